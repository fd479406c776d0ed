use futures_util::join;

use crate::models::dashboard::{AdminDashboard, RoleCount, StatCard};
use crate::models::profiles::{Profile, UserRole};
use crate::queries::QueryClient;

/// 按角色计数；已知角色总是列出，未知角色仅在出现时列出
pub fn users_by_role(profiles: &[Profile]) -> Vec<RoleCount> {
    let count = |role: UserRole| profiles.iter().filter(|p| p.role == role).count();
    let mut rows: Vec<RoleCount> = UserRole::all_roles()
        .iter()
        .map(|role| RoleCount {
            role: **role,
            count: count(**role),
        })
        .collect();
    let unrecognized = count(UserRole::Unrecognized);
    if unrecognized > 0 {
        rows.push(RoleCount {
            role: UserRole::Unrecognized,
            count: unrecognized,
        });
    }
    rows
}

pub async fn build(client: &QueryClient) -> AdminDashboard {
    let (profiles, courses, settings, announcements) = join!(
        client.profiles(),
        client.all_courses(),
        client.system_settings(),
        client.announcements(Some(UserRole::Admin)),
    );

    let active_users = profiles.data.iter().filter(|p| p.is_active).count();
    let inactive_users = profiles.data.len() - active_users;
    let active_courses = courses.data.iter().filter(|c| c.is_active).count();

    AdminDashboard {
        stats: vec![
            StatCard::new("Total Users", profiles.data.len())
                .with_hint(format!("{inactive_users} deactivated")),
            StatCard::new("Active Users", active_users),
            StatCard::new("Courses", courses.data.len())
                .with_hint(format!("{active_courses} active")),
            StatCard::new("Settings", settings.data.len()),
        ],
        users_by_role: users_by_role(&profiles.data),
        settings: settings.data,
        announcements: announcements.data,
    }
}
