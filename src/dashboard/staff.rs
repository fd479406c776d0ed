use futures_util::join;

use crate::models::campus::Department;
use crate::models::courses::Course;
use crate::models::dashboard::{CourseCard, DepartmentSummary, StaffDashboard, StatCard};
use crate::models::profiles::{Profile, UserRole};
use crate::queries::QueryClient;

pub fn summarize_departments(departments: &[Department], courses: &[Course]) -> Vec<DepartmentSummary> {
    departments
        .iter()
        .map(|d| DepartmentSummary {
            department: d.clone(),
            active_courses: courses
                .iter()
                .filter(|c| c.is_active && c.department_id == Some(d.id))
                .count(),
        })
        .collect()
}

fn count_role(profiles: &[Profile], role: UserRole) -> usize {
    profiles.iter().filter(|p| p.role == role).count()
}

pub async fn build(client: &QueryClient) -> StaffDashboard {
    let (departments, courses, profiles, announcements) = join!(
        client.departments(),
        client.all_courses(),
        client.profiles(),
        client.announcements(Some(UserRole::AcademicStaff)),
    );

    let active: Vec<&Course> = courses.data.iter().filter(|c| c.is_active).collect();
    let unassigned = active.iter().filter(|c| c.instructor_id.is_none()).count();

    StaffDashboard {
        stats: vec![
            StatCard::new("Students", count_role(&profiles.data, UserRole::Student)),
            StatCard::new("Lecturers", count_role(&profiles.data, UserRole::Teacher)),
            StatCard::new("Active Courses", active.len())
                .with_hint(format!("{unassigned} without a lecturer")),
            StatCard::new("Departments", departments.data.len()),
        ],
        departments: summarize_departments(&departments.data, &courses.data),
        courses: active.into_iter().map(CourseCard::from).collect(),
        announcements: announcements.data,
    }
}
