//! 仪表盘外壳与各角色仪表盘
//!
//! 认证闸门决定展示加载页、登录页还是外壳；外壳按资料中的角色
//! 选择导航和仪表盘。资料缺失或角色未知时一律按学生处理。

pub mod admin;
pub mod gate;
pub mod navigation;
pub mod shell;
pub mod staff;
pub mod student;
pub mod teacher;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::models::dashboard::DashboardView;
use crate::models::profiles::UserRole;
use crate::queries::QueryClient;
use crate::session::SessionState;

pub use gate::AuthGate;
pub use navigation::{NavPanel, dashboard_for, navigation_for};
pub use shell::build_shell;

/// 按当前资料的角色组装仪表盘
pub async fn build_dashboard(
    client: &QueryClient,
    state: &SessionState,
    now: DateTime<Utc>,
) -> DashboardView {
    let Some(profile) = state.profile.as_ref() else {
        debug!("No profile loaded, rendering empty student dashboard");
        return DashboardView::Student(student::empty());
    };

    match profile.role {
        UserRole::Teacher => {
            DashboardView::Teacher(teacher::build(client, Some(profile.id), now).await)
        }
        UserRole::AcademicStaff => DashboardView::AcademicStaff(staff::build(client).await),
        UserRole::Admin => DashboardView::Admin(admin::build(client).await),
        UserRole::Student | UserRole::Unrecognized => {
            let data = student::load(client, Some(profile.id)).await;
            DashboardView::Student(student::assemble(data, now))
        }
    }
}
