use crate::models::auth::Identity;
use crate::models::dashboard::ShellView;
use crate::models::profiles::{Profile, UserRole};

use super::navigation::{NavPanel, dashboard_for, navigation_for};

/// 外壳视图：资料缺失时以学生身份展示
pub fn build_shell(identity: &Identity, profile: Option<&Profile>, nav: NavPanel) -> ShellView {
    let role = profile.map_or(UserRole::Student, |p| p.role);
    let display_name = profile
        .map(|p| p.full_name.clone())
        .or_else(|| identity.email.clone())
        .unwrap_or_else(|| "User".to_string());

    ShellView {
        role,
        kind: dashboard_for(role),
        display_name,
        nav_open: nav.open,
        navigation: navigation_for(role).to_vec(),
    }
}
