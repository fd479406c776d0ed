use crate::models::dashboard::GateView;
use crate::session::SessionState;

use super::navigation::NavPanel;
use super::shell::build_shell;

/// 认证闸门：加载中 / 登录页 / 仪表盘
pub struct AuthGate;

impl AuthGate {
    pub fn resolve(state: &SessionState, nav: NavPanel) -> GateView {
        if state.loading {
            return GateView::Loading;
        }
        match state.identity.as_ref() {
            None => GateView::Login,
            Some(identity) => GateView::Dashboard {
                shell: build_shell(identity, state.profile.as_ref(), nav),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Identity;
    use crate::models::dashboard::DashboardKind;
    use uuid::Uuid;

    #[test]
    fn test_gate_views() {
        let loading = SessionState::default();
        assert_eq!(AuthGate::resolve(&loading, NavPanel::default()), GateView::Loading);

        let signed_out = SessionState {
            loading: false,
            ..Default::default()
        };
        assert_eq!(AuthGate::resolve(&signed_out, NavPanel::default()), GateView::Login);

        let no_profile = SessionState {
            identity: Some(Identity {
                id: Uuid::new_v4(),
                email: None,
                email_confirmed_at: None,
                created_at: None,
            }),
            loading: false,
            ..Default::default()
        };
        match AuthGate::resolve(&no_profile, NavPanel::default()) {
            GateView::Dashboard { shell } => {
                assert_eq!(shell.kind, DashboardKind::Student);
                assert_eq!(shell.display_name, "User");
            }
            other => panic!("expected dashboard, got {other:?}"),
        }
    }
}
