use std::sync::Arc;

use chrono::Duration;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::auth_client::AuthClient;
use super::events::AuthStateChange;
use crate::backend::Backend;
use crate::errors::{PortalError, Result};
use crate::models::auth::{Identity, SignUpRequest};
use crate::models::profiles::{NewProfile, Profile, UpdateProfileRequest};

/// 提供给视图层的会话状态
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub identity: Option<Identity>,
    pub profile: Option<Profile>,
    pub loading: bool,
    /// 已应用的最后一个身份事件序号
    pub applied: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            identity: None,
            profile: None,
            loading: true,
            applied: 0,
        }
    }
}

/// 会话与资料提供者
///
/// 监听任务只持有后端、状态发送端和事件接收端；提供者被丢弃时
/// [`AuthClient`] 一并释放，事件通道关闭，任务随之退出。
pub struct SessionProvider {
    auth: AuthClient,
    backend: Arc<dyn Backend>,
    state: watch::Receiver<SessionState>,
}

impl SessionProvider {
    /// 需要在 tokio 运行时中调用
    pub async fn new(backend: Arc<dyn Backend>, refresh_margin: Duration) -> Self {
        let auth = AuthClient::new(backend.clone(), refresh_margin);
        let events = auth.subscribe();
        let (sender, state) = watch::channel(SessionState::default());
        tokio::spawn(listen(backend.clone(), sender, events));
        auth.initialize().await;

        Self {
            auth,
            backend,
            state,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    pub fn backend(&self) -> Arc<dyn Backend> {
        self.backend.clone()
    }

    pub async fn access_token(&self) -> String {
        self.auth.access_token().await
    }

    /// 等待初始事件应用完毕
    pub async fn settled(&self) -> SessionState {
        let mut state = self.state.clone();
        match state.wait_for(|s| !s.loading).await {
            Ok(settled) => settled.clone(),
            Err(_) => self.state(),
        }
    }

    // 等待监听任务应用到指定序号
    async fn applied(&self, seq: u64) -> SessionState {
        let mut state = self.state.clone();
        match state.wait_for(|s| s.applied >= seq).await {
            Ok(applied) => applied.clone(),
            Err(_) => {
                warn!("Session listener stopped before applying event {}", seq);
                self.state()
            }
        }
    }

    /// 注册身份并写入资料行
    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<SessionState> {
        let outcome = self
            .auth
            .sign_up(&request.email, &request.password)
            .await
            .inspect_err(|e| error!("Sign up failed for {}: {}", request.email, e))?;

        let token = outcome
            .session
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_default();
        let profile = NewProfile {
            id: outcome.identity.id,
            email: request.email.clone(),
            full_name: request.full_name.trim().to_string(),
            role: request.role,
            student_id: request.student_id.clone(),
            employee_id: request.employee_id.clone(),
            phone: request.phone.clone(),
        };
        self.backend
            .insert_profile(&token, profile)
            .await
            .inspect_err(|e| {
                error!(
                    "Failed to create profile for identity {}: {}",
                    outcome.identity.id, e
                )
            })?;

        match outcome.session {
            Some(session) => {
                let seq = self.auth.establish(session).await;
                Ok(self.applied(seq).await)
            }
            None => {
                debug!(
                    "Identity {} awaits email confirmation, no session yet",
                    outcome.identity.id
                );
                Ok(self.state())
            }
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SessionState> {
        let seq = self
            .auth
            .sign_in(email, password)
            .await
            .inspect_err(|e| error!("Sign in failed for {}: {}", email, e))?;
        Ok(self.applied(seq).await)
    }

    /// 无论远端是否成功，本地身份与资料都会清空
    pub async fn sign_out(&self) -> Result<SessionState> {
        let (result, seq) = self.auth.sign_out().await;
        let state = self.applied(seq).await;
        result.inspect_err(|e| error!("Remote sign out failed: {}", e))?;
        Ok(state)
    }

    /// 部分更新当前用户资料，随后重新拉取
    pub async fn update_profile(&self, update: &UpdateProfileRequest) -> Result<Profile> {
        let identity = self
            .state()
            .identity
            .ok_or_else(|| PortalError::authentication("Not signed in"))?;
        let token = self.auth.access_token().await;

        let updated = self
            .backend
            .update_profile(&token, identity.id, update)
            .await
            .inspect_err(|e| error!("Failed to update profile {}: {}", identity.id, e))?;

        let seq = self.auth.notify_user_updated().await;
        Ok(self.applied(seq).await.profile.unwrap_or(updated))
    }

    /// 令牌临近过期时刷新；refresh token 被拒绝时本地会话随之结束
    pub async fn ensure_fresh(&self) -> Result<SessionState> {
        let (result, seq) = self.auth.ensure_fresh().await;
        let state = match seq {
            Some(seq) => self.applied(seq).await,
            None => self.state(),
        };
        result.inspect_err(|e| error!("Failed to refresh session: {}", e))?;
        Ok(state)
    }
}

async fn listen(
    backend: Arc<dyn Backend>,
    state: watch::Sender<SessionState>,
    mut events: broadcast::Receiver<AuthStateChange>,
) {
    loop {
        match events.recv().await {
            Ok(change) => apply(backend.as_ref(), &state, change).await,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Session listener lagged, skipped {} auth events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    debug!("Session listener stopped");
}

async fn apply(backend: &dyn Backend, state: &watch::Sender<SessionState>, change: AuthStateChange) {
    let identity = change.session.as_ref().map(|s| s.user.clone());
    let profile = match change.session.as_ref() {
        Some(session) => fetch_profile(backend, &session.access_token, session.user.id).await,
        None => None,
    };
    debug!(
        "Applied auth event {} (seq {}), profile loaded: {}",
        change.event,
        change.seq,
        profile.is_some()
    );
    state.send_modify(|s| {
        s.identity = identity;
        s.profile = profile;
        s.loading = false;
        s.applied = s.applied.max(change.seq);
    });
}

/// 资料不存在视为正常情况；其它错误记录后吞掉
async fn fetch_profile(backend: &dyn Backend, token: &str, id: Uuid) -> Option<Profile> {
    match backend.get_profile(token, id).await {
        Ok(profile) => Some(profile),
        Err(e) if e.is_row_not_found() => {
            debug!("No profile row for identity {}", id);
            None
        }
        Err(e) => {
            error!("Failed to fetch profile for {}: {}", id, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;
    use crate::models::profiles::UserRole;

    const SECRET: &str = "provider-test-secret";

    fn memory() -> Arc<MemoryBackend> {
        Arc::new(MemoryBackend::new(SECRET))
    }

    async fn provider(backend: &Arc<MemoryBackend>) -> SessionProvider {
        SessionProvider::new(backend.clone(), Duration::seconds(60)).await
    }

    fn sign_up_request(email: &str) -> SignUpRequest {
        SignUpRequest {
            email: email.to_string(),
            password: "Welcome2026".to_string(),
            full_name: "  Nia Newcomer ".to_string(),
            role: UserRole::Student,
            student_id: Some("STU-9".to_string()),
            employee_id: None,
            phone: None,
        }
    }

    #[tokio::test]
    async fn test_initial_state_settles_signed_out() {
        let backend = memory();
        let provider = provider(&backend).await;

        let state = provider.settled().await;
        assert!(!state.loading);
        assert!(state.identity.is_none());
        assert!(state.profile.is_none());
    }

    #[tokio::test]
    async fn test_sign_in_loads_profile_and_sign_out_clears_both() {
        let backend = memory();
        let profile = backend
            .add_account("lee@campus.test", "Teacher123", "Lee", UserRole::Teacher)
            .unwrap();
        let provider = provider(&backend).await;

        let state = provider.sign_in("lee@campus.test", "Teacher123").await.unwrap();
        assert_eq!(state.identity.map(|i| i.id), Some(profile.id));
        assert_eq!(state.profile.map(|p| p.role), Some(UserRole::Teacher));

        let state = provider.sign_out().await.unwrap();
        assert!(state.identity.is_none());
        assert!(state.profile.is_none());
    }

    #[tokio::test]
    async fn test_sign_out_clears_state_even_when_remote_fails() {
        let backend = memory();
        backend
            .add_account("lee@campus.test", "Teacher123", "Lee", UserRole::Teacher)
            .unwrap();
        let provider = provider(&backend).await;
        provider.sign_in("lee@campus.test", "Teacher123").await.unwrap();

        backend.set_unavailable(true);
        assert!(provider.sign_out().await.is_err());

        let state = provider.state();
        assert!(state.identity.is_none());
        assert!(state.profile.is_none());
    }

    #[tokio::test]
    async fn test_missing_profile_row_is_not_an_error() {
        let backend = memory();
        backend.add_identity("ghost@campus.test", "Ghost1234").unwrap();
        let provider = provider(&backend).await;

        let state = provider.sign_in("ghost@campus.test", "Ghost1234").await.unwrap();
        assert!(state.identity.is_some());
        assert!(state.profile.is_none());
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_sign_up_inserts_profile_before_signing_in() {
        let backend = memory();
        let provider = provider(&backend).await;

        let state = provider
            .sign_up(&sign_up_request("nia@campus.test"))
            .await
            .unwrap();
        let profile = state.profile.unwrap();
        assert_eq!(profile.full_name, "Nia Newcomer");
        assert_eq!(profile.student_id.as_deref(), Some("STU-9"));
        assert_eq!(Some(profile.id), state.identity.map(|i| i.id));

        let err = provider
            .sign_up(&sign_up_request("nia@campus.test"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E012");
    }

    #[tokio::test]
    async fn test_update_profile_requires_identity_and_refetches() {
        let backend = memory();
        backend
            .add_account("ray@campus.test", "Student123", "Ray", UserRole::Student)
            .unwrap();
        let provider = provider(&backend).await;

        let update = UpdateProfileRequest {
            phone: Some("+44 20 7946 0000".to_string()),
            ..Default::default()
        };
        let err = provider.update_profile(&update).await.unwrap_err();
        assert_eq!(err.code(), "E012");

        provider.sign_in("ray@campus.test", "Student123").await.unwrap();
        let profile = provider.update_profile(&update).await.unwrap();
        assert_eq!(profile.phone.as_deref(), Some("+44 20 7946 0000"));
        assert_eq!(provider.state().profile, Some(profile));
    }

    #[tokio::test]
    async fn test_ensure_fresh_refreshes_near_expiry() {
        let backend = Arc::new(
            MemoryBackend::new(SECRET).with_access_ttl(Duration::seconds(30)),
        );
        backend
            .add_account("ray@campus.test", "Student123", "Ray", UserRole::Student)
            .unwrap();
        let provider = provider(&backend).await;
        provider.sign_in("ray@campus.test", "Student123").await.unwrap();
        let before = provider.state().applied;

        let state = provider.ensure_fresh().await.unwrap();
        assert!(state.applied > before);
        assert!(state.profile.is_some());
    }

    #[tokio::test]
    async fn test_listener_stops_when_provider_dropped() {
        let backend = memory();
        let provider = provider(&backend).await;
        provider.settled().await;
        let mut state = provider.subscribe();
        drop(provider);

        let stopped = tokio::time::timeout(std::time::Duration::from_secs(2), async {
            while state.changed().await.is_ok() {}
        })
        .await;
        assert!(stopped.is_ok());
    }
}
