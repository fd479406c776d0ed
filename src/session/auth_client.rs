use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, warn};

use super::events::{AuthEvent, AuthStateChange};
use crate::backend::{Backend, SignUpOutcome};
use crate::errors::Result;
use crate::models::auth::AuthSession;

const EVENT_CHANNEL_CAPACITY: usize = 16;

struct Inner {
    session: Option<AuthSession>,
    seq: u64,
}

/// 一个浏览器会话的身份客户端
///
/// 保存当前令牌，每次令牌变化都广播一个 [`AuthStateChange`]。
/// 状态锁在刷新期间保持，保证轮换式 refresh token 不会被并发使用两次。
pub struct AuthClient {
    backend: Arc<dyn Backend>,
    inner: Mutex<Inner>,
    events: broadcast::Sender<AuthStateChange>,
    refresh_margin: Duration,
}

impl AuthClient {
    pub fn new(backend: Arc<dyn Backend>, refresh_margin: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            backend,
            inner: Mutex::new(Inner {
                session: None,
                seq: 0,
            }),
            events,
            refresh_margin,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthStateChange> {
        self.events.subscribe()
    }

    // 在持锁状态下发出事件，保证 seq 与状态变化顺序一致
    fn emit(&self, inner: &mut Inner, event: AuthEvent) -> u64 {
        inner.seq += 1;
        let change = AuthStateChange {
            seq: inner.seq,
            event,
            session: inner.session.clone(),
        };
        debug!("Auth event {} (seq {})", event, change.seq);
        if self.events.send(change).is_err() {
            debug!("No auth listeners for event {}", event);
        }
        inner.seq
    }

    /// 发出初始事件
    pub async fn initialize(&self) -> u64 {
        let mut inner = self.inner.lock().await;
        self.emit(&mut inner, AuthEvent::InitialSession)
    }

    pub async fn current_session(&self) -> Option<AuthSession> {
        self.inner.lock().await.session.clone()
    }

    /// 当前 access token，未登录时为空串
    pub async fn access_token(&self) -> String {
        self.inner
            .lock()
            .await
            .session
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_default()
    }

    /// 只创建身份；会话由调用方在资料写入后通过 [`AuthClient::establish`] 建立
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        self.backend.sign_up(email, password).await
    }

    /// 保存会话并发出 SIGNED_IN
    pub async fn establish(&self, session: AuthSession) -> u64 {
        let mut inner = self.inner.lock().await;
        info!("Identity {} signed in", session.user.id);
        inner.session = Some(session);
        self.emit(&mut inner, AuthEvent::SignedIn)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<u64> {
        let session = self.backend.sign_in_with_password(email, password).await?;
        Ok(self.establish(session).await)
    }

    /// 远端注销失败时本地会话照样清除，错误随序号一起返回
    pub async fn sign_out(&self) -> (Result<()>, u64) {
        let mut inner = self.inner.lock().await;
        let result = match inner.session.take() {
            Some(session) => self.backend.sign_out(&session.access_token).await,
            None => Ok(()),
        };
        let seq = self.emit(&mut inner, AuthEvent::SignedOut);
        (result, seq)
    }

    /// 令牌即将过期时刷新；返回值的序号对应本次发出的事件（如有）
    pub async fn ensure_fresh(&self) -> (Result<()>, Option<u64>) {
        let mut inner = self.inner.lock().await;
        let Some(session) = inner.session.as_ref() else {
            return (Ok(()), None);
        };
        if !session.expires_within(Utc::now(), self.refresh_margin) {
            return (Ok(()), None);
        }

        debug!("Access token for {} expires soon, refreshing", session.user.id);
        match self.backend.refresh_session(&session.refresh_token).await {
            Ok(refreshed) => {
                inner.session = Some(refreshed);
                (Ok(()), Some(self.emit(&mut inner, AuthEvent::TokenRefreshed)))
            }
            Err(e) if e.error_type() == "Authentication" => {
                // refresh token 已失效，会话无法恢复
                warn!("Session refresh rejected, signing out locally: {}", e);
                inner.session = None;
                (Err(e), Some(self.emit(&mut inner, AuthEvent::SignedOut)))
            }
            Err(e) => (Err(e), None),
        }
    }

    /// 资料变更后通知监听者重新拉取
    pub async fn notify_user_updated(&self) -> u64 {
        let mut inner = self.inner.lock().await;
        self.emit(&mut inner, AuthEvent::UserUpdated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;
    use crate::models::profiles::UserRole;

    fn backend() -> Arc<MemoryBackend> {
        let backend = MemoryBackend::new("auth-client-test");
        backend
            .add_account("kim@campus.test", "Student123", "Kim", UserRole::Student)
            .unwrap();
        Arc::new(backend)
    }

    #[tokio::test]
    async fn test_events_carry_increasing_sequence() {
        let client = AuthClient::new(backend(), Duration::seconds(60));
        let mut events = client.subscribe();

        let first = client.initialize().await;
        let second = client.sign_in("kim@campus.test", "Student123").await.unwrap();
        let (result, third) = client.sign_out().await;
        result.unwrap();

        assert_eq!((first, second, third), (1, 2, 3));
        assert_eq!(events.recv().await.unwrap().event, AuthEvent::InitialSession);
        let signed_in = events.recv().await.unwrap();
        assert_eq!(signed_in.event, AuthEvent::SignedIn);
        assert!(signed_in.session.is_some());
        let signed_out = events.recv().await.unwrap();
        assert_eq!(signed_out.event, AuthEvent::SignedOut);
        assert!(signed_out.session.is_none());
        assert!(client.access_token().await.is_empty());
    }

    #[tokio::test]
    async fn test_ensure_fresh_only_near_expiry() {
        let memory = backend();
        let client = AuthClient::new(memory.clone(), Duration::seconds(60));
        client.sign_in("kim@campus.test", "Student123").await.unwrap();
        let (result, seq) = client.ensure_fresh().await;
        assert!(result.is_ok());
        assert_eq!(seq, None);

        let near = AuthClient::new(memory, Duration::hours(2));
        near.sign_in("kim@campus.test", "Student123").await.unwrap();
        let before = near.current_session().await.unwrap().refresh_token;
        let (result, seq) = near.ensure_fresh().await;
        assert!(result.is_ok());
        assert!(seq.is_some());
        let after = near.current_session().await.unwrap().refresh_token;
        assert_ne!(before, after);
    }
}
