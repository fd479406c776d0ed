use std::sync::{Arc, Mutex};
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;
use uuid::Uuid;

use super::provider::SessionProvider;
use crate::backend::Backend;
use crate::config::SessionConfig;
use crate::dashboard::navigation::NavPanel;

/// 一个浏览器会话的服务端状态
pub struct PortalSession {
    pub id: Uuid,
    pub provider: SessionProvider,
    nav: Mutex<NavPanel>,
}

impl PortalSession {
    pub fn nav(&self) -> NavPanel {
        *self.nav.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// 切换导航面板，返回切换后的状态
    pub fn toggle_nav(&self) -> NavPanel {
        let mut nav = self.nav.lock().unwrap_or_else(|p| p.into_inner());
        nav.toggle();
        *nav
    }
}

/// 浏览器会话表，空闲超时后整体丢弃（包括其监听任务）
pub struct SessionRegistry {
    backend: Arc<dyn Backend>,
    sessions: Cache<Uuid, Arc<PortalSession>>,
    refresh_margin: chrono::Duration,
}

impl SessionRegistry {
    pub fn new(backend: Arc<dyn Backend>, config: &SessionConfig) -> Self {
        let sessions = Cache::builder()
            .max_capacity(config.max_sessions)
            .time_to_idle(Duration::from_secs(config.idle_timeout_secs))
            .build();
        Self {
            backend,
            sessions,
            refresh_margin: chrono::Duration::seconds(config.refresh_margin_secs),
        }
    }

    pub fn backend(&self) -> Arc<dyn Backend> {
        self.backend.clone()
    }

    pub async fn create(&self) -> Arc<PortalSession> {
        let id = Uuid::new_v4();
        let session = Arc::new(PortalSession {
            id,
            provider: SessionProvider::new(self.backend.clone(), self.refresh_margin).await,
            nav: Mutex::new(NavPanel::default()),
        });
        self.sessions.insert(id, session.clone()).await;
        debug!("Browser session {} created", id);
        session
    }

    pub async fn get(&self, id: &Uuid) -> Option<Arc<PortalSession>> {
        self.sessions.get(id).await
    }

    pub async fn remove(&self, id: &Uuid) {
        self.sessions.invalidate(id).await;
        debug!("Browser session {} removed", id);
    }

    pub async fn len(&self) -> u64 {
        self.sessions.run_pending_tasks().await;
        self.sessions.entry_count()
    }
}
