//! 数据访问钩子
//!
//! 每个钩子对应一个缓存键。读取失败记录日志后返回默认值，
//! 写入失败记录日志后向上返回；写入成功后按前缀失效相关键。

pub mod assignments;
pub mod campus;
pub mod courses;
pub mod enrollments;
pub mod submissions;

use std::fmt::{self, Display};
use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, error};
use ts_rs::TS;
use uuid::Uuid;

use crate::backend::Backend;
use crate::cache::ObjectCache;
use crate::errors::{PortalError, Result};
use crate::session::PortalSession;

/// 钩子结果；禁用的钩子 `is_loading` 为真且数据为默认值
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/query.ts")]
pub struct QueryState<T> {
    pub data: T,
    pub is_loading: bool,
}

impl<T: Default> QueryState<T> {
    pub fn disabled() -> Self {
        Self {
            data: T::default(),
            is_loading: true,
        }
    }
}

impl<T> QueryState<T> {
    pub fn ready(data: T) -> Self {
        Self {
            data,
            is_loading: false,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryState<U> {
        QueryState {
            data: f(self.data),
            is_loading: self.is_loading,
        }
    }
}

/// 缓存键，由实体名和若干段组成，`:` 连接
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new(entity: &str) -> Self {
        Self(vec![entity.to_string()])
    }

    pub fn with(mut self, segment: impl Display) -> Self {
        self.0.push(segment.to_string());
        self
    }

    /// 多个ID组成一段，排序后以 `,` 连接，保证同一集合得到同一个键
    pub fn with_ids(self, ids: &[Uuid]) -> Self {
        let mut sorted = ids.to_vec();
        sorted.sort();
        let joined = sorted
            .iter()
            .map(Uuid::to_string)
            .collect::<Vec<_>>()
            .join(",");
        self.with(joined)
    }
}

impl Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(":"))
    }
}

// 写入前的单行读取找不到时，给出业务错误而非后端错误
pub(crate) fn not_found(entity: &'static str) -> impl FnOnce(PortalError) -> PortalError {
    move |e| {
        if e.is_row_not_found() {
            PortalError::not_found(format!("{entity} not found"))
        } else {
            e
        }
    }
}

/// 一个访问者的查询客户端
pub struct QueryClient {
    cache: Arc<dyn ObjectCache>,
    backend: Arc<dyn Backend>,
    token: String,
    viewer: String,
}

impl QueryClient {
    pub fn new(
        cache: Arc<dyn ObjectCache>,
        backend: Arc<dyn Backend>,
        token: String,
        viewer: Option<Uuid>,
    ) -> Self {
        Self {
            cache,
            backend,
            token,
            viewer: viewer.map_or_else(|| "anon".to_string(), |id| id.to_string()),
        }
    }

    /// 以浏览器会话当前的身份和令牌创建
    pub async fn for_session(cache: Arc<dyn ObjectCache>, session: &PortalSession) -> Self {
        let viewer = session.provider.state().identity.map(|i| i.id);
        let token = session.provider.access_token().await;
        Self::new(cache, session.provider.backend(), token, viewer)
    }

    fn scoped(&self, key: &QueryKey) -> String {
        format!("q:{}:{}", self.viewer, key)
    }

    pub(crate) fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub(crate) fn token(&self) -> &str {
        &self.token
    }

    /// 先查缓存，未命中再调用后端；失败时返回默认值且不写缓存
    async fn read<T, F, Fut>(&self, key: QueryKey, fetch: F) -> QueryState<T>
    where
        T: Serialize + DeserializeOwned + Default,
        F: FnOnce(Arc<dyn Backend>, String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let scoped = self.scoped(&key);
        if let Some(cached) = self.cache.get_json::<T>(&scoped).await {
            debug!("Query cache hit: {}", scoped);
            return QueryState::ready(cached);
        }

        match fetch(self.backend.clone(), self.token.clone()).await {
            Ok(data) => {
                self.cache.insert_json(scoped, &data, 0).await;
                QueryState::ready(data)
            }
            Err(e) => {
                error!("Query {} failed: {}", key, e);
                QueryState::ready(T::default())
            }
        }
    }

    /// 单行读取，行不存在时为 `None`
    async fn read_one<T, F, Fut>(&self, key: QueryKey, fetch: F) -> QueryState<Option<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(Arc<dyn Backend>, String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.read(key, |backend, token| async move {
            match fetch(backend, token).await {
                Ok(row) => Ok(Some(row)),
                Err(e) if e.is_row_not_found() => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
    }

    /// 失效以 `key` 开头的所有键
    pub async fn invalidate(&self, key: &QueryKey) {
        let scoped = self.scoped(key);
        debug!("Invalidating queries with prefix {}", scoped);
        self.cache.remove_prefix(&scoped).await;
    }

    /// 失效当前访问者的所有键
    pub async fn invalidate_viewer(&self) {
        self.cache
            .remove_prefix(&format!("q:{}:", self.viewer))
            .await;
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_key_format() {
        let a = Uuid::from_u128(2);
        let b = Uuid::from_u128(1);
        let key = QueryKey::new("schedules").with_ids(&[a, b]);
        assert_eq!(
            key.to_string(),
            format!("schedules:{b},{a}")
        );
        assert_eq!(QueryKey::new("courses").with("all").to_string(), "courses:all");
    }

    #[tokio::test]
    async fn test_cache_hit_skips_backend() {
        let (backend, _, client) = signed_in("staff@campus.test").await;

        let first = client.departments().await;
        let reads = backend.reads();
        let second = client.departments().await;

        assert!(!first.data.is_empty());
        assert_eq!(first, second);
        assert_eq!(backend.reads(), reads);
    }

    #[tokio::test]
    async fn test_failed_read_returns_default_and_is_not_cached() {
        let (backend, _, client) = signed_in("staff@campus.test").await;

        backend.set_unavailable(true);
        let failed = client.departments().await;
        assert!(failed.data.is_empty());
        assert!(!failed.is_loading);

        backend.set_unavailable(false);
        assert!(!client.departments().await.data.is_empty());
    }

    #[tokio::test]
    async fn test_viewers_do_not_share_entries() {
        let (backend, session, _) = signed_in("staff@campus.test").await;
        let shared = cache();
        let staff = QueryClient::new(
            shared.clone(),
            backend.clone(),
            session.access_token.clone(),
            Some(session.user.id),
        );
        let anonymous = QueryClient::new(shared, backend.clone(), session.access_token, None);

        staff.departments().await;
        let reads = backend.reads();
        anonymous.departments().await;
        assert_eq!(backend.reads(), reads + 1);

        staff.invalidate_viewer().await;
        staff.departments().await;
        assert_eq!(backend.reads(), reads + 2);
    }
}
