use crate::backend::create_backend;
use crate::cache::{ObjectCache, register::get_object_cache_plugin};
use crate::config::AppConfig;
use crate::errors::{PortalError, Result};
use crate::session::SessionRegistry;
use actix_web::web;
use std::sync::Arc;
use tracing::{debug, warn};

const FALLBACK_CACHE: &str = "moka";

pub struct StartupContext {
    pub cache: Arc<dyn ObjectCache>,
    pub registry: web::Data<SessionRegistry>,
}

async fn build_cache(cache_type: &str) -> Result<Arc<dyn ObjectCache>> {
    let constructor = get_object_cache_plugin(cache_type).ok_or_else(|| {
        PortalError::cache_plugin_not_found(format!(
            "Cache backend '{cache_type}' not found in registry"
        ))
    })?;
    constructor().await.map(Arc::from)
}

/// 创建缓存实例，配置的类型不可用时回退到内存缓存
async fn create_cache() -> Result<Arc<dyn ObjectCache>> {
    let config = AppConfig::get();
    let cache_type = config.cache.cache_type.as_str();

    warn!("Attempting to create {} cache backend", cache_type);
    match build_cache(cache_type).await {
        Ok(cache) => {
            warn!("Successfully created {} cache backend", cache_type);
            Ok(cache)
        }
        Err(e) if cache_type != FALLBACK_CACHE => {
            warn!("{}; falling back to memory cache", e);
            let cache = build_cache(FALLBACK_CACHE).await?;
            warn!("Successfully created fallback Moka (in-memory) cache backend");
            Ok(cache)
        }
        Err(e) => Err(e),
    }
}

/// 准备服务器启动的上下文
/// 包括后端客户端、缓存和浏览器会话表
pub async fn prepare_server_startup() -> Result<StartupContext> {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    if cfg!(debug_assertions) {
        crate::cache::register::debug_object_cache_registry();
        debug!("Debug mode: Cache registry is enabled");
    }

    let config = AppConfig::get();

    let backend = create_backend().await?;
    warn!("Backend client initialized ({})", config.backend.kind);
    if config.backend.kind == "memory" {
        warn!("Using the in-memory backend with demo accounts, do not use in production");
    }

    let cache = create_cache().await?;
    warn!("Cache backend initialized");

    let registry = web::Data::new(SessionRegistry::new(backend, &config.session));

    Ok(StartupContext { cache, registry })
}
