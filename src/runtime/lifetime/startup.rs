use crate::cache::{ObjectCache, register::get_object_cache_plugin};
use crate::config::AppConfig;
use crate::errors::{LmsError, Result};
use crate::storage::Storage;
use std::sync::Arc;
use tracing::{debug, warn};

const FALLBACK_CACHE: &str = "moka";

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
}

/// 按名称构造缓存插件
async fn build_cache(name: &str) -> Result<Arc<dyn ObjectCache>> {
    let constructor = get_object_cache_plugin(name).ok_or_else(|| {
        LmsError::cache_plugin_not_found(format!("Cache backend '{name}' not found in registry"))
    })?;
    let cache = constructor().await?;
    Ok(Arc::from(cache))
}

/// 创建缓存实例；配置的后端不可用时回退到内存缓存
async fn create_cache() -> Result<Arc<dyn ObjectCache>> {
    let cache_type = &AppConfig::get().cache.cache_type;
    warn!("Attempting to create {} cache backend", cache_type);

    match build_cache(cache_type).await {
        Ok(cache) => {
            warn!("Successfully created {} cache backend", cache_type);
            Ok(cache)
        }
        Err(e) if cache_type != FALLBACK_CACHE => {
            warn!("Failed to create {} cache: {}", cache_type, e);
            warn!("Falling back to memory cache");
            let cache = build_cache(FALLBACK_CACHE).await?;
            warn!("Successfully created fallback Moka (in-memory) cache backend");
            Ok(cache)
        }
        Err(e) => Err(e),
    }
}

/// 准备服务器启动的上下文（存储与缓存）
pub async fn prepare_server_startup() -> StartupContext {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    if cfg!(debug_assertions) {
        crate::cache::register::debug_object_cache_registry();
        debug!("Debug mode: Cache registry is enabled");
    }

    let storage = crate::storage::create_storage()
        .await
        .expect("Failed to create storage backend");
    warn!("Storage backend initialized and migrations completed");

    let cache = create_cache().await.expect("Failed to create cache");
    warn!("Cache backend initialized");

    StartupContext { storage, cache }
}
