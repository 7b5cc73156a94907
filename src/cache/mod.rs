//! 对象缓存层
//!
//! 通过插件注册表选择缓存后端（moka / redis），业务层只依赖 [`ObjectCache`]。

pub mod object_cache;
pub mod register;
pub mod traits;

pub use traits::{CacheResult, ObjectCache};

use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

/// 读取 JSON 缓存，反序列化失败时删除该键
pub async fn get_json<T: DeserializeOwned>(cache: &dyn ObjectCache, key: &str) -> Option<T> {
    match cache.get_raw(key).await {
        CacheResult::Found(raw) => match serde_json::from_str::<T>(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("Dropping undecodable cache entry {}: {}", key, e);
                cache.remove(key).await;
                None
            }
        },
        _ => None,
    }
}

/// 写入 JSON 缓存（序列化失败时忽略）
pub async fn insert_json<T: Serialize>(cache: &dyn ObjectCache, key: &str, value: &T, ttl: u64) {
    if let Ok(raw) = serde_json::to_string(value) {
        cache.insert_raw(key.to_string(), raw, ttl).await;
    }
}

/// 声明缓存插件：在进程启动时把构造函数写入注册表
#[macro_export]
macro_rules! declare_object_cache_plugin {
    ($name:literal, $ty:ty) => {
        #[ctor::ctor]
        unsafe fn __register_object_cache_plugin() {
            $crate::cache::register::register_object_cache_plugin(
                $name,
                std::sync::Arc::new(|| {
                    Box::pin(async {
                        let cache = <$ty>::new().map_err(|e| {
                            $crate::errors::LmsError::cache_connection(format!(
                                "{} cache init failed: {e}",
                                $name
                            ))
                        })?;
                        let boxed: Box<dyn $crate::cache::ObjectCache> = Box::new(cache);
                        $crate::errors::Result::<Box<dyn $crate::cache::ObjectCache>>::Ok(boxed)
                    }) as $crate::cache::register::BoxedObjectCacheFuture
                }),
            );
        }
    };
}
