pub mod client;
pub mod memory;
pub mod valkey;

use async_trait::async_trait;
use std::time::Duration;

pub use client::{CacheClient, CacheError, CacheResult};
pub use memory::MemoryCache;
pub use valkey::ValkeyClient;

/// Cache backend selected at startup (`VALKEY_URL` set → Valkey, otherwise in-process).
#[derive(Clone, Debug)]
pub enum CacheBackend {
    Valkey(ValkeyClient),
    Memory(MemoryCache),
}

impl CacheBackend {
    pub async fn connect(valkey_url: Option<&str>) -> Result<Self, CacheError> {
        match valkey_url {
            Some(url) => Ok(Self::Valkey(ValkeyClient::new(url).await?)),
            None => Ok(Self::Memory(MemoryCache::new())),
        }
    }
}

#[async_trait]
impl CacheClient for CacheBackend {
    fn backend_name(&self) -> &'static str {
        match self {
            Self::Valkey(c) => c.backend_name(),
            Self::Memory(c) => c.backend_name(),
        }
    }

    async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
        match self {
            Self::Valkey(c) => c.get_string(key).await,
            Self::Memory(c) => c.get_string(key).await,
        }
    }

    async fn set_if_absent_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> CacheResult<bool> {
        match self {
            Self::Valkey(c) => c.set_if_absent_with_ttl(key, value, ttl).await,
            Self::Memory(c) => c.set_if_absent_with_ttl(key, value, ttl).await,
        }
    }
}
