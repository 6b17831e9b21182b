//! 网络信息 TTL 缓存
//! 过期判定：已过时间 > TTL；刷新时整体替换

use std::{future::Future, sync::Arc, time::Duration};

use tokio::{sync::RwLock, time::Instant};

use crate::{domain::NetworkInfo, error::Result};

struct CachedInfo {
    info: Arc<NetworkInfo>,
    fetched_at: Instant,
}

pub struct InfoCache {
    ttl: Duration,
    entry: RwLock<Option<CachedInfo>>,
}

impl InfoCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: RwLock::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 未过期的缓存值
    pub async fn get(&self) -> Option<Arc<NetworkInfo>> {
        let guard = self.entry.read().await;
        guard
            .as_ref()
            .filter(|cached| cached.fetched_at.elapsed() <= self.ttl)
            .map(|cached| cached.info.clone())
    }

    pub async fn put(&self, info: NetworkInfo) -> Arc<NetworkInfo> {
        let info = Arc::new(info);
        *self.entry.write().await = Some(CachedInfo {
            info: info.clone(),
            fetched_at: Instant::now(),
        });
        info
    }

    pub async fn invalidate(&self) {
        *self.entry.write().await = None;
    }

    /// 命中直接返回，否则调用 `fetch` 刷新
    ///
    /// 并发的两个过期调用可能都会刷新，结果相同，可以接受
    pub async fn get_or_refresh<F, Fut>(&self, fetch: F) -> Result<Arc<NetworkInfo>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<NetworkInfo>>,
    {
        if let Some(info) = self.get().await {
            return Ok(info);
        }
        let info = fetch().await?;
        tracing::debug!(tokens = info.token_list.len(), "network info refreshed");
        Ok(self.put(info).await)
    }
}
