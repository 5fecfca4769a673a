use std::time::Instant;

use async_trait::async_trait;

use crate::constants::TASK_SCHED_TARGET;
use crate::data_backend::{MenuStore, SqliteMenuStore};
use crate::data_types::Menu;
use crate::errors::MenuError;

/// Remote first, SQLite snapshot as offline fallback.
///
/// Every successful remote fetch overwrites the cached snapshot for that
/// restaurant. Cached data may be stale; that's accepted.
pub struct CachedMenuStore<R> {
    remote: R,
    cache: SqliteMenuStore,
}

impl<R: MenuStore> CachedMenuStore<R> {
    pub fn new(remote: R, cache: SqliteMenuStore) -> Self {
        CachedMenuStore { remote, cache }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn cache(&self) -> &SqliteMenuStore {
        &self.cache
    }

    /// Re-fetches the given restaurants into the cache, returns how many succeeded.
    pub async fn refresh(&self, restaurant_ids: &[String]) -> usize {
        let now = Instant::now();
        let mut refreshed = 0;

        for restaurant_id in restaurant_ids {
            match self.fetch_and_store(restaurant_id).await {
                Ok(_) => refreshed += 1,
                Err(e) => log::warn!(
                    target: TASK_SCHED_TARGET,
                    "refresh of {} failed: {}",
                    restaurant_id,
                    e
                ),
            }
        }

        log::info!(
            target: TASK_SCHED_TARGET,
            "refreshed {}/{} restaurants: {:.2?}",
            refreshed,
            restaurant_ids.len(),
            now.elapsed()
        );
        refreshed
    }

    async fn fetch_and_store(&self, restaurant_id: &str) -> Result<Vec<Menu>, MenuError> {
        let menus = self.remote.menus_by_restaurant(restaurant_id).await?;

        let snapshot = menus.clone();
        let id = restaurant_id.to_string();
        if let Err(e) = self
            .cache
            .blocking(move |cache| cache.replace_restaurant_menus(&id, &snapshot))
            .await
        {
            // the fetched data is still good, only the cache is behind
            log::warn!("could not cache menus of {}: {}", restaurant_id, e);
        }

        Ok(menus)
    }
}

#[async_trait]
impl<R: MenuStore> MenuStore for CachedMenuStore<R> {
    async fn menus_by_restaurant(&self, restaurant_id: &str) -> Result<Vec<Menu>, MenuError> {
        match self.fetch_and_store(restaurant_id).await {
            Ok(menus) => Ok(menus),
            Err(remote_err) => {
                log::warn!(
                    "remote menus of {} unavailable ({}), using cache",
                    restaurant_id,
                    remote_err
                );
                match self.cache.menus_by_restaurant(restaurant_id).await {
                    Ok(cached) if !cached.is_empty() => Ok(cached),
                    _ => Err(remote_err),
                }
            }
        }
    }
}
