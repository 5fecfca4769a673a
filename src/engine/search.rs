use std::{sync::Arc, time::Instant};

use crate::data_backend::MenuStore;
use crate::data_types::{Menu, MenuEntry, QuerySpec};
use crate::engine::filter::ItemFilter;
use crate::engine::flattener::flatten;
use crate::engine::popularity::{check_limit, rank_popular};
use crate::errors::MenuError;

/// Answers menu queries for a restaurant against whatever store it was built with.
///
/// Each call fetches one snapshot from the store; nothing is kept between calls.
pub struct MenuSearchEngine<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for MenuSearchEngine<S> {
    fn clone(&self) -> Self {
        MenuSearchEngine {
            store: Arc::clone(&self.store),
        }
    }
}

pub type SharedEngine = MenuSearchEngine<dyn MenuStore>;

impl<S: MenuStore + ?Sized> MenuSearchEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        MenuSearchEngine { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub async fn search_menu_items(
        &self,
        restaurant_id: &str,
        spec: &QuerySpec,
    ) -> Result<Vec<MenuEntry>, MenuError> {
        let menus = self.fetch(restaurant_id).await?;

        let now = Instant::now();
        let results = search_snapshot(&menus, spec);
        log::debug!(
            "search {} -> {} hits: {:.2?}",
            restaurant_id,
            results.len(),
            now.elapsed()
        );

        Ok(results)
    }

    pub async fn get_popular_items(
        &self,
        restaurant_id: &str,
        limit: i64,
    ) -> Result<Vec<MenuEntry>, MenuError> {
        // reject before touching the store
        check_limit(limit)?;
        let menus = self.fetch(restaurant_id).await?;

        let now = Instant::now();
        let results = rank_popular(&menus, limit)?;
        log::debug!(
            "popular {} (limit {}) -> {} items: {:.2?}",
            restaurant_id,
            limit,
            results.len(),
            now.elapsed()
        );

        Ok(results)
    }

    async fn fetch(&self, restaurant_id: &str) -> Result<Vec<Menu>, MenuError> {
        let now = Instant::now();
        let menus = self.store.menus_by_restaurant(restaurant_id).await?;
        log::debug!(
            "fetched {} menus for {}: {:.2?}",
            menus.len(),
            restaurant_id,
            now.elapsed()
        );
        Ok(menus)
    }
}

/// Filters one snapshot; keeps flattener order, no ranking.
pub fn search_snapshot(menus: &[Menu], spec: &QuerySpec) -> Vec<MenuEntry> {
    let filter = ItemFilter::new(spec);
    flatten(menus).filter(|entry| filter.matches(entry)).collect()
}
