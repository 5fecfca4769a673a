//! Client for the restaurant menu REST API.
//!
//! Endpoints used:
//! - `GET {base}/menus/restaurant/{id}`: active menus of a restaurant, nested
//!   categories and items included
//! - `GET {base}/restaurants?page=1&limit=N`: `{ "restaurants": [...], "total": n }`
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::constants::{API_TIMEOUT_SECS, RESTAURANT_PAGE_LIMIT};
use crate::data_backend::MenuStore;
use crate::data_types::{Menu, Restaurant};
use crate::errors::MenuError;

#[derive(Debug, Clone)]
pub struct RemoteMenuStore {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct RestaurantPage {
    restaurants: Vec<Restaurant>,
    #[serde(default)]
    total: u64,
}

impl RemoteMenuStore {
    pub fn new(base_url: &str) -> Result<Self, MenuError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(API_TIMEOUT_SECS))
            .build()?;

        Ok(RemoteMenuStore {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn menus_url(&self, restaurant_id: &str) -> String {
        format!("{}/menus/restaurant/{}", self.base_url, restaurant_id)
    }

    pub fn restaurants_url(&self) -> String {
        format!(
            "{}/restaurants?page=1&limit={}",
            self.base_url, RESTAURANT_PAGE_LIMIT
        )
    }

    pub async fn get_restaurants(&self) -> Result<Vec<Restaurant>, MenuError> {
        let now = Instant::now();
        let page = self
            .client
            .get(self.restaurants_url())
            .send()
            .await?
            .error_for_status()?
            .json::<RestaurantPage>()
            .await?;

        if page.total > page.restaurants.len() as u64 {
            log::warn!(
                "API lists {} restaurants, only the first {} are used",
                page.total,
                page.restaurants.len()
            );
        }
        log::debug!("restaurant list: {:.2?}", now.elapsed());

        Ok(page.restaurants)
    }
}

#[async_trait]
impl MenuStore for RemoteMenuStore {
    async fn menus_by_restaurant(&self, restaurant_id: &str) -> Result<Vec<Menu>, MenuError> {
        let now = Instant::now();
        let menus = self
            .client
            .get(self.menus_url(restaurant_id))
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Menu>>()
            .await?;

        log::debug!("menu API response for {}: {:.2?}", restaurant_id, now.elapsed());
        Ok(menus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_urls_without_double_slashes() {
        let store = RemoteMenuStore::new("http://127.0.0.1:3000/api/").unwrap();
        assert_eq!(
            store.menus_url("abc123"),
            "http://127.0.0.1:3000/api/menus/restaurant/abc123"
        );
        assert_eq!(
            store.restaurants_url(),
            "http://127.0.0.1:3000/api/restaurants?page=1&limit=100"
        );
    }

    #[tokio::test]
    async fn unreachable_api_is_data_unavailable() {
        // port 9 (discard) is not served on test machines
        let store = RemoteMenuStore::new("http://127.0.0.1:9").unwrap();
        let err = store.menus_by_restaurant("r1").await.unwrap_err();
        assert!(matches!(err, MenuError::DataUnavailable(_)));
    }
}
