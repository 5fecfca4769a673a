use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::data_backend::MenuStore;
use crate::data_types::Menu;
use crate::errors::MenuError;

/// Immutable snapshot of menus grouped by restaurant, input order kept per restaurant.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMenuStore {
    menus: BTreeMap<String, Vec<Menu>>,
}

impl InMemoryMenuStore {
    pub fn new(menus: impl IntoIterator<Item = Menu>) -> Self {
        let mut grouped: BTreeMap<String, Vec<Menu>> = BTreeMap::new();
        for menu in menus {
            grouped
                .entry(menu.restaurant_id.clone())
                .or_default()
                .push(menu);
        }
        InMemoryMenuStore { menus: grouped }
    }
}

#[async_trait]
impl MenuStore for InMemoryMenuStore {
    async fn menus_by_restaurant(&self, restaurant_id: &str) -> Result<Vec<Menu>, MenuError> {
        Ok(self.menus.get(restaurant_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn groups_by_restaurant_in_input_order() {
        let store = InMemoryMenuStore::new(vec![
            Menu::new("m2", "r1", "Drinks"),
            Menu::new("m3", "r2", "Lunch"),
            Menu::new("m1", "r1", "Food"),
        ]);

        let names: Vec<String> = store
            .menus_by_restaurant("r1")
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, ["Drinks", "Food"]);
        assert_eq!(store.menus_by_restaurant("r2").await.unwrap().len(), 1);
        assert!(store.menus_by_restaurant("r3").await.unwrap().is_empty());
    }
}
