use serde::Deserialize;

use crate::data_backend::memory_store::InMemoryMenuStore;
use crate::data_types::{Menu, Restaurant};
use crate::errors::MenuError;

const DEMO_JSON: &str = include_str!("demo_data.json");

#[derive(Deserialize)]
struct DemoData {
    restaurants: Vec<Restaurant>,
    menus: Vec<Menu>,
}

/// The bundled demo restaurants, served when no menu API is configured.
pub fn demo_store() -> Result<(Vec<Restaurant>, InMemoryMenuStore), MenuError> {
    let data: DemoData = serde_json::from_str(DEMO_JSON)?;
    Ok((data.restaurants, InMemoryMenuStore::new(data.menus)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_backend::MenuStore;

    #[tokio::test]
    async fn demo_data_parses() {
        let (restaurants, store) = demo_store().unwrap();
        assert_eq!(restaurants.len(), 2);

        for restaurant in &restaurants {
            let menus = store.menus_by_restaurant(&restaurant.id).await.unwrap();
            assert!(!menus.is_empty(), "no menus for {}", restaurant.name);
        }
    }
}
