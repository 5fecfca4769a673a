use async_trait::async_trait;

use crate::data_types::Menu;
use crate::errors::MenuError;

pub mod cached_store;
pub mod demo_data;
pub mod memory_store;
pub mod remote_store;
pub mod sqlite_store;

pub use cached_store::CachedMenuStore;
pub use memory_store::InMemoryMenuStore;
pub use remote_store::RemoteMenuStore;
pub use sqlite_store::SqliteMenuStore;

/// Source of menu documents. The only thing the search engine needs.
///
/// Implementations return a restaurant's menus with nested categories and
/// items, in a stable order. An unknown restaurant is an empty list, not an
/// error; fetch failures are [`MenuError::DataUnavailable`].
#[async_trait]
pub trait MenuStore: Send + Sync {
    async fn menus_by_restaurant(&self, restaurant_id: &str) -> Result<Vec<Menu>, MenuError>;
}
