pub mod filter;
pub mod flattener;
pub mod popularity;
pub mod search;

pub use filter::ItemFilter;
pub use flattener::flatten;
pub use popularity::rank_popular;
pub use search::{search_snapshot, MenuSearchEngine, SharedEngine};
