pub mod cache;
pub mod feed;
pub mod item;
pub mod page;

pub use cache::Cache;
pub use feed::{Feed, FeedId, PLACEHOLDER_ICON};
pub use item::Item;
pub use page::Page;
