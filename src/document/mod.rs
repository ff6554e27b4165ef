//! Document snapshot: a read-only view of a page's element tree plus its location

pub mod queries;
pub mod snapshot;

pub use queries::{global_selector_cache, QueryId, SelectorCache};
pub use snapshot::{host_of, Element, PageSnapshot};
