//! Queries - 读模型

mod snapshot;

pub use snapshot::{CatalogSnapshot, SelectionSnapshot};
