//! Package catalog for pacman based systems: repository and local databases
//! merged into one record per package, with install status, reverse
//! dependencies, search and pending updates.

pub mod catalog;
pub mod config;
pub mod error;
pub mod filter;
pub mod format;
pub mod pman;
pub mod resolver;
pub mod source;
pub mod specifier;
pub mod status;
pub mod store;
pub mod structs;
pub mod updates;
pub mod utils;
pub mod version;

pub use catalog::{Catalog, CatalogBuilder};
pub use error::{AppError, Result};
pub use filter::{FilterState, SearchField, SearchFilterConfig, SearchMode, SortField};
pub use store::{CatalogEvent, CatalogStore};
pub use structs::{flags::StatusFlags, package::PackageRecord};
