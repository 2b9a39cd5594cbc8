mod duplicate;
mod error;
mod manager;

pub use duplicate::{
    build_probe, check_duplicate, find_duplicate, find_duplicate_by_input, DuplicateCheck,
};
pub use error::CatalogError;
pub use manager::{CatalogManager, CatalogResult};
