pub mod error;

pub use error::{CatalogError, ConnectFailure, Result};
