//! # movierec
//!
//! Serves the MovieLens tables page by page behind basic auth, drains them
//! with a pagination client and ranks movies by release year and rating.
//!
//! ## Modules
//!
//! - `config` - Layered configuration (defaults, TOML file, environment)
//! - `data` - Rows, datasets, pages, CSV/JSON sources and output sinks
//! - `server` - The paginated data service
//! - `client` - Page source trait, HTTP client and the drain loop
//! - `transform` - Grouping, join, title cleanup, validity filter and ranking
//! - `pipeline` - Fetch and rank stages writing to an output sink
pub mod client;
pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod server;
pub mod transform;

pub use error::{Error, Result};
