pub mod config;
pub mod error;
pub mod market;
pub mod types;

pub use config::{Config, ServiceConfig};
pub use error::{Error, Result};
pub use market::MarketDataSource;
pub use types::*;
