pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, RelevancePolicy};
pub use error::BriefwireError;
pub use types::*;
