pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{cli::LocalStorage, toml_config::JobConfig};
pub use core::{engine::ConversionEngine, pipeline::CardPipeline};
pub use utils::error::{CardsError, Result};
