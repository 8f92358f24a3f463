pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{cli::LocalStorage, CliConfig};

pub use config::toml_config::TomlConfig;
pub use core::{etl::EtlEngine, pipeline::HandicapPipeline};
pub use domain::handicap::{calculate_for_rounds, calculate_handicap, score_differential};
pub use domain::model::{Differential, HandicapReport, HandicapResult, PlayerHandicap, Round};
pub use domain::selection::SelectionRules;
pub use utils::error::{HandicapError, Result};
