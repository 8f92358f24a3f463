pub mod etl;
pub mod pipeline;

pub use crate::domain::model::{HandicapReport, Round, RoundBatch};
pub use crate::domain::ports::{ConfigProvider, Pipeline, RoundSource, Storage};
pub use crate::utils::error::Result;
