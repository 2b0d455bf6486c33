pub mod audit;
pub mod config;
pub mod correction;
pub mod dataset;
pub mod duplicates;
pub mod error;
pub mod grading;
pub mod identifiers;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod record;
pub mod roster;
pub mod scoring;

pub use error::{MastError, Result};
