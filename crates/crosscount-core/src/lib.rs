pub mod config;
pub mod decompose;
pub mod enrich;
pub mod error;
pub mod loader;
pub mod normalize;
pub mod outputs;
pub mod pipeline;
pub mod report;

pub use config::ReportConfig;
pub use error::{PipelineError, Result};
pub use pipeline::{run_pipeline, PipelineOutput, RunSummary};
