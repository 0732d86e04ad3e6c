use dispatch_core::error::HarnessError;
use thiserror::Error;

/// Failures outside a single simulation: thread pools and artifact files.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error(transparent)]
    Harness(#[from] HarnessError),
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("parquet export failed: {0}")]
    Parquet(String),
    #[error("nothing to export")]
    Empty,
}
