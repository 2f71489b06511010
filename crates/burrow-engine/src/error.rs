//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure that can stop startup or the run
//! loop, so `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: burrow_core::ConfigError,
    },

    /// Building the coordinator or encoding its partition failed.
    #[error("coordinator error: {source}")]
    Coordinator {
        /// The underlying coordinator error.
        #[from]
        source: burrow_core::CoordinatorError,
    },

    /// Simulation runner failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: burrow_core::RunnerError,
    },

    /// Reading or writing the cost cache failed.
    #[error("cache file {path}: {source}")]
    Cache {
        /// The cache file path.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
