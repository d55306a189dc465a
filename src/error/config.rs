use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required environment variable is not set.
    ///
    /// The application requires this environment variable to be defined. Check the
    /// documentation or `.env.example` file for required configuration variables.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Environment variable is set but could not be parsed into the expected type.
    #[error("Invalid value for environment variable {name}: {value}")]
    InvalidEnvVar {
        /// Name of the environment variable
        name: String,
        /// The value that failed to parse
        value: String,
    },

    /// Cluster topology is inconsistent (e.g. `cluster_id >= total_clusters`
    /// or a zero shard count). The process refuses to start rather than own
    /// a degenerate shard range.
    #[error(
        "Invalid cluster topology: cluster_id={cluster_id}, total_clusters={total_clusters}, \
         total_shards={total_shards}"
    )]
    InvalidClusterTopology {
        cluster_id: u32,
        total_clusters: u32,
        total_shards: u32,
    },
}
