use thiserror::Error;

/// Errors returned by the Gravatar URL builder and existence probe.
#[derive(Debug, Error)]
pub enum GravatarError {
    /// The address failed the `local-part@domain` syntax check.
    #[error("invalid email address: {0:?}")]
    InvalidEmail(String),

    /// Network, DNS, TLS, or timeout failure while probing for an avatar.
    #[error("avatar probe failed for {url}: {source}")]
    ProbeFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The underlying `reqwest::Client` could not be constructed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Errors raised while loading environment configuration or profile files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read profiles file {path}: {source}")]
    ProfilesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse profiles file: {0}")]
    ProfilesFileParse(#[from] serde_yaml::Error),

    #[error("invalid profile \"{name}\": {reason}")]
    InvalidProfile { name: String, reason: String },
}
