use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid gpu count: {0} (expected: none|single|multiple)")]
    InvalidGpuCount(String),
    #[error("invalid network type: {0} (expected: none|outbound|incoming)")]
    InvalidNetworkType(String),
}
