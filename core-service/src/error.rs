use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    /// The configured host kind was compiled out.
    #[error("Host '{host}' is not available: enable the '{feature}' feature")]
    HostUnavailable {
        host: &'static str,
        feature: &'static str,
    },

    #[error(transparent)]
    Runtime(#[from] core_runtime::Error),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
