use crate::config::ConfigError;
use crate::lifecycle::LifecycleState;

/// The external engine module could not be brought up. Fatal: no surface can
/// be created until a later `initialize` succeeds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BootstrapError {
    #[error("engine module payload could not be loaded: {0}")]
    Load(String),

    #[error("engine module could not be instantiated: {0}")]
    Instantiate(String),
}

/// Neither construction protocol produced an engine handle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    #[error("engine constructor failed: {0}")]
    Construct(String),

    #[error("engine factory rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error("engine module is not initialized")]
    NotInitialized,

    #[error("no container to mount the surface into")]
    NoContainer,

    #[error("operation not allowed in state {0}")]
    InvalidState(LifecycleState),

    #[error("engine creation was abandoned by unmount")]
    Abandoned,

    #[error("engine handle is already disposed")]
    Disposed,

    #[error("render failed: {0}")]
    Render(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("malformed configuration: {0}")]
    ConfigFormat(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_error_converts_transparently() {
        let err: HostError = BootstrapError::Load("404".into()).into();
        assert!(matches!(err, HostError::Bootstrap(BootstrapError::Load(_))));
        assert_eq!(err.to_string(), "engine module payload could not be loaded: 404");
    }

    #[test]
    fn invalid_state_names_the_state() {
        let err = HostError::InvalidState(LifecycleState::Ready);
        assert_eq!(err.to_string(), "operation not allowed in state Ready");
    }
}
