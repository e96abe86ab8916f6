use rtlify_dom::DomError;
use thiserror::Error;

use crate::ConfigError;

/// Errors surfaced by [`Engine`](crate::Engine) operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The document is currently borrowed by the host or another engine
    #[error("Document is busy")]
    DocumentBusy,

    #[error("Engine has been destroyed")]
    Destroyed,

    #[error("Engine is disabled")]
    Disabled,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Dom(#[from] DomError),
}

/// Failure while processing a single node. Caught per node, never aborts a batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessError {
    #[error("Node left the document")]
    Detached,

    #[error(transparent)]
    Dom(#[from] DomError),
}
