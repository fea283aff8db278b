//! Error types for the binding engine
//!
//! Nothing in this crate lets these errors escape a component's mount:
//! evaluation failures degrade to empty values and mount failures are
//! logged by the page bootstrapper.

use crate::config::ConfigError;
use crate::expr::ExprError;
use accelade_dom::{DomError, NodeId};
use accelade_types::SubstrateId;

#[derive(Debug, thiserror::Error)]
pub enum AcceladeError {
    #[error("DOM error: {0}")]
    Dom(#[from] DomError),

    #[error("Expression error: {0}")]
    Expr(#[from] ExprError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid initial state: {0}")]
    InvalidState(String),

    #[error("Controller is already initialized")]
    AlreadyInitialized,

    #[error("Controller is not initialized")]
    NotInitialized,

    #[error("Controller has been disposed")]
    Disposed,

    #[error("A {store} store cannot drive a {controller} binding controller")]
    SubstrateMismatch {
        store: SubstrateId,
        controller: SubstrateId,
    },

    #[error("Element {0} is not a component root")]
    NotAComponentRoot(NodeId),
}

pub type Result<T> = std::result::Result<T, AcceladeError>;
