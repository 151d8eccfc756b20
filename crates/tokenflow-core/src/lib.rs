//!
//! Tokenflow Core - token-based execution core for process graphs
//!
//! A process definition is a [`ProcessGraph`] of flow nodes joined by
//! optionally guarded transitions. A running instance is a set of tokens kept
//! by an [`InstanceData`] store; activating a node advances the tokens that
//! sit at it. The crate holds no instance state of its own and decides
//! nothing about which node runs next.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Domain layer - graph, nodes, tokens, execution and validation
pub mod domain;

/// Core types
pub mod types;

/// Error types
pub mod error;

/// Runtime configuration
pub mod config;

pub use config::CoreConfig;
pub use error::CoreError;
pub use types::DataPacket;

pub use domain::context::{activate, ActivationOutcome, ExecutionContext};
pub use domain::element::{generate_id, id_key, same_id, ElementKind, FlowElement};
pub use domain::graph::ProcessGraph;
pub use domain::node::{FlowNode, NodeBase};
pub use domain::repository::InstanceData;
pub use domain::token::{Token, TokenId, TokenPosition};
pub use domain::transition::{Guard, Transition};
pub use domain::validation::{error_codes, Severity, ValidationContext, ValidationResult};
pub use domain::variable::{DataType, DefaultTypeRegistry, TypeRegistry, ValueKind, Variable};
