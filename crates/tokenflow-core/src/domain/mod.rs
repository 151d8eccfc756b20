//! Domain model of the execution core

/// Base contract shared by every graph member
pub mod element;

/// Tokens and their addressing
pub mod token;

/// Directed, optionally guarded edges
pub mod transition;

/// Flow nodes and token advancement
pub mod node;

/// The process graph
pub mod graph;

/// Per-activation execution context
pub mod context;

/// Structural validation
pub mod validation;

/// Process variables and data types
pub mod variable;

/// Instance-data contract
pub mod repository;
