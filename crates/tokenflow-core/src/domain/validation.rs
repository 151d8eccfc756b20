//! Structural validation of process graphs
//!
//! A [`ValidationContext`] is created once per full-graph pass. Every flow
//! element appends its findings; nothing short-circuits the pass.

use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::config::CoreConfig;
use crate::domain::element::{same_id, ElementKind, FlowElement};
use crate::domain::graph::ProcessGraph;
use crate::CoreError;

/// Validation error codes
pub mod error_codes {
    /// Non-start node without incoming transitions
    pub const UNREACHABLE_NODE: &str = "ERR_VALIDATION_UNREACHABLE_NODE";

    /// Transition without source or target
    pub const MISSING_ENDPOINT: &str = "ERR_VALIDATION_MISSING_ENDPOINT";

    /// Reference to an element that does not exist
    pub const INVALID_REFERENCE: &str = "ERR_VALIDATION_INVALID_REFERENCE";

    /// Two elements of the same kind share an id or name
    pub const DUPLICATE_ID: &str = "ERR_VALIDATION_DUPLICATE_ID";

    /// More than one start node
    pub const DUPLICATE_START_NODE: &str = "ERR_VALIDATION_DUPLICATE_START_NODE";

    /// No start node at all
    pub const MISSING_START_NODE: &str = "ERR_VALIDATION_MISSING_START_NODE";

    /// Required field left empty
    pub const MISSING_REQUIRED_FIELD: &str = "ERR_VALIDATION_MISSING_REQUIRED_FIELD";

    /// Value does not fit the declared data type
    pub const TYPE_MISMATCH: &str = "ERR_VALIDATION_TYPE_MISMATCH";

    /// Node-kind specific rule, reserved for concrete node kinds
    pub const NODE_RULE: &str = "ERR_VALIDATION_NODE_RULE";
}

/// Severity of a finding. The core only reports errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// The graph cannot be executed as is
    Error,
}

/// One structural finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    /// Id (or name, for variables) of the offending element
    pub element_id: String,

    /// Kind of the offending element
    pub element_kind: ElementKind,

    /// Severity
    pub severity: Severity,

    /// Stable error code from [`error_codes`]
    pub code: &'static str,

    /// Human-readable message
    pub message: String,
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} (at {:?} {})",
            self.code, self.message, self.element_kind, self.element_id
        )
    }
}

/// Accumulates findings over one validation pass
pub struct ValidationContext<'a> {
    graph: &'a ProcessGraph,
    config: CoreConfig,
    results: Vec<ValidationResult>,
}

impl<'a> ValidationContext<'a> {
    /// Start a pass over `graph`
    pub fn new(graph: &'a ProcessGraph, config: CoreConfig) -> Self {
        Self {
            graph,
            config,
            results: Vec::new(),
        }
    }

    /// Graph under validation
    pub fn graph(&self) -> &'a ProcessGraph {
        self.graph
    }

    /// Configuration of this pass
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Record an error against a flow element
    pub fn add_error(
        &mut self,
        element: &dyn FlowElement,
        code: &'static str,
        message: impl Into<String>,
    ) {
        self.add_error_for(element.kind(), element.id(), code, message);
    }

    /// Record an error against an element identified by kind and id
    pub fn add_error_for(
        &mut self,
        element_kind: ElementKind,
        element_id: &str,
        code: &'static str,
        message: impl Into<String>,
    ) {
        let result = ValidationResult {
            element_id: element_id.to_string(),
            element_kind,
            severity: Severity::Error,
            code,
            message: message.into(),
        };
        debug!(code, element = %result.element_id, "{}", result.message);
        self.results.push(result);
    }

    /// Findings so far, in the order they were reported
    pub fn results(&self) -> &[ValidationResult] {
        &self.results
    }

    /// Findings reported against one element
    pub fn results_for(&self, element_id: &str) -> Vec<&ValidationResult> {
        self.results
            .iter()
            .filter(|result| same_id(&result.element_id, element_id))
            .collect()
    }

    /// Findings with error severity
    pub fn errors(&self) -> impl Iterator<Item = &ValidationResult> {
        self.results
            .iter()
            .filter(|result| result.severity == Severity::Error)
    }

    /// Whether any error was reported
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Consume the context, returning the findings
    pub fn into_results(self) -> Vec<ValidationResult> {
        self.results
    }

    /// Consume the context, failing when any error was reported
    pub fn into_result(self) -> Result<(), CoreError> {
        match self.results.len() {
            0 => Ok(()),
            1 => Err(CoreError::Validation(self.results[0].to_string())),
            count => {
                let mut message = format!("{} issues:", count);
                for (i, result) in self.results.iter().enumerate() {
                    message.push_str(&format!("\n  {}. {}", i + 1, result));
                }
                Err(CoreError::Validation(message))
            }
        }
    }
}
