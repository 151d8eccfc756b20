use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

use crate::domain::context::ExecutionContext;
use crate::domain::element::{generate_id, same_id, ElementKind, FlowElement};
use crate::domain::validation::{error_codes, ValidationContext};
use crate::{CoreError, DataPacket};

type GuardFn = dyn Fn(&ExecutionContext<'_>) -> Result<bool, CoreError> + Send + Sync;

/// Boolean predicate gating whether a token may cross a transition.
///
/// Guards are opaque to the core: they are bound once when the transition is
/// built and evaluated against the activation's context.
#[derive(Clone)]
pub struct Guard(Arc<GuardFn>);

impl Guard {
    /// Wrap an arbitrary predicate
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&ExecutionContext<'_>) -> Result<bool, CoreError> + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    /// Passes when the token being advanced carries `name == expected`
    pub fn local_equals(name: impl Into<String>, expected: impl Into<DataPacket>) -> Self {
        let name = name.into();
        let expected = expected.into();
        Self::new(move |ctx| Ok(ctx.local_value(&name)?.as_ref() == Some(&expected)))
    }

    /// Passes when the instance-wide value `name` equals `expected`
    pub fn global_equals(name: impl Into<String>, expected: impl Into<DataPacket>) -> Self {
        let name = name.into();
        let expected = expected.into();
        Self::new(move |ctx| Ok(ctx.global_value(&name)?.as_ref() == Some(&expected)))
    }

    /// Run the predicate
    pub fn check(&self, context: &ExecutionContext<'_>) -> Result<bool, CoreError> {
        (self.0)(context)
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Guard(..)")
    }
}

/// Directed edge between two flow nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transition {
    /// Identifier, unique within the graph
    pub id: String,

    /// Id of the node the transition leaves
    pub source: Option<String>,

    /// Id of the node the transition enters
    pub target: Option<String>,

    /// Optional guard; absent means the edge is unconditional
    #[serde(skip)]
    pub guard: Option<Guard>,
}

impl Transition {
    /// Create an unwired transition with a generated id
    pub fn new() -> Self {
        Self {
            id: generate_id(),
            source: None,
            target: None,
            guard: None,
        }
    }

    /// Create an unconditional transition between two nodes
    pub fn between(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: Some(source.into()),
            target: Some(target.into()),
            guard: None,
        }
    }

    /// Bind a guard
    pub fn with_guard(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Whether the token under advancement may cross this transition.
    ///
    /// A guard error marks the activation as faulted and counts as `false`.
    pub fn evaluate(&self, context: &mut ExecutionContext<'_>) -> bool {
        let Some(guard) = &self.guard else {
            return true;
        };

        match guard.check(context) {
            Ok(passed) => passed,
            Err(err) => {
                warn!(transition = %self.id, error = %err, "Guard evaluation failed");
                context.fault(format!("guard on transition {} failed: {}", self.id, err));
                false
            }
        }
    }

    /// Whether the transition leaves the given node
    pub fn leaves(&self, node_id: &str) -> bool {
        self.source
            .as_deref()
            .is_some_and(|source| same_id(source, node_id))
    }

    /// Whether the transition enters the given node
    pub fn enters(&self, node_id: &str) -> bool {
        self.target
            .as_deref()
            .is_some_and(|target| same_id(target, node_id))
    }
}

impl Default for Transition {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowElement for Transition {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Transition
    }

    fn validate(&self, context: &mut ValidationContext<'_>) {
        for (end, value) in [("source", &self.source), ("target", &self.target)] {
            match value {
                None => context.add_error(
                    self,
                    error_codes::MISSING_ENDPOINT,
                    format!("Transition {} has no {}", self.id, end),
                ),
                Some(node_id) if context.graph().node(node_id).is_none() => context.add_error(
                    self,
                    error_codes::INVALID_REFERENCE,
                    format!(
                        "Transition {} references non-existent {} node: {}",
                        self.id, end, node_id
                    ),
                ),
                Some(_) => {}
            }
        }
    }
}
