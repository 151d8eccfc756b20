use tracing::{debug, trace, warn};

use crate::domain::context::ExecutionContext;
use crate::domain::element::{generate_id, same_id, FlowElement};
use crate::domain::graph::ProcessGraph;
use crate::domain::validation::{error_codes, ValidationContext};
use crate::CoreError;

/// State shared by every node kind: identity plus the adjacency caches.
///
/// The caches hold transition ids and are only correct after
/// [`NodeBase::reindex_transitions`] ran against the current graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeBase {
    id: String,
    incoming: Vec<String>,
    outgoing: Vec<String>,
}

impl NodeBase {
    /// Create a node base with an assigned id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            incoming: Vec::new(),
            outgoing: Vec::new(),
        }
    }

    /// Create a node base with a generated id
    pub fn generated() -> Self {
        Self::new(generate_id())
    }

    /// Node id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Cached ids of transitions entering this node, in graph order
    pub fn incoming(&self) -> &[String] {
        &self.incoming
    }

    /// Cached ids of transitions leaving this node, in graph order
    pub fn outgoing(&self) -> &[String] {
        &self.outgoing
    }

    /// Rebuild both caches by scanning every transition of the graph
    pub fn reindex_transitions(&mut self, graph: &ProcessGraph) {
        self.incoming = graph
            .transitions
            .iter()
            .filter(|transition| transition.enters(&self.id))
            .map(|transition| transition.id.clone())
            .collect();
        self.outgoing = graph
            .transitions
            .iter()
            .filter(|transition| transition.leaves(&self.id))
            .map(|transition| transition.id.clone())
            .collect();
    }

    /// Consume or hold every pending token at this node.
    ///
    /// With `should_flow` each token is removed and replaced by one in-flight
    /// token per outgoing transition whose guard passes; no passing guard
    /// means the path ends here. Without it each token is held for the rest
    /// of the activation.
    ///
    /// A store failure while creating successors leaves the token removed and
    /// only part of its successors created; the context is faulted before the
    /// error is returned.
    pub fn advance_tokens(
        &self,
        context: &mut ExecutionContext<'_>,
        should_flow: bool,
    ) -> Result<(), CoreError> {
        let limit = context.config().activation_token_limit;
        let mut processed = 0usize;

        while let Some(token) = context.pending_token()? {
            if limit.is_some_and(|limit| processed >= limit) {
                warn!(node = %self.id, processed, "Activation token limit reached");
                context.fault(format!(
                    "node {} exceeded the activation token limit of {}",
                    self.id, processed
                ));
                break;
            }
            processed += 1;

            if !should_flow {
                trace!(node = %self.id, token = %token.id, "Holding token");
                context.hold(&token);
                continue;
            }

            context.data_mut().remove_token(&token.id)?;
            context.set_current_token(Some(token.clone()));

            let graph = context.graph();
            let mut produced = 0usize;
            for transition_id in &self.outgoing {
                let Some(transition) = graph.transition(transition_id) else {
                    warn!(node = %self.id, transition = %transition_id, "Stale outgoing transition");
                    continue;
                };
                if transition.evaluate(context) {
                    if let Err(err) = context.data_mut().add_token_on_transition(&transition.id) {
                        context.fault(format!(
                            "token {} left node {} with {} of its successors created: {}",
                            token.id, self.id, produced, err
                        ));
                        context.set_current_token(None);
                        return Err(err);
                    }
                    produced += 1;
                }
            }

            context.set_current_token(None);
            debug!(node = %self.id, token = %token.id, produced, "Token advanced");
        }

        Ok(())
    }

    /// Default structural rule: a node must be reachable
    pub fn validate(&self, element: &dyn FlowElement, context: &mut ValidationContext<'_>) {
        if self.incoming.is_empty() {
            context.add_error(
                element,
                error_codes::UNREACHABLE_NODE,
                format!("Node {} has no incoming transitions", self.id),
            );
        }
    }
}

/// A vertex of the process graph.
///
/// Concrete node kinds implement `execute` and usually call
/// [`FlowNode::advance_tokens`] from it.
pub trait FlowNode: FlowElement + Send + Sync {
    /// Shared node state
    fn base(&self) -> &NodeBase;

    /// Shared node state, mutably
    fn base_mut(&mut self) -> &mut NodeBase;

    /// Run this node's logic for one activation
    fn execute(&self, context: &mut ExecutionContext<'_>) -> Result<(), CoreError>;

    /// Whether this node starts a process
    fn is_start(&self) -> bool {
        false
    }

    /// Ids of transitions entering this node
    fn incoming(&self) -> &[String] {
        self.base().incoming()
    }

    /// Ids of transitions leaving this node
    fn outgoing(&self) -> &[String] {
        self.base().outgoing()
    }

    /// Rebuild the adjacency caches from the graph
    fn reindex_transitions(&mut self, graph: &ProcessGraph) {
        self.base_mut().reindex_transitions(graph);
    }

    /// Move or hold the pending tokens at this node
    fn advance_tokens(
        &self,
        context: &mut ExecutionContext<'_>,
        should_flow: bool,
    ) -> Result<(), CoreError> {
        self.base().advance_tokens(context, should_flow)
    }

    /// Whether this node has the given id (case-insensitive)
    fn has_id(&self, id: &str) -> bool {
        same_id(self.base().id(), id)
    }
}
