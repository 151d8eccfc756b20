//! Per-activation execution context
//!
//! An [`ExecutionContext`] lives for exactly one node activation. It binds the
//! graph, the activated node and the instance's data, remembers which tokens
//! were held during the activation and carries the activation's fault flag.

use std::collections::HashSet;
use tracing::{debug, warn};

use crate::config::CoreConfig;
use crate::domain::element::same_id;
use crate::domain::graph::ProcessGraph;
use crate::domain::node::FlowNode;
use crate::domain::repository::InstanceData;
use crate::domain::token::{Token, TokenId};
use crate::{CoreError, DataPacket};

/// Mediator between one node's logic and the instance data
pub struct ExecutionContext<'a> {
    graph: &'a ProcessGraph,
    node_id: String,
    data: &'a mut dyn InstanceData,
    config: CoreConfig,
    held: Vec<TokenId>,
    held_index: HashSet<TokenId>,
    current: Option<Token>,
    fault: Option<String>,
}

impl<'a> ExecutionContext<'a> {
    /// Bind a context to a node of `graph` and the instance's data
    pub fn new(
        graph: &'a ProcessGraph,
        node_id: impl Into<String>,
        data: &'a mut dyn InstanceData,
    ) -> Self {
        Self::with_config(graph, node_id, data, CoreConfig::default())
    }

    /// Same as [`ExecutionContext::new`] with explicit configuration
    pub fn with_config(
        graph: &'a ProcessGraph,
        node_id: impl Into<String>,
        data: &'a mut dyn InstanceData,
        config: CoreConfig,
    ) -> Self {
        Self {
            graph,
            node_id: node_id.into(),
            data,
            config,
            held: Vec::new(),
            held_index: HashSet::new(),
            current: None,
            fault: None,
        }
    }

    /// Process graph of the instance
    pub fn graph(&self) -> &'a ProcessGraph {
        self.graph
    }

    /// Id of the node being activated
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Node being activated, if it still exists in the graph
    pub fn node(&self) -> Option<&'a dyn FlowNode> {
        self.graph.node(&self.node_id)
    }

    /// Configuration of this activation
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Instance data, read-only
    pub fn data(&self) -> &dyn InstanceData {
        &*self.data
    }

    /// Instance data, for node logic that writes directly
    pub fn data_mut(&mut self) -> &mut dyn InstanceData {
        &mut *self.data
    }

    /// Next token at the activated node that was not held yet
    pub fn pending_token(&self) -> Result<Option<Token>, CoreError> {
        Ok(self
            .data
            .tokens_at(self.graph, &self.node_id)?
            .into_iter()
            .find(|token| !self.held_index.contains(&token.id)))
    }

    /// Next pending token that arrived over the given transition
    pub fn pending_token_via(&self, transition_id: &str) -> Result<Option<Token>, CoreError> {
        Ok(self
            .data
            .tokens_at(self.graph, &self.node_id)?
            .into_iter()
            .filter(|token| !self.held_index.contains(&token.id))
            .find(|token| {
                token
                    .transition()
                    .is_some_and(|via| same_id(via, transition_id))
            }))
    }

    /// Keep a token in place for the rest of this activation
    pub fn hold(&mut self, token: &Token) {
        if self.held_index.insert(token.id.clone()) {
            self.held.push(token.id.clone());
            debug!(node = %self.node_id, token = %token.id, "Token held");
        }
    }

    /// Whether a token was held during this activation
    pub fn is_held(&self, token_id: &TokenId) -> bool {
        self.held_index.contains(token_id)
    }

    /// Ids of every token held during this activation, in the order they
    /// were held
    pub fn held_tokens(&self) -> &[TokenId] {
        &self.held
    }

    /// Token whose outgoing guards are being evaluated, if any
    pub fn current_token(&self) -> Option<&Token> {
        self.current.as_ref()
    }

    pub(crate) fn set_current_token(&mut self, token: Option<Token>) {
        self.current = token;
    }

    /// Local value of the current token
    pub fn local_value(&self, name: &str) -> Result<Option<DataPacket>, CoreError> {
        match &self.current {
            Some(token) => self.data.local_value(&token.id, name),
            None => Ok(None),
        }
    }

    /// Set a local value on a token
    pub fn set_local_value(
        &mut self,
        token_id: &TokenId,
        name: &str,
        value: impl Into<DataPacket>,
    ) -> Result<(), CoreError> {
        self.data.set_local_value(token_id, name, value.into())
    }

    /// Process-scoped value of the instance. Names of graph variables
    /// resolve to the variable's declared spelling.
    pub fn global_value(&self, name: &str) -> Result<Option<DataPacket>, CoreError> {
        self.data.global_value(self.canonical_name(name))
    }

    /// Set a process-scoped value of the instance, under the declared
    /// spelling when `name` is a graph variable
    pub fn set_global_value(
        &mut self,
        name: &str,
        value: impl Into<DataPacket>,
    ) -> Result<(), CoreError> {
        let name = self.canonical_name(name);
        self.data.set_global_value(name, value.into())
    }

    fn canonical_name<'n>(&self, name: &'n str) -> &'n str
    where
        'a: 'n,
    {
        self.graph
            .variable(name)
            .map_or(name, |variable| variable.name.as_str())
    }

    /// Instance value of a process variable, falling back to the variable's
    /// default when the instance never set it
    pub fn variable_value(&self, name: &str) -> Result<Option<DataPacket>, CoreError> {
        let Some(variable) = self.graph.variable(name) else {
            return self.data.global_value(name);
        };
        if let Some(value) = self.data.global_value(&variable.name)? {
            return Ok(Some(value));
        }
        Ok(variable.default_value.clone())
    }

    /// Local value `name` of the last token that visited the activated node
    pub fn historical_value(&self, name: &str) -> Result<Option<DataPacket>, CoreError> {
        self.historical_value_at(&self.node_id, name)
    }

    /// Local value `name` of the last token that visited `node`
    pub fn historical_value_for(
        &self,
        node: &dyn FlowNode,
        name: &str,
    ) -> Result<Option<DataPacket>, CoreError> {
        self.historical_value_at(node.base().id(), name)
    }

    /// Local value `name` of the last token that visited the node with id
    /// `node_id`
    pub fn historical_value_at(
        &self,
        node_id: &str,
        name: &str,
    ) -> Result<Option<DataPacket>, CoreError> {
        match self.data.last_token_at(self.graph, node_id)? {
            Some(token) => self.data.local_value(&token.id, name),
            None => Ok(None),
        }
    }

    /// Mark the activation as failed
    pub fn fault(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(node = %self.node_id, %reason, "Activation faulted");
        self.fault = Some(reason);
    }

    /// Clear the fault flag
    pub fn clear_fault(&mut self) {
        self.fault = None;
    }

    /// Whether the activation failed
    pub fn is_faulted(&self) -> bool {
        self.fault.is_some()
    }

    /// Reason given when the activation was marked as failed
    pub fn fault_reason(&self) -> Option<&str> {
        self.fault.as_deref()
    }

    /// Consume the context into the activation outcome
    pub fn finish(self) -> ActivationOutcome {
        ActivationOutcome {
            node_id: self.node_id,
            held: self.held,
            fault: self.fault,
        }
    }
}

/// What a driver learns from one activation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationOutcome {
    /// Node that was activated
    pub node_id: String,

    /// Tokens deliberately left in place, in the order they were held
    pub held: Vec<TokenId>,

    /// Fault reason, if the activation failed
    pub fault: Option<String>,
}

impl ActivationOutcome {
    /// Whether the activation failed
    pub fn is_faulted(&self) -> bool {
        self.fault.is_some()
    }
}

/// Run one activation of `node_id`: build a fresh context, execute the
/// node's logic and return the outcome.
///
/// Store failures and unknown nodes are errors; node-level failures are
/// reported through [`ActivationOutcome::fault`].
pub fn activate(
    graph: &ProcessGraph,
    node_id: &str,
    data: &mut dyn InstanceData,
    config: CoreConfig,
) -> Result<ActivationOutcome, CoreError> {
    let node = graph
        .node(node_id)
        .ok_or_else(|| CoreError::NodeNotFound(node_id.to_string()))?;

    let mut context = ExecutionContext::with_config(graph, node.base().id(), data, config);
    node.execute(&mut context)?;

    let outcome = context.finish();
    debug!(
        node = %outcome.node_id,
        held = outcome.held.len(),
        faulted = outcome.is_faulted(),
        "Activation finished"
    );
    Ok(outcome)
}
