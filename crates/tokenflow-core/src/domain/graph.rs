use std::collections::HashSet;
use std::fmt;
use tracing::debug;

use crate::config::CoreConfig;
use crate::domain::element::{id_key, same_id, ElementKind, FlowElement};
use crate::domain::node::FlowNode;
use crate::domain::transition::Transition;
use crate::domain::validation::{error_codes, ValidationContext};
use crate::domain::variable::Variable;

/// A process definition: nodes, transitions and variables.
///
/// Members are plain collections so builders and loaders can fill them
/// directly. After any change to `transitions` call [`ProcessGraph::reindex`]
/// so every node's adjacency caches match the graph again.
pub struct ProcessGraph {
    /// Graph id
    pub id: String,

    /// Human-readable name
    pub name: Option<String>,

    /// Flow nodes, in declaration order
    pub nodes: Vec<Box<dyn FlowNode>>,

    /// Transitions, in declaration order
    pub transitions: Vec<Transition>,

    /// Process variables
    pub variables: Vec<Variable>,
}

impl ProcessGraph {
    /// Create an empty graph
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            nodes: Vec::new(),
            transitions: Vec::new(),
            variables: Vec::new(),
        }
    }

    /// First node whose id matches, ignoring case
    pub fn node(&self, id: &str) -> Option<&dyn FlowNode> {
        self.nodes
            .iter()
            .find(|node| node.has_id(id))
            .map(|node| node.as_ref())
    }

    /// Mutable access to the first node whose id matches, ignoring case
    pub fn node_mut(&mut self, id: &str) -> Option<&mut Box<dyn FlowNode>> {
        self.nodes.iter_mut().find(|node| node.has_id(id))
    }

    /// First transition whose id matches, ignoring case
    pub fn transition(&self, id: &str) -> Option<&Transition> {
        self.transitions
            .iter()
            .find(|transition| same_id(&transition.id, id))
    }

    /// First variable whose name matches, ignoring case
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables
            .iter()
            .find(|variable| same_id(&variable.name, name))
    }

    /// First node that reports itself as a start node
    pub fn start_node(&self) -> Option<&dyn FlowNode> {
        self.nodes
            .iter()
            .find(|node| node.is_start())
            .map(|node| node.as_ref())
    }

    /// Every start node, in declaration order
    pub fn start_nodes(&self) -> Vec<&dyn FlowNode> {
        self.nodes
            .iter()
            .filter(|node| node.is_start())
            .map(|node| node.as_ref())
            .collect()
    }

    /// Rebuild the adjacency caches of every node
    pub fn reindex(&mut self) {
        // Nodes are taken out so each can read the graph while being updated.
        let mut nodes = std::mem::take(&mut self.nodes);
        for node in nodes.iter_mut() {
            node.reindex_transitions(self);
        }
        self.nodes = nodes;
        debug!(
            graph = %self.id,
            nodes = self.nodes.len(),
            transitions = self.transitions.len(),
            "Reindexed transitions"
        );
    }

    /// Run a full structural validation pass.
    ///
    /// Every element is visited exactly once; the returned context holds all
    /// findings.
    pub fn validate(&self, config: CoreConfig) -> ValidationContext<'_> {
        let mut context = ValidationContext::new(self, config);

        for node in &self.nodes {
            node.validate(&mut context);
        }
        for transition in &self.transitions {
            transition.validate(&mut context);
        }
        for variable in &self.variables {
            variable.validate(&mut context);
        }

        self.validate_unique_ids(&mut context);
        self.validate_start_nodes(&mut context);

        debug!(
            graph = %self.id,
            findings = context.results().len(),
            "Validation pass finished"
        );
        context
    }

    fn validate_unique_ids(&self, context: &mut ValidationContext<'_>) {
        for id in duplicate_ids(self.nodes.iter().map(|node| node.id())) {
            context.add_error_for(
                ElementKind::Node,
                &id,
                error_codes::DUPLICATE_ID,
                format!("Duplicate node ID: {}", id),
            );
        }
        for id in duplicate_ids(self.transitions.iter().map(|t| t.id.as_str())) {
            context.add_error_for(
                ElementKind::Transition,
                &id,
                error_codes::DUPLICATE_ID,
                format!("Duplicate transition ID: {}", id),
            );
        }
        for name in duplicate_ids(self.variables.iter().map(|v| v.name.as_str())) {
            context.add_error_for(
                ElementKind::Variable,
                &name,
                error_codes::DUPLICATE_ID,
                format!("Duplicate variable name: {}", name),
            );
        }
    }

    fn validate_start_nodes(&self, context: &mut ValidationContext<'_>) {
        let starts = self.start_nodes();
        if starts.is_empty() {
            context.add_error_for(
                ElementKind::Graph,
                &self.id,
                error_codes::MISSING_START_NODE,
                "Process has no start node",
            );
        } else if context.config().single_start_node {
            for extra in starts.iter().skip(1) {
                context.add_error_for(
                    ElementKind::Node,
                    extra.id(),
                    error_codes::DUPLICATE_START_NODE,
                    format!(
                        "Process already has start node {}; {} is another one",
                        starts[0].id(),
                        extra.id()
                    ),
                );
            }
        }
    }
}

/// Lower-cased ids that occur more than once, each reported once
fn duplicate_ids<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    ids.map(id_key)
        .filter(|id| !seen.insert(id.clone()) && reported.insert(id.clone()))
        .collect()
}

impl fmt::Debug for ProcessGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessGraph")
            .field("id", &self.id)
            .field("name", &self.name)
            .field(
                "nodes",
                &self.nodes.iter().map(|node| node.id()).collect::<Vec<_>>(),
            )
            .field("transitions", &self.transitions)
            .field("variables", &self.variables)
            .finish()
    }
}
