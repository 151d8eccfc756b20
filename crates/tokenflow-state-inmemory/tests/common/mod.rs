#![allow(dead_code)]

use tokenflow_core::{
    error_codes, CoreError, ElementKind, ExecutionContext, FlowElement, FlowNode, Guard, NodeBase,
    ProcessGraph, Transition, ValidationContext,
};
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Start event: passes its token on
pub struct StartNode {
    base: NodeBase,
}

/// Task that approves each token before passing it on
pub struct ApprovalTask {
    base: NodeBase,
}

/// End event: consumes tokens, must not have outgoing transitions
pub struct EndNode {
    base: NodeBase,
}

macro_rules! node_element {
    ($node:ty) => {
        impl FlowElement for $node {
            fn id(&self) -> &str {
                self.base.id()
            }

            fn kind(&self) -> ElementKind {
                ElementKind::Node
            }

            fn validate(&self, context: &mut ValidationContext<'_>) {
                self.check(context);
            }
        }
    };
}

node_element!(StartNode);
node_element!(ApprovalTask);
node_element!(EndNode);

impl StartNode {
    pub fn new(id: &str) -> Self {
        Self { base: NodeBase::new(id) }
    }

    fn check(&self, _context: &mut ValidationContext<'_>) {}
}

impl ApprovalTask {
    pub fn new(id: &str) -> Self {
        Self { base: NodeBase::new(id) }
    }

    fn check(&self, context: &mut ValidationContext<'_>) {
        self.base.validate(self, context);
    }
}

impl EndNode {
    pub fn new(id: &str) -> Self {
        Self { base: NodeBase::new(id) }
    }

    fn check(&self, context: &mut ValidationContext<'_>) {
        self.base.validate(self, context);
        if !self.base.outgoing().is_empty() {
            context.add_error(
                self,
                error_codes::NODE_RULE,
                format!("End node {} must not have outgoing transitions", self.id()),
            );
        }
    }
}

impl FlowNode for StartNode {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn execute(&self, context: &mut ExecutionContext<'_>) -> Result<(), CoreError> {
        self.advance_tokens(context, true)
    }

    fn is_start(&self) -> bool {
        true
    }
}

impl FlowNode for ApprovalTask {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn execute(&self, context: &mut ExecutionContext<'_>) -> Result<(), CoreError> {
        let arrived = context
            .data()
            .tokens_at(context.graph(), context.node_id())?;
        for token in &arrived {
            context.set_local_value(&token.id, "approved", true)?;
        }
        self.advance_tokens(context, true)
    }
}

impl FlowNode for EndNode {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn execute(&self, context: &mut ExecutionContext<'_>) -> Result<(), CoreError> {
        self.advance_tokens(context, true)
    }
}

/// S -> M -> E, where M -> E requires the token's `approved` flag
pub fn approval_graph() -> ProcessGraph {
    let mut graph = ProcessGraph::new("approval");
    graph.name = Some("Approval".to_string());
    graph.nodes.push(Box::new(StartNode::new("S")));
    graph.nodes.push(Box::new(ApprovalTask::new("M")));
    graph.nodes.push(Box::new(EndNode::new("E")));
    graph.transitions.push(Transition::between("T1", "S", "M"));
    graph.transitions.push(
        Transition::between("T2", "M", "E").with_guard(Guard::local_equals("approved", true)),
    );
    graph.reindex();
    graph
}
