use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::element::same_id;
use crate::domain::graph::ProcessGraph;

/// Value object: Token ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenId(pub String);

impl TokenId {
    /// Generate a new random token id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a token currently is. Exactly one address is ever set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPosition {
    /// Parked at a node
    AtNode(String),
    /// Travelling along a transition towards its target
    InFlight(String),
}

/// A marker for one concurrent execution position of a process instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Unique identifier
    pub id: TokenId,

    /// Current address
    pub position: TokenPosition,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Token {
    /// Create a token parked at a node
    pub fn at_node(node_id: impl Into<String>) -> Self {
        Self {
            id: TokenId::generate(),
            position: TokenPosition::AtNode(node_id.into()),
            created_at: Utc::now(),
        }
    }

    /// Create a token in flight on a transition
    pub fn on_transition(transition_id: impl Into<String>) -> Self {
        Self {
            id: TokenId::generate(),
            position: TokenPosition::InFlight(transition_id.into()),
            created_at: Utc::now(),
        }
    }

    /// Stationary node, if the token is at rest
    pub fn node(&self) -> Option<&str> {
        match &self.position {
            TokenPosition::AtNode(id) => Some(id),
            TokenPosition::InFlight(_) => None,
        }
    }

    /// Transition, if the token is in flight
    pub fn transition(&self) -> Option<&str> {
        match &self.position {
            TokenPosition::InFlight(id) => Some(id),
            TokenPosition::AtNode(_) => None,
        }
    }

    /// Park the token at a node, clearing any transition
    pub fn set_node(&mut self, node_id: impl Into<String>) {
        self.position = TokenPosition::AtNode(node_id.into());
    }

    /// Put the token in flight on a transition, clearing any node
    pub fn set_transition(&mut self, transition_id: impl Into<String>) {
        self.position = TokenPosition::InFlight(transition_id.into());
    }

    /// Whether the token is travelling on a transition
    #[inline]
    pub fn is_in_flight(&self) -> bool {
        matches!(self.position, TokenPosition::InFlight(_))
    }

    /// Effective location: the transition's target when in flight, else the
    /// stationary node. `None` when the transition is unknown to the graph or
    /// has no target.
    pub fn location<'g>(&'g self, graph: &'g ProcessGraph) -> Option<&'g str> {
        match &self.position {
            TokenPosition::AtNode(id) => Some(id.as_str()),
            TokenPosition::InFlight(id) => graph.transition(id)?.target.as_deref(),
        }
    }

    /// Whether the effective location is the given node (case-insensitive)
    pub fn is_located_at(&self, graph: &ProcessGraph, node_id: &str) -> bool {
        self.location(graph)
            .is_some_and(|location| same_id(location, node_id))
    }
}
