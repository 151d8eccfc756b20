//! Instance-data contract for the tokenflow core
//!
//! The core never owns tokens or instance values. Everything it reads or
//! mutates for a running process instance goes through [`InstanceData`],
//! which external crates implement to provide persistence.

use crate::domain::graph::ProcessGraph;
use crate::domain::token::{Token, TokenId};
use crate::{CoreError, DataPacket};

/// Live tokens and variable values of one process instance.
///
/// Implementations must keep token-local values after the token itself is
/// removed, so historical lookups keep working once a token moved on.
///
/// Each call stands alone: the core never groups calls into a transaction,
/// so a failure in the middle of advancing a token is not rolled back.
/// Process-scoped value names are case-insensitive.
#[cfg_attr(test, mockall::automock)]
pub trait InstanceData: Send {
    /// Add a token parked at a node
    fn add_token_at_node(&mut self, node_id: &str) -> Result<Token, CoreError>;

    /// Add a token in flight on a transition
    fn add_token_on_transition(&mut self, transition_id: &str) -> Result<Token, CoreError>;

    /// Number of live tokens
    fn token_count(&self) -> Result<usize, CoreError>;

    /// All live tokens, oldest first
    fn tokens(&self) -> Result<Vec<Token>, CoreError>;

    /// Live tokens whose effective location is the given node, oldest first
    fn tokens_at(&self, graph: &ProcessGraph, node_id: &str) -> Result<Vec<Token>, CoreError> {
        Ok(self
            .tokens()?
            .into_iter()
            .filter(|token| token.is_located_at(graph, node_id))
            .collect())
    }

    /// Remove a live token
    fn remove_token(&mut self, token_id: &TokenId) -> Result<(), CoreError>;

    /// Most recent token, live or removed, whose effective location was the
    /// given node
    fn last_token_at(&self, graph: &ProcessGraph, node_id: &str)
        -> Result<Option<Token>, CoreError>;

    /// Process-scoped value
    fn global_value(&self, name: &str) -> Result<Option<DataPacket>, CoreError>;

    /// Set a process-scoped value
    fn set_global_value(&mut self, name: &str, value: DataPacket) -> Result<(), CoreError>;

    /// Token-scoped value
    fn local_value(&self, token_id: &TokenId, name: &str) -> Result<Option<DataPacket>, CoreError>;

    /// Set a token-scoped value
    fn set_local_value(
        &mut self,
        token_id: &TokenId,
        name: &str,
        value: DataPacket,
    ) -> Result<(), CoreError>;
}

/// Minimal in-memory instance data for unit tests
#[cfg(test)]
pub(crate) mod memory {
    use super::*;
    use crate::domain::element::id_key;
    use std::collections::HashMap;

    #[derive(Default)]
    pub(crate) struct MemoryInstanceData {
        pub(crate) live: Vec<Token>,
        pub(crate) history: Vec<Token>,
        pub(crate) globals: HashMap<String, DataPacket>,
        pub(crate) locals: HashMap<(TokenId, String), DataPacket>,
    }

    impl MemoryInstanceData {
        fn push(&mut self, token: Token) -> Token {
            self.live.push(token.clone());
            self.history.push(token.clone());
            token
        }
    }

    impl InstanceData for MemoryInstanceData {
        fn add_token_at_node(&mut self, node_id: &str) -> Result<Token, CoreError> {
            Ok(self.push(Token::at_node(node_id)))
        }

        fn add_token_on_transition(&mut self, transition_id: &str) -> Result<Token, CoreError> {
            Ok(self.push(Token::on_transition(transition_id)))
        }

        fn token_count(&self) -> Result<usize, CoreError> {
            Ok(self.live.len())
        }

        fn tokens(&self) -> Result<Vec<Token>, CoreError> {
            Ok(self.live.clone())
        }

        fn remove_token(&mut self, token_id: &TokenId) -> Result<(), CoreError> {
            let before = self.live.len();
            self.live.retain(|token| &token.id != token_id);
            if self.live.len() == before {
                return Err(CoreError::TokenNotFound(token_id.0.clone()));
            }
            Ok(())
        }

        fn last_token_at(
            &self,
            graph: &ProcessGraph,
            node_id: &str,
        ) -> Result<Option<Token>, CoreError> {
            Ok(self
                .history
                .iter()
                .rev()
                .find(|token| token.is_located_at(graph, node_id))
                .cloned())
        }

        fn global_value(&self, name: &str) -> Result<Option<DataPacket>, CoreError> {
            Ok(self.globals.get(&id_key(name)).cloned())
        }

        fn set_global_value(&mut self, name: &str, value: DataPacket) -> Result<(), CoreError> {
            self.globals.insert(id_key(name), value);
            Ok(())
        }

        fn local_value(
            &self,
            token_id: &TokenId,
            name: &str,
        ) -> Result<Option<DataPacket>, CoreError> {
            Ok(self.locals.get(&(token_id.clone(), name.to_string())).cloned())
        }

        fn set_local_value(
            &mut self,
            token_id: &TokenId,
            name: &str,
            value: DataPacket,
        ) -> Result<(), CoreError> {
            self.locals.insert((token_id.clone(), name.to_string()), value);
            Ok(())
        }
    }
}
