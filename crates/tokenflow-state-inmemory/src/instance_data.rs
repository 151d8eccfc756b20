use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, trace};

use tokenflow_core::{id_key, CoreError, DataPacket, InstanceData, ProcessGraph, Token, TokenId};

/// Tokens and values of one process instance, kept in memory.
///
/// Every token ever created is remembered in creation order so historical
/// lookups keep working after the token moved on. Local values are keyed by
/// token id and survive token removal. Global names are stored case-folded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryInstanceData {
    tokens: Vec<Token>,
    visits: Vec<Token>,
    globals: HashMap<String, DataPacket>,
    locals: HashMap<TokenId, HashMap<String, DataPacket>>,
}

impl InMemoryInstanceData {
    /// Create empty instance data
    pub fn new() -> Self {
        Self::default()
    }

    /// Every token ever created, oldest first
    pub fn visits(&self) -> &[Token] {
        &self.visits
    }

    /// Whether the instance has no live tokens left
    pub fn is_complete(&self) -> bool {
        self.tokens.is_empty()
    }

    fn track(&mut self, token: Token) -> Token {
        trace!(token = %token.id, position = ?token.position, "Token created");
        self.tokens.push(token.clone());
        self.visits.push(token.clone());
        token
    }

    fn known(&self, token_id: &TokenId) -> bool {
        self.visits.iter().any(|token| &token.id == token_id)
    }
}

impl InstanceData for InMemoryInstanceData {
    fn add_token_at_node(&mut self, node_id: &str) -> Result<Token, CoreError> {
        Ok(self.track(Token::at_node(node_id)))
    }

    fn add_token_on_transition(&mut self, transition_id: &str) -> Result<Token, CoreError> {
        Ok(self.track(Token::on_transition(transition_id)))
    }

    fn token_count(&self) -> Result<usize, CoreError> {
        Ok(self.tokens.len())
    }

    fn tokens(&self) -> Result<Vec<Token>, CoreError> {
        Ok(self.tokens.clone())
    }

    fn remove_token(&mut self, token_id: &TokenId) -> Result<(), CoreError> {
        let index = self
            .tokens
            .iter()
            .position(|token| &token.id == token_id)
            .ok_or_else(|| CoreError::TokenNotFound(token_id.to_string()))?;
        self.tokens.remove(index);
        debug!(token = %token_id, remaining = self.tokens.len(), "Token removed");
        Ok(())
    }

    fn last_token_at(
        &self,
        graph: &ProcessGraph,
        node_id: &str,
    ) -> Result<Option<Token>, CoreError> {
        Ok(self
            .visits
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

    fn local_value(&self, token_id: &TokenId, name: &str) -> Result<Option<DataPacket>, CoreError> {
        Ok(self
            .locals
            .get(token_id)
            .and_then(|values| values.get(name))
            .cloned())
    }

    fn set_local_value(
        &mut self,
        token_id: &TokenId,
        name: &str,
        value: DataPacket,
    ) -> Result<(), CoreError> {
        if !self.known(token_id) {
            return Err(CoreError::TokenNotFound(token_id.to_string()));
        }
        self.locals
            .entry(token_id.clone())
            .or_default()
            .insert(name.to_string(), value);
        Ok(())
    }
}
