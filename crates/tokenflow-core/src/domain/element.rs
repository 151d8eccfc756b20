use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::validation::ValidationContext;

/// Kind of graph member a diagnostic or lookup refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    /// The process graph itself
    Graph,
    /// A flow node
    Node,
    /// A transition between two nodes
    Transition,
    /// A process variable
    Variable,
}

/// Base contract for every member of a process graph
pub trait FlowElement {
    /// Identifier, unique within the owning graph
    fn id(&self) -> &str;

    /// Kind of this element, used when reporting diagnostics
    fn kind(&self) -> ElementKind;

    /// Append structural diagnostics for this element to the context
    fn validate(&self, context: &mut ValidationContext<'_>);
}

/// Generate a fresh element identifier
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Case-folded form of an id or name, for use as a map key
pub fn id_key(id: &str) -> String {
    id.to_lowercase()
}

/// Case-insensitive identifier comparison used by every lookup
pub fn same_id(a: &str, b: &str) -> bool {
    a == b || id_key(a) == id_key(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(generate_id(), generate_id());
    }

    #[test]
    fn test_same_id_ignores_case() {
        assert!(same_id("Approve", "aPPROVE"));
        assert!(!same_id("approve", "approved"));
    }

    #[test]
    fn test_same_id_folds_non_ascii() {
        assert!(same_id("Überprüfung", "überprüfung"));
        assert!(!same_id("Überprüfung", "uberprufung"));
        assert_eq!(id_key("Übergang"), "übergang");
    }
}
