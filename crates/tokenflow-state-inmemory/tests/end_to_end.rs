mod common;

use pretty_assertions::assert_eq;

use common::{approval_graph, init_tracing, EndNode, StartNode};
use tokenflow_core::{
    activate, error_codes, CoreConfig, DataPacket, ExecutionContext, InstanceData, ProcessGraph,
    Transition,
};
use tokenflow_state_inmemory::{InMemoryInstanceData, InMemoryInstanceStore};

#[test]
fn test_start_task_end_scenario() {
    init_tracing();
    let graph = approval_graph();
    assert!(!graph.validate(CoreConfig::default()).has_errors());

    let mut data = InMemoryInstanceData::new();
    let initial = data.add_token_at_node("S").unwrap();

    // S: the token leaves over the unguarded T1
    let outcome = activate(&graph, "S", &mut data, CoreConfig::default()).unwrap();
    assert!(!outcome.is_faulted());
    let tokens = data.tokens().unwrap();
    assert_eq!(tokens.len(), 1);
    assert_ne!(tokens[0].id, initial.id);
    assert_eq!(tokens[0].transition(), Some("T1"));
    assert_eq!(tokens[0].location(&graph), Some("M"));

    // M: the pending token is the one on T1; approval lets it pass T2
    {
        let context = ExecutionContext::new(&graph, "M", &mut data);
        assert_eq!(
            context.pending_token().unwrap().map(|t| t.id),
            Some(tokens[0].id.clone())
        );
    }
    let outcome = activate(&graph, "M", &mut data, CoreConfig::default()).unwrap();
    assert!(!outcome.is_faulted());
    let tokens = data.tokens().unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].transition(), Some("T2"));
    assert_eq!(tokens[0].location(&graph), Some("E"));

    // E: no outgoing transitions, the token is consumed
    let outcome = activate(&graph, "E", &mut data, CoreConfig::default()).unwrap();
    assert!(!outcome.is_faulted());
    assert_eq!(data.token_count().unwrap(), 0);
    assert!(data.is_complete());

    let context = ExecutionContext::new(&graph, "E", &mut data);
    assert_eq!(
        context.historical_value_at("M", "approved").unwrap(),
        Some(DataPacket::from_bool(true))
    );
}

#[test]
fn test_unapproved_token_stops_at_task() {
    let graph = approval_graph();
    let mut data = InMemoryInstanceData::new();
    data.add_token_at_node("S").unwrap();
    activate(&graph, "S", &mut data, CoreConfig::default()).unwrap();

    // Advancing M without its approval step: the guard on T2 fails.
    let m = graph.node("M").unwrap();
    let mut context = ExecutionContext::new(&graph, "M", &mut data);
    m.advance_tokens(&mut context, true).unwrap();
    assert!(!context.is_faulted());
    drop(context);

    assert_eq!(data.token_count().unwrap(), 0);
    assert!(data.tokens_at(&graph, "E").unwrap().is_empty());
}

#[test]
fn test_scenario_through_store() {
    let graph = approval_graph();
    let store = InMemoryInstanceStore::with_config(CoreConfig::from_env());
    let id = store.start(&graph).unwrap();

    for node in ["S", "M", "E"] {
        let outcome = store.activate(&id, &graph, node).unwrap();
        assert!(!outcome.is_faulted(), "activation of {} faulted", node);
    }

    assert!(store.is_complete(&id).unwrap());
    let visits = store.snapshot(&id).unwrap().visits().len();
    assert_eq!(visits, 3);
}

#[test]
fn test_end_node_rule_composes_with_base_rules() {
    let mut graph = ProcessGraph::new("broken");
    graph.nodes.push(Box::new(StartNode::new("S")));
    graph.nodes.push(Box::new(EndNode::new("E")));
    graph.transitions.push(Transition::between("T1", "S", "E"));
    graph.transitions.push(Transition::between("T2", "E", "S"));
    graph.reindex();

    let context = graph.validate(CoreConfig::default());
    let findings = context.results_for("E");
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].code, error_codes::NODE_RULE);
    assert!(context.into_result().is_err());
}
