//! Shared graph fixtures for integration tests.

use botflow::model::{
    ConditionOperator, Edge, Graph, MathOperator, Node, NodeData, VariableDecl,
};
use serde_json::Value;

/// Start -> End.
pub fn minimal_graph() -> Graph {
    Graph {
        nodes: vec![
            Node::new("start", NodeData::Start {}),
            Node::new("end", NodeData::End {}),
        ],
        edges: vec![Edge::plain("e1", "start", "end")],
        variables: Default::default(),
    }
}

/// Start -> SendMessage(content) for each content, chained -> End.
pub fn message_chain(contents: &[&str]) -> Graph {
    let mut nodes = vec![Node::new("start", NodeData::Start {})];
    let mut edges = Vec::new();
    let mut prev = "start".to_string();
    for (i, content) in contents.iter().enumerate() {
        let id = format!("msg{i}");
        nodes.push(Node::new(
            &id,
            NodeData::SendMessage {
                content: (*content).to_string(),
            },
        ));
        edges.push(Edge::plain(format!("e{i}"), prev, &id));
        prev = id;
    }
    nodes.push(Node::new("end", NodeData::End {}));
    edges.push(Edge::plain("e_end", prev, "end"));
    Graph {
        nodes,
        edges,
        variables: Default::default(),
    }
}

/// Start -> IfCondition -> "yes"/"no" SendMessage -> End, with the variable
/// seeded by the caller's context.
pub fn condition_graph(variable: &str, operator: ConditionOperator, value: &str) -> Graph {
    Graph {
        nodes: vec![
            Node::new("start", NodeData::Start {}),
            Node::new(
                "cond",
                NodeData::IfCondition {
                    variable: variable.to_string(),
                    operator,
                    value: value.to_string(),
                },
            ),
            Node::new(
                "yes",
                NodeData::SendMessage {
                    content: "yes".into(),
                },
            ),
            Node::new(
                "no",
                NodeData::SendMessage {
                    content: "no".into(),
                },
            ),
            Node::new("end", NodeData::End {}),
            Node::new("end2", NodeData::End {}),
        ],
        edges: vec![
            Edge::plain("e1", "start", "cond"),
            Edge::branch("e2", "cond", "yes", "true"),
            Edge::branch("e3", "cond", "no", "false"),
            Edge::plain("e4", "yes", "end"),
            Edge::plain("e5", "no", "end2"),
        ],
        variables: Default::default(),
    }
}

/// The end-to-end example: Start -> SetVariable(count=1) ->
/// IfCondition(count equals 1 ? yes : no) -> End.
pub fn set_then_branch_graph() -> Graph {
    let mut graph = condition_graph("count", ConditionOperator::Equals, "1");
    graph.nodes.push(Node::new(
        "set",
        NodeData::SetVariable {
            name: "count".into(),
            value: "1".into(),
        },
    ));
    // Reroute start -> set -> cond.
    graph.edges.retain(|e| e.id != "e1");
    graph.edges.push(Edge::plain("e0", "start", "set"));
    graph.edges.push(Edge::plain("e1", "set", "cond"));
    graph
}

/// Start -> SendMessage("before") -> Delay(duration_ms) ->
/// SendMessage("after") -> End.
pub fn delay_graph(duration_ms: u64) -> Graph {
    Graph {
        nodes: vec![
            Node::new("start", NodeData::Start {}),
            Node::new(
                "before",
                NodeData::SendMessage {
                    content: "before".into(),
                },
            ),
            Node::new(
                "wait",
                NodeData::Delay {
                    duration: duration_ms,
                },
            ),
            Node::new(
                "after",
                NodeData::SendMessage {
                    content: "after".into(),
                },
            ),
            Node::new("end", NodeData::End {}),
        ],
        edges: vec![
            Edge::plain("e1", "start", "before"),
            Edge::plain("e2", "before", "wait"),
            Edge::plain("e3", "wait", "after"),
            Edge::plain("e4", "after", "end"),
        ],
        variables: Default::default(),
    }
}

/// Start -> Random(min..=max -> roll) -> SendMessage("{roll}") -> End.
pub fn random_graph(min: i64, max: i64) -> Graph {
    Graph {
        nodes: vec![
            Node::new("start", NodeData::Start {}),
            Node::new(
                "roll",
                NodeData::Random {
                    min,
                    max,
                    store_as: "roll".into(),
                },
            ),
            Node::new(
                "say",
                NodeData::SendMessage {
                    content: "rolled {roll}".into(),
                },
            ),
            Node::new("end", NodeData::End {}),
        ],
        edges: vec![
            Edge::plain("e1", "start", "roll"),
            Edge::plain("e2", "roll", "say"),
            Edge::plain("e3", "say", "end"),
        ],
        variables: Default::default(),
    }
}

/// Start -> MathOperation -> GetVariable(result) -> End, with a declared
/// default for an unrelated variable so GetVariable fallbacks are covered.
pub fn math_graph(operator: MathOperator, left: &str, right: &str) -> Graph {
    let mut variables = rustc_hash::FxHashMap::default();
    variables.insert(
        "greeting".to_string(),
        VariableDecl {
            default: Some(Value::String("hello".into())),
            ..Default::default()
        },
    );
    Graph {
        nodes: vec![
            Node::new("start", NodeData::Start {}),
            Node::new(
                "math",
                NodeData::MathOperation {
                    operator,
                    left: left.to_string(),
                    right: right.to_string(),
                    store_as: "result".into(),
                },
            ),
            Node::new(
                "get",
                NodeData::GetVariable {
                    name: "result".into(),
                },
            ),
            Node::new("end", NodeData::End {}),
        ],
        edges: vec![
            Edge::plain("e1", "start", "math"),
            Edge::plain("e2", "math", "get"),
            Edge::plain("e3", "get", "end"),
        ],
        variables,
    }
}
