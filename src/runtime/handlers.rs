//! One handler per node type: pure functions of (node data, context) into
//! (variable mutation, output, next-edge hint), with all side effects routed
//! through the [`EffectSink`].

use serde_json::Value;
use tracing::debug;

use super::context::InvocationContext;
use super::effects::{ActionError, EffectSink, ExternalAction, Output};
use super::interpolate::{interpolate, render_value};
use crate::model::{ConditionOperator, Graph, MathOperator, Node, NodeData};

/// How the engine should pick the outgoing edge after a handler ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NextHint {
    /// Follow the first outgoing edge in declaration order.
    Follow,
    /// Follow the edge whose `source_handle` matches `"true"`/`"false"`.
    Branch(bool),
}

/// Execute a single node against the invocation context and effect sink.
///
/// Start and End never reach this function; the engine handles them as pure
/// flow markers.
pub(crate) async fn execute_node(
    node: &Node,
    graph: &Graph,
    ctx: &mut InvocationContext,
    sink: &mut dyn EffectSink,
) -> Result<NextHint, ActionError> {
    match &node.data {
        NodeData::Start {} | NodeData::End {} => Ok(NextHint::Follow),

        NodeData::SendMessage { content } => {
            let content = interpolate(content, ctx);
            sink.emit(ctx, Output::Message { content }).await?;
            Ok(NextHint::Follow)
        }

        NodeData::SendEmbed {
            title,
            description,
            color,
            footer,
        } => {
            let output = Output::Embed {
                title: interpolate(title, ctx),
                description: interpolate(description, ctx),
                color: *color,
                footer: footer.as_deref().map(|f| interpolate(f, ctx)),
            };
            sink.emit(ctx, output).await?;
            Ok(NextHint::Follow)
        }

        NodeData::SetVariable { name, value } => {
            let value = interpolate(value, ctx);
            ctx.variables.insert(name.clone(), Value::String(value));
            Ok(NextHint::Follow)
        }

        NodeData::GetVariable { name } => {
            let value = ctx
                .variables
                .get(name)
                .cloned()
                .or_else(|| declared_default(graph, name))
                .unwrap_or(Value::Null);
            sink.emit(
                ctx,
                Output::VariableRead {
                    name: name.clone(),
                    value,
                },
            )
            .await?;
            Ok(NextHint::Follow)
        }

        NodeData::IfCondition {
            variable,
            operator,
            value,
        } => {
            let left = ctx
                .variables
                .get(variable)
                .map(render_value)
                .unwrap_or_default();
            let right = interpolate(value, ctx);
            let outcome = evaluate_condition(*operator, &left, &right);
            debug!(node = %node.id, %left, %right, op = ?operator, outcome, "condition");
            Ok(NextHint::Branch(outcome))
        }

        NodeData::Delay { duration } => {
            sink.delay(*duration).await;
            Ok(NextHint::Follow)
        }

        NodeData::Random { min, max, store_as } => {
            if min > max {
                return Err(ActionError::MalformedNode {
                    reason: format!("random range inverted: min {min} > max {max}"),
                });
            }
            let sample = sink.random_range(*min, *max);
            ctx.variables.insert(store_as.clone(), Value::from(sample));
            Ok(NextHint::Follow)
        }

        NodeData::MathOperation {
            operator,
            left,
            right,
            store_as,
        } => {
            let lhs = parse_operand(&interpolate(left, ctx));
            let rhs = parse_operand(&interpolate(right, ctx));
            let result = apply_math(*operator, lhs, rhs);
            ctx.variables.insert(store_as.clone(), number_value(result));
            Ok(NextHint::Follow)
        }

        NodeData::AddRole { role_id } => {
            sink.perform(
                ctx,
                ExternalAction::AddRole {
                    role_id: interpolate(role_id, ctx),
                },
            )
            .await?;
            Ok(NextHint::Follow)
        }

        NodeData::RemoveRole { role_id } => {
            sink.perform(
                ctx,
                ExternalAction::RemoveRole {
                    role_id: interpolate(role_id, ctx),
                },
            )
            .await?;
            Ok(NextHint::Follow)
        }

        NodeData::ApiCall {
            url,
            method,
            store_as,
        } => {
            let response = sink
                .perform(
                    ctx,
                    ExternalAction::ApiCall {
                        url: interpolate(url, ctx),
                        method: method.clone(),
                    },
                )
                .await?;
            if let Some(name) = store_as {
                ctx.variables.insert(name.clone(), response);
            }
            Ok(NextHint::Follow)
        }

        NodeData::AwaitReply {
            prompt,
            store_as,
            timeout_ms,
        } => {
            let reply = sink
                .perform(
                    ctx,
                    ExternalAction::AwaitReply {
                        prompt: interpolate(prompt, ctx),
                        timeout_ms: *timeout_ms,
                    },
                )
                .await?;
            ctx.variables.insert(store_as.clone(), reply);
            Ok(NextHint::Follow)
        }
    }
}

fn declared_default(graph: &Graph, name: &str) -> Option<Value> {
    graph.variables.get(name).and_then(|d| d.default.clone())
}

/// Evaluate a condition operator over the rendered variable value and the
/// interpolated literal. Numeric operators coerce with a number parse; a
/// non-numeric operand produces NaN, and NaN comparisons evaluate false.
/// No operator ever errors.
#[must_use]
pub fn evaluate_condition(op: ConditionOperator, left: &str, right: &str) -> bool {
    match op {
        ConditionOperator::Equals => left == right,
        ConditionOperator::NotEquals => left != right,
        ConditionOperator::GreaterThan => parse_operand(left) > parse_operand(right),
        ConditionOperator::LessThan => parse_operand(left) < parse_operand(right),
        ConditionOperator::Contains => left.contains(right),
        ConditionOperator::StartsWith => left.starts_with(right),
        ConditionOperator::EndsWith => left.ends_with(right),
        ConditionOperator::IsEmpty => left.is_empty(),
        ConditionOperator::IsNotEmpty => !left.is_empty(),
    }
}

fn parse_operand(s: &str) -> f64 {
    s.trim().parse::<f64>().unwrap_or(f64::NAN)
}

fn apply_math(op: MathOperator, lhs: f64, rhs: f64) -> f64 {
    match op {
        MathOperator::Add => lhs + rhs,
        MathOperator::Subtract => lhs - rhs,
        MathOperator::Multiply => lhs * rhs,
        // Division and modulo by zero yield 0, not an error.
        MathOperator::Divide => {
            if rhs == 0.0 {
                0.0
            } else {
                lhs / rhs
            }
        }
        MathOperator::Modulo => {
            if rhs == 0.0 {
                0.0
            } else {
                lhs % rhs
            }
        }
    }
}

/// Store math results as JSON numbers, keeping integers integral. A NaN
/// result (non-numeric operand) is stored as the string "NaN" since JSON has
/// no NaN literal.
fn number_value(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && (i64::MIN as f64..=i64::MAX as f64).contains(&n) {
        Value::from(n as i64)
    } else if n.is_finite() {
        Value::from(n)
    } else {
        Value::String("NaN".to_string())
    }
}
