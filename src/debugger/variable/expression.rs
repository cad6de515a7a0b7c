//! Turn a tree node back into an expression that debugee evaluator understands.

use crate::debugger::error::Error;
use crate::debugger::variable::{Forest, NodeId, ValueKind, VariableNode};

/// Subscript (container element) names are glued to the parent expression without a dot.
fn is_subscript(name: &str) -> bool {
    name.ends_with(']')
}

/// Return fully qualified name of a node, like `bar.foo.a` or `arr[2].x`.
/// Same expression is used for reading and for writing.
pub fn qualified_name(forest: &Forest, id: NodeId) -> Result<String, Error> {
    let chain = forest.ancestry(id)?;

    let mut expr = String::new();
    for node in chain.iter().rev() {
        if !node.is_root() && !is_subscript(&node.name) {
            expr.push('.');
        }
        expr.push_str(&node.name);
    }
    Ok(expr)
}

/// Return node value in a form suitable for the right side of assignment.
pub fn qualified_write_value(node: &VariableNode) -> String {
    write_value(node, &node.raw_value)
}

/// Same as [`qualified_write_value`] but for an arbitrary (edited) value text.
/// Enumerators are qualified with their type name: `Mode::Fast`.
pub fn write_value(node: &VariableNode, raw: &str) -> String {
    match node.kind {
        ValueKind::Enumeration if !node.type_name.is_empty() => {
            format!("{}::{raw}", node.type_name)
        }
        ValueKind::Enumeration
        | ValueKind::Aggregate
        | ValueKind::Boolean
        | ValueKind::UnsignedByte
        | ValueKind::SignedInt
        | ValueKind::Opaque => raw.to_string(),
    }
}

/// Return assignment expression `<qualified name> = <qualified value>`.
pub fn assignment(forest: &Forest, id: NodeId, raw: &str) -> Result<String, Error> {
    let node = forest.get(id)?;
    Ok(format!(
        "{} = {}",
        qualified_name(forest, id)?,
        write_value(node, raw)
    ))
}

/// Find first node (in depth-first order) with given qualified name.
pub fn find(forest: &Forest, qualified: &str) -> Option<NodeId> {
    forest
        .iter()
        .map(|(id, _)| id)
        .find(|&id| qualified_name(forest, id).is_ok_and(|name| name == qualified))
}
