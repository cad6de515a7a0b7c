use crate::debugger::variable::{Forest, NodeId, ValueKind};
use std::fmt::{Display, Formatter};

const INDENT: &str = "  ";

/// Text rendering of a variable forest.
pub struct ForestView<'a>(pub &'a Forest);

impl ForestView<'_> {
    fn fmt_node(&self, f: &mut Formatter<'_>, id: NodeId, depth: usize) -> std::fmt::Result {
        let Some(node) = self.0.node(id) else {
            return Ok(());
        };
        let indent = INDENT.repeat(depth);
        let label = node.label();

        match node.kind {
            ValueKind::Aggregate => {
                writeln!(f, "{indent}{label} {} {{", node.type_name)?;
                for child in node.children() {
                    self.fmt_node(f, *child, depth + 1)?;
                }
                writeln!(f, "{indent}}}")
            }
            ValueKind::Enumeration => {
                writeln!(f, "{indent}{label} = {}::{}", node.type_name, node.raw_value)
            }
            ValueKind::Boolean
            | ValueKind::UnsignedByte
            | ValueKind::SignedInt
            | ValueKind::Opaque => writeln!(f, "{indent}{label} = {}", node.raw_value),
        }
    }
}

impl Display for ForestView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.0.roots().is_empty() {
            return writeln!(f, "<no variables>");
        }
        for root in self.0.roots() {
            self.fmt_node(f, *root, 0)?;
        }
        Ok(())
    }
}
