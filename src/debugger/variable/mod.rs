//! Variable tree: one node per visible variable or aggregate member.
//!
//! Nodes live in a contiguous arena ([`Forest`]), children and parents are referenced by
//! [`NodeId`]. A forest is an immutable snapshot of one debugee stop, ids from other snapshots
//! never resolve in it.

pub mod builder;
pub mod edit;
pub mod expression;

use crate::debugger::error::Error;
use crate::debugger::inspector::{BasicType, StableId, TypeClass};
use std::fmt::{Display, Formatter};

/// Name prefix of file-scope and global variables.
pub const GLOBAL_SCOPE_PREFIX: &str = "::";

/// Variable kind, drives both display and write-back formatting.
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, Debug, strum_macros::Display, strum_macros::IntoStaticStr,
)]
pub enum ValueKind {
    #[strum(serialize = "aggregate")]
    Aggregate,
    #[strum(serialize = "bool")]
    Boolean,
    #[strum(serialize = "unsigned char")]
    UnsignedByte,
    #[strum(serialize = "int")]
    SignedInt,
    #[strum(serialize = "enum")]
    Enumeration,
    #[strum(serialize = "opaque")]
    Opaque,
}

impl ValueKind {
    /// Classify value by its type class. Typedef chains are resolved to the underlying type.
    pub fn classify(class: &TypeClass) -> Self {
        match class {
            TypeClass::Structure | TypeClass::Class | TypeClass::Union | TypeClass::Array => {
                ValueKind::Aggregate
            }
            TypeClass::Enumeration => ValueKind::Enumeration,
            TypeClass::Basic(BasicType::Bool) => ValueKind::Boolean,
            TypeClass::Basic(BasicType::UnsignedChar) => ValueKind::UnsignedByte,
            TypeClass::Basic(BasicType::Int) => ValueKind::SignedInt,
            TypeClass::Basic(BasicType::Other) | TypeClass::Other => ValueKind::Opaque,
            TypeClass::Typedef(underlying) => ValueKind::classify(underlying),
        }
    }
}

/// Index of a node in a [`Forest`], tagged with the snapshot it belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId {
    snapshot: u64,
    index: usize,
}

impl NodeId {
    #[inline(always)]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline(always)]
    pub fn snapshot(&self) -> u64 {
        self.snapshot
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{}:{}", self.snapshot, self.index))
    }
}

/// One visible variable or aggregate member.
#[derive(Clone, Debug, PartialEq)]
pub struct VariableNode {
    /// Declared identifier or subscript label (`count`, `[3]`).
    pub name: String,
    /// Function owning a root variable, empty for members and global scope variables.
    pub declaring_function: String,
    pub stable_id: StableId,
    pub kind: ValueKind,
    /// Scalar value text, empty for aggregates.
    pub raw_value: String,
    pub type_name: String,
    /// Enumerator names, filled only for enumerations.
    pub enum_members: Vec<String>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl VariableNode {
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_aggregate(&self) -> bool {
        self.kind == ValueKind::Aggregate
    }

    /// Display label, root variables are prefixed with their function: `(main) counter`.
    pub fn label(&self) -> String {
        if self.is_root() && !self.declaring_function.is_empty() {
            format!("({}) {}", self.declaring_function, self.name)
        } else {
            self.name.clone()
        }
    }
}

/// All variables visible at one debugee stop.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Forest {
    snapshot: u64,
    nodes: Vec<VariableNode>,
    roots: Vec<NodeId>,
}

impl Forest {
    pub fn empty(snapshot: u64) -> Self {
        Self {
            snapshot,
            nodes: vec![],
            roots: vec![],
        }
    }

    /// Number of the stop this forest was built at.
    pub fn snapshot(&self) -> u64 {
        self.snapshot
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Return node by id, `None` if id belongs to another snapshot.
    pub fn node(&self, id: NodeId) -> Option<&VariableNode> {
        if id.snapshot != self.snapshot {
            return None;
        }
        self.nodes.get(id.index)
    }

    pub fn get(&self, id: NodeId) -> Result<&VariableNode, Error> {
        self.node(id).ok_or(Error::NodeNotFound(id.index))
    }

    /// Iterate over all nodes in depth-first order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &VariableNode)> {
        self.nodes.iter().enumerate().map(|(index, node)| {
            (
                NodeId {
                    snapshot: self.snapshot,
                    index,
                },
                node,
            )
        })
    }

    /// Return node and all its ancestors, starting from the node itself.
    pub fn ancestry(&self, id: NodeId) -> Result<Vec<&VariableNode>, Error> {
        let mut chain = vec![self.get(id)?];
        while let Some(parent) = chain[chain.len() - 1].parent {
            chain.push(self.get(parent)?);
        }
        Ok(chain)
    }

    /// Return root of a tree containing node.
    pub fn root_of(&self, id: NodeId) -> Result<&VariableNode, Error> {
        let mut node = self.get(id)?;
        while let Some(parent) = node.parent {
            node = self.get(parent)?;
        }
        Ok(node)
    }

    fn push(&mut self, node: VariableNode) -> NodeId {
        self.nodes.push(node);
        NodeId {
            snapshot: self.snapshot,
            index: self.nodes.len() - 1,
        }
    }

    /// Drop node and everything added after it.
    fn rollback(&mut self, id: NodeId) {
        self.nodes.truncate(id.index);
    }
}
