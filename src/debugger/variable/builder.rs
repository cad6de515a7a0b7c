use crate::debugger::error::Error;
use crate::debugger::inspector::{
    DebugInspector, InspectedFrame, InspectedThread, InspectedValue, VariableFilter,
};
use crate::debugger::variable::{Forest, NodeId, ValueKind, VariableNode, GLOBAL_SCOPE_PREFIX};
use log::debug;
use std::collections::HashSet;

/// Builds a variable forest from the current debugee stop.
///
/// Every build starts from scratch, nothing is reused between stops.
#[derive(Clone, Copy, Debug, Default)]
pub struct ForestBuilder {
    filter: VariableFilter,
}

impl ForestBuilder {
    pub fn new(filter: VariableFilter) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> VariableFilter {
        self.filter
    }

    /// Walk all frames of selected thread (innermost first) and collect their variables.
    ///
    /// Root variables are deduplicated by (declaring function, name) pair, the innermost
    /// readable occurrence wins. Scalars without readable value and aggregates without any
    /// readable member are skipped, so they never shadow an outer variable.
    ///
    /// # Arguments
    ///
    /// * `inspector`: debugee inspector, debugee must be stopped
    /// * `snapshot`: number of current stop, node ids of the result are tagged with it
    pub fn build<I: DebugInspector>(&self, inspector: &I, snapshot: u64) -> Result<Forest, Error> {
        let thread = inspector.selected_thread().ok_or(Error::NoActiveThread)?;
        let frames = thread.frames();
        if frames.is_empty() {
            return Err(Error::NoActiveFrame);
        }

        let mut forest = Forest::empty(snapshot);
        let mut seen = HashSet::new();

        for frame in &frames {
            let function = frame.function_name();

            for value in frame.variables(self.filter) {
                let name = value.name();
                let declaring_function = if name.starts_with(GLOBAL_SCOPE_PREFIX) {
                    String::new()
                } else {
                    function.clone()
                };

                let key = (declaring_function, name);
                if seen.contains(&key) {
                    debug!(target: "hook", "variable `{}` shadowed in `{function}`", key.1);
                    continue;
                }

                let (declaring_function, name) = key.clone();
                if let Some(root) = self.attach(&mut forest, &value, name, declaring_function, None)
                {
                    forest.roots.push(root);
                    seen.insert(key);
                }
            }
        }

        debug!(
            target: "hook",
            "variable tree #{snapshot} built: {} roots, {} nodes",
            forest.roots.len(),
            forest.len()
        );

        Ok(forest)
    }

    fn attach<V: InspectedValue>(
        &self,
        forest: &mut Forest,
        value: &V,
        name: String,
        declaring_function: String,
        parent: Option<NodeId>,
    ) -> Option<NodeId> {
        let kind = ValueKind::classify(&value.type_class());

        let raw_value = match kind {
            ValueKind::Aggregate => String::new(),
            ValueKind::Boolean
            | ValueKind::UnsignedByte
            | ValueKind::SignedInt
            | ValueKind::Enumeration
            | ValueKind::Opaque => match value.current_text() {
                Some(text) => text,
                None => {
                    debug!(target: "hook", "{}", Error::ValueUnreadable(name));
                    return None;
                }
            },
        };

        let enum_members = if kind == ValueKind::Enumeration {
            value.enum_members()
        } else {
            vec![]
        };

        let id = forest.push(VariableNode {
            name,
            declaring_function,
            stable_id: value.stable_id(),
            kind,
            raw_value,
            type_name: value.type_name(),
            enum_members,
            children: vec![],
            parent,
        });

        if kind == ValueKind::Aggregate {
            let mut children = vec![];
            for child in value.children() {
                let child_name = child.name();
                let child_id = self.attach(forest, &child, child_name, String::new(), Some(id));
                if let Some(child_id) = child_id {
                    children.push(child_id);
                }
            }

            if children.is_empty() {
                debug!(
                    target: "hook",
                    "aggregate `{}` has no readable members",
                    forest.nodes[id.index].name
                );
                forest.rollback(id);
                return None;
            }
            forest.nodes[id.index].children = children;
        }

        Some(id)
    }
}
