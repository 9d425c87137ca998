//! Deletion units.

use crate::ast::{Module, Node, NodeId};

/// A node scheduled for removal together with the smallest enclosing
/// construct that has to go with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Action {
    pub node: NodeId,
    pub unit: NodeId,
}

impl Action {
    /// Removes the unit. Returns every node tombstoned by the removal.
    pub fn apply(&self, module: &mut Module) -> Vec<NodeId> {
        module.remove(self.unit)
    }
}

/// `true` when `child` can be detached from `parent` without touching the
/// rest of `parent`.
fn is_boundary(module: &Module, parent: NodeId, child: NodeId) -> bool {
    match module.node(parent) {
        Node::Program { .. } | Node::Block { .. } => true,
        Node::VarDecl { declarators: list, .. }
        | Node::Import { specifiers: list, .. }
        | Node::Seq { exprs: list } => list.len() > 1,
        Node::ExportNamed {
            declaration: None,
            specifiers,
            ..
        } => specifiers.len() > 1,
        Node::Object { .. } | Node::ObjectPattern { .. } => true,
        Node::Class { members, .. } => members.contains(&child),
        Node::If { alt, .. } => *alt == Some(child),
        Node::SwitchCase { body, .. } => body.contains(&child),
        Node::Try {
            handler: Some(handler),
            finalizer: Some(finalizer),
            ..
        } => child == *handler || child == *finalizer,
        _ => false,
    }
}

/// Climbs from `node` to the smallest removable unit containing it.
///
/// Returns `None` when `node` is already its own unit (a top-level
/// statement, a property, a class member) or is detached.
pub fn find_action(module: &Module, node: NodeId) -> Option<Action> {
    let mut current = node;
    while let Some(parent) = module.parent(current) {
        if is_boundary(module, parent, current) {
            break;
        }
        current = parent;
    }
    if current == node || current == module.root() {
        return None;
    }
    Some(Action {
        node,
        unit: current,
    })
}
