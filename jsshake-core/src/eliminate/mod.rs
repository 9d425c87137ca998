//! Fixed-point dead code elimination.
//!
//! The eliminator walks the deletion worklist until a full pass removes
//! nothing. A candidate is removed together with its [`Action`] unit once no
//! live code outside that unit reads a binding the unit declares. Every
//! removal cascades into bindings that lost their last reader.
//!
//! The reference graph is a snapshot taken before elimination. Removed
//! sites are discounted through the arena tombstones, and sites whose edge
//! was cut ahead of a deletion through the [`Shadow`].

mod action;

pub use action::{find_action, Action};

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::ast::{FnKind, Module, Node, NodeId};
use crate::liveness::Worklist;
use crate::scope::{BindingId, BindingKind, ReferenceGraph};

/// Reference edges cut during elimination.
///
/// An edge is cut only for a candidate that is deleted in the same step, so
/// after a completed run every severed identifier is already tombstoned and
/// [`EliminationStats::restored`] stays 0. The count is a diagnostic: a
/// non-zero value means a severed identifier survived elimination.
#[derive(Debug, Default)]
pub struct Shadow {
    severed: Vec<NodeId>,
    index: HashSet<NodeId>,
}

impl Shadow {
    /// Cuts the edge from `ident` to its binding. Returns `false` when it
    /// was already cut.
    pub fn sever(&mut self, ident: NodeId) -> bool {
        let inserted = self.index.insert(ident);
        if inserted {
            self.severed.push(ident);
        }
        inserted
    }

    pub fn is_severed(&self, ident: NodeId) -> bool {
        self.index.contains(&ident)
    }

    /// Puts the edge back. Returns `false` when it was not cut.
    pub fn restore(&mut self, ident: NodeId) -> bool {
        let removed = self.index.remove(&ident);
        if removed {
            self.severed.retain(|&s| s != ident);
        }
        removed
    }

    pub fn severed(&self) -> &[NodeId] {
        &self.severed
    }

    pub fn is_empty(&self) -> bool {
        self.severed.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EliminationStats {
    pub passes: usize,
    /// Worklist entries that ended up removed.
    pub deleted: usize,
    /// Identifier edges cut ahead of a deletion.
    pub severed: usize,
    /// Cut edges put back after the fixed point.
    pub restored: usize,
}

/// Runs elimination to a fixed point over `worklist`.
pub fn eliminate(module: &mut Module, graph: &ReferenceGraph, worklist: &Worklist) -> EliminationStats {
    let mut eliminator = Eliminator::new(module, graph);
    eliminator.run(worklist.as_slice());
    eliminator.finish()
}

/// Removes `node` (or the construct holding it) and everything that dies
/// with it.
pub fn remove_with_related(module: &mut Module, graph: &ReferenceGraph, node: NodeId) -> Vec<NodeId> {
    let mut eliminator = Eliminator::new(module, graph);
    let removed = eliminator.module.remove(node);
    eliminator.cascade(removed.clone());
    removed
}

struct Eliminator<'a> {
    module: &'a mut Module,
    graph: &'a ReferenceGraph,
    shadow: Shadow,
    stats: EliminationStats,
}

impl<'a> Eliminator<'a> {
    fn new(module: &'a mut Module, graph: &'a ReferenceGraph) -> Self {
        Self {
            module,
            graph,
            shadow: Shadow::default(),
            stats: EliminationStats::default(),
        }
    }

    fn run(&mut self, candidates: &[NodeId]) {
        let mut deleted: HashSet<NodeId> = HashSet::new();
        let mut changed = true;

        while changed && deleted.len() < candidates.len() {
            changed = false;
            self.stats.passes += 1;

            for &candidate in candidates {
                if deleted.contains(&candidate) {
                    continue;
                }
                if self.module.is_removed(candidate) {
                    deleted.insert(candidate);
                    changed = true;
                    continue;
                }

                let action = find_action(self.module, candidate);
                let unit = action.map_or(candidate, |a| a.unit);

                // Something outside the unit still reads what the unit declares.
                if self.declared_outer_refs(unit) > 0 {
                    continue;
                }
                let Some(orphans) = self.orphaned_writes(unit) else {
                    continue;
                };

                if self.module.node(candidate).is_ident()
                    && !self.graph.is_declaration(candidate)
                    && self.own_outer_refs(candidate, unit) > 0
                    && self.shadow.sever(candidate)
                {
                    self.stats.severed += 1;
                }

                let removed = match action {
                    Some(action) => action.apply(self.module),
                    None => self.module.remove(candidate),
                };
                debug!(node = %candidate, unit = %unit, removed = removed.len(), "removed dead node");
                self.cascade(removed);
                for write in orphans {
                    let dropped = self.module.remove(write);
                    self.cascade(dropped);
                }

                deleted.insert(candidate);
                changed = true;
            }
        }

        self.stats.deleted = deleted.len();
    }

    fn finish(mut self) -> EliminationStats {
        restore_severed(&mut self.shadow, self.module, &mut self.stats);
        self.stats
    }

    /// A live read. `c++;` and `c += 1;` as whole statements read `c` only
    /// to write it back and do not count.
    fn is_live_ref(&self, site: NodeId) -> bool {
        !self.module.is_removed(site) && !self.shadow.is_severed(site) && !self.is_self_update(site)
    }

    fn is_self_update(&self, site: NodeId) -> bool {
        let Some(parent) = self.module.parent(site) else {
            return false;
        };
        let updates_site = match self.module.node(parent) {
            Node::Update { arg, .. } => *arg == site,
            Node::Assign { op, target, .. } => op != "=" && *target == site,
            _ => false,
        };
        updates_site && self.write_statement(site).is_some()
    }

    fn live_refs(&self, binding: BindingId) -> usize {
        self.graph
            .references(binding)
            .iter()
            .filter(|&&r| self.is_live_ref(r))
            .count()
    }

    fn declared_in(&self, unit: NodeId) -> BTreeSet<BindingId> {
        self.module
            .descendants(unit)
            .into_iter()
            .filter(|&n| self.graph.is_declaration(n))
            .filter_map(|n| self.graph.binding_of(n))
            .collect()
    }

    /// Live reads, outside `unit`, of bindings declared inside it.
    fn declared_outer_refs(&self, unit: NodeId) -> usize {
        self.declared_in(unit)
            .into_iter()
            .flat_map(|b| self.graph.references(b))
            .filter(|&&r| self.is_live_ref(r) && !self.module.contains(unit, r))
            .count()
    }

    /// Write statements outside `unit` that must go with it because they
    /// assign a binding the unit declares. `None` when one of those writes
    /// sits inside a larger expression and cannot be removed on its own.
    fn orphaned_writes(&self, unit: NodeId) -> Option<Vec<NodeId>> {
        let mut orphans = Vec::new();
        for binding in self.declared_in(unit) {
            for &site in self.graph.writes(binding) {
                if self.module.is_removed(site) || self.module.contains(unit, site) {
                    continue;
                }
                orphans.push(self.write_unit(site)?);
            }
        }
        Some(orphans)
    }

    /// Live reads of the binding `ident` refers to, outside `unit`.
    fn own_outer_refs(&self, ident: NodeId, unit: NodeId) -> usize {
        let Some(binding) = self.graph.binding_of(ident) else {
            return 0;
        };
        self.graph
            .references(binding)
            .iter()
            .filter(|&&r| r != ident && self.is_live_ref(r) && !self.module.contains(unit, r))
            .count()
    }

    /// Removes declarations of bindings whose last reader went away with
    /// `removed`, transitively.
    fn cascade(&mut self, mut removed: Vec<NodeId>) {
        while !removed.is_empty() {
            let touched: BTreeSet<BindingId> = removed
                .iter()
                .filter(|&&n| self.module.node(n).is_ident() && !self.graph.is_declaration(n))
                .filter_map(|&n| self.graph.binding_of(n))
                .collect();
            removed.clear();

            for binding in touched {
                if !self.is_unused(binding) {
                    continue;
                }
                // A write that cannot go on its own keeps the declaration.
                let Some(units) = self.declaration_units(binding) else {
                    continue;
                };
                for target in units {
                    let dropped = self.module.remove(target);
                    if !dropped.is_empty() {
                        debug!(binding = %self.graph.binding(binding).name, "removed unused binding");
                    }
                    removed.extend(dropped);
                }
            }
        }
    }

    fn is_unused(&self, binding: BindingId) -> bool {
        let b = self.graph.binding(binding);
        if b.kind == BindingKind::Param || self.module.is_removed(b.path) {
            return false;
        }
        let exported = self
            .module
            .ancestors(b.path)
            .any(|a| matches!(self.module.node(a), Node::ExportNamed { .. } | Node::ExportDefault { .. }));
        !exported && self.live_refs(binding) == 0
    }

    /// Constructs to remove for an unused binding: its declaration and every
    /// statement that only writes it. `None` when any of them cannot be
    /// removed without leaving the others dangling.
    fn declaration_units(&self, binding: BindingId) -> Option<Vec<NodeId>> {
        let b = self.graph.binding(binding);
        let mut units = Vec::new();

        match self.module.node(b.path) {
            Node::Declarator { id, .. } => {
                units.push(self.declarator_unit(b.path, *id, b.identifier)?);
            }
            Node::Function {
                kind: FnKind::Declaration,
                ..
            }
            | Node::Class {
                is_declaration: true,
                ..
            }
            | Node::ImportSpecifier { .. }
            | Node::ImportNamespace { .. } => units.push(b.path),
            _ => {}
        }

        for &site in self.graph.writes(binding) {
            if self.module.is_removed(site) {
                continue;
            }
            units.push(self.write_unit(site)?);
        }
        Some(units)
    }

    fn write_unit(&self, site: NodeId) -> Option<NodeId> {
        if self.graph.is_declaration(site) {
            self.redeclaration_unit(site)
        } else {
            self.write_statement(site)
        }
    }

    /// Whole declarator, or the one pattern property binding `identifier`
    /// when the other names it destructures are still read. A loop head
    /// declaration stays with its loop.
    fn declarator_unit(&self, declarator: NodeId, pattern: NodeId, identifier: NodeId) -> Option<NodeId> {
        let decl = self.module.parent(declarator)?;
        if self
            .module
            .parent(decl)
            .is_some_and(|head| matches!(self.module.node(head), Node::ForIn { .. }))
        {
            return None;
        }
        if self.module.node(pattern).is_ident() {
            return Some(declarator);
        }

        let all_dead = self
            .graph
            .bindings_declared_by(declarator)
            .iter()
            .all(|&b| self.live_refs(b) == 0);
        if all_dead {
            return Some(declarator);
        }

        // Partial: only object pattern properties can go on their own.
        let mut current = identifier;
        while let Some(parent) = self.module.parent(current) {
            if parent == declarator {
                return None;
            }
            if let Node::ObjectPattern { props } = self.module.node(parent) {
                let has_rest = props
                    .iter()
                    .any(|&p| matches!(self.module.node(p), Node::Rest { .. }));
                return match self.module.node(current) {
                    Node::Property { .. } if !has_rest => Some(current),
                    _ => None,
                };
            }
            current = parent;
        }
        None
    }

    /// `var a = 1; var a = 2;` and `function a() {} function a() {}`
    fn redeclaration_unit(&self, ident: NodeId) -> Option<NodeId> {
        let parent = self.module.parent(ident)?;
        match self.module.node(parent) {
            Node::Declarator { id, .. } if *id == ident => {
                let decl = self.module.parent(parent)?;
                let in_loop_head = self
                    .module
                    .parent(decl)
                    .is_some_and(|head| matches!(self.module.node(head), Node::ForIn { .. }));
                (!in_loop_head).then_some(parent)
            }
            Node::Function {
                kind: FnKind::Declaration,
                id: Some(id),
                ..
            } if *id == ident => Some(parent),
            Node::Class {
                is_declaration: true,
                id: Some(id),
                ..
            } if *id == ident => Some(parent),
            _ => None,
        }
    }

    /// The statement `a = …;` or `a++;` when the write is the whole
    /// statement and the assigned value has no effects of its own.
    fn write_statement(&self, ident: NodeId) -> Option<NodeId> {
        let expr = self.module.parent(ident)?;
        let is_plain_write = match self.module.node(expr) {
            Node::Assign { target, value, .. } => *target == ident && !has_effects(self.module, *value),
            Node::Update { arg, .. } => *arg == ident,
            _ => false,
        };
        if !is_plain_write {
            return None;
        }
        let stmt = self.module.parent(expr)?;
        if !matches!(self.module.node(stmt), Node::ExprStmt { .. }) {
            return None;
        }
        let holder = self.module.parent(stmt)?;
        match self.module.node(holder) {
            Node::Program { .. } | Node::Block { .. } => Some(stmt),
            _ => None,
        }
    }
}

/// Puts back every severed edge, counting identifiers that survived.
fn restore_severed(shadow: &mut Shadow, module: &Module, stats: &mut EliminationStats) {
    for ident in shadow.severed().to_vec() {
        shadow.restore(ident);
        if !module.is_removed(ident) {
            stats.restored += 1;
        }
    }
}

/// `true` when evaluating `expr` may call, assign or suspend. Function
/// bodies are not evaluated and do not count.
fn has_effects(module: &Module, expr: NodeId) -> bool {
    let mut stack = vec![expr];
    while let Some(id) = stack.pop() {
        match module.node(id) {
            Node::Function { .. } => continue,
            Node::Call { .. }
            | Node::ImportCall { .. }
            | Node::TaggedTemplate { .. }
            | Node::Assign { .. }
            | Node::Update { .. }
            | Node::Await { .. }
            | Node::Yield { .. } => return true,
            Node::Unary { op, .. } if op == "delete" => return true,
            node => stack.extend(node.children()),
        }
    }
    false
}
