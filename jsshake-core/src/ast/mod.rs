//! Arena AST for JavaScript modules.
//!
//! Nodes live in one `Vec` and refer to each other through [`NodeId`].
//! Removing a node never frees its slot: the subtree is tombstoned instead,
//! so ids captured by the collector stay valid for the whole pass and
//! "was this removed?" is a constant-time lookup.
//!
//! The module is produced outside of this crate (see [`estree`] for the
//! JSON entry point) or assembled with [`ModuleBuilder`].

mod build;
pub mod estree;
mod print;

pub use build::ModuleBuilder;
pub use print::print_module;

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

/// Index of a node inside its [`Module`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Lit {
    Str(String),
    Num(f64),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Var,
    Let,
    Const,
}

impl VarKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Var => "var",
            Self::Let => "let",
            Self::Const => "const",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FnKind {
    Declaration,
    Expression,
    Arrow,
}

/// Plain properties and methods are `Init`; accessors hold a function
/// value printed as `get key() {}` / `set key(v) {}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PropKind {
    #[default]
    Init,
    Get,
    Set,
}

/// A JavaScript syntax node. Child links are [`NodeId`]s into the arena.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Program { body: Vec<NodeId> },

    // Module declarations
    Import { source: String, specifiers: Vec<NodeId> },
    /// `imported` is `"default"` for default imports.
    ImportSpecifier { imported: String, local: NodeId },
    ImportNamespace { local: NodeId },
    ExportNamed {
        declaration: Option<NodeId>,
        specifiers: Vec<NodeId>,
        source: Option<String>,
    },
    /// `local` is an identifier; it is only a reference when the parent
    /// export has no `source`.
    ExportSpecifier { local: NodeId, exported: String },
    /// `export * as ns from "x"`
    ExportNamespace { exported: String },
    ExportDefault { value: NodeId },
    ExportAll { source: String },

    // Statements
    VarDecl { kind: VarKind, declarators: Vec<NodeId> },
    Declarator { id: NodeId, init: Option<NodeId> },
    Function {
        kind: FnKind,
        id: Option<NodeId>,
        params: Vec<NodeId>,
        /// A `Block` except for arrows with an expression body.
        body: NodeId,
        is_async: bool,
        is_generator: bool,
    },
    Class {
        id: Option<NodeId>,
        super_class: Option<NodeId>,
        members: Vec<NodeId>,
        is_declaration: bool,
    },
    ClassMember {
        key: NodeId,
        value: Option<NodeId>,
        computed: bool,
        is_static: bool,
        is_method: bool,
        kind: PropKind,
    },
    ExprStmt { expr: NodeId },
    Block { body: Vec<NodeId> },
    Return { arg: Option<NodeId> },
    If { test: NodeId, cons: NodeId, alt: Option<NodeId> },
    Throw { arg: NodeId },
    For {
        init: Option<NodeId>,
        test: Option<NodeId>,
        update: Option<NodeId>,
        body: NodeId,
    },
    /// `for (left in right)`, or `for (left of right)` when `of` is set.
    ForIn {
        left: NodeId,
        right: NodeId,
        body: NodeId,
        of: bool,
        is_await: bool,
    },
    While { test: NodeId, body: NodeId },
    DoWhile { body: NodeId, test: NodeId },
    Try {
        block: NodeId,
        handler: Option<NodeId>,
        finalizer: Option<NodeId>,
    },
    Catch { param: Option<NodeId>, body: NodeId },
    Switch { discriminant: NodeId, cases: Vec<NodeId> },
    /// `test` is `None` for `default:`.
    SwitchCase { test: Option<NodeId>, body: Vec<NodeId> },
    Labeled { label: String, body: NodeId },
    Break { label: Option<String> },
    Continue { label: Option<String> },
    Debugger,
    /// Empty statement, or a hole in an array literal / pattern.
    Empty,

    // Expressions
    Ident { name: String },
    Lit(Lit),
    This,
    Super,
    /// `import.meta`, `new.target`
    MetaProperty { meta: String, property: String },
    Member {
        object: NodeId,
        property: NodeId,
        computed: bool,
        optional: bool,
    },
    /// `optional` marks `f?.()`. A member or call nested in an optional
    /// chain carries its own flag only where the `?.` is written.
    Call {
        callee: NodeId,
        args: Vec<NodeId>,
        is_new: bool,
        optional: bool,
    },
    /// `import(source)`
    ImportCall { source: NodeId },
    /// Outer end of an optional chain. `a?.b.c` short-circuits up to here,
    /// so `(a?.b).c` keeps its parentheses.
    Chain { expr: NodeId },
    Assign { op: String, target: NodeId, value: NodeId },
    Binary { op: String, left: NodeId, right: NodeId },
    Unary { op: String, arg: NodeId },
    Update { op: String, prefix: bool, arg: NodeId },
    Cond { test: NodeId, cons: NodeId, alt: NodeId },
    Seq { exprs: Vec<NodeId> },
    Array { elems: Vec<NodeId> },
    Object { props: Vec<NodeId> },
    Property {
        key: NodeId,
        value: NodeId,
        computed: bool,
        shorthand: bool,
        kind: PropKind,
    },
    Spread { arg: NodeId },
    Await { arg: NodeId },
    Yield { arg: Option<NodeId>, delegate: bool },
    /// Raw quasi text around each interpolated expression; there is always
    /// one more quasi than expressions.
    Template { quasis: Vec<String>, exprs: Vec<NodeId> },
    TaggedTemplate { tag: NodeId, quasi: NodeId },

    // Patterns
    ObjectPattern { props: Vec<NodeId> },
    ArrayPattern { elems: Vec<NodeId> },
    AssignPattern { target: NodeId, default: NodeId },
    Rest { arg: NodeId },
}

/// Expands `$f` over every child slot of `$node` in source order. Works for
/// both `&Node` and `&mut Node` thanks to default binding modes.
macro_rules! for_each_slot {
    ($node:expr, $f:ident) => {
        match $node {
            Node::Program { body } | Node::Block { body } => {
                for c in body {
                    $f(c);
                }
            }
            Node::Import { specifiers, .. } => {
                for c in specifiers {
                    $f(c);
                }
            }
            Node::ImportSpecifier { local, .. } | Node::ImportNamespace { local } => $f(local),
            Node::ExportNamed { declaration, specifiers, .. } => {
                if let Some(c) = declaration {
                    $f(c);
                }
                for c in specifiers {
                    $f(c);
                }
            }
            Node::ExportSpecifier { local, .. } => $f(local),
            Node::ExportDefault { value } => $f(value),
            Node::VarDecl { declarators, .. } => {
                for c in declarators {
                    $f(c);
                }
            }
            Node::Declarator { id, init } => {
                $f(id);
                if let Some(c) = init {
                    $f(c);
                }
            }
            Node::Function { id, params, body, .. } => {
                if let Some(c) = id {
                    $f(c);
                }
                for c in params {
                    $f(c);
                }
                $f(body);
            }
            Node::Class { id, super_class, members, .. } => {
                if let Some(c) = id {
                    $f(c);
                }
                if let Some(c) = super_class {
                    $f(c);
                }
                for c in members {
                    $f(c);
                }
            }
            Node::ClassMember { key, value, .. } => {
                $f(key);
                if let Some(c) = value {
                    $f(c);
                }
            }
            Node::ExprStmt { expr } => $f(expr),
            Node::Return { arg } => {
                if let Some(c) = arg {
                    $f(c);
                }
            }
            Node::If { test, cons, alt } => {
                $f(test);
                $f(cons);
                if let Some(c) = alt {
                    $f(c);
                }
            }
            Node::Throw { arg }
            | Node::Unary { arg, .. }
            | Node::Update { arg, .. }
            | Node::Await { arg } => $f(arg),
            Node::For { init, test, update, body } => {
                if let Some(c) = init {
                    $f(c);
                }
                if let Some(c) = test {
                    $f(c);
                }
                if let Some(c) = update {
                    $f(c);
                }
                $f(body);
            }
            Node::ForIn { left, right, body, .. } => {
                $f(left);
                $f(right);
                $f(body);
            }
            Node::While { test, body } => {
                $f(test);
                $f(body);
            }
            Node::DoWhile { body, test } => {
                $f(body);
                $f(test);
            }
            Node::Try { block, handler, finalizer } => {
                $f(block);
                if let Some(c) = handler {
                    $f(c);
                }
                if let Some(c) = finalizer {
                    $f(c);
                }
            }
            Node::Catch { param, body } => {
                if let Some(c) = param {
                    $f(c);
                }
                $f(body);
            }
            Node::Switch { discriminant, cases } => {
                $f(discriminant);
                for c in cases {
                    $f(c);
                }
            }
            Node::SwitchCase { test, body } => {
                if let Some(c) = test {
                    $f(c);
                }
                for c in body {
                    $f(c);
                }
            }
            Node::Labeled { body, .. } => $f(body),
            Node::Yield { arg, .. } => {
                if let Some(c) = arg {
                    $f(c);
                }
            }
            Node::Template { exprs, .. } => {
                for c in exprs {
                    $f(c);
                }
            }
            Node::TaggedTemplate { tag, quasi } => {
                $f(tag);
                $f(quasi);
            }
            Node::ImportCall { source } => $f(source),
            Node::Chain { expr } => $f(expr),
            Node::Member { object, property, .. } => {
                $f(object);
                $f(property);
            }
            Node::Call { callee, args, .. } => {
                $f(callee);
                for c in args {
                    $f(c);
                }
            }
            Node::Assign { target, value, .. } => {
                $f(target);
                $f(value);
            }
            Node::Binary { left, right, .. } => {
                $f(left);
                $f(right);
            }
            Node::Cond { test, cons, alt } => {
                $f(test);
                $f(cons);
                $f(alt);
            }
            Node::Seq { exprs } => {
                for c in exprs {
                    $f(c);
                }
            }
            Node::Array { elems } | Node::ArrayPattern { elems } => {
                for c in elems {
                    $f(c);
                }
            }
            Node::Object { props } | Node::ObjectPattern { props } => {
                for c in props {
                    $f(c);
                }
            }
            Node::Property { key, value, .. } => {
                $f(key);
                $f(value);
            }
            Node::Spread { arg } | Node::Rest { arg } => $f(arg),
            Node::AssignPattern { target, default } => {
                $f(target);
                $f(default);
            }
            Node::ExportNamespace { .. }
            | Node::ExportAll { .. }
            | Node::Break { .. }
            | Node::Continue { .. }
            | Node::Debugger
            | Node::Empty
            | Node::Ident { .. }
            | Node::Lit(_)
            | Node::This
            | Node::Super
            | Node::MetaProperty { .. } => {}
        }
    };
}

fn take_from(list: &mut Vec<NodeId>, child: NodeId) -> bool {
    let before = list.len();
    list.retain(|&c| c != child);
    list.len() != before
}

fn take_opt(slot: &mut Option<NodeId>, child: NodeId) -> bool {
    if *slot == Some(child) {
        *slot = None;
        true
    } else {
        false
    }
}

impl Node {
    /// Child ids in source order.
    pub fn children(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut push = |c: &NodeId| out.push(*c);
        for_each_slot!(self, push);
        out
    }

    pub fn is_ident(&self) -> bool {
        matches!(self, Self::Ident { .. })
    }

    pub fn ident_name(&self) -> Option<&str> {
        match self {
            Self::Ident { name } => Some(name),
            _ => None,
        }
    }

    pub fn str_value(&self) -> Option<&str> {
        match self {
            Self::Lit(Lit::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Detaches `child` from a slot that may legally be emptied.
    ///
    /// Returns `false` when the child sits in a required slot; the caller
    /// then has to remove this node instead.
    fn remove_child(&mut self, child: NodeId) -> bool {
        match self {
            Self::Program { body } | Self::Block { body } => take_from(body, child),
            Self::Import { specifiers, .. } => take_from(specifiers, child),
            Self::ExportNamed {
                declaration,
                specifiers,
                ..
            } => take_opt(declaration, child) || take_from(specifiers, child),
            Self::VarDecl { declarators, .. } => take_from(declarators, child),
            Self::Class { members, .. } => take_from(members, child),
            Self::Return { arg } => take_opt(arg, child),
            Self::If { alt, .. } => take_opt(alt, child),
            Self::For { init, test, update, .. } => {
                take_opt(init, child) || take_opt(test, child) || take_opt(update, child)
            }
            // A try statement needs a handler or a finalizer.
            Self::Try {
                handler, finalizer, ..
            } => {
                (finalizer.is_some() && take_opt(handler, child))
                    || (handler.is_some() && take_opt(finalizer, child))
            }
            Self::Switch { cases, .. } => take_from(cases, child),
            Self::SwitchCase { body, .. } => take_from(body, child),
            Self::Yield { arg, .. } => take_opt(arg, child),
            Self::Seq { exprs } => take_from(exprs, child),
            Self::Object { props } | Self::ObjectPattern { props } => take_from(props, child),
            _ => false,
        }
    }

    fn replace_child(&mut self, old: NodeId, new: NodeId) -> bool {
        let mut replaced = false;
        let mut swap = |c: &mut NodeId| {
            if *c == old && !replaced {
                *c = new;
                replaced = true;
            }
        };
        for_each_slot!(self, swap);
        replaced
    }

    /// Containers that make no sense once their last child is gone.
    fn is_dangling(&self) -> bool {
        match self {
            Self::VarDecl { declarators, .. } => declarators.is_empty(),
            Self::Import { specifiers, .. } => specifiers.is_empty(),
            Self::ExportNamed {
                declaration: None,
                specifiers,
                ..
            } => specifiers.is_empty(),
            Self::Seq { exprs } => exprs.is_empty(),
            _ => false,
        }
    }
}

/// A parsed module: the node arena plus its parent links and tombstones.
#[derive(Debug, Clone)]
pub struct Module {
    nodes: Vec<Node>,
    parents: Vec<Option<NodeId>>,
    removed: Vec<bool>,
    /// Source file name, used for logging and env-strip gating.
    pub filename: String,
    /// Output of an earlier evaluation step. Forwarded untouched.
    pub metadata: Option<serde_json::Value>,
}

impl Module {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            nodes: vec![Node::Program { body: Vec::new() }],
            parents: vec![None],
            removed: vec![false],
            filename: filename.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Adds a node whose children have already been allocated.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        for child in node.children() {
            self.parents[child.index()] = Some(id);
        }
        self.nodes.push(node);
        self.parents.push(None);
        self.removed.push(false);
        id
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body().is_empty()
    }

    /// Live top-level statements.
    pub fn body(&self) -> &[NodeId] {
        match &self.nodes[0] {
            Node::Program { body } => body,
            _ => &[],
        }
    }

    pub fn ident_name(&self, id: NodeId) -> Option<&str> {
        self.node(id).ident_name()
    }

    #[inline]
    pub fn is_removed(&self, id: NodeId) -> bool {
        self.removed[id.index()]
    }

    /// `true` when `node` is `outer` itself or lies inside it.
    pub fn contains(&self, outer: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == outer {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    /// Pre-order walk of the subtree rooted at `id`, including `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            let children = self.node(next).children();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    pub fn append(&mut self, stmt: NodeId) {
        self.parents[stmt.index()] = Some(self.root());
        if let Node::Program { body } = &mut self.nodes[0] {
            body.push(stmt);
        }
    }

    pub fn prepend(&mut self, stmt: NodeId) {
        self.parents[stmt.index()] = Some(self.root());
        if let Node::Program { body } = &mut self.nodes[0] {
            body.insert(0, stmt);
        }
    }

    /// Removes `id` from the tree, climbing to the nearest ancestor that can
    /// be detached when `id` sits in a required slot, and dropping containers
    /// that are left empty. Returns every node tombstoned by the call.
    pub fn remove(&mut self, id: NodeId) -> Vec<NodeId> {
        let mut removed = Vec::new();
        if id == self.root() || self.is_removed(id) {
            return removed;
        }

        let mut target = id;
        while let Some(parent) = self.parent(target) {
            if self.nodes[parent.index()].remove_child(target) {
                removed.extend(self.tombstone(target));
                if parent != self.root() && self.nodes[parent.index()].is_dangling() {
                    target = parent;
                    continue;
                }
                break;
            }
            if parent == self.root() {
                break;
            }
            target = parent;
        }
        removed
    }

    /// Puts `new` into the slot held by `old` and tombstones `old`.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.parent(old) else {
            return Vec::new();
        };
        if !self.nodes[parent.index()].replace_child(old, new) {
            return Vec::new();
        }
        self.parents[new.index()] = Some(parent);
        self.tombstone(old)
    }

    /// Turns `id` into a childless node in place. The id stays valid; the
    /// old children are tombstoned and returned.
    pub fn overwrite_leaf(&mut self, id: NodeId, leaf: Node) -> Vec<NodeId> {
        debug_assert!(leaf.children().is_empty());
        let mut dropped = Vec::new();
        for child in self.node(id).children() {
            dropped.extend(self.tombstone(child));
        }
        self.nodes[id.index()] = leaf;
        dropped
    }

    fn tombstone(&mut self, id: NodeId) -> Vec<NodeId> {
        let subtree = self.descendants(id);
        for &n in &subtree {
            self.removed[n.index()] = true;
        }
        subtree
    }

    /// Generates an identifier that collides with no name in the module.
    pub fn generate_uid(&self, hint: &str) -> String {
        let taken: HashSet<&str> = self
            .nodes
            .iter()
            .filter_map(Node::ident_name)
            .collect();

        let mut base: String = hint
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '$' { c } else { '_' })
            .collect();
        if base.is_empty() {
            base.push_str("temp");
        }
        let base = format!("_{}", base.trim_start_matches('_'));

        if !taken.contains(base.as_str()) {
            return base;
        }
        let mut i = 2;
        loop {
            let candidate = format!("{}{}", base, i);
            if !taken.contains(candidate.as_str()) {
                return candidate;
            }
            i += 1;
        }
    }

    /// Binding identifiers introduced by a declaration pattern.
    pub fn pattern_idents(&self, pattern: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![pattern];
        while let Some(id) = stack.pop() {
            match self.node(id) {
                Node::Ident { .. } => out.push(id),
                Node::ObjectPattern { props } => {
                    for &p in props.iter().rev() {
                        match self.node(p) {
                            Node::Property { value, .. } => stack.push(*value),
                            Node::Rest { arg } => stack.push(*arg),
                            _ => {}
                        }
                    }
                }
                Node::ArrayPattern { elems } => stack.extend(elems.iter().rev()),
                Node::AssignPattern { target, .. } => stack.push(*target),
                Node::Rest { arg } => stack.push(*arg),
                _ => {}
            }
        }
        out
    }

    /// Static name of a member access: `a.b` and `a["b"]` both give `"b"`.
    pub fn member_name(&self, member: NodeId) -> Option<&str> {
        match self.node(member) {
            Node::Member {
                property,
                computed: false,
                ..
            } => self.ident_name(*property),
            Node::Member {
                property,
                computed: true,
                ..
            } => self.node(*property).str_value(),
            _ => None,
        }
    }

    /// Number of live (non-tombstoned) nodes.
    pub fn live_count(&self) -> usize {
        self.removed.iter().filter(|r| !**r).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_single_declarator_drops_declaration() {
        let mut b = ModuleBuilder::new("a.js");
        let one = b.num(1.0);
        let decl = b.const_decl("a", one);
        b.push(decl);
        let mut module = b.finish();

        let removed = module.remove(one);
        assert!(removed.contains(&decl));
        assert!(module.is_empty());
        assert!(module.is_removed(one));
    }

    #[test]
    fn test_remove_one_of_many_declarators() {
        let mut b = ModuleBuilder::new("a.js");
        let one = b.num(1.0);
        let two = b.num(2.0);
        let first = b.declarator("a", Some(one));
        let second = b.declarator("b", Some(two));
        let decl = b.var_decl(VarKind::Let, vec![first, second]);
        b.push(decl);
        let mut module = b.finish();

        module.remove(second);
        assert!(!module.is_removed(decl));
        assert_eq!(print_module(&module), "let a = 1;\n");
    }

    #[test]
    fn test_replace_keeps_parent_link() {
        let mut b = ModuleBuilder::new("a.js");
        let x = b.ident("x");
        let stmt = b.expr_stmt(x);
        b.push(stmt);
        let mut module = b.finish();

        let y = module.alloc(Node::Ident { name: "y".into() });
        module.replace(x, y);
        assert_eq!(module.parent(y), Some(stmt));
        assert!(module.is_removed(x));
        assert_eq!(print_module(&module), "y;\n");
    }

    #[test]
    fn test_generate_uid_avoids_collisions() {
        let mut b = ModuleBuilder::new("a.js");
        let taken = b.ident("_foo");
        let stmt = b.expr_stmt(taken);
        b.push(stmt);
        let module = b.finish();

        assert_eq!(module.generate_uid("foo"), "_foo2");
        assert_eq!(module.generate_uid("bar"), "_bar");
        assert_eq!(module.generate_uid("my-name"), "_my_name");
    }

    #[test]
    fn test_pattern_idents_nested() {
        let mut b = ModuleBuilder::new("a.js");
        let x = b.ident("x");
        let y = b.ident("y");
        let rest = b.ident("rest");
        let inner = b.array_pattern(vec![y]);
        let rest_el = b.rest(rest);
        let prop_x = b.pattern_prop("x", x);
        let prop_inner = b.pattern_prop("inner", inner);
        let pattern = b.object_pattern(vec![prop_x, prop_inner, rest_el]);
        let module = b.finish();

        assert_eq!(module.pattern_idents(pattern), vec![x, y, rest]);
    }
}
