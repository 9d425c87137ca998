//! Scope analysis and the binding/reference graph.
//!
//! [`ReferenceGraph::analyze`] walks a [`Module`] twice: the first pass
//! creates scopes and declares bindings (so hoisted names resolve regardless
//! of source order), the second classifies every identifier as a reference,
//! a write, a declaration or a plain name and resolves it through the scope
//! chain. Unresolved identifiers are recorded as globals.
//!
//! The graph is a snapshot. It is never patched in place; callers that
//! mutate the module rebuild it, and the eliminator discounts removed and
//! severed sites through its own shadow state.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::ast::{FnKind, Module, Node, NodeId, VarKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(u32);

impl BindingId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    Function,
    Block,
    Class,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Var,
    Let,
    Const,
    Function,
    Class,
    Param,
    Import,
}

impl From<VarKind> for BindingKind {
    fn from(kind: VarKind) -> Self {
        match kind {
            VarKind::Var => Self::Var,
            VarKind::Let => Self::Let,
            VarKind::Const => Self::Const,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    /// Node that opened the scope.
    pub node: NodeId,
    names: HashMap<String, BindingId>,
}

/// A declared name and every site that reads or writes it.
#[derive(Debug, Clone)]
pub struct Binding {
    pub name: String,
    pub kind: BindingKind,
    pub scope: ScopeId,
    /// The declaring identifier.
    pub identifier: NodeId,
    /// The declaring construct: declarator, function, class, import
    /// specifier, or the parameter pattern root.
    pub path: NodeId,
    /// Identifiers in read position, in source order. Targets of `+=` and
    /// `++` are listed here and in `writes`.
    pub references: Vec<NodeId>,
    /// Assignment and update targets, plus redeclarations.
    pub writes: Vec<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ctx {
    Read,
    Write,
    /// `a += 1`, `a++`
    ReadWrite,
    Declare,
}

#[derive(Debug, Clone)]
pub struct ReferenceGraph {
    scopes: Vec<Scope>,
    bindings: Vec<Binding>,
    /// Scope opened by a function, class, block or the program.
    scope_of: HashMap<NodeId, ScopeId>,
    /// Identifier -> binding it declares, reads or writes.
    ident_binding: HashMap<NodeId, BindingId>,
    declared_by: HashMap<NodeId, Vec<BindingId>>,
    declaring: HashSet<NodeId>,
    globals: BTreeMap<String, Vec<NodeId>>,
}

impl ReferenceGraph {
    pub fn analyze(module: &Module) -> Self {
        let mut graph = Self {
            scopes: Vec::new(),
            bindings: Vec::new(),
            scope_of: HashMap::new(),
            ident_binding: HashMap::new(),
            declared_by: HashMap::new(),
            declaring: HashSet::new(),
            globals: BTreeMap::new(),
        };

        let root = module.root();
        let module_scope = graph.new_scope(ScopeKind::Module, None, root);
        for &stmt in module.body() {
            graph.declare(module, stmt, module_scope);
        }
        for &stmt in module.body() {
            graph.resolve(module, stmt, module_scope, Ctx::Read);
        }
        graph
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn module_scope(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    pub fn binding(&self, id: BindingId) -> &Binding {
        &self.bindings[id.index()]
    }

    pub fn bindings(&self) -> impl Iterator<Item = (BindingId, &Binding)> {
        self.bindings
            .iter()
            .enumerate()
            .map(|(i, b)| (BindingId(i as u32), b))
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Binding that `ident` declares, reads or writes.
    pub fn binding_of(&self, ident: NodeId) -> Option<BindingId> {
        self.ident_binding.get(&ident).copied()
    }

    /// Bindings introduced by a declarator, function, class, import
    /// specifier or parameter pattern.
    pub fn bindings_declared_by(&self, node: NodeId) -> &[BindingId] {
        self.declared_by.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn binding_declared_by(&self, node: NodeId) -> Option<BindingId> {
        self.bindings_declared_by(node).first().copied()
    }

    /// `true` for identifiers that introduce a binding.
    pub fn is_declaration(&self, ident: NodeId) -> bool {
        self.declaring.contains(&ident)
    }

    /// Resolves `name` through the scope chain starting at `scope`.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<BindingId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = self.scope(id);
            if let Some(&b) = scope.names.get(name) {
                return Some(b);
            }
            current = scope.parent;
        }
        None
    }

    pub fn module_binding(&self, name: &str) -> Option<BindingId> {
        self.lookup(self.module_scope(), name)
    }

    pub fn references(&self, binding: BindingId) -> &[NodeId] {
        &self.binding(binding).references
    }

    pub fn writes(&self, binding: BindingId) -> &[NodeId] {
        &self.binding(binding).writes
    }

    /// Identifiers named `name` that resolve to no binding.
    pub fn globals(&self, name: &str) -> &[NodeId] {
        self.globals.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn global_names(&self) -> impl Iterator<Item = &str> {
        self.globals.keys().map(String::as_str)
    }

    /// `true` when `ident` is an unresolved (global) identifier.
    pub fn is_global(&self, module: &Module, ident: NodeId) -> bool {
        module.node(ident).is_ident()
            && !self.ident_binding.contains_key(&ident)
            && module
                .ident_name(ident)
                .is_some_and(|name| self.globals(name).contains(&ident))
    }

    // ------------------------------------------------------------------
    // Declaration pass
    // ------------------------------------------------------------------

    fn new_scope(&mut self, kind: ScopeKind, parent: Option<ScopeId>, node: NodeId) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            kind,
            parent,
            node,
            names: HashMap::new(),
        });
        self.scope_of.insert(node, id);
        id
    }

    fn function_scope(&self, mut scope: ScopeId) -> ScopeId {
        loop {
            let s = self.scope(scope);
            match (s.kind, s.parent) {
                (ScopeKind::Function | ScopeKind::Module, _) | (_, None) => return scope,
                (_, Some(parent)) => scope = parent,
            }
        }
    }

    fn add_binding(
        &mut self,
        scope: ScopeId,
        module: &Module,
        identifier: NodeId,
        kind: BindingKind,
        path: NodeId,
    ) {
        let Some(name) = module.ident_name(identifier) else {
            return;
        };
        self.declaring.insert(identifier);

        let existing = self.scopes[scope.0 as usize].names.get(name).copied();
        let id = match existing {
            Some(id) => {
                self.bindings[id.index()].writes.push(identifier);
                id
            }
            None => {
                let id = BindingId(self.bindings.len() as u32);
                self.bindings.push(Binding {
                    name: name.to_string(),
                    kind,
                    scope,
                    identifier,
                    path,
                    references: Vec::new(),
                    writes: Vec::new(),
                });
                self.scopes[scope.0 as usize].names.insert(name.to_string(), id);
                id
            }
        };
        self.ident_binding.insert(identifier, id);
        self.declared_by.entry(path).or_default().push(id);
    }

    fn declare(&mut self, module: &Module, id: NodeId, scope: ScopeId) {
        match module.node(id) {
            Node::Function {
                kind,
                id: name,
                params,
                body,
                ..
            } => {
                if let (FnKind::Declaration, Some(name)) = (kind, name) {
                    self.add_binding(scope, module, *name, BindingKind::Function, id);
                }
                let fscope = self.new_scope(ScopeKind::Function, Some(scope), id);
                if let (FnKind::Expression, Some(name)) = (kind, name) {
                    self.add_binding(fscope, module, *name, BindingKind::Function, id);
                }
                for &param in params {
                    for ident in module.pattern_idents(param) {
                        self.add_binding(fscope, module, ident, BindingKind::Param, param);
                    }
                    self.declare(module, param, fscope);
                }
                match module.node(*body) {
                    Node::Block { body: stmts } => {
                        self.scope_of.insert(*body, fscope);
                        for &stmt in stmts {
                            self.declare(module, stmt, fscope);
                        }
                    }
                    _ => self.declare(module, *body, fscope),
                }
            }
            Node::Class {
                id: name,
                super_class,
                members,
                is_declaration,
            } => {
                if let (true, Some(name)) = (is_declaration, name) {
                    self.add_binding(scope, module, *name, BindingKind::Class, id);
                }
                if let Some(sup) = super_class {
                    self.declare(module, *sup, scope);
                }
                let cscope = self.new_scope(ScopeKind::Class, Some(scope), id);
                if let (false, Some(name)) = (is_declaration, name) {
                    self.add_binding(cscope, module, *name, BindingKind::Class, id);
                }
                for &member in members {
                    self.declare(module, member, cscope);
                }
            }
            Node::Block { body } => {
                let bscope = self.new_scope(ScopeKind::Block, Some(scope), id);
                for &stmt in body {
                    self.declare(module, stmt, bscope);
                }
            }
            // `let` in a loop head and `let` in any case clause are scoped to
            // the statement, not to the enclosing block.
            Node::For { .. } | Node::ForIn { .. } | Node::Switch { .. } => {
                let bscope = self.new_scope(ScopeKind::Block, Some(scope), id);
                for child in module.node(id).children() {
                    self.declare(module, child, bscope);
                }
            }
            Node::Catch { param, body } => {
                let cscope = self.new_scope(ScopeKind::Block, Some(scope), id);
                if let Some(param) = param {
                    for ident in module.pattern_idents(*param) {
                        self.add_binding(cscope, module, ident, BindingKind::Param, *param);
                    }
                    self.declare(module, *param, cscope);
                }
                match module.node(*body) {
                    Node::Block { body: stmts } => {
                        self.scope_of.insert(*body, cscope);
                        for &stmt in stmts {
                            self.declare(module, stmt, cscope);
                        }
                    }
                    _ => self.declare(module, *body, cscope),
                }
            }
            Node::VarDecl { kind, declarators } => {
                let target = match kind {
                    VarKind::Var => self.function_scope(scope),
                    VarKind::Let | VarKind::Const => scope,
                };
                for &decl in declarators {
                    if let Node::Declarator { id: pattern, init } = module.node(decl) {
                        for ident in module.pattern_idents(*pattern) {
                            self.add_binding(target, module, ident, (*kind).into(), decl);
                        }
                        self.declare(module, *pattern, scope);
                        if let Some(init) = init {
                            self.declare(module, *init, scope);
                        }
                    }
                }
            }
            Node::Import { specifiers, .. } => {
                let module_scope = self.module_scope();
                for &spec in specifiers {
                    if let Node::ImportSpecifier { local, .. } | Node::ImportNamespace { local } =
                        module.node(spec)
                    {
                        self.add_binding(module_scope, module, *local, BindingKind::Import, spec);
                    }
                }
            }
            node => {
                for child in node.children() {
                    self.declare(module, child, scope);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Resolution pass
    // ------------------------------------------------------------------

    fn record(&mut self, module: &Module, ident: NodeId, scope: ScopeId, ctx: Ctx) {
        let Some(name) = module.ident_name(ident) else {
            return;
        };
        if ctx == Ctx::Declare || self.declaring.contains(&ident) {
            return;
        }
        match self.lookup(scope, name) {
            Some(b) => {
                self.ident_binding.insert(ident, b);
                let binding = &mut self.bindings[b.index()];
                match ctx {
                    Ctx::Write => binding.writes.push(ident),
                    Ctx::ReadWrite => {
                        binding.references.push(ident);
                        binding.writes.push(ident);
                    }
                    _ => binding.references.push(ident),
                }
            }
            None => self.globals.entry(name.to_string()).or_default().push(ident),
        }
    }

    fn resolve_all(&mut self, module: &Module, ids: &[NodeId], scope: ScopeId, ctx: Ctx) {
        for &id in ids {
            self.resolve(module, id, scope, ctx);
        }
    }

    /// Property keys are names unless computed.
    fn resolve_key(&mut self, module: &Module, key: NodeId, computed: bool, scope: ScopeId) {
        if computed {
            self.resolve(module, key, scope, Ctx::Read);
        }
    }

    fn resolve(&mut self, module: &Module, id: NodeId, scope: ScopeId, ctx: Ctx) {
        let scope = self.scope_of.get(&id).copied().unwrap_or(scope);
        match module.node(id) {
            Node::Ident { .. } => self.record(module, id, scope, ctx),
            Node::Function {
                id: name,
                params,
                body,
                ..
            } => {
                if let Some(name) = name {
                    self.resolve(module, *name, scope, Ctx::Declare);
                }
                self.resolve_all(module, params, scope, Ctx::Declare);
                match module.node(*body) {
                    Node::Block { body } => self.resolve_all(module, body, scope, Ctx::Read),
                    _ => self.resolve(module, *body, scope, Ctx::Read),
                }
            }
            Node::Class {
                super_class,
                members,
                ..
            } => {
                if let Some(sup) = super_class {
                    let outer = self.scope(scope).parent.unwrap_or(scope);
                    self.resolve(module, *sup, outer, Ctx::Read);
                }
                self.resolve_all(module, members, scope, Ctx::Read);
            }
            Node::ClassMember {
                key, value, computed, ..
            } => {
                self.resolve_key(module, *key, *computed, scope);
                if let Some(value) = value {
                    self.resolve(module, *value, scope, Ctx::Read);
                }
            }
            Node::Declarator { id: pattern, init } => {
                self.resolve(module, *pattern, scope, Ctx::Declare);
                if let Some(init) = init {
                    self.resolve(module, *init, scope, Ctx::Read);
                }
            }
            Node::Import { .. } => {}
            Node::ExportNamed {
                declaration,
                specifiers,
                source,
            } => {
                if let Some(decl) = declaration {
                    self.resolve(module, *decl, scope, Ctx::Read);
                }
                if source.is_none() {
                    for &spec in specifiers {
                        if let Node::ExportSpecifier { local, .. } = module.node(spec) {
                            self.resolve(module, *local, scope, Ctx::Read);
                        }
                    }
                }
            }
            Node::Member {
                object,
                property,
                computed,
                ..
            } => {
                self.resolve(module, *object, scope, Ctx::Read);
                self.resolve_key(module, *property, *computed, scope);
            }
            Node::Assign { op, target, value } => {
                let target_ctx = match module.node(*target) {
                    Node::Member { .. } => Ctx::Read,
                    _ if op != "=" => Ctx::ReadWrite,
                    _ => Ctx::Write,
                };
                self.resolve(module, *target, scope, target_ctx);
                self.resolve(module, *value, scope, Ctx::Read);
            }
            Node::Update { arg, .. } => {
                let ctx = if module.node(*arg).is_ident() {
                    Ctx::ReadWrite
                } else {
                    Ctx::Read
                };
                self.resolve(module, *arg, scope, ctx);
            }
            // `for (x of xs)` assigns `x`; a declaration head declares it.
            Node::ForIn { left, right, body, .. } => {
                let left_ctx = match module.node(*left) {
                    Node::VarDecl { .. } | Node::Member { .. } => Ctx::Read,
                    _ => Ctx::Write,
                };
                self.resolve(module, *left, scope, left_ctx);
                self.resolve(module, *right, scope, Ctx::Read);
                self.resolve(module, *body, scope, Ctx::Read);
            }
            Node::Property {
                key,
                value,
                computed,
                ..
            } => {
                self.resolve_key(module, *key, *computed, scope);
                self.resolve(module, *value, scope, ctx);
            }
            Node::ObjectPattern { props } => self.resolve_all(module, props, scope, ctx),
            Node::ArrayPattern { elems } => self.resolve_all(module, elems, scope, ctx),
            Node::Rest { arg } => self.resolve(module, *arg, scope, ctx),
            Node::AssignPattern { target, default } => {
                self.resolve(module, *target, scope, ctx);
                self.resolve(module, *default, scope, Ctx::Read);
            }
            node => {
                for child in node.children() {
                    self.resolve(module, child, scope, Ctx::Read);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ModuleBuilder;

    #[test]
    fn test_references_and_writes() {
        // let a = 1; a = 2; f(a);
        let mut b = ModuleBuilder::new("a.js");
        let one = b.num(1.0);
        let d = b.declarator("a", Some(one));
        let decl = b.var_decl(VarKind::Let, vec![d]);
        let a_write = b.ident("a");
        let two = b.num(2.0);
        let assign = b.assign(a_write, two);
        let assign_stmt = b.expr_stmt(assign);
        let f = b.ident("f");
        let a_read = b.ident("a");
        let call = b.call(f, vec![a_read]);
        let call_stmt = b.expr_stmt(call);
        b.push(decl).push(assign_stmt).push(call_stmt);
        let module = b.finish();

        let graph = ReferenceGraph::analyze(&module);
        let binding = graph.module_binding("a").unwrap();
        assert_eq!(graph.references(binding), &[a_read]);
        assert_eq!(graph.writes(binding), &[a_write]);
        assert_eq!(graph.binding(binding).path, d);
        assert_eq!(graph.globals("f"), &[f]);
    }

    #[test]
    fn test_member_property_is_not_a_reference() {
        // const x = 1; obj.x;
        let mut b = ModuleBuilder::new("a.js");
        let one = b.num(1.0);
        let decl = b.const_decl("x", one);
        let obj = b.ident("obj");
        let member = b.member(obj, "x");
        let stmt = b.expr_stmt(member);
        b.push(decl).push(stmt);
        let module = b.finish();

        let graph = ReferenceGraph::analyze(&module);
        let x = graph.module_binding("x").unwrap();
        assert!(graph.references(x).is_empty());
        assert_eq!(graph.globals("obj").len(), 1);
    }

    #[test]
    fn test_shadowing_param_and_hoisted_function() {
        // use(); function use() {} function g(use) { return use; }
        let mut b = ModuleBuilder::new("a.js");
        let callee = b.ident("use");
        let call = b.call(callee, vec![]);
        let call_stmt = b.expr_stmt(call);
        let f = b.function_decl("use", &[], vec![]);
        let inner = b.ident("use");
        let ret = b.ret(Some(inner));
        let g = b.function_decl("g", &["use"], vec![ret]);
        b.push(call_stmt).push(f).push(g);
        let module = b.finish();

        let graph = ReferenceGraph::analyze(&module);
        let outer = graph.module_binding("use").unwrap();
        assert_eq!(graph.references(outer), &[callee]);
        assert_eq!(graph.binding(outer).kind, BindingKind::Function);

        let param = graph.binding_of(inner).unwrap();
        assert_ne!(param, outer);
        assert_eq!(graph.binding(param).kind, BindingKind::Param);
    }

    #[test]
    fn test_block_scoped_let_and_function_scoped_var() {
        // { let a = 1; var b = 2; } a; b;
        let mut b = ModuleBuilder::new("a.js");
        let one = b.num(1.0);
        let two = b.num(2.0);
        let let_a = b.const_decl("a", one);
        let db = b.declarator("b", Some(two));
        let var_b = b.var_decl(VarKind::Var, vec![db]);
        let block = b.block(vec![let_a, var_b]);
        let a = b.ident("a");
        let a_stmt = b.expr_stmt(a);
        let b_ref = b.ident("b");
        let b_stmt = b.expr_stmt(b_ref);
        b.push(block).push(a_stmt).push(b_stmt);
        let module = b.finish();

        let graph = ReferenceGraph::analyze(&module);
        assert!(graph.module_binding("a").is_none());
        assert_eq!(graph.globals("a"), &[a]);
        let var_binding = graph.module_binding("b").unwrap();
        assert_eq!(graph.references(var_binding), &[b_ref]);
    }

    #[test]
    fn test_import_bindings_and_reexport_locals() {
        // import { a as b } from "./x"; export { c } from "./y"; b;
        let mut b = ModuleBuilder::new("a.js");
        let imp = b.import_named("./x", &[("a", "b")]);
        let reexport = b.export_from("./y", &[("c", "c")]);
        let use_b = b.ident("b");
        let stmt = b.expr_stmt(use_b);
        b.push(imp).push(reexport).push(stmt);
        let module = b.finish();

        let graph = ReferenceGraph::analyze(&module);
        let binding = graph.module_binding("b").unwrap();
        assert_eq!(graph.binding(binding).kind, BindingKind::Import);
        assert_eq!(graph.references(binding), &[use_b]);
        assert!(graph.globals("c").is_empty());
    }

    #[test]
    fn test_destructuring_assignment_targets_are_writes() {
        // let x; ({ x } = obj);
        let mut b = ModuleBuilder::new("a.js");
        let decl = b.uninit_decl(VarKind::Let, "x");
        let x = b.ident("x");
        let prop = b.pattern_prop("x", x);
        let pattern = b.object_pattern(vec![prop]);
        let obj = b.ident("obj");
        let assign = b.assign(pattern, obj);
        let stmt = b.expr_stmt(assign);
        b.push(decl).push(stmt);
        let module = b.finish();

        let graph = ReferenceGraph::analyze(&module);
        let binding = graph.module_binding("x").unwrap();
        assert_eq!(graph.writes(binding), &[x]);
        assert!(graph.references(binding).is_empty());
    }

    #[test]
    fn test_compound_assignment_and_update_read_and_write() {
        // let c = 0; c += 1; c++;
        let mut b = ModuleBuilder::new("a.js");
        let zero = b.num(0.0);
        let d = b.declarator("c", Some(zero));
        let decl = b.var_decl(VarKind::Let, vec![d]);
        let target = b.ident("c");
        let one = b.num(1.0);
        let compound = b.assign_op("+=", target, one);
        let s1 = b.expr_stmt(compound);
        let arg = b.ident("c");
        let update = b.update("++", false, arg);
        let s2 = b.expr_stmt(update);
        b.push(decl).push(s1).push(s2);
        let module = b.finish();

        let graph = ReferenceGraph::analyze(&module);
        let c = graph.module_binding("c").unwrap();
        assert_eq!(graph.references(c), &[target, arg]);
        assert_eq!(graph.writes(c), &[target, arg]);
    }

    #[test]
    fn test_loop_head_let_and_catch_param_are_scoped() {
        // for (let i = 0; ; ) {} i;  try {} catch (e) { e; } e;
        let mut b = ModuleBuilder::new("a.js");
        let zero = b.num(0.0);
        let di = b.declarator("i", Some(zero));
        let init = b.var_decl(VarKind::Let, vec![di]);
        let body = b.block(vec![]);
        let for_stmt = b.for_stmt(Some(init), None, None, body);
        let outer_i = b.ident("i");
        let s1 = b.expr_stmt(outer_i);
        let inner_e = b.ident("e");
        let use_e = b.expr_stmt(inner_e);
        let try_stmt = b.try_catch(vec![], Some("e"), vec![use_e]);
        let outer_e = b.ident("e");
        let s2 = b.expr_stmt(outer_e);
        b.push(for_stmt).push(s1).push(try_stmt).push(s2);
        let module = b.finish();

        let graph = ReferenceGraph::analyze(&module);
        assert!(graph.module_binding("i").is_none());
        assert_eq!(graph.globals("i"), &[outer_i]);
        assert_eq!(graph.globals("e"), &[outer_e]);
        let param = graph.binding_of(inner_e).unwrap();
        assert_eq!(graph.binding(param).kind, BindingKind::Param);
    }

    #[test]
    fn test_for_of_head_assigns_outer_binding() {
        // let k; for (k of list) {}
        let mut b = ModuleBuilder::new("a.js");
        let decl = b.uninit_decl(VarKind::Let, "k");
        let k = b.ident("k");
        let list = b.ident("list");
        let body = b.block(vec![]);
        let loop_stmt = b.for_of(k, list, body);
        b.push(decl).push(loop_stmt);
        let module = b.finish();

        let graph = ReferenceGraph::analyze(&module);
        let binding = graph.module_binding("k").unwrap();
        assert_eq!(graph.writes(binding), &[k]);
        assert!(graph.references(binding).is_empty());
    }
}
