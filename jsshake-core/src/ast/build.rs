//! Programmatic module construction.
//!
//! Children are always allocated before their parents, so every method
//! takes already-built [`NodeId`]s and returns the id of the new node.
//! Top-level statements are attached with [`ModuleBuilder::push`].

use super::{FnKind, Lit, Module, Node, NodeId, PropKind, VarKind};

/// Fluent builder over a [`Module`] arena.
///
/// ```rust,ignore
/// let mut b = ModuleBuilder::new("util.js");
/// let init = b.num(1.0);
/// let decl = b.const_decl("answer", init);
/// let export = b.export_decl(decl);
/// b.push(export);
/// let module = b.finish();
/// ```
#[derive(Debug)]
pub struct ModuleBuilder {
    module: Module,
}

impl ModuleBuilder {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            module: Module::new(filename),
        }
    }

    pub fn node(&mut self, node: Node) -> NodeId {
        self.module.alloc(node)
    }

    /// Appends a top-level statement.
    pub fn push(&mut self, stmt: NodeId) -> &mut Self {
        self.module.append(stmt);
        self
    }

    pub fn finish(self) -> Module {
        self.module
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    pub fn ident(&mut self, name: &str) -> NodeId {
        self.node(Node::Ident { name: name.to_string() })
    }

    pub fn str(&mut self, value: &str) -> NodeId {
        self.node(Node::Lit(Lit::Str(value.to_string())))
    }

    pub fn num(&mut self, value: f64) -> NodeId {
        self.node(Node::Lit(Lit::Num(value)))
    }

    pub fn bool(&mut self, value: bool) -> NodeId {
        self.node(Node::Lit(Lit::Bool(value)))
    }

    pub fn null(&mut self) -> NodeId {
        self.node(Node::Lit(Lit::Null))
    }

    pub fn this(&mut self) -> NodeId {
        self.node(Node::This)
    }

    /// `object.name`
    pub fn member(&mut self, object: NodeId, name: &str) -> NodeId {
        let property = self.ident(name);
        self.node(Node::Member {
            object,
            property,
            computed: false,
            optional: false,
        })
    }

    /// `object[property]`
    pub fn member_computed(&mut self, object: NodeId, property: NodeId) -> NodeId {
        self.node(Node::Member {
            object,
            property,
            computed: true,
            optional: false,
        })
    }

    /// `a.b.c` from a dotted path.
    pub fn path(&mut self, dotted: &str) -> NodeId {
        let mut parts = dotted.split('.');
        let first = parts.next().unwrap_or_default();
        let mut expr = self.ident(first);
        for part in parts {
            expr = self.member(expr, part);
        }
        expr
    }

    pub fn call(&mut self, callee: NodeId, args: Vec<NodeId>) -> NodeId {
        self.node(Node::Call {
            callee,
            args,
            is_new: false,
            optional: false,
        })
    }

    pub fn new_expr(&mut self, callee: NodeId, args: Vec<NodeId>) -> NodeId {
        self.node(Node::Call {
            callee,
            args,
            is_new: true,
            optional: false,
        })
    }

    /// `require("source")`
    pub fn require(&mut self, source: &str) -> NodeId {
        let callee = self.ident("require");
        let arg = self.str(source);
        self.call(callee, vec![arg])
    }

    pub fn assign(&mut self, target: NodeId, value: NodeId) -> NodeId {
        self.assign_op("=", target, value)
    }

    pub fn assign_op(&mut self, op: &str, target: NodeId, value: NodeId) -> NodeId {
        self.node(Node::Assign {
            op: op.to_string(),
            target,
            value,
        })
    }

    pub fn binary(&mut self, op: &str, left: NodeId, right: NodeId) -> NodeId {
        self.node(Node::Binary {
            op: op.to_string(),
            left,
            right,
        })
    }

    pub fn unary(&mut self, op: &str, arg: NodeId) -> NodeId {
        self.node(Node::Unary {
            op: op.to_string(),
            arg,
        })
    }

    pub fn update(&mut self, op: &str, prefix: bool, arg: NodeId) -> NodeId {
        self.node(Node::Update {
            op: op.to_string(),
            prefix,
            arg,
        })
    }

    pub fn cond(&mut self, test: NodeId, cons: NodeId, alt: NodeId) -> NodeId {
        self.node(Node::Cond { test, cons, alt })
    }

    pub fn seq(&mut self, exprs: Vec<NodeId>) -> NodeId {
        self.node(Node::Seq { exprs })
    }

    pub fn array(&mut self, elems: Vec<NodeId>) -> NodeId {
        self.node(Node::Array { elems })
    }

    pub fn object(&mut self, props: Vec<NodeId>) -> NodeId {
        self.node(Node::Object { props })
    }

    /// `key: value`
    pub fn prop(&mut self, key: &str, value: NodeId) -> NodeId {
        let key = self.ident(key);
        self.node(Node::Property {
            key,
            value,
            computed: false,
            shorthand: false,
            kind: PropKind::Init,
        })
    }

    /// `{ name }`
    pub fn shorthand_prop(&mut self, name: &str) -> NodeId {
        let key = self.ident(name);
        let value = self.ident(name);
        self.node(Node::Property {
            key,
            value,
            computed: false,
            shorthand: true,
            kind: PropKind::Init,
        })
    }

    pub fn spread(&mut self, arg: NodeId) -> NodeId {
        self.node(Node::Spread { arg })
    }

    /// `(params) => body` where `body` is an expression or a block.
    pub fn arrow(&mut self, params: &[&str], body: NodeId) -> NodeId {
        let params = params.iter().map(|p| self.ident(p)).collect();
        self.node(Node::Function {
            kind: FnKind::Arrow,
            id: None,
            params,
            body,
            is_async: false,
            is_generator: false,
        })
    }

    pub fn function_expr(&mut self, name: Option<&str>, params: &[&str], body: Vec<NodeId>) -> NodeId {
        let id = name.map(|n| self.ident(n));
        let params = params.iter().map(|p| self.ident(p)).collect();
        let body = self.block(body);
        self.node(Node::Function {
            kind: FnKind::Expression,
            id,
            params,
            body,
            is_async: false,
            is_generator: false,
        })
    }

    // ------------------------------------------------------------------
    // Patterns
    // ------------------------------------------------------------------

    pub fn object_pattern(&mut self, props: Vec<NodeId>) -> NodeId {
        self.node(Node::ObjectPattern { props })
    }

    pub fn array_pattern(&mut self, elems: Vec<NodeId>) -> NodeId {
        self.node(Node::ArrayPattern { elems })
    }

    /// `key: value` inside an object pattern; `{ x }` when the value is an
    /// identifier named like the key.
    pub fn pattern_prop(&mut self, key: &str, value: NodeId) -> NodeId {
        let shorthand = self.module.ident_name(value) == Some(key);
        let key = self.ident(key);
        self.node(Node::Property {
            key,
            value,
            computed: false,
            shorthand,
            kind: PropKind::Init,
        })
    }

    /// `{ a, b, c }` destructuring pattern.
    pub fn object_pattern_of(&mut self, names: &[&str]) -> NodeId {
        let props = names
            .iter()
            .map(|n| {
                let value = self.ident(n);
                self.pattern_prop(n, value)
            })
            .collect();
        self.object_pattern(props)
    }

    pub fn assign_pattern(&mut self, target: NodeId, default: NodeId) -> NodeId {
        self.node(Node::AssignPattern { target, default })
    }

    pub fn rest(&mut self, arg: NodeId) -> NodeId {
        self.node(Node::Rest { arg })
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    pub fn expr_stmt(&mut self, expr: NodeId) -> NodeId {
        self.node(Node::ExprStmt { expr })
    }

    pub fn block(&mut self, body: Vec<NodeId>) -> NodeId {
        self.node(Node::Block { body })
    }

    pub fn ret(&mut self, arg: Option<NodeId>) -> NodeId {
        self.node(Node::Return { arg })
    }

    pub fn if_stmt(&mut self, test: NodeId, cons: NodeId, alt: Option<NodeId>) -> NodeId {
        self.node(Node::If { test, cons, alt })
    }

    pub fn throw(&mut self, arg: NodeId) -> NodeId {
        self.node(Node::Throw { arg })
    }

    pub fn for_stmt(
        &mut self,
        init: Option<NodeId>,
        test: Option<NodeId>,
        update: Option<NodeId>,
        body: NodeId,
    ) -> NodeId {
        self.node(Node::For {
            init,
            test,
            update,
            body,
        })
    }

    /// `for (left of right) body`
    pub fn for_of(&mut self, left: NodeId, right: NodeId, body: NodeId) -> NodeId {
        self.node(Node::ForIn {
            left,
            right,
            body,
            of: true,
            is_await: false,
        })
    }

    pub fn while_stmt(&mut self, test: NodeId, body: NodeId) -> NodeId {
        self.node(Node::While { test, body })
    }

    /// `try { block } catch (param) { handler }`
    pub fn try_catch(&mut self, block: Vec<NodeId>, param: Option<&str>, handler: Vec<NodeId>) -> NodeId {
        let block = self.block(block);
        let param = param.map(|p| self.ident(p));
        let body = self.block(handler);
        let handler = self.node(Node::Catch { param, body });
        self.node(Node::Try {
            block,
            handler: Some(handler),
            finalizer: None,
        })
    }

    pub fn declarator(&mut self, name: &str, init: Option<NodeId>) -> NodeId {
        let id = self.ident(name);
        self.node(Node::Declarator { id, init })
    }

    pub fn declarator_pattern(&mut self, pattern: NodeId, init: Option<NodeId>) -> NodeId {
        self.node(Node::Declarator { id: pattern, init })
    }

    pub fn var_decl(&mut self, kind: VarKind, declarators: Vec<NodeId>) -> NodeId {
        self.node(Node::VarDecl { kind, declarators })
    }

    /// `const name = init;`
    pub fn const_decl(&mut self, name: &str, init: NodeId) -> NodeId {
        let d = self.declarator(name, Some(init));
        self.var_decl(VarKind::Const, vec![d])
    }

    /// `let name;` / `var name;` without initializer.
    pub fn uninit_decl(&mut self, kind: VarKind, name: &str) -> NodeId {
        let d = self.declarator(name, None);
        self.var_decl(kind, vec![d])
    }

    pub fn function_decl(&mut self, name: &str, params: &[&str], body: Vec<NodeId>) -> NodeId {
        let id = Some(self.ident(name));
        let params = params.iter().map(|p| self.ident(p)).collect();
        let body = self.block(body);
        self.node(Node::Function {
            kind: FnKind::Declaration,
            id,
            params,
            body,
            is_async: false,
            is_generator: false,
        })
    }

    pub fn class_decl(&mut self, name: &str, super_class: Option<NodeId>, members: Vec<NodeId>) -> NodeId {
        let id = Some(self.ident(name));
        self.node(Node::Class {
            id,
            super_class,
            members,
            is_declaration: true,
        })
    }

    /// `name(params) { body }` inside a class body.
    pub fn method(&mut self, name: &str, params: &[&str], body: Vec<NodeId>) -> NodeId {
        let key = self.ident(name);
        let value = self.function_expr(None, params, body);
        self.node(Node::ClassMember {
            key,
            value: Some(value),
            computed: false,
            is_static: false,
            is_method: true,
            kind: PropKind::Init,
        })
    }

    // ------------------------------------------------------------------
    // Module declarations
    // ------------------------------------------------------------------

    /// `import { imported as local, ... } from "source"`
    pub fn import_named(&mut self, source: &str, names: &[(&str, &str)]) -> NodeId {
        let specifiers = names
            .iter()
            .map(|(imported, local)| {
                let local = self.ident(local);
                self.node(Node::ImportSpecifier {
                    imported: imported.to_string(),
                    local,
                })
            })
            .collect();
        self.node(Node::Import {
            source: source.to_string(),
            specifiers,
        })
    }

    /// `import local from "source"`
    pub fn import_default(&mut self, source: &str, local: &str) -> NodeId {
        self.import_named(source, &[("default", local)])
    }

    /// `import * as local from "source"`
    pub fn import_namespace(&mut self, source: &str, local: &str) -> NodeId {
        let local = self.ident(local);
        let spec = self.node(Node::ImportNamespace { local });
        self.node(Node::Import {
            source: source.to_string(),
            specifiers: vec![spec],
        })
    }

    /// `import "source"`
    pub fn import_bare(&mut self, source: &str) -> NodeId {
        self.node(Node::Import {
            source: source.to_string(),
            specifiers: Vec::new(),
        })
    }

    /// `export <declaration>`
    pub fn export_decl(&mut self, declaration: NodeId) -> NodeId {
        self.node(Node::ExportNamed {
            declaration: Some(declaration),
            specifiers: Vec::new(),
            source: None,
        })
    }

    fn export_specifiers(&mut self, names: &[(&str, &str)]) -> Vec<NodeId> {
        names
            .iter()
            .map(|(local, exported)| {
                let local = self.ident(local);
                self.node(Node::ExportSpecifier {
                    local,
                    exported: exported.to_string(),
                })
            })
            .collect()
    }

    /// `export { local as exported, ... }`
    pub fn export_named(&mut self, names: &[(&str, &str)]) -> NodeId {
        let specifiers = self.export_specifiers(names);
        self.node(Node::ExportNamed {
            declaration: None,
            specifiers,
            source: None,
        })
    }

    /// `export { local as exported, ... } from "source"`
    pub fn export_from(&mut self, source: &str, names: &[(&str, &str)]) -> NodeId {
        let specifiers = self.export_specifiers(names);
        self.node(Node::ExportNamed {
            declaration: None,
            specifiers,
            source: Some(source.to_string()),
        })
    }

    /// `export * from "source"`
    pub fn export_all(&mut self, source: &str) -> NodeId {
        self.node(Node::ExportAll {
            source: source.to_string(),
        })
    }

    /// `export * as exported from "source"`
    pub fn export_all_as(&mut self, source: &str, exported: &str) -> NodeId {
        let spec = self.node(Node::ExportNamespace {
            exported: exported.to_string(),
        });
        self.node(Node::ExportNamed {
            declaration: None,
            specifiers: vec![spec],
            source: Some(source.to_string()),
        })
    }

    /// `export default value`
    pub fn export_default(&mut self, value: NodeId) -> NodeId {
        self.node(Node::ExportDefault { value })
    }

    /// `exports.name = value;`
    pub fn cjs_export(&mut self, name: &str, value: NodeId) -> NodeId {
        let exports = self.ident("exports");
        let target = self.member(exports, name);
        let assign = self.assign(target, value);
        self.expr_stmt(assign)
    }
}
