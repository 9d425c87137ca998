//! Export/import collection.
//!
//! A single read-only walk over a module that records what it exports (and
//! which node defines each export), what it imports, what it forwards from
//! other modules, and whether it is recognisably an ES module.
//!
//! Both ES module syntax and the CommonJS shapes emitted by common
//! transpilers are understood:
//!
//! - `exports.x = v`, `module.exports.x = v`, `Object.defineProperty(exports, "x", ...)`
//! - `const x = require("s")`, `const { a, b: c } = require("s")`, `require("s").a`
//! - `require("s");` as a side-effect import
//! - `__exportStar(require("s"), exports)` as a wildcard re-export
//! - `exports.__esModule = true` / `Object.defineProperty(exports, "__esModule", ...)`
//!
//! Only unshadowed `exports`, `module` and `require` identifiers count.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::ast::{Module, Node, NodeId};
use crate::scope::ReferenceGraph;

/// Name under which something is exported.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ExportName {
    Named(String),
    /// `export * from "s"`
    Wildcard,
}

impl ExportName {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn as_named(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Wildcard => None,
        }
    }
}

impl fmt::Display for ExportName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Wildcard => f.write_str("*"),
        }
    }
}

/// What an import pulls out of its source module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Imported {
    Named(String),
    /// `import * as ns`, `const ns = require("s")`
    Namespace,
    /// `import "s"`, `require("s");`
    SideEffect,
}

impl fmt::Display for Imported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Namespace => f.write_str("*"),
            Self::SideEffect => f.write_str("side-effect"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportRecord {
    pub imported: Imported,
    pub source: String,
    /// Local identifier; for side-effect imports the import statement or the
    /// `require()` call.
    pub local: NodeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReexportRecord {
    pub exported: ExportName,
    pub imported: Imported,
    pub source: String,
    /// Specifier or statement that forwards the export.
    pub local: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleKind {
    EsModule,
    CommonJs,
    Unknown,
}

/// Export name -> defining node, in discovery order. A name is a key at
/// most once; several names may share a node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportMap {
    entries: Vec<(ExportName, NodeId)>,
}

impl ExportMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts unless the name is already present. Returns `true` when
    /// inserted.
    pub fn insert(&mut self, name: ExportName, node: NodeId) -> bool {
        if self.entries.iter().any(|(n, _)| *n == name) {
            return false;
        }
        self.entries.push((name, node));
        true
    }

    /// Points an existing name at a new node, or inserts it.
    pub fn set(&mut self, name: ExportName, node: NodeId) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = node,
            None => self.entries.push((name, node)),
        }
    }

    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.entries
            .iter()
            .find(|(n, _)| n.as_named() == Some(name))
            .map(|(_, node)| *node)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ExportName, NodeId)> {
        self.entries.iter().map(|(n, node)| (n, *node))
    }

    pub fn names(&self) -> impl Iterator<Item = &ExportName> {
        self.entries.iter().map(|(n, _)| n)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything the collector learned about one module.
#[derive(Debug, Clone)]
pub struct Collected {
    pub exports: ExportMap,
    /// CommonJS export name -> every `exports.name` member site.
    pub export_refs: BTreeMap<String, Vec<NodeId>>,
    pub imports: Vec<ImportRecord>,
    pub reexports: Vec<ReexportRecord>,
    pub kind: ModuleKind,
}

impl Collected {
    /// Names of everything imported by name, used by the alias heuristic.
    pub fn imported_names(&self) -> impl Iterator<Item = &str> {
        self.imports.iter().filter_map(|i| match &i.imported {
            Imported::Named(name) => Some(name.as_str()),
            _ => None,
        })
    }
}

/// Collects exports, imports and re-exports of `module`.
pub fn collect(module: &Module, graph: &ReferenceGraph) -> Collected {
    let mut c = Collector {
        module,
        graph,
        out: Collected {
            exports: ExportMap::new(),
            export_refs: BTreeMap::new(),
            imports: Vec::new(),
            reexports: Vec::new(),
            kind: ModuleKind::Unknown,
        },
        es_module: false,
        common_js: false,
    };

    for &stmt in module.body() {
        c.statement(stmt);
    }
    c.common_js_exports();
    c.requires();

    c.out.kind = if c.es_module {
        ModuleKind::EsModule
    } else if c.common_js {
        ModuleKind::CommonJs
    } else {
        ModuleKind::Unknown
    };
    c.out
}

struct Collector<'a> {
    module: &'a Module,
    graph: &'a ReferenceGraph,
    out: Collected,
    es_module: bool,
    common_js: bool,
}

impl<'a> Collector<'a> {
    fn node(&self, id: NodeId) -> &'a Node {
        self.module.node(id)
    }

    fn export(&mut self, name: &str, node: NodeId) {
        self.out.exports.insert(ExportName::named(name), node);
    }

    fn import(&mut self, imported: Imported, source: &str, local: NodeId) {
        self.out.imports.push(ImportRecord {
            imported,
            source: source.to_string(),
            local,
        });
    }

    // ------------------------------------------------------------------
    // ES modules
    // ------------------------------------------------------------------

    fn statement(&mut self, stmt: NodeId) {
        let module = self.module;
        match self.node(stmt) {
            Node::Import { source, specifiers } => {
                self.es_module = true;
                if specifiers.is_empty() {
                    self.import(Imported::SideEffect, source, stmt);
                }
                for &spec in specifiers {
                    match self.node(spec) {
                        Node::ImportSpecifier { imported, local } => {
                            self.import(Imported::Named(imported.clone()), source, *local)
                        }
                        Node::ImportNamespace { local } => self.import(Imported::Namespace, source, *local),
                        _ => {}
                    }
                }
            }
            Node::ExportNamed {
                declaration: Some(decl),
                ..
            } => {
                self.es_module = true;
                self.exported_declaration(*decl);
            }
            Node::ExportNamed {
                declaration: None,
                specifiers,
                source: None,
            } => {
                self.es_module = true;
                for &spec in specifiers {
                    if let Node::ExportSpecifier { local, exported } = self.node(spec) {
                        self.export(exported, *local);
                    }
                }
            }
            Node::ExportNamed {
                declaration: None,
                specifiers,
                source: Some(source),
            } => {
                self.es_module = true;
                for &spec in specifiers {
                    let (exported, imported) = match self.node(spec) {
                        Node::ExportSpecifier { local, exported } => {
                            let imported = module.ident_name(*local).unwrap_or_default();
                            (exported.clone(), Imported::Named(imported.to_string()))
                        }
                        Node::ExportNamespace { exported } => (exported.clone(), Imported::Namespace),
                        _ => continue,
                    };
                    self.out.reexports.push(ReexportRecord {
                        exported: ExportName::Named(exported),
                        imported,
                        source: source.clone(),
                        local: spec,
                    });
                }
            }
            Node::ExportAll { source } => {
                self.es_module = true;
                self.out.reexports.push(ReexportRecord {
                    exported: ExportName::Wildcard,
                    imported: Imported::Namespace,
                    source: source.clone(),
                    local: stmt,
                });
            }
            Node::ExportDefault { value } => {
                self.es_module = true;
                self.export("default", *value);
            }
            _ => {}
        }
    }

    fn exported_declaration(&mut self, decl: NodeId) {
        let module = self.module;
        match self.node(decl) {
            Node::VarDecl { declarators, .. } => {
                for &d in declarators {
                    let Node::Declarator { id, init } = self.node(d) else {
                        continue;
                    };
                    // Every name bound by a destructuring pattern shares the
                    // initializer.
                    let target = init.unwrap_or(*id);
                    for ident in module.pattern_idents(*id) {
                        if let Some(name) = module.ident_name(ident) {
                            self.export(name, target);
                        }
                    }
                }
            }
            Node::Function { id: Some(id), .. } | Node::Class { id: Some(id), .. } => {
                if let Some(name) = module.ident_name(*id) {
                    self.export(name, decl);
                }
            }
            _ => {}
        }
    }

    // ------------------------------------------------------------------
    // CommonJS
    // ------------------------------------------------------------------

    /// `exports.name` for an `exports` object expression, as
    /// `(member, name)`.
    fn exports_member(&self, object: NodeId) -> Option<(NodeId, &'a str)> {
        let module = self.module;
        let member = module.parent(object)?;
        match module.node(member) {
            Node::Member { object: o, .. } if *o == object => {
                let name = module.member_name(member)?;
                Some((member, name))
            }
            _ => None,
        }
    }

    /// The `= value` side of an assignment whose target is `target`.
    fn assigned_value(&self, target: NodeId) -> Option<NodeId> {
        let parent = self.module.parent(target)?;
        match self.node(parent) {
            Node::Assign { op, target: t, value } if *t == target && op == "=" => Some(*value),
            _ => None,
        }
    }

    /// `exports` objects: every unshadowed `exports` plus `module.exports`.
    fn exports_objects(&self) -> Vec<NodeId> {
        let mut objects: Vec<NodeId> = self.graph.globals("exports").to_vec();
        for &m in self.graph.globals("module") {
            if let Some((member, "exports")) = self.exports_member(m) {
                objects.push(member);
            }
        }
        objects.sort();
        objects
    }

    fn common_js_exports(&mut self) {
        for object in self.exports_objects() {
            self.common_js = true;

            if let Some((member, name)) = self.exports_member(object) {
                if name == "__esModule" {
                    if self.assigned_value(member).is_some() {
                        self.es_module = true;
                    }
                    continue;
                }
                if let Some(value) = self.assigned_value(member) {
                    self.export(name, value);
                }
                self.out
                    .export_refs
                    .entry(name.to_string())
                    .or_default()
                    .push(member);
                continue;
            }

            if let Some((call, name)) = self.define_property(object) {
                if name == "__esModule" {
                    self.es_module = true;
                } else {
                    self.export(name, call);
                }
            }
        }
    }

    /// `Object.defineProperty(exports, "name", descriptor)` as `(call, name)`.
    fn define_property(&self, object: NodeId) -> Option<(NodeId, &'a str)> {
        let call = self.module.parent(object)?;
        let Node::Call { callee, args, .. } = self.node(call) else {
            return None;
        };
        if args.first() != Some(&object) || self.dotted(*callee).as_deref() != Some("Object.defineProperty") {
            return None;
        }
        let name = self.node(*args.get(1)?).str_value()?;
        Some((call, name))
    }

    /// `a.b.c` for plain member chains over identifiers.
    fn dotted(&self, id: NodeId) -> Option<String> {
        match self.node(id) {
            Node::Ident { name } => Some(name.clone()),
            Node::Member { object, .. } => {
                let prefix = self.dotted(*object)?;
                let name = self.module.member_name(id)?;
                Some(format!("{}.{}", prefix, name))
            }
            _ => None,
        }
    }

    /// Callee names of interop helpers that wrap a `require()` call.
    fn is_interop_wrapper(&self, callee: NodeId) -> bool {
        let name = match self.dotted(callee) {
            Some(name) => name,
            None => return false,
        };
        let last = name.rsplit('.').next().unwrap_or_default();
        last.starts_with("_interopRequire") || last == "__importDefault" || last == "__importStar"
    }

    fn is_export_star(&self, callee: NodeId) -> bool {
        self.dotted(callee)
            .is_some_and(|name| matches!(name.rsplit('.').next(), Some("__exportStar" | "_exportStar")))
    }

    fn requires(&mut self) {
        let module = self.module;
        let graph = self.graph;
        for &r in graph.globals("require") {
            let Some(call) = module.parent(r) else { continue };
            let Node::Call {
                callee,
                args,
                is_new: false,
                ..
            } = self.node(call) else {
                continue;
            };
            if *callee != r {
                continue;
            }
            let Some(source) = args.first().and_then(|&a| self.node(a).str_value()) else {
                continue;
            };
            self.common_js = true;

            // Step over `_interopRequireDefault(require("s"))`.
            let mut expr = call;
            if let Some(outer) = module.parent(call) {
                if let Node::Call { callee, args, .. } = self.node(outer) {
                    if args.first() == Some(&call) && self.is_interop_wrapper(*callee) {
                        expr = outer;
                    }
                }
            }

            self.require_usage(expr, source);
        }
    }

    fn require_usage(&mut self, expr: NodeId, source: &str) {
        let module = self.module;
        let Some(parent) = module.parent(expr) else {
            return;
        };
        match self.node(parent) {
            Node::Declarator { id, init: Some(init) } if *init == expr => match self.node(*id) {
                Node::Ident { .. } => self.import(Imported::Namespace, source, *id),
                Node::ObjectPattern { props } => {
                    for &prop in props {
                        match self.node(prop) {
                            Node::Property {
                                key,
                                value,
                                computed: false,
                                ..
                            } => {
                                let imported = module.ident_name(*key).unwrap_or_default().to_string();
                                let local = match self.node(*value) {
                                    Node::AssignPattern { target, .. } => *target,
                                    _ => *value,
                                };
                                self.import(Imported::Named(imported), source, local);
                            }
                            Node::Rest { arg } => self.import(Imported::Namespace, source, *arg),
                            _ => {}
                        }
                    }
                }
                _ => self.import(Imported::Namespace, source, expr),
            },
            Node::Member { object, .. } if *object == expr => match module.member_name(parent) {
                Some(name) => self.import(Imported::Named(name.to_string()), source, parent),
                None => self.import(Imported::Namespace, source, expr),
            },
            Node::ExprStmt { .. } => self.import(Imported::SideEffect, source, expr),
            Node::Call { callee, args, .. } if args.first() == Some(&expr) && self.is_export_star(*callee) => {
                self.import(Imported::Namespace, source, expr);
                self.out.reexports.push(ReexportRecord {
                    exported: ExportName::Wildcard,
                    imported: Imported::Namespace,
                    source: source.to_string(),
                    local: parent,
                });
            }
            _ => self.import(Imported::Namespace, source, expr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ModuleBuilder, VarKind};

    fn collect_module(module: &Module) -> Collected {
        let graph = ReferenceGraph::analyze(module);
        collect(module, &graph)
    }

    #[test]
    fn test_collect_esm_exports_and_imports() {
        let mut b = ModuleBuilder::new("a.js");
        let imp = b.import_named("./dep", &[("default", "dep"), ("x", "y")]);
        let bare = b.import_bare("./polyfill");
        let one = b.num(1.0);
        let decl = b.const_decl("a", one);
        let exp_a = b.export_decl(decl);
        let f = b.function_decl("f", &[], vec![]);
        let exp_f = b.export_decl(f);
        let named = b.export_named(&[("a", "b")]);
        let obj = b.object(vec![]);
        let default = b.export_default(obj);
        for stmt in [imp, bare, exp_a, exp_f, named, default] {
            b.push(stmt);
        }
        let module = b.finish();

        let c = collect_module(&module);
        assert_eq!(c.kind, ModuleKind::EsModule);
        assert_eq!(c.exports.get("a"), Some(one));
        assert_eq!(c.exports.get("f"), Some(f));
        assert_eq!(c.exports.get("default"), Some(obj));
        assert!(c.exports.contains("b"));
        assert_eq!(c.exports.len(), 4);

        let imported: Vec<String> = c.imports.iter().map(|i| i.imported.to_string()).collect();
        assert_eq!(imported, ["default", "x", "side-effect"]);
        assert_eq!(c.imports[2].local, bare);
        assert!(c.export_refs.is_empty());
    }

    #[test]
    fn test_destructured_export_shares_initializer() {
        let mut b = ModuleBuilder::new("a.js");
        let compute = b.ident("compute");
        let call = b.call(compute, vec![]);
        let pattern = b.object_pattern_of(&["x", "y"]);
        let d = b.declarator_pattern(pattern, Some(call));
        let decl = b.var_decl(VarKind::Const, vec![d]);
        let exp = b.export_decl(decl);
        b.push(exp);
        let module = b.finish();

        let c = collect_module(&module);
        assert_eq!(c.exports.get("x"), Some(call));
        assert_eq!(c.exports.get("y"), Some(call));
    }

    #[test]
    fn test_collect_reexports() {
        let mut b = ModuleBuilder::new("a.js");
        let from = b.export_from("./x", &[("a", "b")]);
        let all = b.export_all("./util");
        let ns = b.export_all_as("./ns", "ns");
        b.push(from).push(all).push(ns);
        let module = b.finish();

        let c = collect_module(&module);
        assert!(c.exports.is_empty());
        assert_eq!(c.reexports.len(), 3);
        assert_eq!(c.reexports[0].exported, ExportName::named("b"));
        assert_eq!(c.reexports[0].imported, Imported::Named("a".into()));
        assert_eq!(c.reexports[1].exported, ExportName::Wildcard);
        assert_eq!(c.reexports[1].local, all);
        assert_eq!(c.reexports[2].imported, Imported::Namespace);
    }

    #[test]
    fn test_collect_common_js() {
        // Object.defineProperty(exports, "__esModule", { value: true });
        // const dep = require("./dep");
        // const { a, b: c } = require("./named");
        // require("./side");
        // exports.foo = dep.x;
        // exports.foo.bar = 1;
        let mut b = ModuleBuilder::new("a.js");
        let define = b.path("Object.defineProperty");
        let exports = b.ident("exports");
        let marker = b.str("__esModule");
        let t = b.bool(true);
        let value = b.prop("value", t);
        let descriptor = b.object(vec![value]);
        let call = b.call(define, vec![exports, marker, descriptor]);
        let s1 = b.expr_stmt(call);

        let req = b.require("./dep");
        let s2 = b.const_decl("dep", req);

        let req2 = b.require("./named");
        let pa = b.ident("a");
        let prop_a = b.pattern_prop("a", pa);
        let pc = b.ident("c");
        let prop_c = b.pattern_prop("b", pc);
        let pattern = b.object_pattern(vec![prop_a, prop_c]);
        let d = b.declarator_pattern(pattern, Some(req2));
        let s3 = b.var_decl(VarKind::Const, vec![d]);

        let side = b.require("./side");
        let s4 = b.expr_stmt(side);

        let dep = b.ident("dep");
        let dep_x = b.member(dep, "x");
        let s5 = b.cjs_export("foo", dep_x);

        let exports2 = b.ident("exports");
        let foo = b.member(exports2, "foo");
        let bar = b.member(foo, "bar");
        let one = b.num(1.0);
        let assign = b.assign(bar, one);
        let s6 = b.expr_stmt(assign);
        for stmt in [s1, s2, s3, s4, s5, s6] {
            b.push(stmt);
        }
        let module = b.finish();

        let c = collect_module(&module);
        assert_eq!(c.kind, ModuleKind::EsModule);
        assert_eq!(c.exports.get("foo"), Some(dep_x));
        assert_eq!(c.export_refs["foo"].len(), 2);

        let imports: Vec<(String, &str)> = c
            .imports
            .iter()
            .map(|i| (i.imported.to_string(), i.source.as_str()))
            .collect();
        assert_eq!(
            imports,
            [
                ("*".to_string(), "./dep"),
                ("a".to_string(), "./named"),
                ("b".to_string(), "./named"),
                ("side-effect".to_string(), "./side"),
            ]
        );
        assert_eq!(c.imports[3].local, side);
    }

    #[test]
    fn test_common_js_without_marker_is_not_es_module() {
        let mut b = ModuleBuilder::new("a.js");
        let obj = b.object(vec![]);
        let stmt = b.cjs_export("default", obj);
        b.push(stmt);
        let module = b.finish();

        let c = collect_module(&module);
        assert_eq!(c.kind, ModuleKind::CommonJs);
        assert_eq!(c.exports.get("default"), Some(obj));
    }

    #[test]
    fn test_export_star_helper_is_wildcard_reexport() {
        let mut b = ModuleBuilder::new("a.js");
        let helper = b.ident("__exportStar");
        let req = b.require("./util");
        let exports = b.ident("exports");
        let call = b.call(helper, vec![req, exports]);
        let stmt = b.expr_stmt(call);
        b.push(stmt);
        let module = b.finish();

        let c = collect_module(&module);
        assert_eq!(c.reexports.len(), 1);
        assert_eq!(c.reexports[0].exported, ExportName::Wildcard);
        assert_eq!(c.reexports[0].local, call);
        assert_eq!(c.kind, ModuleKind::CommonJs);
    }

    #[test]
    fn test_shadowed_exports_is_ignored() {
        // function f(exports) { exports.x = 1; }
        let mut b = ModuleBuilder::new("a.js");
        let one = b.num(1.0);
        let stmt = b.cjs_export("x", one);
        let f = b.function_decl("f", &["exports"], vec![stmt]);
        b.push(f);
        let module = b.finish();

        let c = collect_module(&module);
        assert!(c.exports.is_empty());
        assert_eq!(c.kind, ModuleKind::Unknown);
    }
}
