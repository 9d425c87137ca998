//! Liveness of exports, re-exports and side-effect imports.
//!
//! Given the collected export surface and the caller's request, decides
//! whether the module can be shaken at all and, if so, which export nodes
//! stay alive. The complement seeds the deletion [`Worklist`].

use std::collections::HashSet;
use std::fmt;

use crate::ast::{Module, NodeId};
use crate::collect::{Collected, ExportName, Imported, ModuleKind};
use crate::config::{KnownDeadImport, UnknownExportPolicy};
use crate::error::{ShakerError, ShakerResult};
use crate::scope::ReferenceGraph;

/// Export name reserved for compile-time metadata produced by the
/// evaluation step. Dropped from requests when the module lacks it.
pub const PREVAL_EXPORT: &str = "__preval";

/// Wire form of the wildcard request.
pub const WILDCARD: &str = "*";
/// Wire form of the "imported for side effects" marker.
pub const SIDE_EFFECT: &str = "side-effect";

/// One requested entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Requested {
    Named(String),
    Wildcard,
    SideEffect,
}

impl Requested {
    pub fn parse(raw: &str) -> Self {
        match raw {
            WILDCARD => Self::Wildcard,
            SIDE_EFFECT => Self::SideEffect,
            name => Self::Named(name.to_string()),
        }
    }
}

/// The request as given by the caller, plus its parsed entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedExports {
    original: Vec<String>,
    entries: Vec<Requested>,
}

impl RequestedExports {
    pub fn new<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut original = Vec::new();
        let mut entries = Vec::new();
        for r in raw {
            let r = r.as_ref();
            original.push(r.to_string());
            let parsed = Requested::parse(r);
            if !entries.contains(&parsed) {
                entries.push(parsed);
            }
        }
        Self { original, entries }
    }

    /// The request exactly as passed in.
    pub fn original(&self) -> &[String] {
        &self.original
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_wildcard(&self) -> bool {
        self.entries.contains(&Requested::Wildcard)
    }

    pub fn has_side_effect(&self) -> bool {
        self.entries.contains(&Requested::SideEffect)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|e| match e {
            Requested::Named(name) => Some(name.as_str()),
            _ => None,
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names().any(|n| n == name)
    }

    fn remove(&mut self, entry: &Requested) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e != entry);
        before != self.entries.len()
    }
}

/// Export and re-export nodes reachable from the request. Insert-only.
#[derive(Debug, Clone, Default)]
pub struct AliveSet {
    order: Vec<NodeId>,
    nodes: HashSet<NodeId>,
}

impl AliveSet {
    pub fn insert(&mut self, node: NodeId) -> bool {
        let inserted = self.nodes.insert(node);
        if inserted {
            self.order.push(node);
        }
        inserted
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.order.iter().copied()
    }
}

/// Deletion candidates, each at most once, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Worklist {
    items: Vec<NodeId>,
    seen: HashSet<NodeId>,
}

impl Worklist {
    pub fn push(&mut self, node: NodeId) -> bool {
        let inserted = self.seen.insert(node);
        if inserted {
            self.items.push(node);
        }
        inserted
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.seen.contains(&node)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[NodeId] {
        &self.items
    }
}

/// Why a module is returned unshaken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// `default` requested from a module that is not confirmed to be an ES
    /// module; removing anything could break default-import interop.
    DefaultInterop,
    /// Requested names with no matching export, under `skip-shaking`.
    UnknownExports { missing: Vec<String> },
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DefaultInterop => write!(f, "default export requested from a non-ES module"),
            Self::UnknownExports { missing } => {
                write!(f, "unknown export(s) requested: {}", missing.join(","))
            }
        }
    }
}

/// Outcome of the liveness computation.
#[derive(Debug, Clone)]
pub enum Liveness {
    /// Empty request: every top-level statement goes.
    RemoveAll,
    /// Leave the module as it is.
    Skip(AbortReason),
    /// Wildcard request: nothing is removed.
    KeepAll,
    /// Shake everything outside `alive`.
    Shake {
        alive: AliveSet,
        /// The request carried the side-effect marker.
        keep_side_effect_imports: bool,
    },
}

/// Decides what survives. Fails only under [`UnknownExportPolicy::Error`].
pub fn compute_liveness(
    module: &Module,
    collected: &Collected,
    request: &RequestedExports,
    policy: UnknownExportPolicy,
    alias_imported_names: bool,
) -> ShakerResult<Liveness> {
    if request.is_empty() {
        return Ok(Liveness::RemoveAll);
    }

    let mut request = request.clone();
    if !collected.exports.contains(PREVAL_EXPORT) {
        request.remove(&Requested::Named(PREVAL_EXPORT.to_string()));
    }
    let keep_side_effect_imports = request.remove(&Requested::SideEffect);

    if request.contains("default")
        && collected.exports.contains("default")
        && collected.kind != ModuleKind::EsModule
    {
        return Ok(Liveness::Skip(AbortReason::DefaultInterop));
    }

    if request.has_wildcard() {
        return Ok(Liveness::KeepAll);
    }

    let imported: HashSet<&str> = collected.imported_names().collect();
    let mut alive = AliveSet::default();
    let mut matched: HashSet<&str> = HashSet::new();

    for (name, node) in collected.exports.iter() {
        let Some(name) = name.as_named() else { continue };
        if request.contains(name) {
            alive.insert(node);
            matched.insert(name);
        } else if alias_imported_names
            && module.ident_name(node).is_some_and(|local| imported.contains(local))
        {
            alive.insert(node);
        }
        // Names sharing an alive node are alive through the node itself.
    }

    for reexport in &collected.reexports {
        if let ExportName::Named(name) = &reexport.exported {
            if request.contains(name) {
                alive.insert(reexport.local);
                matched.insert(name);
            }
        }
    }

    let missing: Vec<String> = request
        .names()
        .filter(|n| !matched.contains(n))
        .map(String::from)
        .collect();

    if !missing.is_empty() {
        match policy {
            UnknownExportPolicy::Error => {
                return Err(ShakerError::unknown_exports(request.original().iter().cloned()));
            }
            UnknownExportPolicy::Ignore => {}
            UnknownExportPolicy::ReexportAll => {
                for reexport in &collected.reexports {
                    if reexport.exported == ExportName::Wildcard {
                        alive.insert(reexport.local);
                    }
                }
            }
            UnknownExportPolicy::SkipShaking => {
                return Ok(Liveness::Skip(AbortReason::UnknownExports { missing }));
            }
        }
    }

    Ok(Liveness::Shake {
        alive,
        keep_side_effect_imports,
    })
}

/// Side-effect import settings for [`build_worklist`].
pub struct SideEffectPolicy<'a> {
    /// Remove side-effect imports at all.
    pub remove: bool,
    /// Sources that must be kept even when removing.
    pub keep_source: &'a dyn Fn(&str) -> bool,
}

/// Seeds the deletion worklist: dead exports and re-exports, removable
/// side-effect imports, and known-dead imports.
pub fn build_worklist(
    module: &Module,
    graph: &ReferenceGraph,
    collected: &Collected,
    alive: &AliveSet,
    side_effects: SideEffectPolicy<'_>,
    known_dead: &[KnownDeadImport],
) -> Worklist {
    let mut worklist = Worklist::default();

    for (_, node) in collected.exports.iter() {
        if !alive.contains(node) {
            worklist.push(node);
        }
    }
    for reexport in &collected.reexports {
        if !alive.contains(reexport.local) {
            worklist.push(reexport.local);
        }
    }

    if side_effects.remove {
        for import in &collected.imports {
            if import.imported == Imported::SideEffect && !(side_effects.keep_source)(&import.source) {
                worklist.push(import.local);
            }
        }
    }

    for dead in known_dead {
        for import in &collected.imports {
            let name_matches = match &import.imported {
                Imported::Named(name) => *name == dead.name,
                Imported::Namespace => dead.name == WILDCARD,
                Imported::SideEffect => false,
            };
            if !name_matches || import.source != dead.source || module.is_removed(import.local) {
                continue;
            }
            let references = graph
                .binding_of(import.local)
                .map(|b| graph.references(b))
                .unwrap_or(&[]);
            if references.is_empty() {
                worklist.push(import.local);
            } else {
                for &r in references {
                    worklist.push(r);
                }
            }
        }
    }

    worklist
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ModuleBuilder;
    use crate::collect::collect;

    fn analyze(module: &Module) -> (ReferenceGraph, Collected) {
        let graph = ReferenceGraph::analyze(module);
        let collected = collect(module, &graph);
        (graph, collected)
    }

    fn shake_set(liveness: Liveness) -> AliveSet {
        match liveness {
            Liveness::Shake { alive, .. } => alive,
            other => panic!("expected Shake, got {:?}", other),
        }
    }

    /// export const a = 1; export const b = 2; export * from "./util";
    fn two_exports_and_star() -> (Module, NodeId, NodeId, NodeId) {
        let mut b = ModuleBuilder::new("a.js");
        let one = b.num(1.0);
        let da = b.const_decl("a", one);
        let ea = b.export_decl(da);
        let two = b.num(2.0);
        let db = b.const_decl("b", two);
        let eb = b.export_decl(db);
        let star = b.export_all("./util");
        b.push(ea).push(eb).push(star);
        (b.finish(), one, two, star)
    }

    #[test]
    fn test_requested_parsing() {
        let req = RequestedExports::new(["a", "*", "side-effect", "a"]);
        assert!(req.has_wildcard());
        assert!(req.has_side_effect());
        assert_eq!(req.names().collect::<Vec<_>>(), ["a"]);
        assert_eq!(req.original().len(), 4);
    }

    #[test]
    fn test_empty_request_is_remove_all() {
        let (module, ..) = two_exports_and_star();
        let (_, collected) = analyze(&module);
        let req = RequestedExports::new(Vec::<String>::new());
        let liveness =
            compute_liveness(&module, &collected, &req, UnknownExportPolicy::SkipShaking, true).unwrap();
        assert!(matches!(liveness, Liveness::RemoveAll));
    }

    #[test]
    fn test_requested_export_alive() {
        let (module, one, two, star) = two_exports_and_star();
        let (_, collected) = analyze(&module);
        let req = RequestedExports::new(["a"]);
        let alive = shake_set(
            compute_liveness(&module, &collected, &req, UnknownExportPolicy::SkipShaking, true).unwrap(),
        );
        assert!(alive.contains(one));
        assert!(!alive.contains(two));
        assert!(!alive.contains(star));
    }

    #[test]
    fn test_unknown_export_policies() {
        let (module, _, _, star) = two_exports_and_star();
        let (_, collected) = analyze(&module);
        let req = RequestedExports::new(["a", "foo"]);

        let err = compute_liveness(&module, &collected, &req, UnknownExportPolicy::Error, true).unwrap_err();
        assert_eq!(err.to_string(), "Unknown export(s) requested: a,foo");

        let skipped =
            compute_liveness(&module, &collected, &req, UnknownExportPolicy::SkipShaking, true).unwrap();
        assert!(matches!(
            skipped,
            Liveness::Skip(AbortReason::UnknownExports { ref missing }) if missing == &["foo"]
        ));

        let ignore = shake_set(
            compute_liveness(&module, &collected, &req, UnknownExportPolicy::Ignore, true).unwrap(),
        );
        assert!(!ignore.contains(star));

        let reexport_all = shake_set(
            compute_liveness(&module, &collected, &req, UnknownExportPolicy::ReexportAll, true).unwrap(),
        );
        assert!(reexport_all.contains(star));
        // The alive set only ever grows: everything alive under `ignore` is
        // alive under `reexport-all` too.
        assert!(ignore.iter().all(|n| reexport_all.contains(n)));
    }

    #[test]
    fn test_default_interop_abort() {
        // exports.default = {};
        let mut b = ModuleBuilder::new("a.js");
        let obj = b.object(vec![]);
        let stmt = b.cjs_export("default", obj);
        b.push(stmt);
        let module = b.finish();
        let (_, collected) = analyze(&module);

        let req = RequestedExports::new(["default"]);
        let liveness =
            compute_liveness(&module, &collected, &req, UnknownExportPolicy::Ignore, true).unwrap();
        assert!(matches!(liveness, Liveness::Skip(AbortReason::DefaultInterop)));
    }

    #[test]
    fn test_preval_dropped_when_not_exported() {
        let (module, ..) = two_exports_and_star();
        let (_, collected) = analyze(&module);
        let req = RequestedExports::new(["a", PREVAL_EXPORT]);
        let liveness =
            compute_liveness(&module, &collected, &req, UnknownExportPolicy::SkipShaking, true).unwrap();
        assert!(matches!(liveness, Liveness::Shake { .. }));
    }

    #[test]
    fn test_alias_of_imported_name() {
        // import { styled } from "lib"; export { styled };
        let mut b = ModuleBuilder::new("a.js");
        let imp = b.import_named("lib", &[("styled", "styled")]);
        let exp = b.export_named(&[("styled", "styled")]);
        b.push(imp).push(exp);
        let module = b.finish();
        let (_, collected) = analyze(&module);
        let local = collected.exports.get("styled").unwrap();

        let req = RequestedExports::new(["side-effect"]);
        let with_alias = compute_liveness(&module, &collected, &req, UnknownExportPolicy::Ignore, true).unwrap();
        assert!(matches!(
            with_alias,
            Liveness::Shake { ref alive, keep_side_effect_imports: true } if alive.contains(local)
        ));

        let without = shake_set(
            compute_liveness(&module, &collected, &req, UnknownExportPolicy::Ignore, false).unwrap(),
        );
        assert!(!without.contains(local));
    }

    #[test]
    fn test_worklist_side_effects_and_known_dead() {
        // import "./polyfill"; import "./styles.css"; import inv from "tiny-invariant"; inv(x);
        let mut b = ModuleBuilder::new("a.js");
        let poly = b.import_bare("./polyfill");
        let css = b.import_bare("./styles.css");
        let inv_imp = b.import_default("tiny-invariant", "inv");
        let inv = b.ident("inv");
        let x = b.ident("x");
        let call = b.call(inv, vec![x]);
        let stmt = b.expr_stmt(call);
        b.push(poly).push(css).push(inv_imp).push(stmt);
        let module = b.finish();
        let (graph, collected) = analyze(&module);

        let keep_css = |source: &str| source.ends_with(".css");
        let known = [KnownDeadImport {
            name: "default".into(),
            source: "tiny-invariant".into(),
        }];
        let worklist = build_worklist(
            &module,
            &graph,
            &collected,
            &AliveSet::default(),
            SideEffectPolicy {
                remove: true,
                keep_source: &keep_css,
            },
            &known,
        );

        assert_eq!(worklist.as_slice(), &[poly, inv]);
    }
}
