//! Environment-code stripping.
//!
//! Build-time evaluation runs outside a browser, so reads of browser globals
//! (`window`, `document.cookie`, `fetch(url)`) are replaced with `undefined`
//! before dead code is searched for. `typeof window` becomes `"undefined"`.
//! Writes to those globals are left alone, as are locally shadowed names.

use regex::Regex;
use tracing::debug;

use crate::ast::{Lit, Module, Node, NodeId};
use crate::config::EnvStripConfig;
use crate::error::{ShakerError, ShakerResult};
use crate::scope::ReferenceGraph;

#[derive(Debug)]
pub struct EnvStrip {
    files: Vec<Regex>,
    globals: Vec<String>,
}

impl EnvStrip {
    pub fn from_config(config: &EnvStripConfig) -> ShakerResult<Self> {
        let files = config
            .files
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| ShakerError::invalid_argument(format!("env-strip file pattern `{}`: {}", p, e)))
            })
            .collect::<ShakerResult<Vec<_>>>()?;
        Ok(Self {
            files,
            globals: config.globals.clone(),
        })
    }

    /// An empty pattern list matches every file.
    pub fn applies_to(&self, filename: &str) -> bool {
        self.files.is_empty() || self.files.iter().any(|re| re.is_match(filename))
    }

    /// Replaces every read of a configured global. Returns the number of
    /// replaced expressions; the graph must be rebuilt when non-zero.
    pub fn run(&self, module: &mut Module, graph: &ReferenceGraph) -> usize {
        let mut replaced = 0;
        for name in &self.globals {
            for &ident in graph.globals(name) {
                if module.is_removed(ident) || is_write_target(module, ident) {
                    continue;
                }
                let (target, leaf) = match typeof_of(module, ident) {
                    Some(unary) => (unary, Node::Lit(Lit::Str("undefined".to_string()))),
                    None => {
                        let top = chain_top(module, ident);
                        if is_write_target(module, top) {
                            continue;
                        }
                        (
                            top,
                            Node::Ident {
                                name: "undefined".to_string(),
                            },
                        )
                    }
                };
                module.overwrite_leaf(target, leaf);
                replaced += 1;
            }
        }
        if replaced > 0 {
            debug!(file = %module.filename, replaced, "stripped environment globals");
        }
        replaced
    }
}

/// `typeof ident`
fn typeof_of(module: &Module, ident: NodeId) -> Option<NodeId> {
    let parent = module.parent(ident)?;
    match module.node(parent) {
        Node::Unary { op, arg } if op == "typeof" && *arg == ident => Some(parent),
        _ => None,
    }
}

/// Outermost member access / call built on top of `ident`.
fn chain_top(module: &Module, ident: NodeId) -> NodeId {
    let mut current = ident;
    while let Some(parent) = module.parent(current) {
        let extends = match module.node(parent) {
            Node::Member { object, .. } => *object == current,
            Node::Call { callee, .. } => *callee == current,
            _ => false,
        };
        if !extends {
            break;
        }
        current = parent;
    }
    current
}

fn is_write_target(module: &Module, node: NodeId) -> bool {
    let Some(parent) = module.parent(node) else {
        return false;
    };
    match module.node(parent) {
        Node::Assign { target, .. } => *target == node,
        Node::Update { arg, .. } => *arg == node,
        Node::Unary { op, arg } => op == "delete" && *arg == node,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{print_module, ModuleBuilder};

    fn strip(module: &mut Module) -> usize {
        let graph = ReferenceGraph::analyze(module);
        EnvStrip::from_config(&EnvStripConfig::default())
            .unwrap()
            .run(module, &graph)
    }

    #[test]
    fn test_replaces_reads_and_typeof() {
        // const w = window.innerWidth; const t = typeof document; fetch("/x").then(f);
        let mut b = ModuleBuilder::new("a.js");
        let win = b.path("window.innerWidth");
        let dw = b.const_decl("w", win);
        let doc = b.ident("document");
        let ty = b.unary("typeof", doc);
        let dt = b.const_decl("t", ty);
        let fetch = b.ident("fetch");
        let url = b.str("/x");
        let call = b.call(fetch, vec![url]);
        let then = b.member(call, "then");
        let f = b.ident("f");
        let outer = b.call(then, vec![f]);
        let stmt = b.expr_stmt(outer);
        b.push(dw).push(dt).push(stmt);
        let mut module = b.finish();

        assert_eq!(strip(&mut module), 3);
        assert_eq!(
            print_module(&module),
            "const w = undefined;\nconst t = \"undefined\";\nundefined;\n"
        );
    }

    #[test]
    fn test_shadowed_and_written_globals_kept() {
        // function g(window) { return window; } window.x = 1;
        let mut b = ModuleBuilder::new("a.js");
        let inner = b.ident("window");
        let ret = b.ret(Some(inner));
        let g = b.function_decl("g", &["window"], vec![ret]);
        let target = b.path("window.x");
        let one = b.num(1.0);
        let assign = b.assign(target, one);
        let stmt = b.expr_stmt(assign);
        b.push(g).push(stmt);
        let mut module = b.finish();

        assert_eq!(strip(&mut module), 0);
    }

    #[test]
    fn test_file_patterns() {
        let config = EnvStripConfig {
            enabled: true,
            files: vec![r"\.tsx?$".to_string()],
            ..EnvStripConfig::default()
        };
        let strip = EnvStrip::from_config(&config).unwrap();
        assert!(strip.applies_to("src/App.tsx"));
        assert!(!strip.applies_to("src/app.js"));

        let bad = EnvStripConfig {
            files: vec!["(".to_string()],
            ..EnvStripConfig::default()
        };
        assert!(EnvStrip::from_config(&bad).is_err());
    }
}
