//! Graphviz DOT visualization for binding graphs.
//!
//! Uses the `std::fmt::Write` trait for string formatting into a
//! pre-allocated buffer.

use std::fmt::Write;

use crate::ast::Module;
use crate::graph::BindingGraph;
use crate::scope::ReferenceGraph;

/// Generate a Graphviz DOT representation of a binding graph.
///
/// The graph is built before shaking; `module` is the shaken module. Kept
/// bindings are lightgreen, removed ones lightcoral, and bindings read by
/// declaration-free statements get a bold border.
pub fn generate_dot(module: &Module, refs: &ReferenceGraph, graph: &BindingGraph) -> String {
    let estimated_capacity = graph.node_count() * 80 + graph.edge_count() * 40 + 150;
    let mut dot = String::with_capacity(estimated_capacity);

    if let Err(e) = write_dot_content(&mut dot, module, refs, graph) {
        tracing::error!(error = %e, "failed to generate DOT string");
        return "digraph jsshake {\n}\n".to_string();
    }
    dot
}

fn write_dot_content(
    dot: &mut String,
    module: &Module,
    refs: &ReferenceGraph,
    graph: &BindingGraph,
) -> std::fmt::Result {
    writeln!(dot, "digraph jsshake {{")?;
    writeln!(dot, "  label=\"{}\";", escape(&module.filename))?;
    writeln!(dot, "  rankdir=LR;")?;
    writeln!(
        dot,
        "  node [shape=box, style=filled, fontname=\"JetBrains Mono\"];"
    )?;
    writeln!(dot)?;

    for id in graph.graph.nodes() {
        let binding = refs.binding(id);
        let color = if module.is_removed(binding.identifier) {
            "lightcoral"
        } else {
            "lightgreen"
        };
        let style = if graph.statement_roots.contains(&id) {
            ", penwidth=2"
        } else {
            ""
        };
        writeln!(
            dot,
            "  b{} [label=\"{}\", fillcolor={}{}];",
            id.index(),
            escape(&binding.name),
            color,
            style
        )?;
    }

    writeln!(dot)?;

    for (from, to, _) in graph.graph.all_edges() {
        writeln!(dot, "  b{} -> b{};", from.index(), to.index())?;
    }

    writeln!(dot, "}}")?;
    Ok(())
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ModuleBuilder;
    use crate::graph::build_graph;

    #[test]
    fn test_dot_colors_removed_bindings() {
        // const a = 1; const b = a;
        let mut b = ModuleBuilder::new("a.js");
        let one = b.num(1.0);
        let da = b.const_decl("a", one);
        let a = b.ident("a");
        let db = b.const_decl("b", a);
        b.push(da).push(db);
        let mut module = b.finish();

        let refs = ReferenceGraph::analyze(&module);
        let graph = build_graph(&module, &refs);
        module.remove(db);

        let dot = generate_dot(&module, &refs, &graph);
        assert!(dot.starts_with("digraph jsshake {"));
        assert!(dot.contains("label=\"a\", fillcolor=lightgreen"));
        assert!(dot.contains("label=\"b\", fillcolor=lightcoral"));
        assert!(dot.contains(" -> "));
    }
}
