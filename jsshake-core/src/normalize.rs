//! Export normalization.
//!
//! A CommonJS export that is read back inside its own module
//! (`exports.x = 1; use(exports.x);`) is both public surface and internal
//! state. Such exports are rewritten through one local variable so the
//! internal uses become ordinary references to a binding:
//!
//! ```text
//! var _x;
//! _x = 1;
//! use(_x);
//! exports.x = _x;
//! ```
//!
//! The export then points at the trailing `_x`, which can be removed without
//! touching the internal uses.

use tracing::debug;

use crate::ast::{Module, Node, NodeId, VarKind};
use crate::collect::{Collected, ExportName};

/// Rewrites every export with more than one internal site. Returns the
/// names that were rewritten; the reference graph must be rebuilt when the
/// list is non-empty.
pub fn normalize_exports(module: &mut Module, collected: &mut Collected) -> Vec<String> {
    let mut rewritten = Vec::new();

    for (name, sites) in &collected.export_refs {
        let live: Vec<NodeId> = sites.iter().copied().filter(|&s| !module.is_removed(s)).collect();
        if live.len() <= 1 {
            continue;
        }

        let uid = module.generate_uid(name);

        let id = module.alloc(Node::Ident { name: uid.clone() });
        let declarator = module.alloc(Node::Declarator { id, init: None });
        let decl = module.alloc(Node::VarDecl {
            kind: VarKind::Var,
            declarators: vec![declarator],
        });
        module.prepend(decl);

        for site in live {
            let replacement = module.alloc(Node::Ident { name: uid.clone() });
            module.replace(site, replacement);
        }

        let exports = module.alloc(Node::Ident {
            name: "exports".to_string(),
        });
        let property = module.alloc(Node::Ident { name: name.clone() });
        let target = module.alloc(Node::Member {
            object: exports,
            property,
            computed: false,
            optional: false,
        });
        let value = module.alloc(Node::Ident { name: uid.clone() });
        let assign = module.alloc(Node::Assign {
            op: "=".to_string(),
            target,
            value,
        });
        let stmt = module.alloc(Node::ExprStmt { expr: assign });
        module.append(stmt);

        collected.exports.set(ExportName::named(name.as_str()), value);
        debug!(export = %name, local = %uid, "normalized export");
        rewritten.push(name.clone());
    }

    for name in &rewritten {
        collected.export_refs.remove(name);
    }
    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{print_module, ModuleBuilder};
    use crate::collect::collect;
    use crate::scope::ReferenceGraph;

    #[test]
    fn test_normalize_multiply_referenced_export() {
        // exports.x = 1; use(exports.x); exports.y = 2;
        let mut b = ModuleBuilder::new("a.js");
        let one = b.num(1.0);
        let s1 = b.cjs_export("x", one);
        let use_fn = b.ident("use");
        let exports = b.ident("exports");
        let read = b.member(exports, "x");
        let call = b.call(use_fn, vec![read]);
        let s2 = b.expr_stmt(call);
        let two = b.num(2.0);
        let s3 = b.cjs_export("y", two);
        b.push(s1).push(s2).push(s3);
        let mut module = b.finish();

        let graph = ReferenceGraph::analyze(&module);
        let mut collected = collect(&module, &graph);
        let rewritten = normalize_exports(&mut module, &mut collected);

        assert_eq!(rewritten, ["x"]);
        assert_eq!(
            print_module(&module),
            "var _x;\n_x = 1;\nuse(_x);\nexports.y = 2;\nexports.x = _x;\n"
        );

        let tail = collected.exports.get("x").unwrap();
        assert_eq!(module.ident_name(tail), Some("_x"));
        assert_eq!(collected.exports.get("y"), Some(two));
    }

    #[test]
    fn test_single_site_export_untouched() {
        let mut b = ModuleBuilder::new("a.js");
        let one = b.num(1.0);
        let s1 = b.cjs_export("x", one);
        b.push(s1);
        let mut module = b.finish();

        let graph = ReferenceGraph::analyze(&module);
        let mut collected = collect(&module, &graph);
        assert!(normalize_exports(&mut module, &mut collected).is_empty());
        assert_eq!(print_module(&module), "exports.x = 1;\n");
    }

    #[test]
    fn test_generated_name_avoids_collision() {
        // var _x; exports.x = 1; exports.x;
        let mut b = ModuleBuilder::new("a.js");
        let taken = b.uninit_decl(VarKind::Var, "_x");
        let one = b.num(1.0);
        let s1 = b.cjs_export("x", one);
        let exports = b.ident("exports");
        let read = b.member(exports, "x");
        let s2 = b.expr_stmt(read);
        b.push(taken).push(s1).push(s2);
        let mut module = b.finish();

        let graph = ReferenceGraph::analyze(&module);
        let mut collected = collect(&module, &graph);
        normalize_exports(&mut module, &mut collected);

        let tail = collected.exports.get("x").unwrap();
        assert_eq!(module.ident_name(tail), Some("_x2"));
    }
}
