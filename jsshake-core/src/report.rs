//! Shake results and their plaintext / JSON output.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::ast::{Module, NodeId};
use crate::collect::{Collected, ExportName, ImportRecord, ReexportRecord};
use crate::eliminate::EliminationStats;

/// How a module left the shaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "kebab-case")]
pub enum ShakeStatus {
    /// Dead code was searched for and removed.
    Shaken,
    /// Nothing requested: every statement removed.
    RemovedAll,
    /// `*` requested: nothing removed.
    KeptAll,
    /// Shaking was unsafe; module returned as is.
    Skipped(String),
}

impl fmt::Display for ShakeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shaken => f.write_str("shaken"),
            Self::RemovedAll => f.write_str("removed all"),
            Self::KeptAll => f.write_str("kept all"),
            Self::Skipped(reason) => write!(f, "skipped ({})", reason),
        }
    }
}

/// What importers of the shaken module can still see, and what it needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShakeSummary {
    pub dead_exports: Vec<String>,
    pub exports: Vec<String>,
    /// Source -> names still taken from it, by import or re-export.
    pub imports: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct ShakeOutcome {
    pub imports: Vec<ImportRecord>,
    /// Surviving export name -> node.
    pub exports: BTreeMap<String, NodeId>,
    pub reexports: Vec<ReexportRecord>,
    pub dead_exports: Vec<String>,
    pub summary: ShakeSummary,
    /// Forwarded from the module untouched.
    pub metadata: Option<serde_json::Value>,
    pub stats: EliminationStats,
    pub status: ShakeStatus,
}

/// Reduces the final tree state to the surviving surface.
pub fn report(module: &Module, collected: Collected, stats: EliminationStats, status: ShakeStatus) -> ShakeOutcome {
    let imports: Vec<ImportRecord> = collected
        .imports
        .into_iter()
        .filter(|i| !module.is_removed(i.local))
        .collect();
    let reexports: Vec<ReexportRecord> = collected
        .reexports
        .into_iter()
        .filter(|r| !module.is_removed(r.local))
        .collect();

    let mut exports = BTreeMap::new();
    let mut dead_exports = Vec::new();
    for (name, node) in collected.exports.iter() {
        let name = match name {
            ExportName::Named(name) => name.clone(),
            ExportName::Wildcard => continue,
        };
        if module.is_removed(node) {
            dead_exports.push(name);
        } else {
            exports.insert(name, node);
        }
    }

    let mut summary_imports: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let pairs = imports
        .iter()
        .map(|i| (&i.source, i.imported.to_string()))
        .chain(reexports.iter().map(|r| (&r.source, r.imported.to_string())));
    for (source, imported) in pairs {
        let names = summary_imports.entry(source.clone()).or_default();
        if !names.contains(&imported) {
            names.push(imported);
        }
    }

    let summary = ShakeSummary {
        dead_exports: dead_exports.clone(),
        exports: exports.keys().cloned().collect(),
        imports: summary_imports,
    };

    ShakeOutcome {
        imports,
        exports,
        reexports,
        dead_exports,
        summary,
        metadata: module.metadata.clone(),
        stats,
        status,
    }
}

/// Prints one module's result in plain text format.
pub fn print_plain(file: &str, outcome: &ShakeOutcome) {
    println!("{} [{}]", file, outcome.status);
    let summary = &outcome.summary;
    if summary.dead_exports.is_empty() {
        println!("  No dead exports.");
    } else {
        println!("  DEAD EXPORTS ({}):", summary.dead_exports.len());
        for name in &summary.dead_exports {
            println!("  - {}", name);
        }
    }
    if !summary.exports.is_empty() {
        println!("  EXPORTS: {}", summary.exports.join(", "));
    }
    for (source, names) in &summary.imports {
        println!("  IMPORTS {}: {}", source, names.join(", "));
    }
}

/// Prints every module's summary in JSON format, keyed by file.
///
/// Falls back to the debug representation if serialization fails.
pub fn print_json(results: &BTreeMap<String, ShakeSummary>) {
    match serde_json::to_string_pretty(&json!({ "modules": results })) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("[WARN] JSON serialization failed: {}", e);
            println!("{{\"modules\": {:?}}}", results);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ModuleBuilder;
    use crate::collect::collect;
    use crate::scope::ReferenceGraph;

    #[test]
    fn test_report_partitions_exports_and_merges_imports() {
        // import { a } from "./x"; export const keep = a; export const drop = 1;
        // export { a } from "./x"; export * from "./y";
        let mut b = ModuleBuilder::new("m.js");
        let imp = b.import_named("./x", &[("a", "a")]);
        let a = b.ident("a");
        let dk = b.const_decl("keep", a);
        let ek = b.export_decl(dk);
        let one = b.num(1.0);
        let dd = b.const_decl("drop", one);
        let ed = b.export_decl(dd);
        let re = b.export_from("./x", &[("a", "a")]);
        let star = b.export_all("./y");
        b.push(imp).push(ek).push(ed).push(re).push(star);
        let mut module = b.finish();

        let graph = ReferenceGraph::analyze(&module);
        let collected = collect(&module, &graph);
        module.remove(ed);
        module.remove(star);

        let outcome = report(&module, collected, EliminationStats::default(), ShakeStatus::Shaken);
        assert_eq!(outcome.dead_exports, ["drop"]);
        assert_eq!(outcome.summary.exports, ["keep"]);
        assert_eq!(outcome.reexports.len(), 1);
        assert_eq!(outcome.summary.imports.len(), 1);
        assert_eq!(outcome.summary.imports["./x"], ["a"]);
    }

    #[test]
    fn test_summary_json_keys() {
        let summary = ShakeSummary {
            dead_exports: vec!["b".into()],
            exports: vec!["a".into()],
            imports: BTreeMap::from([("./x".to_string(), vec!["side-effect".to_string()])]),
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["deadExports"][0], "b");
        assert_eq!(value["exports"][0], "a");
        assert_eq!(value["imports"]["./x"][0], "side-effect");
    }

    #[test]
    fn test_metadata_forwarded() {
        let module = ModuleBuilder::new("m.js")
            .finish()
            .with_metadata(json!({ "processors": [] }));
        let graph = ReferenceGraph::analyze(&module);
        let collected = collect(&module, &graph);
        let outcome = report(&module, collected, EliminationStats::default(), ShakeStatus::KeptAll);
        assert_eq!(outcome.metadata, Some(json!({ "processors": [] })));
    }
}
