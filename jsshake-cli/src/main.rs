//! jsshake CLI - export-driven tree shaking for JavaScript module ASTs.
//!
//! Features:
//! - ESTree JSON input (`*.json` files, one module each)
//! - jsshake.toml configuration with command-line overrides
//! - Rayon-powered parallel loading
//! - Plain text or JSON summaries
//! - Graphviz DOT visualization of binding graphs

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use jsshake_core::{
    build_graph, gather_ast_files, generate_dot, init_structured_logging, load_config, load_config_file,
    load_module, log_event, print_json, print_module, print_plain, Module, ReferenceGraph, ShakeConfig,
    ShakeSession, ShakeSummary, Shaker, ShakerResult, UnknownExportPolicy,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Export-driven tree shaker for JavaScript modules")]
pub struct Cli {
    /// Directory of ESTree JSON files, or a single file
    #[arg(default_value = ".")]
    path: String,

    /// Requested exports, comma separated (`*` keeps all, `side-effect` keeps side-effect imports)
    #[arg(long, value_delimiter = ',')]
    only: Option<Vec<String>>,

    /// What to do with requested names the module does not export
    #[arg(long, value_name = "POLICY")]
    policy: Option<UnknownExportPolicy>,

    /// Never remove side-effect imports
    #[arg(long)]
    keep_side_effects: bool,

    /// Configuration file (defaults to jsshake.toml under PATH)
    #[arg(long, value_name = "FILE")]
    config: Option<String>,

    /// Output results in JSON format
    #[arg(long)]
    json: bool,

    /// Print the shaken source of each module
    #[arg(long)]
    print: bool,

    /// Write shaken sources into this directory
    #[arg(long, value_name = "DIR")]
    out_dir: Option<String>,

    /// Generate Graphviz DOT output of each module's binding graph
    #[arg(long)]
    dot: bool,
}

/// Security: Validates output paths to prevent path traversal attacks.
///
/// Rejects null bytes, absolute paths and `..` components.
fn validate_output_path(path: &str) -> Result<PathBuf> {
    if path.contains('\0') {
        return Err(anyhow!("Output path contains null bytes"));
    }

    let p = PathBuf::from(path);

    if p.is_absolute() {
        return Err(anyhow!("Output path must be relative, not absolute: {}", path));
    }

    for component in p.components() {
        if matches!(component, std::path::Component::ParentDir) {
            return Err(anyhow!("Path traversal (..) not allowed in output paths: {}", path));
        }
    }

    Ok(p)
}

/// Loads jsshake.toml (explicit file first, then PATH) and applies the
/// command-line overrides on top.
fn resolve_config(cli: &Cli, root: &Path) -> Result<ShakeConfig> {
    let config_dir = if root.is_file() {
        root.parent().unwrap_or(Path::new("."))
    } else {
        root
    };

    let mut cfg = match &cli.config {
        Some(file) => load_config_file(Path::new(file))?,
        None => load_config(config_dir)?.unwrap_or_default(),
    };

    if let Some(only) = &cli.only {
        cfg.only_exports = only.iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
    }
    if let Some(policy) = cli.policy {
        cfg.unknown_export_policy = policy;
    }
    if cli.keep_side_effects {
        cfg.keep_side_effects = true;
    }
    Ok(cfg)
}

/// Output file for a module: its filename relative to the scan root.
fn output_file(out_dir: &Path, root: &Path, filename: &str) -> PathBuf {
    let path = Path::new(filename);
    let relative = path
        .strip_prefix(root)
        .ok()
        .filter(|p| !p.as_os_str().is_empty())
        .or_else(|| path.file_name().map(Path::new))
        .unwrap_or(path);
    out_dir.join(relative)
}

/// DOT rendering of a module's binding graph, taken before shaking.
fn binding_dot(module: &Module) -> String {
    let refs = ReferenceGraph::analyze(module);
    let graph = build_graph(module, &refs);
    generate_dot(module, &refs, &graph)
}

fn main() -> Result<()> {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] jsshake internal error: {}", info);
        eprintln!("[PANIC] The process will exit safely with code 2.");
    }));

    init_structured_logging();

    let cli = Cli::parse();
    let root = PathBuf::from(&cli.path);

    let cfg = resolve_config(&cli, &root)?;
    let shaker = Shaker::from_config(&cfg).context("Invalid shaker configuration")?;

    let out_dir = match &cli.out_dir {
        Some(dir) => match validate_output_path(dir) {
            Ok(p) => Some(p),
            Err(e) => {
                eprintln!("[ERROR] Invalid output path: {}", e);
                std::process::exit(2);
            }
        },
        None => None,
    };

    let files = gather_ast_files(&root)?;
    log_event("scan", &format!("{} module(s) under {}", files.len(), root.display()));

    // Parse in parallel; shaking stays sequential and in file order.
    let loaded: Vec<(PathBuf, ShakerResult<Module>)> =
        files.par_iter().map(|p| (p.clone(), load_module(p))).collect();

    let mut session = ShakeSession::new(shaker);
    let mut summaries: BTreeMap<String, ShakeSummary> = BTreeMap::new();
    let mut failures = 0usize;

    for (path, result) in loaded {
        let mut module = match result {
            Ok(m) => m,
            Err(e) => {
                eprintln!("[WARN] Skipping {}: {}", path.display(), e);
                failures += 1;
                continue;
            }
        };

        let dot = cli.dot.then(|| binding_dot(&module));

        let outcome = match session.shake(&mut module) {
            Ok(o) => o,
            Err(e) => {
                eprintln!("[WARN] {}: {}", module.filename, e);
                failures += 1;
                continue;
            }
        };

        if let Some(dot) = dot {
            println!("{}", dot);
        }

        let source = print_module(&module);
        if cli.print {
            println!("// {}", module.filename);
            print!("{}", source);
        }
        if let Some(dir) = &out_dir {
            let target = output_file(dir, &root, &module.filename);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            if let Err(e) = fs::write(&target, &source) {
                eprintln!("[WARN] Write failed to {}: {}", target.display(), e);
            }
        }

        if !cli.json {
            print_plain(&module.filename, &outcome);
        }
        summaries.insert(module.filename.clone(), outcome.summary);
    }

    if cli.json {
        print_json(&summaries);
    }

    log_event("done", &format!("{} shaken, {} failed", summaries.len(), failures));

    if failures > 0 && summaries.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}
