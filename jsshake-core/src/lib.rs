//! jsshake-core: export-driven tree shaking for JavaScript modules
//!
//! Given a parsed module and the subset of its exports that importers
//! actually use, removes every statement, declaration, import and export
//! that those exports do not reach, while keeping side-effecting imports
//! that may still matter.
//!
//! # Features
//!
//! - **ES modules and CommonJS**: `export`/`import` syntax, `exports.x = …`,
//!   `require()`, `__exportStar` and `__esModule` interop markers
//! - **Re-exports**: named, namespace and `export *` forwarding
//! - **Destructured exports**: several names sharing one initializer
//! - **Fixed-point elimination**: dead exports cascade into the helpers,
//!   bindings and imports only they used
//! - **Interop safety**: modules that may be default-imported through
//!   CommonJS interop are left untouched
//! - **Environment stripping**: browser globals replaced by `undefined`
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use jsshake_core::prelude::*;
//!
//! let mut module = scan::load_module(Path::new("app.js.json"))?;
//! let outcome = Shaker::new(["default"]).shake(&mut module)?;
//!
//! println!("{}", print_module(&module));
//! println!("dead exports: {:?}", outcome.dead_exports);
//! ```
//!
//! # Module Organization
//!
//! - [`ast`]: arena AST, ESTree JSON lowering, builder and printer
//! - [`scope`]: scopes, bindings and the reference graph
//! - [`collect`]: export / import / re-export discovery
//! - [`normalize`]: rewriting of exports read back inside their module
//! - [`liveness`]: requested exports, alive set and deletion worklist
//! - [`eliminate`]: fixed-point removal with cascading
//! - [`report`]: surviving surface and summaries
//! - [`shaker`]: builder API running the whole pipeline
//! - [`session`]: sequential multi-module runs
//! - [`graph`]: binding dependency graph and reachability
//! - [`config`]: `jsshake.toml` loading
//! - [`error`]: typed error handling
//!
//! # Cargo Features
//!
//! - `env-strip` (default): environment-code stripping pass
//! - `dot` (default): Graphviz DOT output of binding graphs

pub mod ast;
pub mod collect;
pub mod config;
pub mod eliminate;
pub mod error;
pub mod graph;
pub mod liveness;
pub mod logging;
pub mod normalize;
pub mod prelude;
pub mod report;
pub mod scan;
pub mod scope;
pub mod session;
pub mod shaker;

#[cfg(feature = "env-strip")]
pub mod env_strip;

#[cfg(feature = "dot")]
pub mod visualize;

// ============================================================================
// Explicit Re-exports
// ============================================================================

// AST
pub use ast::estree::{module_from_estree, module_from_value};
pub use ast::{print_module, Module, ModuleBuilder, Node, NodeId};

// Error types
pub use error::{IoResultExt, ShakerError, ShakerResult};

// Configuration
pub use config::{load_config, load_config_file, EnvStripConfig, KnownDeadImport, ShakeConfig, UnknownExportPolicy};

// Pipeline
pub use collect::{collect, Collected, ExportName, Imported, ImportRecord, ModuleKind, ReexportRecord};
pub use eliminate::{eliminate, find_action, remove_with_related, Action, EliminationStats, Shadow};
pub use liveness::{build_worklist, compute_liveness, AbortReason, AliveSet, Liveness, Requested, RequestedExports, Worklist};
pub use normalize::normalize_exports;
pub use scope::{Binding, BindingId, BindingKind, ReferenceGraph};

// Builder API
pub use session::ShakeSession;
pub use shaker::{KeepPredicate, Shaker};

// Reporting
pub use report::{print_json, print_plain, report, ShakeOutcome, ShakeStatus, ShakeSummary};

// Graph building
pub use graph::{build_graph, reachable_from_roots, BindingGraph};

// Logging
pub use logging::{init_structured_logging, log_event};

// File scanning
pub use scan::{gather_ast_files, gather_ast_files_with_excludes, load_module};

// Feature-gated re-exports
#[cfg(feature = "env-strip")]
pub use env_strip::EnvStrip;

#[cfg(feature = "dot")]
pub use visualize::generate_dot;
