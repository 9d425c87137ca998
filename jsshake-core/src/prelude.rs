//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use jsshake_core::prelude::*;
//! ```
//!
//! Brings in what a typical caller needs to load, shake and print modules.

// Modules and their construction
pub use crate::ast::estree::module_from_estree;
pub use crate::ast::{print_module, Module, ModuleBuilder};

// Shaking
pub use crate::session::ShakeSession;
pub use crate::shaker::Shaker;

// Results
pub use crate::report::{ShakeOutcome, ShakeStatus, ShakeSummary};

// Error types
pub use crate::error::{ShakerError, ShakerResult};

// Configuration
pub use crate::config::{load_config, ShakeConfig, UnknownExportPolicy};

// File scanning
pub use crate::scan::{gather_ast_files, load_module};
