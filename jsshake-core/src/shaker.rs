//! Builder API for shaking modules.
//!
//! ```rust,ignore
//! use jsshake_core::prelude::*;
//!
//! let shaker = Shaker::new(["default", "styles"])
//!     .unknown_export_policy(UnknownExportPolicy::ReexportAll)
//!     .keep_side_effects(false);
//!
//! let outcome = shaker.shake(&mut module)?;
//! println!("dead: {:?}", outcome.dead_exports);
//! ```
//!
//! One call runs the whole pipeline on a module: collect exports and
//! imports, normalize re-read exports, decide liveness, eliminate to a fixed
//! point, report what survived.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use tracing::{info, info_span, warn};

use crate::ast::Module;
use crate::collect::collect;
use crate::config::{KnownDeadImport, ShakeConfig, UnknownExportPolicy};
use crate::eliminate::{eliminate, EliminationStats};
#[cfg(feature = "env-strip")]
use crate::env_strip::EnvStrip;
use crate::error::{ShakerError, ShakerResult};
use crate::liveness::{build_worklist, compute_liveness, Liveness, RequestedExports, SideEffectPolicy};
use crate::normalize::normalize_exports;
use crate::report::{report, ShakeOutcome, ShakeStatus};
use crate::scope::ReferenceGraph;

/// Decides whether a side-effect import from a source must stay.
pub type KeepPredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Shaking options for a batch of modules.
#[derive(Clone)]
pub struct Shaker {
    request: RequestedExports,
    policy: UnknownExportPolicy,
    keep_side_effects: bool,
    keep_sources: Vec<Regex>,
    keep_predicate: Option<KeepPredicate>,
    known_dead_imports: Vec<KnownDeadImport>,
    alias_imported_names: bool,
    #[cfg(feature = "env-strip")]
    env_strip: Option<Arc<EnvStrip>>,
}

impl fmt::Debug for Shaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shaker")
            .field("request", &self.request.original())
            .field("policy", &self.policy)
            .field("keep_side_effects", &self.keep_side_effects)
            .field("keep_sources", &self.keep_sources)
            .field("keep_predicate", &self.keep_predicate.is_some())
            .field("known_dead_imports", &self.known_dead_imports)
            .field("alias_imported_names", &self.alias_imported_names)
            .finish()
    }
}

impl Shaker {
    /// Create a shaker for the given requested export names. `*` keeps every
    /// export, `side-effect` keeps side-effect imports.
    pub fn new<I, S>(request: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            request: RequestedExports::new(request),
            policy: UnknownExportPolicy::default(),
            keep_side_effects: false,
            keep_sources: Vec::new(),
            keep_predicate: None,
            known_dead_imports: Vec::new(),
            alias_imported_names: true,
            #[cfg(feature = "env-strip")]
            env_strip: None,
        }
    }

    /// Build a shaker from a loaded configuration.
    pub fn from_config(config: &ShakeConfig) -> ShakerResult<Self> {
        let mut shaker = Self::new(&config.only_exports)
            .unknown_export_policy(config.unknown_export_policy)
            .keep_side_effects(config.keep_side_effects)
            .alias_imported_names(config.alias_imported_names)
            .keep_side_effect_sources(&config.keep_side_effect_sources)?;
        for dead in &config.known_dead_imports {
            shaker = shaker.known_dead_import(&dead.name, &dead.source);
        }
        shaker.env_strip_from_config(config)
    }

    #[cfg(feature = "env-strip")]
    fn env_strip_from_config(self, config: &ShakeConfig) -> ShakerResult<Self> {
        if !config.env_strip.enabled {
            return Ok(self);
        }
        Ok(self.with_env_strip(EnvStrip::from_config(&config.env_strip)?))
    }

    #[cfg(not(feature = "env-strip"))]
    fn env_strip_from_config(self, _config: &ShakeConfig) -> ShakerResult<Self> {
        Ok(self)
    }

    /// Replace the requested export names.
    pub fn only_exports<I, S>(mut self, request: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.request = RequestedExports::new(request);
        self
    }

    pub fn unknown_export_policy(mut self, policy: UnknownExportPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Never remove side-effect imports.
    pub fn keep_side_effects(mut self, enabled: bool) -> Self {
        self.keep_side_effects = enabled;
        self
    }

    /// Keep side-effect imports whose source matches any pattern.
    pub fn keep_side_effect_sources(mut self, patterns: &[String]) -> ShakerResult<Self> {
        for pattern in patterns {
            let re = Regex::new(pattern).map_err(|e| {
                ShakerError::invalid_argument(format!("keep-side-effect-sources pattern `{}`: {}", pattern, e))
            })?;
            self.keep_sources.push(re);
        }
        Ok(self)
    }

    /// Keep side-effect imports for which `predicate` returns `true`.
    pub fn keep_side_effect_if(mut self, predicate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.keep_predicate = Some(Arc::new(predicate));
        self
    }

    /// Treat `name` imported from `source` as dead.
    pub fn known_dead_import(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.known_dead_imports.push(KnownDeadImport {
            name: name.into(),
            source: source.into(),
        });
        self
    }

    /// Keep exports whose local name matches an imported name.
    pub fn alias_imported_names(mut self, enabled: bool) -> Self {
        self.alias_imported_names = enabled;
        self
    }

    #[cfg(feature = "env-strip")]
    pub fn with_env_strip(mut self, strip: EnvStrip) -> Self {
        self.env_strip = Some(Arc::new(strip));
        self
    }

    pub fn request(&self) -> &RequestedExports {
        &self.request
    }

    fn keeps_source(&self, source: &str) -> bool {
        self.keep_sources.iter().any(|re| re.is_match(source))
            || self.keep_predicate.as_ref().is_some_and(|keep| keep(source))
    }

    /// Shake `module` in place.
    pub fn shake(&self, module: &mut Module) -> ShakerResult<ShakeOutcome> {
        self.shake_at(module, None)
    }

    pub(crate) fn shake_at(&self, module: &mut Module, file_idx: Option<usize>) -> ShakerResult<ShakeOutcome> {
        let span = info_span!("shake", file = %module.filename, file_idx = ?file_idx);
        let _enter = span.enter();

        let graph = ReferenceGraph::analyze(module);
        let mut collected = collect(module, &graph);
        let normalized = normalize_exports(module, &mut collected);
        let graph = if normalized.is_empty() {
            graph
        } else {
            ReferenceGraph::analyze(module)
        };

        let liveness = compute_liveness(
            module,
            &collected,
            &self.request,
            self.policy,
            self.alias_imported_names,
        )?;

        let (stats, status) = match liveness {
            Liveness::RemoveAll => {
                for stmt in module.body().to_vec() {
                    module.remove(stmt);
                }
                (EliminationStats::default(), ShakeStatus::RemovedAll)
            }
            Liveness::Skip(reason) => {
                warn!(reason = %reason, "module left unshaken");
                (EliminationStats::default(), ShakeStatus::Skipped(reason.to_string()))
            }
            Liveness::KeepAll => (EliminationStats::default(), ShakeStatus::KeptAll),
            Liveness::Shake {
                alive,
                keep_side_effect_imports,
            } => {
                let graph = self.strip_env(module, graph);
                let keep = |source: &str| self.keeps_source(source);
                let worklist = build_worklist(
                    module,
                    &graph,
                    &collected,
                    &alive,
                    SideEffectPolicy {
                        remove: !(self.keep_side_effects || keep_side_effect_imports),
                        keep_source: &keep,
                    },
                    &self.known_dead_imports,
                );
                let stats = eliminate(module, &graph, &worklist);
                (stats, ShakeStatus::Shaken)
            }
        };

        let outcome = report(module, collected, stats, status);
        info!(
            status = %outcome.status,
            exports = outcome.exports.len(),
            dead_exports = outcome.dead_exports.len(),
            passes = outcome.stats.passes,
            "module shaken"
        );
        Ok(outcome)
    }

    /// Replaces environment globals when configured for this file. Returns
    /// the graph to eliminate with.
    #[cfg(feature = "env-strip")]
    fn strip_env(&self, module: &mut Module, graph: ReferenceGraph) -> ReferenceGraph {
        match &self.env_strip {
            Some(strip) if strip.applies_to(&module.filename) && strip.run(module, &graph) > 0 => {
                ReferenceGraph::analyze(module)
            }
            _ => graph,
        }
    }

    #[cfg(not(feature = "env-strip"))]
    fn strip_env(&self, _module: &mut Module, graph: ReferenceGraph) -> ReferenceGraph {
        graph
    }
}
