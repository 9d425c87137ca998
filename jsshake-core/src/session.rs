//! Sequential shaking of many modules with one [`Shaker`].

use std::collections::HashMap;

use crate::ast::Module;
use crate::error::ShakerResult;
use crate::report::ShakeOutcome;
use crate::shaker::Shaker;

/// Runs modules through a shaker one after another.
///
/// Each distinct filename gets a stable index on first sight. The index is
/// attached to the `shake` tracing span so a module's events can be told
/// apart from its neighbours' when several runs are interleaved in one log.
#[derive(Debug)]
pub struct ShakeSession {
    shaker: Shaker,
    file_indices: HashMap<String, usize>,
    processed: usize,
}

impl ShakeSession {
    pub fn new(shaker: Shaker) -> Self {
        Self {
            shaker,
            file_indices: HashMap::new(),
            processed: 0,
        }
    }

    pub fn shaker(&self) -> &Shaker {
        &self.shaker
    }

    /// Index of `filename`, assigning the next one if it is new.
    pub fn file_index(&mut self, filename: &str) -> usize {
        let next = self.file_indices.len();
        *self.file_indices.entry(filename.to_string()).or_insert(next)
    }

    pub fn shake(&mut self, module: &mut Module) -> ShakerResult<ShakeOutcome> {
        let idx = self.file_index(&module.filename);
        self.processed += 1;
        self.shaker.shake_at(module, Some(idx))
    }

    /// Shakes every module in order. A failing module does not stop the
    /// others.
    pub fn shake_all<'m>(
        &mut self,
        modules: impl IntoIterator<Item = &'m mut Module>,
    ) -> Vec<(String, ShakerResult<ShakeOutcome>)> {
        modules
            .into_iter()
            .map(|module| {
                let result = self.shake(module);
                (module.filename.clone(), result)
            })
            .collect()
    }

    /// Number of shake calls so far.
    pub fn processed(&self) -> usize {
        self.processed
    }

    /// Number of distinct files seen.
    pub fn file_count(&self) -> usize {
        self.file_indices.len()
    }
}
