use std::collections::{BTreeMap, HashMap};

use crate::surface::Surface;

/// Runtime limits shared by both execution strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Calls may nest this deep before failing with R007.
    pub max_call_depth: usize,
}

impl Default for Limits {
    fn default() -> Self { Self { max_call_depth: 256 } }
}

/// Mutable state of one run. Created fresh for every `run` or `invoke` and
/// dropped afterwards.
///
/// `F` is how a strategy refers to a defined function: the tree walker keeps
/// the definition node, the VM keeps a code address.
pub struct Context<'s, F> {
    pub(crate) vars: BTreeMap<i64, f64>,
    pub(crate) functions: HashMap<i64, F>,
    pub(crate) surface: &'s mut dyn Surface,
    /// Set by `;`, cleared by the loop or call that observes it.
    pub(crate) breaking: bool,
    pub(crate) depth: usize,
    pub(crate) limits: Limits,
}

impl<'s, F: Copy> Context<'s, F> {
    pub fn new(surface: &'s mut dyn Surface) -> Self {
        Self::with_limits(surface, Limits::default())
    }

    pub fn with_limits(surface: &'s mut dyn Surface, limits: Limits) -> Self {
        Self {
            vars: BTreeMap::new(),
            functions: HashMap::new(),
            surface,
            breaking: false,
            depth: 0,
            limits,
        }
    }

    /// Stored value at `key`, 0 when unset.
    pub fn var(&self, key: i64) -> f64 { self.vars.get(&key).copied().unwrap_or(0.0) }

    pub fn set_var(&mut self, key: i64, value: f64) { self.vars.insert(key, value); }

    pub fn variables(&self) -> &BTreeMap<i64, f64> { &self.vars }

    pub fn is_defined(&self, key: i64) -> bool { self.functions.contains_key(&key) }

    pub(crate) fn define(&mut self, key: i64, f: F) {
        tracing::debug!(key, "define function");
        self.functions.insert(key, f);
    }

    pub(crate) fn function(&self, key: i64) -> Option<F> { self.functions.get(&key).copied() }

    /// Bind positional arguments to the parameter slots -1, -2, …
    pub(crate) fn bind_args(&mut self, args: &[f64]) {
        for (i, a) in args.iter().enumerate() {
            self.vars.insert(-(i as i64) - 1, *a);
        }
    }
}
