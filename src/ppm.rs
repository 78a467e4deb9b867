//! Prediction by Partial Matching contexts.
//!
//! ## Intuition First
//!
//! A PPM model asks "given the last N symbols, what usually follows?" and
//! keeps a separate frequency table (a *context*) for every prefix it has
//! seen. Prediction starts at the longest context; if that context has
//! never seen the symbol, the model emits an *escape* bound and retries one
//! order lower, down to the order-0 context and finally a uniform split of
//! the whole alphabet. The escape probability itself must be estimated,
//! and methods A, B, and C below differ exactly there.
//!
//! With *exclusion*, symbols ruled out by a higher-order escape are removed
//! from the probability mass at lower orders, sharpening every subsequent
//! bound.
//!
//! ## References
//!
//! - Cleary, J. and Witten, I. (1984). "Data compression using adaptive
//!   coding and partial string matching."
//! - Moffat, A. (1990). "Implementing the PPM data compression scheme."

use std::collections::{HashMap, HashSet};

use ahash::RandomState;

use crate::model::{Bound, ProbabilityModel};
use crate::stream::Symbol;

/// Escape-probability estimation discipline applied on every context update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EscapeMethod {
    /// No escapes; plain counting. Used for fixed order-0 distributions.
    None,
    /// PPMA: one escape count as soon as the context is nonempty.
    A,
    /// PPMB: escape count = symbols seen so far; a first-seen symbol is
    /// indexed with zero mass and only gains mass on repeats. (This keeps
    /// the historical behavior of this lab rather than Moffat's canonical
    /// PPMB, which discounts repeats instead.)
    B,
    /// PPMC: escape count = distinct symbols; a new symbol starts at mass 1.
    C,
}

/// Per-prefix symbol statistics: a dense-index map, a cumulative count
/// vector with `cum[0] = 0`, and the escape count for the chosen method.
pub struct PpmContext {
    index: HashMap<Symbol, usize, RandomState>,
    cum: Vec<u64>,
    esc: u64,
    method: EscapeMethod,
}

impl PpmContext {
    /// Create an empty context using the given escape method.
    pub fn new(method: EscapeMethod) -> Self {
        Self {
            index: HashMap::with_capacity_and_hasher(64, RandomState::new()),
            cum: vec![0],
            esc: 0,
            method,
        }
    }

    /// Whether `symbol` has been indexed in this context.
    pub fn contains(&self, symbol: Symbol) -> bool {
        self.index.contains_key(&symbol)
    }

    /// Total probability mass: data counts plus the escape count.
    pub fn total(&self) -> u64 {
        self.cum[self.cum.len() - 1] + self.esc
    }

    /// The current escape count.
    pub fn escape_count(&self) -> u64 {
        self.esc
    }

    /// The data mass of `symbol` within this context (0 if unindexed).
    pub fn mass_of(&self, symbol: Symbol) -> u64 {
        match self.index.get(&symbol) {
            Some(&i) => self.cum[i] - self.cum[i - 1],
            None => 0,
        }
    }

    /// Number of distinct symbols indexed.
    pub fn distinct(&self) -> usize {
        self.index.len()
    }

    /// The probability bound of `symbol`. The symbol must be indexed.
    pub fn bound(&self, symbol: Symbol) -> Bound {
        let total = self.total() as f64;
        let i = self.index[&symbol];

        Bound {
            lower: self.cum[i - 1] as f64 / total,
            upper: self.cum[i] as f64 / total,
        }
    }

    /// The probability bound of `symbol` with the masses of `excluded`
    /// symbols removed from the normalization and from the cumulative
    /// segment below the symbol. The symbol itself is never excluded.
    pub fn bound_excluding(&self, symbol: Symbol, excluded: &HashSet<Symbol, RandomState>) -> Bound {
        let i = self.index[&symbol];
        let mut below = 0u64;
        let mut total_excluded = 0u64;

        for &other in excluded {
            if other == symbol {
                continue;
            }
            if let Some(&j) = self.index.get(&other) {
                let mass = self.cum[j] - self.cum[j - 1];
                total_excluded += mass;
                if j < i {
                    below += mass;
                }
            }
        }

        let total = (self.total() - total_excluded) as f64;
        Bound {
            lower: (self.cum[i - 1] - below) as f64 / total,
            upper: (self.cum[i] - below) as f64 / total,
        }
    }

    /// The escape bound: everything above the data mass, up to 1.
    pub fn esc_bound(&self) -> Bound {
        let total = self.total() as f64;
        Bound {
            lower: self.cum[self.cum.len() - 1] as f64 / total,
            upper: 1.0,
        }
    }

    /// The escape bound with excluded in-context masses removed from both
    /// the data segment and the normalization.
    pub fn esc_bound_excluding(&self, excluded: &HashSet<Symbol, RandomState>) -> Bound {
        let excluded_mass: u64 = excluded.iter().map(|&s| self.mass_of(s)).sum();
        let total = (self.total() - excluded_mass) as f64;

        Bound {
            lower: (self.cum[self.cum.len() - 1] - excluded_mass) as f64 / total,
            upper: 1.0,
        }
    }

    /// All symbols indexed in this context.
    pub fn symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.index.keys().copied()
    }

    /// Apply one observation of `symbol` under the context's escape method.
    pub fn update(&mut self, symbol: Symbol) {
        let seen = self.contains(symbol);

        if !seen {
            match self.method {
                EscapeMethod::None => {}
                EscapeMethod::A => {
                    if self.esc == 0 {
                        self.esc = 1;
                    }
                }
                EscapeMethod::B | EscapeMethod::C => self.esc += 1,
            }

            self.index.insert(symbol, self.cum.len());
            let top = self.cum[self.cum.len() - 1];
            self.cum.push(top);

            // PPMB defers the first unit of mass to the first repeat.
            if self.method == EscapeMethod::B {
                return;
            }
        }

        for i in self.index[&symbol]..self.cum.len() {
            self.cum[i] += 1;
        }
    }
}

/// An order-N PPM model over prefix-keyed contexts.
pub struct PpmModel {
    contexts: HashMap<Vec<Symbol>, PpmContext, RandomState>,
    nsymbols: u128,
    method: EscapeMethod,
    exclusion: bool,
}

impl PpmModel {
    /// Create a model for an alphabet of `nsymbols`. The model's order is
    /// set by the window length it is fed, not fixed at construction.
    pub fn new(nsymbols: u128, method: EscapeMethod, exclusion: bool) -> Self {
        Self::with_capacity(nsymbols, method, exclusion, 1 << 16)
    }

    /// Create a model with a pre-sizing hint for the context table.
    pub fn with_capacity(
        nsymbols: u128,
        method: EscapeMethod,
        exclusion: bool,
        capacity: usize,
    ) -> Self {
        Self {
            contexts: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
            nsymbols,
            method,
            exclusion,
        }
    }

    /// Number of live contexts (all orders pooled).
    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    /// The context stored for `prefix`, if any.
    pub fn context(&self, prefix: &[Symbol]) -> Option<&PpmContext> {
        self.contexts.get(prefix)
    }
}

impl ProbabilityModel for PpmModel {
    fn nsymbols(&self) -> u128 {
        self.nsymbols
    }

    /// Descend from the highest order the window supports down to order 0,
    /// emitting the symbol's bound where a context knows it and escape
    /// bounds where one does not, then fall back to an equiprobable split
    /// of the full alphabet.
    fn bounds(&self, window: &[Symbol]) -> Vec<Bound> {
        let symbol = window[window.len() - 1];
        let mut out = Vec::new();
        let mut excluded: HashSet<Symbol, RandomState> = HashSet::with_hasher(RandomState::new());

        for order in (0..window.len()).rev() {
            let prefix = &window[window.len() - 1 - order..window.len() - 1];
            let Some(context) = self.contexts.get(prefix) else {
                continue;
            };

            if context.contains(symbol) {
                let bound = if self.exclusion {
                    context.bound_excluding(symbol, &excluded)
                } else {
                    context.bound(symbol)
                };

                // A zero-mass hit (PPMB's deferred first unit) collapses
                // the interval; escape past it instead.
                if self.method == EscapeMethod::B && bound.lower == bound.upper {
                    out.push(if self.exclusion {
                        context.esc_bound_excluding(&excluded)
                    } else {
                        context.esc_bound()
                    });
                } else {
                    out.push(bound);
                    return out;
                }
            } else {
                log::trace!("ppm: escape at order {order}");
                out.push(if self.exclusion {
                    context.esc_bound_excluding(&excluded)
                } else {
                    context.esc_bound()
                });
            }

            if self.exclusion {
                excluded.extend(context.symbols());
            }
        }

        let n = self.nsymbols as f64;
        out.push(Bound {
            lower: symbol as f64 / n,
            upper: (symbol as f64 + 1.0) / n,
        });
        out
    }

    /// Update the context at every suffix of the window's prefix, order 0
    /// up to the full prefix, with the observed symbol.
    fn update(&mut self, window: &[Symbol]) {
        let symbol = window[window.len() - 1];

        for order in 0..window.len() {
            let prefix = &window[window.len() - 1 - order..window.len() - 1];
            self.contexts
                .entry(prefix.to_vec())
                .or_insert_with(|| PpmContext::new(self.method))
                .update(symbol);
        }
    }
}
