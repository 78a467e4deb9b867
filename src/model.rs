//! Probability models feeding the arithmetic coder.
//!
//! A model turns each symbol window (prefix plus current symbol) into a
//! sequence of probability [`Bound`]s. One bound per symbol is the common
//! case; context models emit extra escape bounds on the way down to a
//! context that knows the symbol.

use crate::ppm::{EscapeMethod, PpmContext};
use crate::stream::{Symbol, WindowedSymbolStream};

/// A half-open probability interval `[lower, upper)` within `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bound {
    /// Cumulative probability below the symbol.
    pub lower: f64,
    /// Cumulative probability up to and including the symbol.
    pub upper: f64,
}

/// A source of probability bounds for the arithmetic coder.
pub trait ProbabilityModel {
    /// Declared alphabet size.
    fn nsymbols(&self) -> u128;

    /// The bound sequence coding the last symbol of `window` given the
    /// preceding symbols of `window` as its context.
    fn bounds(&self, window: &[Symbol]) -> Vec<Bound>;

    /// Account for the last symbol of `window` having been coded.
    fn update(&mut self, window: &[Symbol]);
}

/// An order-0 model with probabilities fixed by one pass over the data.
pub struct FixedModel {
    dist: PpmContext,
    nsymbols: u128,
}

impl FixedModel {
    /// Build the empirical distribution by draining `stream`.
    pub fn new(nsymbols: u128, stream: &mut WindowedSymbolStream<'_>) -> Self {
        let mut dist = PpmContext::new(EscapeMethod::None);

        while !stream.is_empty() {
            let window = stream.next();
            dist.update(window[window.len() - 1]);
        }

        Self { dist, nsymbols }
    }
}

impl ProbabilityModel for FixedModel {
    fn nsymbols(&self) -> u128 {
        self.nsymbols
    }

    fn bounds(&self, window: &[Symbol]) -> Vec<Bound> {
        vec![self.dist.bound(window[window.len() - 1])]
    }

    fn update(&mut self, _window: &[Symbol]) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_model_splits_unit_interval_by_counts() {
        let data = [0u8, 0, 0, 1]; // 0 three times, 1 once
        let mut pass = WindowedSymbolStream::new(&data, 8, 1).unwrap();
        let model = FixedModel::new(256, &mut pass);

        let b0 = model.bounds(&[0])[0];
        let b1 = model.bounds(&[1])[0];
        assert_eq!(b0, Bound { lower: 0.0, upper: 0.75 });
        assert_eq!(b1, Bound { lower: 0.75, upper: 1.0 });
    }
}
