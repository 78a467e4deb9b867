//! Integer-interval arithmetic coding.
//!
//! ## Intuition First
//!
//! Arithmetic coding narrows a working interval once per probability bound:
//! a likely symbol shrinks it a little (few bits), an unlikely one a lot
//! (many bits). The interval lives in fixed-width integers, so whenever
//! its bounds agree on their most significant bit the coder emits that bit
//! and shifts it out (E1 below the midpoint, E2 above). When the interval
//! straddles the midpoint while sitting inside the middle two quarters
//! (E3), no bit can be emitted yet; the coder expands the interval and
//! remembers to emit an opposite *follow bit* after the next decided bit.
//!
//! This coder measures rather than transcodes: it reports the number of
//! bits the input would occupy. No terminating flush is emitted, and
//! decoding is out of scope.
//!
//! ## References
//!
//! - Witten, I., Neal, R., and Cleary, J. (1987). "Arithmetic coding for
//!   data compression."

use crate::error::{Error, Result};
use crate::model::{Bound, ProbabilityModel};
use crate::stream::WindowedSymbolStream;

/// Widest supported coding interval, in bits; one below the `u64` storage.
pub const MAX_WORD_LENGTH: u32 = 63;

/// An arithmetic encoder with a fixed interval word length.
pub struct ArithmeticEncoder {
    word_length: u32,
    mask: u64,
    half: u64,
    quarter: u64,
    trace: Option<String>,
}

impl ArithmeticEncoder {
    /// Create an encoder whose interval spans `word_length` bits.
    ///
    /// # Errors
    /// Returns [`Error::InvalidWordLength`] unless `1 <= word_length <= 63`.
    pub fn new(word_length: u32) -> Result<Self> {
        if word_length == 0 || word_length > MAX_WORD_LENGTH {
            return Err(Error::InvalidWordLength(word_length));
        }

        let mask = (1u64 << word_length) - 1;
        let half = (mask + 1) >> 1;

        Ok(Self {
            word_length,
            mask,
            half,
            quarter: half >> 1,
            trace: None,
        })
    }

    /// Create an encoder that also records the emitted bit string.
    ///
    /// # Errors
    /// Returns [`Error::InvalidWordLength`] unless `1 <= word_length <= 63`.
    pub fn with_trace(word_length: u32) -> Result<Self> {
        let mut encoder = Self::new(word_length)?;
        encoder.trace = Some(String::with_capacity(1 << 10));
        Ok(encoder)
    }

    /// The recorded bit string, when tracing was requested.
    pub fn trace(&self) -> Option<&str> {
        self.trace.as_deref()
    }

    /// Drain `stream` through `model`, narrowing the interval once per
    /// bound, and return the number of bits emitted.
    ///
    /// # Errors
    /// Returns [`Error::IntervalCollapse`] if a bound truncates to a
    /// zero-width interval; the word length is too small for the model's
    /// probabilities.
    pub fn encode<M: ProbabilityModel>(
        &mut self,
        stream: &mut WindowedSymbolStream<'_>,
        model: &mut M,
    ) -> Result<u64> {
        let mut lo = 0u64;
        let mut hi = self.mask;
        let mut e3_count = 0u64;
        let mut emitted = 0u64;

        if let Some(trace) = &mut self.trace {
            trace.clear();
        }
        log::trace!(
            "arith: init lo={lo:0w$b} hi={hi:0w$b}",
            w = self.word_length as usize
        );

        while !stream.is_empty() {
            let window = stream.next().to_vec();
            let bounds = model.bounds(&window);

            for bound in &bounds {
                self.narrow(&mut lo, &mut hi, bound)?;
                emitted += self.renormalize(&mut lo, &mut hi, &mut e3_count);
            }

            model.update(&window);
        }

        Ok(emitted)
    }

    /// Scale the interval into `[lower, upper)` of its current width.
    fn narrow(&self, lo: &mut u64, hi: &mut u64, bound: &Bound) -> Result<()> {
        let range = (*hi - *lo + 1) as f64;
        let up = (range * bound.upper) as u64;
        let down = (range * bound.lower) as u64;

        if up == down {
            return Err(Error::IntervalCollapse);
        }

        *hi = lo.wrapping_add(up).wrapping_sub(1) & self.mask;
        *lo = lo.wrapping_add(down) & self.mask;

        log::trace!(
            "arith: bound ({}, {}) -> lo={lo:0w$b} hi={hi:0w$b}",
            bound.lower,
            bound.upper,
            w = self.word_length as usize
        );
        Ok(())
    }

    /// Run E1/E2/E3 to exhaustion; returns the number of bits emitted.
    fn renormalize(&mut self, lo: &mut u64, hi: &mut u64, e3_count: &mut u64) -> u64 {
        let mut emitted = 0u64;

        loop {
            let lo_msb = *lo >= self.half;
            let hi_msb = *hi >= self.half;

            if lo_msb == hi_msb {
                // E1/E2: the decided bit, then any deferred follow bits.
                emitted += 1 + *e3_count;
                if let Some(trace) = &mut self.trace {
                    trace.push(if lo_msb { '1' } else { '0' });
                    for _ in 0..*e3_count {
                        trace.push(if lo_msb { '0' } else { '1' });
                    }
                }
                *e3_count = 0;

                *lo = (*lo << 1) & self.mask;
                *hi = ((*hi << 1) | 1) & self.mask;
                log::trace!(
                    "arith: {} lo={lo:0w$b} hi={hi:0w$b}",
                    if lo_msb { "e2" } else { "e1" },
                    w = self.word_length as usize
                );
            } else if self.quarter <= *lo && *hi < self.half + self.quarter {
                // E3: expand the middle two quarters and defer one bit.
                *e3_count += 1;

                *lo = ((*lo << 1) + self.half) & self.mask;
                *hi = (((*hi << 1) | 1) + self.half) & self.mask;
                log::trace!(
                    "arith: e3 cnt={e3_count} lo={lo:0w$b} hi={hi:0w$b}",
                    w = self.word_length as usize
                );
            } else {
                break;
            }

            debug_assert!(*lo <= *hi, "interval inverted after renormalization");
        }

        emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FixedModel;
    use crate::ppm::{EscapeMethod, PpmModel};

    // The textbook exercise: "cat_ate_hat" over {h,e,t,a,c,_} = 0..=5.
    const EXERCISE: [u8; 11] = [4, 3, 2, 5, 3, 2, 1, 5, 0, 3, 2];

    #[test]
    fn word_length_bounds_are_enforced() {
        assert!(ArithmeticEncoder::new(0).is_err());
        assert!(ArithmeticEncoder::new(64).is_err());
        assert!(ArithmeticEncoder::new(63).is_ok());
    }

    #[test]
    fn exercise_fixed_model_trace_is_deterministic() {
        let run = || {
            let mut pass = WindowedSymbolStream::new(&EXERCISE, 8, 1).unwrap();
            let mut model = FixedModel::new(6, &mut pass);
            let mut stream = WindowedSymbolStream::new(&EXERCISE, 8, 1).unwrap();
            let mut encoder = ArithmeticEncoder::with_trace(6).unwrap();
            let bits = encoder.encode(&mut stream, &mut model).unwrap();
            (bits, encoder.trace().unwrap().to_owned())
        };

        let (bits, trace) = run();
        assert!(bits > 0);
        assert_eq!(bits as usize, trace.len());
        assert!(trace.chars().all(|c| c == '0' || c == '1'));

        let (bits2, trace2) = run();
        assert_eq!(bits, bits2);
        assert_eq!(trace, trace2);
    }

    #[test]
    fn exercise_ppma_encodes_fewer_bits_than_uniform() {
        let mut model = PpmModel::new(6, EscapeMethod::A, false);
        let mut stream = WindowedSymbolStream::new(&EXERCISE, 8, 2).unwrap();
        let mut encoder = ArithmeticEncoder::new(6).unwrap();
        let bits = encoder.encode(&mut stream, &mut model).unwrap();

        assert!(bits > 0);
        // 11 symbols of a 6-letter alphabet cost ~2.59 bits each uniformly;
        // escapes add overhead early but the model must stay in the same
        // ballpark.
        assert!(bits < 11 * 6, "{bits}");
    }

    #[test]
    fn repetition_compresses_well_under_ppm() {
        let data: Vec<u8> = (0..48u8).map(|i| i % 4).collect();
        let mut model = PpmModel::new(4, EscapeMethod::C, true);
        let mut stream = WindowedSymbolStream::new(&data, 8, 3).unwrap();
        let mut encoder = ArithmeticEncoder::new(16).unwrap();
        let bits = encoder.encode(&mut stream, &mut model).unwrap();

        // A perfectly periodic sequence becomes nearly free once the
        // order-2 contexts are primed.
        assert!(bits < 2 * 48, "{bits}");
    }

    #[test]
    fn tiny_word_length_collapses_on_skewed_input() {
        // One symbol hogging the distribution leaves the rare symbols'
        // bounds below the resolution of a 2-bit interval.
        let mut data = vec![0u8; 400];
        data.push(1);
        data.push(2);
        let mut pass = WindowedSymbolStream::new(&data, 8, 1).unwrap();
        let mut model = FixedModel::new(256, &mut pass);
        let mut stream = WindowedSymbolStream::new(&data, 8, 1).unwrap();
        let mut encoder = ArithmeticEncoder::new(2).unwrap();

        assert!(matches!(
            encoder.encode(&mut stream, &mut model),
            Err(Error::IntervalCollapse)
        ));
    }
}
