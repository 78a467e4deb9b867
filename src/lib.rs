//! # Entropy-Coding Laboratory
//!
//! *Measure how compressible a byte stream is, without compressing it.*
//!
//! ## Intuition First
//!
//! Take any buffer, decide how many bits make one "symbol" (the *stride*),
//! and ask: how many bits per symbol would each classic statistical coder
//! spend on this data? The answer depends on how much structure the coder
//! can see — a static Huffman code sees only the marginal distribution,
//! tuple extension sees short-range correlation, an adaptive code sees the
//! distribution drift, and a context model sees conditional structure.
//!
//! This crate implements the measurement side of that experiment. Each
//! coder consumes the stream and reports *bit counts* and derived metrics;
//! none of them produces a decodable archive, and decoding is explicitly
//! out of scope.
//!
//! ## The Schemes
//!
//! - **Static Huffman** ([`huffman`]): one frequency pass, then an optimal
//!   prefix code. At most one bit per symbol above the entropy.
//! - **Extended Huffman**: the same, over tuples of `k` symbols with
//!   product probabilities, closing in on the entropy as `k` grows.
//! - **Adaptive Huffman** ([`adaptive`]): the FGK single-pass tree,
//!   restructured after every symbol under the sibling property, with a
//!   per-weight block index accelerating the restructuring.
//! - **Arithmetic coding** ([`arith`]) with pluggable probability models
//!   ([`model`]): a fixed empirical model, and PPM context models
//!   ([`ppm`]) in escape flavors A, B, and C, with optional symbol
//!   exclusion.
//!
//! ## Historical Context
//!
//! ```text
//! 1948  Shannon        Entropy as the fundamental limit
//! 1952  Huffman        Optimal prefix codes from a frequency table
//! 1973  Faller         First adaptive Huffman scheme
//! 1978  Gallager       The sibling property
//! 1985  Knuth          FGK in its practical form
//! 1987  Witten et al.  Integer-interval arithmetic coding
//! 1984  Cleary-Witten  PPM: contexts plus escapes
//! 1990  Moffat         PPMC and implementation craft
//! ```
//!
//! ## Complexity Analysis
//!
//! - **Static/extended Huffman**: $O(n + s \log s)$ for $n$ symbols and $s$
//!   distinct keys; extension multiplies $s$ exponentially in $k$.
//! - **Adaptive Huffman**: $O(\log s)$ amortized per symbol with the block
//!   index, $O(s)$ with the naive tree scan.
//! - **PPM + arithmetic coding**: $O(N)$ context lookups per symbol for
//!   order $N$, each emitting at most one bound.
//!
//! ## Failure Modes
//!
//! 1. **Interval collapse**: a too-small arithmetic word length cannot
//!    resolve a rare symbol's bound; surfaced as an error, not silence.
//! 2. **Context blow-up**: PPM memory grows with the number of distinct
//!    prefixes; pre-size the tables for wide strides.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adaptive;
pub mod arith;
mod block;
pub mod error;
pub mod freq;
pub mod huffman;
pub mod model;
pub mod ppm;
pub mod report;
pub mod stream;

pub use adaptive::{AdaptiveHuffman, LeaderSearch};
pub use arith::ArithmeticEncoder;
pub use error::Error;
pub use freq::FreqTable;
pub use huffman::{HuffmanCoder, HuffmanOptions};
pub use model::{Bound, FixedModel, ProbabilityModel};
pub use ppm::{EscapeMethod, PpmModel};
pub use report::CodingReport;
pub use stream::{BitReader, Symbol, SymbolStream, WindowedSymbolStream};
