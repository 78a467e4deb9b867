//! Static and extended Huffman coding.
//!
//! # Historical Context
//!
//! David Huffman (1952) developed this algorithm as a term paper at MIT.
//! It was the first practical algorithm for constructing optimal prefix
//! codes. Extending the alphabet to tuples of `k` symbols (with tuple
//! probabilities formed as products of the base distribution) pushes the
//! expected codeword length toward the entropy at the cost of an
//! exponentially larger code tree.
//!
//! The coder here measures rather than transcodes: it builds the tree,
//! sums `depth * count` over the leaves, and reports the total encoded
//! bit count alongside timing.

use std::collections::BinaryHeap;
use std::sync::Mutex;
use std::time::Instant;

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::freq::FreqTable;
use crate::report::CodingReport;
use crate::stream::{Symbol, SymbolStream, MAX_STRIDE};

/// Huffman tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Leaf {
        symbol: Symbol,
        weight: u128,
    },
    Internal {
        left: Box<Node>,
        right: Box<Node>,
        weight: u128,
    },
}

impl Node {
    fn weight(&self) -> u128 {
        match self {
            Node::Leaf { weight, .. } => *weight,
            Node::Internal { weight, .. } => *weight,
        }
    }
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other.weight().cmp(&self.weight()) // Min-priority queue
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Tuning knobs for a Huffman run.
#[derive(Clone, Copy, Debug)]
pub struct HuffmanOptions {
    /// Tuple extension factor; 1 is plain static Huffman.
    pub extend: u64,
    /// Fan the frequency pass out over buffer chunks. Exact counts, but
    /// key order (and thus tie-breaking) is no longer reproducible.
    pub parallel: bool,
}

impl Default for HuffmanOptions {
    fn default() -> Self {
        Self {
            extend: 1,
            parallel: false,
        }
    }
}

/// Static Huffman coder over fixed-stride symbols, optionally extended to
/// tuples.
pub struct HuffmanCoder {
    freq: FreqTable,
    stride: u64,
    extend: u64,
    encoded_bits: u128,
    elapsed: f64,
}

impl HuffmanCoder {
    /// Measure `buf` at the given stride with default options.
    ///
    /// # Errors
    /// Returns [`Error::InvalidStride`] for strides outside `1..=127`.
    pub fn new(buf: &[u8], stride: u64) -> Result<Self> {
        Self::with_options(buf, stride, HuffmanOptions::default())
    }

    /// Measure `buf` at the given stride.
    ///
    /// # Errors
    /// Returns [`Error::InvalidStride`] if the stride, or the extended
    /// tuple width `stride * extend`, exceeds 127 bits.
    pub fn with_options(buf: &[u8], stride: u64, opts: HuffmanOptions) -> Result<Self> {
        let extend = opts.extend.max(1);
        if stride == 0 || stride > MAX_STRIDE {
            return Err(Error::InvalidStride(stride));
        }
        if stride.saturating_mul(extend) > MAX_STRIDE {
            return Err(Error::InvalidStride(stride.saturating_mul(extend)));
        }

        let start = Instant::now();

        let mut freq = if opts.parallel {
            count_parallel(buf, stride)
        } else {
            count_sequential(buf, stride)
        };
        if extend > 1 {
            freq = extend_freq(freq, stride, extend);
        }

        let encoded_bits = total_encoded_bits(&freq);
        let elapsed = start.elapsed().as_secs_f64();

        log::debug!(
            "huffman: stride={stride} extend={extend} nonzeros={} encoded_bits={encoded_bits}",
            freq.count_nonzeros()
        );

        Ok(Self {
            freq,
            stride,
            extend,
            encoded_bits,
            elapsed,
        })
    }

    /// Number of distinct (tuple) symbols observed.
    pub fn nonzeros(&self) -> u64 {
        self.freq.count_nonzeros() as u64
    }

    /// Effective data size in (tuple) symbols.
    pub fn occurrences(&self) -> u128 {
        self.freq.occurrences()
    }

    /// Total encoded size in bits.
    pub fn encoded_bits(&self) -> u128 {
        self.encoded_bits
    }

    /// Mean encoded bits per (tuple) symbol.
    pub fn expected_codeword_length(&self) -> f64 {
        self.encoded_bits as f64 / self.freq.occurrences() as f64
    }

    /// Input bits over encoded bits.
    pub fn compression_ratio(&self) -> f64 {
        let input_bits = self.freq.occurrences() as f64 * self.stride as f64 * self.extend as f64;
        input_bits / self.encoded_bits as f64
    }

    /// Wall-clock measurement time in seconds.
    pub fn execution_time(&self) -> f64 {
        self.elapsed
    }

    /// The full measurement summary.
    pub fn report(&self) -> CodingReport {
        CodingReport {
            stride: self.stride,
            extend: self.extend,
            nonzero_symbols: self.nonzeros(),
            occurrences: self.occurrences(),
            expected_codeword_length: self.expected_codeword_length(),
            compression_ratio: self.compression_ratio(),
            execution_time: self.elapsed,
        }
    }
}

fn count_sequential(buf: &[u8], stride: u64) -> FreqTable {
    let mut freq = FreqTable::new(1u128 << stride);
    let mut stream = SymbolStream::with_stride(buf, stride);

    while !stream.is_empty() {
        freq.count(stream.next());
    }

    freq
}

/// Chunked frequency pass. Chunks are cut at `lcm(8, stride)` boundaries so
/// every chunk holds whole symbols; the unaligned tail is counted
/// sequentially afterwards.
fn count_parallel(buf: &[u8], stride: u64) -> FreqTable {
    let nelem = 1u128 << stride;
    let unit_bytes = (lcm(8, stride) / 8) as usize;
    let chunk_bytes = unit_bytes * ((1 << 20) / unit_bytes).max(1);
    let nchunks = buf.len() / chunk_bytes;

    let shared = Mutex::new(FreqTable::new(nelem));

    (0..nchunks).into_par_iter().for_each(|i| {
        let chunk = &buf[i * chunk_bytes..(i + 1) * chunk_bytes];
        let mut local = FreqTable::new(nelem);
        let mut stream = SymbolStream::with_stride(chunk, stride);

        while !stream.is_empty() {
            local.count(stream.next());
        }

        shared.lock().expect("frequency merge lock").merge(&local);
    });

    let mut freq = shared.into_inner().expect("frequency merge lock");

    let tail = &buf[nchunks * chunk_bytes..];
    let mut stream = SymbolStream::with_stride(tail, stride);
    while !stream.is_empty() {
        freq.count(stream.next());
    }

    freq
}

/// The k-fold self-product of the base table: tuple key `(p << stride) | b`
/// with count `count(p) * count(b)`.
fn extend_freq(base: FreqTable, stride: u64, extend: u64) -> FreqTable {
    let mut freq = base.clone();

    for width in 2..=extend {
        let mut product = FreqTable::new(1u128 << (stride * width));

        for &prefix in freq.nonzero_keys() {
            for &key in base.nonzero_keys() {
                product.count_by((prefix << stride) | key, freq.get(prefix) * base.get(key));
            }
        }

        freq = product;
    }

    freq
}

fn total_encoded_bits(freq: &FreqTable) -> u128 {
    let Some(root) = build_tree(freq) else {
        return 0;
    };

    let mut total = 0u128;
    let mut stack = vec![(&root, 0u128)];

    while let Some((node, depth)) = stack.pop() {
        match node {
            Node::Leaf { weight, .. } => total += depth * weight,
            Node::Internal { left, right, .. } => {
                stack.push((left.as_ref(), depth + 1));
                stack.push((right.as_ref(), depth + 1));
            }
        }
    }

    total
}

fn build_tree(freq: &FreqTable) -> Option<Node> {
    let mut pq = BinaryHeap::with_capacity(freq.count_nonzeros());
    for &symbol in freq.nonzero_keys() {
        pq.push(Node::Leaf {
            symbol,
            weight: freq.get(symbol),
        });
    }

    while pq.len() > 1 {
        let left = pq.pop()?;
        let right = pq.pop()?;
        let weight = left.weight() + right.weight();
        pq.push(Node::Internal {
            left: Box::new(left),
            right: Box::new(right),
            weight,
        });
    }

    pq.pop()
}

fn lcm(a: u64, b: u64) -> u64 {
    a / gcd(a, b) * b
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entropy_bits(freq: &FreqTable) -> f64 {
        freq.nonzero_keys()
            .iter()
            .map(|&k| {
                let p = freq.freq(k);
                -p * p.log2()
            })
            .sum()
    }

    #[test]
    fn abracadabra_matches_hand_count() {
        // a:5 b:2 r:2 c:1 d:1 -- optimal code lengths 1,3,3,3,3
        let coder = HuffmanCoder::new(b"abracadabra", 8).unwrap();
        assert_eq!(coder.occurrences(), 11);
        assert_eq!(coder.nonzeros(), 5);
        assert_eq!(coder.encoded_bits(), 23);
    }

    #[test]
    fn single_symbol_needs_no_bits() {
        let coder = HuffmanCoder::new(&[7u8; 32], 8).unwrap();
        assert_eq!(coder.nonzeros(), 1);
        assert_eq!(coder.encoded_bits(), 0);
    }

    #[test]
    fn codeword_length_within_one_bit_of_entropy() {
        let data: Vec<u8> = (0..4096u32).map(|i| (i * i % 251) as u8).collect();
        let coder = HuffmanCoder::new(&data, 8).unwrap();
        let freq = count_sequential(&data, 8);
        let h = entropy_bits(&freq);

        let ecl = coder.expected_codeword_length();
        assert!(ecl >= h - 1e-9, "ecl {ecl} below entropy {h}");
        assert!(ecl <= h + 1.0, "ecl {ecl} above entropy + 1 {h}");
    }

    #[test]
    fn parallel_counts_match_sequential() {
        let data: Vec<u8> = (0..3_000_000u32).map(|i| (i % 57) as u8).collect();
        let seq = count_sequential(&data, 8);
        let par = count_parallel(&data, 8);

        assert_eq!(seq.occurrences(), par.occurrences());
        assert_eq!(seq.count_nonzeros(), par.count_nonzeros());
        for &key in seq.nonzero_keys() {
            assert_eq!(seq.get(key), par.get(key));
        }
    }

    #[test]
    fn parallel_counts_match_at_odd_strides() {
        let data: Vec<u8> = (0..2_100_000u32).map(|i| (i % 251) as u8).collect();
        for stride in [3u64, 5, 12] {
            let seq = count_sequential(&data, stride);
            let par = count_parallel(&data, stride);
            assert_eq!(seq.occurrences(), par.occurrences(), "stride {stride}");
            for &key in seq.nonzero_keys() {
                assert_eq!(seq.get(key), par.get(key), "stride {stride}");
            }
        }
    }

    #[test]
    fn extension_multiplies_counts() {
        // Base: a:3 b:1 over stride 8. Pairs get count(p) * count(b).
        let freq = count_sequential(b"aaab", 8);
        let pairs = extend_freq(freq, 8, 2);

        let a = u128::from(b'a');
        let b = u128::from(b'b');
        assert_eq!(pairs.get((a << 8) | a), 9);
        assert_eq!(pairs.get((a << 8) | b), 3);
        assert_eq!(pairs.get((b << 8) | a), 3);
        assert_eq!(pairs.get((b << 8) | b), 1);
        assert_eq!(pairs.occurrences(), 16);
    }

    #[test]
    fn extension_does_not_hurt_skewed_sources() {
        // Heavily skewed source: extension should only improve the ratio.
        let mut data = vec![0u8; 4000];
        for (i, byte) in data.iter_mut().enumerate() {
            if i % 17 == 0 {
                *byte = 1;
            }
            if i % 29 == 0 {
                *byte = 2;
            }
        }

        let ratios: Vec<f64> = (1..=3u64)
            .map(|extend| {
                HuffmanCoder::with_options(
                    &data,
                    8,
                    HuffmanOptions {
                        extend,
                        parallel: false,
                    },
                )
                .unwrap()
                .compression_ratio()
            })
            .collect();

        assert!(ratios[1] >= ratios[0] - 1e-9, "{ratios:?}");
        assert!(ratios[2] >= ratios[1] - 1e-9, "{ratios:?}");
    }

    #[test]
    fn overlong_tuple_width_is_rejected() {
        let err = HuffmanCoder::with_options(
            b"xyz",
            64,
            HuffmanOptions {
                extend: 2,
                parallel: false,
            },
        );
        assert!(err.is_err());
    }
}
