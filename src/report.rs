//! Per-run measurement summaries.

use std::fmt;

/// The scalars reported by one coding experiment.
///
/// `compression_ratio` relates the raw input size to the encoded size:
/// `occurrences * stride * extend / encoded_bits`. A ratio above 1 means
/// the scheme beat the fixed-width baseline.
#[derive(Clone, Debug)]
pub struct CodingReport {
    /// Symbol width in bits.
    pub stride: u64,
    /// Huffman extension factor; 1 for everything else.
    pub extend: u64,
    /// Number of distinct symbols observed.
    pub nonzero_symbols: u64,
    /// Effective data size in symbols.
    pub occurrences: u128,
    /// Mean encoded bits per symbol.
    pub expected_codeword_length: f64,
    /// Input bits over encoded bits.
    pub compression_ratio: f64,
    /// Wall-clock encode time in seconds.
    pub execution_time: f64,
}

impl fmt::Display for CodingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.extend > 1 {
            writeln!(
                f,
                "Extended Symbol Width:    {} * {} = {} (bit)",
                self.stride,
                self.extend,
                self.stride * self.extend
            )?;
        } else {
            writeln!(f, "Symbol Length:            {} (bit)", self.stride)?;
        }
        writeln!(f, "Nonzero Symbols:          {}", self.nonzero_symbols)?;
        writeln!(f, "Data Size:                {} (# symbol)", self.occurrences)?;
        writeln!(
            f,
            "Expected Codeword Length: {:.6} (bit)",
            self.expected_codeword_length
        )?;
        writeln!(f, "Compression Ratio:        {:.6}", self.compression_ratio)?;
        write!(f, "Execution Time:           {:.6} (second)", self.execution_time)
    }
}
