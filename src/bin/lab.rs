//! Run the named measurement experiments, optionally over a data file.

use entrolab::error::Result;
use entrolab::{
    AdaptiveHuffman, ArithmeticEncoder, EscapeMethod, FixedModel, HuffmanCoder, HuffmanOptions,
    PpmModel, WindowedSymbolStream,
};

// The textbook exercise: "cat_ate_hat" over {h,e,t,a,c,_} = 0..=5.
const EXERCISE: [u8; 11] = [4, 3, 2, 5, 3, 2, 1, 5, 0, 3, 2];

fn header(title: &str) {
    println!("{}", "*".repeat(title.len() + 4));
    println!("* {title} *");
    println!("{}", "*".repeat(title.len() + 4));
}

fn textbook_nyt_codes() {
    header("Textbook NYT Coding Test");
    let coder = AdaptiveHuffman::new(26);
    for (symbol, expected) in [(0u128, "00000"), (1, "00001"), (21, "1011")] {
        println!("Expected: {expected}, Returned: {}", coder.nyt_code(symbol));
    }
    println!();
}

fn textbook_adaptive_example() {
    header("Textbook Encoding Example");
    let mut coder = AdaptiveHuffman::new(26);
    for symbol in [0u128, 0, 17, 3, 21] {
        println!("{symbol}: {} (len={})", coder.code(symbol), coder.code_len(symbol));
        coder.push(symbol);
    }
    println!("{}", coder.dump_tree());
}

fn exercise_trace() -> Result<()> {
    header("Arithmetic Coder Exercise");

    let mut pass = WindowedSymbolStream::new(&EXERCISE, 8, 1)?;
    let mut fixed = FixedModel::new(6, &mut pass);
    let mut stream = WindowedSymbolStream::new(&EXERCISE, 8, 1)?;
    let mut encoder = ArithmeticEncoder::with_trace(6)?;
    let bits = encoder.encode(&mut stream, &mut fixed)?;
    println!("Fixed : {bits} bits");
    println!("Message: {}", encoder.trace().unwrap_or_default());

    let mut ppma = PpmModel::new(6, EscapeMethod::A, false);
    let mut stream = WindowedSymbolStream::new(&EXERCISE, 8, 2)?;
    let mut encoder = ArithmeticEncoder::with_trace(6)?;
    let bits = encoder.encode(&mut stream, &mut ppma)?;
    println!("PPMA  : {bits} bits");
    println!("Message: {}", encoder.trace().unwrap_or_default());
    println!();
    Ok(())
}

fn ppm_sweep(buf: &[u8], order: usize) -> Result<()> {
    header(&format!("Arithmetic coding, order {order}"));
    let runs = [
        ("Fixed ", EscapeMethod::None, false),
        ("PPMA  ", EscapeMethod::A, false),
        ("PPMAe ", EscapeMethod::A, true),
        ("PPMB  ", EscapeMethod::B, false),
        ("PPMBe ", EscapeMethod::B, true),
        ("PPMC  ", EscapeMethod::C, false),
        ("PPMCe ", EscapeMethod::C, true),
    ];

    for (name, method, exclusion) in runs {
        let bits = if method == EscapeMethod::None {
            let mut pass = WindowedSymbolStream::new(buf, 8, 1)?;
            let mut model = FixedModel::new(256, &mut pass);
            let mut stream = WindowedSymbolStream::new(buf, 8, 1)?;
            ArithmeticEncoder::new(32)?.encode(&mut stream, &mut model)?
        } else {
            let mut model = PpmModel::new(256, method, exclusion);
            let mut stream = WindowedSymbolStream::new(buf, 8, order + 1)?;
            ArithmeticEncoder::new(32)?.encode(&mut stream, &mut model)?
        };
        println!("    {name}: {bits} bits");
    }
    println!();
    Ok(())
}

fn file_experiments(buf: &[u8]) -> Result<()> {
    for stride in [8u64, 32] {
        header(&format!("{stride}-bit data source"));
        println!("{}\n", HuffmanCoder::new(buf, stride)?.report());
    }

    header("AdaHuff: 8-bit data source");
    println!("{}\n", AdaptiveHuffman::process(buf, 8)?.report());

    for extend in 1..=3u64 {
        header(&format!("Extended Huffman: 8-bit, k = {extend}"));
        let opts = HuffmanOptions {
            extend,
            parallel: true,
        };
        println!("{}\n", HuffmanCoder::with_options(buf, 8, opts)?.report());
    }

    ppm_sweep(buf, 1)
}

fn main() -> Result<()> {
    env_logger::init();

    textbook_nyt_codes();
    textbook_adaptive_example();
    exercise_trace()?;

    if let Some(path) = std::env::args().nth(1) {
        let buf = std::fs::read(path)?;
        file_experiments(&buf)?;
    }

    Ok(())
}
