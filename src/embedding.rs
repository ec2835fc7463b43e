//! The embedding module
//! Turns text into a fixed-length unit vector by hashing its words
//!
//! There is no model behind this: two integer hashes per word are spread over
//! every dimension through `sin`/`cos`, and a length-dependent wave is added on
//! top. Texts sharing words end up close, unrelated texts end up near-orthogonal.
//!
//! Hashing works on UTF-16 code units and the rolling hash shifts the 32-bit
//! truncation of its running value, so vectors match the ones stored by the
//! original browser tool exactly.

use crate::vector::{l2_normalize, Embedding};

/// Number of components in every embedding.
pub const EMBEDDING_DIM: usize = 384;

/// Number of leading components shown by [`embedding_preview`].
pub const PREVIEW_DIM: usize = 8;

const ROLLING_HASH_SEED: i64 = 5381;
const SEED_MODULUS: i128 = 1000;
const WORD_WEIGHT: f64 = 0.5;
const LENGTH_WEIGHT: f64 = 0.3;

/// Whitespace as understood by the word splitter: the ECMAScript `\s` class.
pub(crate) fn is_separator(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\u{0B}' | '\u{0C}' | '\r' | ' ' | '\u{A0}' | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}' | '\u{2029}' | '\u{202F}' | '\u{205F}' | '\u{3000}' | '\u{FEFF}'
    )
}

/// Lowercases and trims the text. The result is what gets split into words
/// and whose length feeds the length term.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase().trim_matches(is_separator).to_string()
}

/// Splits normalized text on runs of whitespace. Blank text has no words.
pub fn tokenize(normalized: &str) -> Vec<&str> {
    normalized
        .split(is_separator)
        .filter(|word| !word.is_empty())
        .collect()
}

/// Position-weighted sum of the word's UTF-16 code units (1-based positions).
pub fn char_weight_hash(word: &str) -> i64 {
    word.encode_utf16()
        .enumerate()
        .fold(0i64, |hash, (i, unit)| hash.wrapping_add(unit as i64 * (i as i64 + 1)))
}

/// DJB2-style rolling hash: `hash = (hash << 5) + hash + unit`.
///
/// The shift sees only the low 32 bits of the running value and wraps in
/// 32 bits; the additions do not. Long words therefore leave the `i32` range,
/// e.g. `"pneumonoultramicroscopicsilicovolcanoconiosis"` hashes to
/// `8294385077`.
pub fn rolling_hash(word: &str) -> i64 {
    word.encode_utf16().fold(ROLLING_HASH_SEED, |hash, unit| {
        let shifted = (hash as i32).wrapping_shl(5) as i64;
        shifted.wrapping_add(hash).wrapping_add(unit as i64)
    })
}

/// Embeds `text` into a unit vector of [`EMBEDDING_DIM`] components.
///
/// Total for every input. Blank text has no words and a zero length term, so it
/// yields the all-zero vector.
///
/// # Examples
///
/// ```
/// use hashvdb::{embed, EMBEDDING_DIM};
///
/// let a = embed("Hello world");
/// assert_eq!(a.len(), EMBEDDING_DIM);
/// assert_ne!(a, embed("hello"));
/// // Case and surrounding whitespace do not matter
/// assert_eq!(a, embed("  hello world "));
/// ```
pub fn embed(text: &str) -> Embedding {
    let normalized = normalize_text(text);
    let words = tokenize(&normalized);
    let mut acc = vec![0.0f64; EMBEDDING_DIM];

    for word in &words {
        let hash_a = char_weight_hash(word) as i128;
        let hash_b = rolling_hash(word) as i128;

        for (dim, value) in acc.iter_mut().enumerate() {
            let seed = ((hash_a * (dim as i128 + 1) + hash_b) % SEED_MODULUS) as f64;
            *value += seed.sin() * WORD_WEIGHT + (seed * 1.3).cos() * WORD_WEIGHT;
        }
    }

    let units = normalized.encode_utf16().count();
    let length_factor = ((units + 1) as f64).ln();
    for (dim, value) in acc.iter_mut().enumerate() {
        *value += (dim as f64 * length_factor).sin() * LENGTH_WEIGHT;
    }

    tracing::trace!(words = words.len(), units, "embedded text");

    Embedding::new(l2_normalize(&acc))
}

/// Short human-readable rendering: the first [`PREVIEW_DIM`] components with
/// three decimals, e.g. `"0.009, 0.045, ..."`.
pub fn embedding_preview(embedding: &[f64]) -> String {
    let head: Vec<String> = embedding
        .iter()
        .take(PREVIEW_DIM)
        .map(|v| format!("{:.3}", v))
        .collect();

    format!("{}...", head.join(", "))
}
