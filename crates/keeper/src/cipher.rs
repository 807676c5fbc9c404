//! Cipher - alphabet rotation used to obscure stored fields
//!
//! Each character found in the alphabet is replaced by the character `shift`
//! positions further along (wrapping around). Characters outside the alphabet
//! and reserved characters pass through unchanged. Decoding rotates by the
//! negated shift over the same alphabet.
//!
//! Because the mapping is a per-character bijection, `p` is a substring of `t`
//! exactly when `encode(p)` is a substring of `encode(t)`. The store relies on
//! this to search without decoding rows.
//!
//! The alphabet must not contain duplicate characters. This is the caller's
//! responsibility and is not checked.

use keeper_core::CipherConfig;
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// A configured rotation cipher
#[derive(Debug, Clone)]
pub struct Cipher {
    alphabet: Vec<char>,
    index: HashMap<char, usize>,
    reserved: HashSet<char>,
    shift: i64,
}

impl Cipher {
    pub fn new(alphabet: &str, shift: i64, reserved: &str) -> Self {
        let alphabet: Vec<char> = alphabet.chars().collect();
        let mut index = HashMap::with_capacity(alphabet.len());
        for (i, c) in alphabet.iter().enumerate() {
            // First occurrence wins
            index.entry(*c).or_insert(i);
        }

        Self {
            alphabet,
            index,
            reserved: reserved.chars().collect(),
            shift,
        }
    }

    pub fn from_config(config: &CipherConfig) -> Self {
        Self::new(&config.alphabet, config.shift, &config.reserved)
    }

    /// Same alphabet and shift, no reserved characters
    pub fn without_reserved(&self) -> Self {
        Self {
            reserved: HashSet::new(),
            ..self.clone()
        }
    }

    pub fn shift(&self) -> i64 {
        self.shift
    }

    /// Obscure `text`
    pub fn encode(&self, text: &str) -> String {
        self.transform(text, self.offset(false))
    }

    /// Reveal text previously produced by [`Cipher::encode`]
    pub fn decode(&self, text: &str) -> String {
        self.transform(text, self.offset(true))
    }

    /// Forward rotation in `[0, len)`, or its inverse
    fn offset(&self, inverse: bool) -> usize {
        let len = self.alphabet.len() as i64;
        if len == 0 {
            return 0;
        }
        let forward = self.shift.rem_euclid(len);
        let offset = if inverse { (len - forward) % len } else { forward };
        offset as usize
    }

    fn transform(&self, text: &str, offset: usize) -> String {
        let len = self.alphabet.len();
        let output: String = text
            .chars()
            .map(|c| {
                if self.reserved.contains(&c) {
                    return c;
                }
                match self.index.get(&c) {
                    Some(&i) => self.alphabet[(i + offset) % len],
                    None => c,
                }
            })
            .collect();

        if output.chars().count() != text.chars().count() || (output.is_empty() && !text.is_empty()) {
            warn!(
                input_len = text.chars().count(),
                output_len = output.chars().count(),
                "cipher produced a malformed result; keeping the input unchanged"
            );
            return text.to_string();
        }

        output
    }
}

/// Encode `text` with a one-off cipher
pub fn encode(text: &str, alphabet: &str, shift: i64, reserved: &str) -> String {
    Cipher::new(alphabet, shift, reserved).encode(text)
}

/// Decode `text` with a one-off cipher
pub fn decode(text: &str, alphabet: &str, shift: i64, reserved: &str) -> String {
    Cipher::new(alphabet, shift, reserved).decode(text)
}
