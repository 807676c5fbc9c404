//! Random password generation

use rand::Rng;

/// Word that asks the CLI for a generated password instead of a typed one
pub const RANDOM_KEYWORD: &str = "random";

/// Build a password of `length` characters drawn uniformly from `charset`.
///
/// An empty charset yields an empty password.
pub fn generate(length: usize, charset: &str) -> String {
    generate_with(&mut rand::thread_rng(), length, charset)
}

/// Same as [`generate`] with a caller-supplied RNG
pub fn generate_with<R: Rng + ?Sized>(rng: &mut R, length: usize, charset: &str) -> String {
    let chars: Vec<char> = charset.chars().collect();
    if chars.is_empty() {
        return String::new();
    }
    (0..length)
        .map(|_| chars[rng.gen_range(0..chars.len())])
        .collect()
}
