//! Deterministic local embeddings via harmonic token projection.
//!
//! Vocabulary-free and training-free: each token is encoded as an integer,
//! reduced modulo a set of coprime moduli, and projected onto the unit
//! circle per modulus. Token vectors are mean-pooled and L2-normalized.
//! Same input, same output: no model file, no network call.

use std::f64::consts::PI;

use lazy_static::lazy_static;

/// Embedding dimension: two circle coordinates per modulus.
pub const EMBEDDING_DIM: usize = 384;

const NUM_MODULI: usize = EMBEDDING_DIM / 2;

/// Tokens are truncated to this many code points before encoding.
const MAX_TOKEN_CHARS: usize = 64;

lazy_static! {
    // The first NUM_MODULI primes; primes are pairwise coprime.
    static ref MODULI: Vec<u64> = first_primes(NUM_MODULI);
}

fn first_primes(count: usize) -> Vec<u64> {
    let mut primes: Vec<u64> = Vec::with_capacity(count);
    let mut candidate: u64 = 2;
    while primes.len() < count {
        if primes.iter().all(|p| candidate % p != 0) {
            primes.push(candidate);
        }
        candidate += 1;
    }
    primes
}

/// Local embedding model. Cheap to construct, deterministic per build.
pub struct EmbeddingModel;

impl EmbeddingModel {
    pub fn new() -> Self {
        Self
    }

    /// Embed a batch of texts in one call.
    ///
    /// This is the primary entry point: the engine embeds all chunks of a
    /// file in a single invocation.
    pub fn embed_batch(&self, texts: &[&str]) -> Vec<Vec<f32>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Embed one text: tokenize, project each token, mean-pool, normalize.
    /// Empty input yields the zero vector.
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return vec![0.0; EMBEDDING_DIM];
        }

        let mut pooled = vec![0.0f64; EMBEDDING_DIM];
        for token in &tokens {
            let n = encode_token(token);
            for (i, &m) in MODULI.iter().enumerate() {
                let theta = 2.0 * PI * ((n % m) as f64) / (m as f64);
                pooled[2 * i] += theta.sin();
                pooled[2 * i + 1] += theta.cos();
            }
        }
        let count = tokens.len() as f64;
        for val in &mut pooled {
            *val /= count;
        }

        let norm: f64 = pooled.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm > 0.0 {
            pooled.iter().map(|x| (*x / norm) as f32).collect()
        } else {
            pooled.iter().map(|x| *x as f32).collect()
        }
    }
}

impl Default for EmbeddingModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Base-2^16 positional encoding of a token's code points, wrapping on
/// overflow.
fn encode_token(token: &str) -> u64 {
    token
        .chars()
        .take(MAX_TOKEN_CHARS)
        .fold(0u64, |n, c| n.wrapping_mul(65536).wrapping_add(c as u64))
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

/// Cosine similarity; 0.0 on length mismatch or zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a > 0.0 && norm_b > 0.0 {
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}
