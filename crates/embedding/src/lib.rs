//! Deterministic text embedding and similarity ranking.
//!
//! Pure-Rust implementations of:
//! - Hashed bag-of-words embedding into a fixed 256-dimension vector
//! - Cosine similarity
//! - Stable similarity ranking of candidate embeddings
//!
//! The embedding is a toy vectorizer, not a model: each lowercased
//! whitespace token is hashed with FNV-1a into one of 256 buckets and the
//! resulting histogram is L2-normalized. That makes embeddings reproducible
//! across processes and platforms — the hash is fixed, not the runtime
//! default — which is enough for demo retrieval ranking.

/// Number of components in every embedding vector.
pub const EMBEDDING_DIMENSION: usize = 256;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a 64-bit hash. Stable across processes and platforms.
fn fnv1a(token: &str) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in token.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Tokenize text into lowercase whitespace-separated tokens.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace().map(|t| t.to_lowercase())
}

/// Compute a deterministic embedding for the given text.
///
/// Each token increments one of [`EMBEDDING_DIMENSION`] buckets; the
/// accumulated histogram is divided by its Euclidean norm. A zero norm is
/// treated as 1.0, so text with no tokens yields the zero vector unchanged.
/// Pure function — no failure mode.
pub fn embed(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; EMBEDDING_DIMENSION];
    for token in tokenize(text) {
        let bucket = (fnv1a(&token) % EMBEDDING_DIMENSION as u64) as usize;
        vector[bucket] += 1.0;
    }

    let norm = vector.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm = if norm == 0.0 { 1.0 } else { norm };
    for x in &mut vector {
        *x = (*x as f64 / norm) as f32;
    }
    vector
}

/// Compute cosine similarity between two embedding vectors.
///
/// The denominator is floored at 1.0, so any zero vector scores 0.0 rather
/// than dividing by zero. Deterministic and commutative.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let mut denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        denom = 1.0;
    }
    (dot / denom) as f32
}

/// Rank candidate embeddings by cosine similarity to the query embedding.
///
/// Returns `(index, score)` pairs sorted by descending similarity. The sort
/// is stable: candidates with equal scores keep their original relative
/// order. An empty candidate slice yields an empty ranking.
pub fn rank_by_similarity(query: &[f32], candidates: &[Vec<f32>]) -> Vec<(usize, f32)> {
    let mut scores: Vec<(usize, f32)> = candidates
        .iter()
        .enumerate()
        .map(|(idx, emb)| (idx, cosine_similarity(query, emb)))
        .collect();

    scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scores
}
