//! Embedding backends for utterance text.
//!
//! The store embeds at write time through an injected [`Embedder`]. The only
//! backend shipped today is a deterministic stub; a real model drops in
//! behind the trait without touching pipeline or dedup code.

use async_trait::async_trait;

use crate::error::Result;

/// Default dimension for the stub backend.
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Text embedding capability.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Output dimension. Must stay stable for the lifetime of a collection.
    fn dim(&self) -> usize;

    /// Embed a batch of texts; one vector per input, in order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Deterministic placeholder embedder.
///
/// Produces FNV-1a-seeded pseudo-vectors, L2-normalized, so identical text
/// always embeds identically and tests are reproducible. Carries no semantic
/// signal; stands in until a real model is installed.
pub struct StubEmbedder {
    dim: usize,
}

impl StubEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut state = fnv64(text.as_bytes());
        let mut v = Vec::with_capacity(self.dim);
        for _ in 0..self.dim {
            // xorshift64 over the FNV seed
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            v.push(((state >> 11) as f32 / (1u64 << 53) as f32) - 0.5);
        }
        let norm = l2_norm(&v);
        v.iter().map(|x| x / norm).collect()
    }
}

impl Default for StubEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIM)
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

/// FNV-1a 64-bit hash.
fn fnv64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 14695981039346656037;
    for &byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(1099511628211);
    }
    hash
}

fn l2_norm(v: &[f32]) -> f32 {
    let s: f32 = v.iter().map(|x| x * x).sum();
    s.sqrt().max(1e-10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stub_is_deterministic() {
        let embedder = StubEmbedder::default();
        let texts = vec!["let's review the numbers".to_string()];
        let a = embedder.embed_batch(&texts).await.unwrap();
        let b = embedder.embed_batch(&texts).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_stub_dimension_and_norm() {
        let embedder = StubEmbedder::new(64);
        let texts = vec!["anything".to_string(), "".to_string()];
        let vecs = embedder.embed_batch(&texts).await.unwrap();
        assert_eq!(vecs.len(), 2);
        for v in &vecs {
            assert_eq!(v.len(), 64);
            let norm = l2_norm(v);
            assert!((norm - 1.0).abs() < 1e-4, "norm was {norm}");
        }
    }

    #[tokio::test]
    async fn test_different_texts_differ() {
        let embedder = StubEmbedder::default();
        let vecs = embedder
            .embed_batch(&["alpha".to_string(), "beta".to_string()])
            .await
            .unwrap();
        assert_ne!(vecs[0], vecs[1]);
    }

    #[test]
    fn test_l2_norm_zero_is_safe() {
        let v = vec![0.0f32, 0.0f32];
        assert!(l2_norm(&v) > 0.0); // returns 1e-10, not 0
    }
}
