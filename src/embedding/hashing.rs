//! Deterministic hash-based text embeddings.
//!
//! Uses character n-gram and word hashing to create fixed-dimensional
//! vector representations of text without an external ML model. Suitable
//! for tests and offline runs; production deployments inject a real
//! embedding model behind the same [`Embedder`] trait.

use async_trait::async_trait;
use ndarray::Array1;
use sha2::{Digest, Sha256};

use crate::error::EmbeddingError;

use super::embedder::Embedder;

/// Default embedding dimension for hash-based vectors.
const DEFAULT_DIMENSION: usize = 128;

/// Generator for deterministic hash-based text embeddings.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    /// Dimension of the generated embeddings.
    dimension: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl HashingEmbedder {
    /// Creates a new hashing embedder with the specified dimension.
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    /// Generates an embedding for text content.
    ///
    /// Captures:
    /// - Word-level features via word hashing
    /// - Character trigram features
    /// - Text statistics (length, word count, average word length)
    ///
    /// The result is L2-normalized; empty text maps to the zero vector.
    pub fn embed_text(&self, text: &str) -> Array1<f64> {
        let mut embedding = Array1::zeros(self.dimension);

        if text.is_empty() {
            return embedding;
        }

        let text_lower = text.to_lowercase();

        // Feature 1: Word-level features
        let words: Vec<&str> = text_lower.split_whitespace().collect();
        let word_dim = self.dimension / 2;
        for word in &words {
            let pos = self.hash_to_index(word, word_dim);
            embedding[pos] += 1.0 / words.len().max(1) as f64;
        }

        // Feature 2: Character trigram features
        let offset = word_dim;
        let trigram_dim = self.dimension / 4;
        let chars: Vec<char> = text_lower.chars().collect();
        for window in chars.windows(3) {
            let trigram: String = window.iter().collect();
            let pos = offset + self.hash_to_index(&trigram, trigram_dim);
            embedding[pos] += 1.0;
        }

        // Feature 3: Text statistics
        let stats_offset = offset + trigram_dim;
        let remaining = self.dimension - stats_offset;
        if remaining > 0 {
            // Normalized length
            embedding[stats_offset] = (text.len() as f64 / 1000.0).min(1.0);
        }
        if remaining > 1 {
            // Word count normalized
            embedding[stats_offset + 1] = (words.len() as f64 / 200.0).min(1.0);
        }
        if remaining > 2 {
            // Average word length
            let avg_word_len = if words.is_empty() {
                0.0
            } else {
                words.iter().map(|w| w.len()).sum::<usize>() as f64 / words.len() as f64
            };
            embedding[stats_offset + 2] = avg_word_len / 10.0;
        }

        self.normalize(&mut embedding);
        embedding
    }

    /// Hashes a string to an index in [0, max_index).
    fn hash_to_index(&self, input: &str, max_index: usize) -> usize {
        if max_index == 0 {
            return 0;
        }
        let mut hasher = Sha256::new();
        hasher.update(input.as_bytes());
        let hash_bytes = hasher.finalize();
        let hash_val = ((hash_bytes[0] as u32) << 24
            | (hash_bytes[1] as u32) << 16
            | (hash_bytes[2] as u32) << 8
            | hash_bytes[3] as u32) as usize;
        hash_val % max_index
    }

    /// Normalizes a vector to unit length (L2 norm).
    fn normalize(&self, v: &mut Array1<f64>) {
        let norm: f64 = v.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm > 1e-10 {
            v.mapv_inplace(|x| x / norm);
        }
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Array1<f64>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::similarity::cosine_similarity;

    #[test]
    fn test_hashing_embedder_new() {
        let embedder = HashingEmbedder::new(64);
        assert_eq!(embedder.dimension(), 64);
    }

    #[test]
    fn test_hashing_embedder_default() {
        let embedder = HashingEmbedder::default();
        assert_eq!(embedder.dimension(), DEFAULT_DIMENSION);
    }

    #[test]
    fn test_embed_text() {
        let embedder = HashingEmbedder::new(64);
        let embedding = embedder.embed_text("City council approves new transit budget");

        assert_eq!(embedding.len(), 64);
        let norm: f64 = embedding.iter().map(|x| x * x).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6, "Embedding should be unit normalized");
    }

    #[test]
    fn test_embed_text_empty() {
        let embedder = HashingEmbedder::new(64);
        let embedding = embedder.embed_text("");
        assert_eq!(embedding.len(), 64);
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_embed_text_deterministic() {
        let embedder = HashingEmbedder::new(128);
        let text = "Storm warnings issued along the northern coast";

        let embedding1 = embedder.embed_text(text);
        let embedding2 = embedder.embed_text(text);

        for i in 0..embedding1.len() {
            assert!(
                (embedding1[i] - embedding2[i]).abs() < 1e-10,
                "Embeddings should be deterministic"
            );
        }
    }

    #[test]
    fn test_different_texts_different_embeddings() {
        let embedder = HashingEmbedder::new(128);
        let e1 = embedder.embed_text("Quarterly earnings beat analyst expectations");
        let e2 = embedder.embed_text("Midfielder signs three-year contract extension");

        let similarity = cosine_similarity(&e1, &e2);
        assert!(
            similarity < 0.99,
            "Different texts should have different embeddings"
        );
    }

    #[tokio::test]
    async fn test_embed_batch_order_and_length() {
        let embedder = HashingEmbedder::new(64);
        let texts = vec![
            "First headline".to_string(),
            "Second headline".to_string(),
            "Third headline".to_string(),
        ];

        let vectors = embedder.embed(&texts).await.expect("embedding should succeed");
        assert_eq!(vectors.len(), 3);

        // Same length and order as input
        let direct = embedder.embed_text("Second headline");
        for i in 0..64 {
            assert!((vectors[1][i] - direct[i]).abs() < 1e-10);
        }
    }
}
