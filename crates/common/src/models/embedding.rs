//! Embedding keys and similarity scoring

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::AppError;

/// Entity an embedding was computed for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum EmbeddingOwner {
    Article(Uuid),
}

/// Identifies one stored vector: owner plus chunk index.
///
/// Rendered as `article:{id}:chunk:{index}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EmbeddingKey {
    pub owner: EmbeddingOwner,
    pub chunk: usize,
}

impl EmbeddingKey {
    pub fn article_chunk(article_id: Uuid, chunk: usize) -> Self {
        Self {
            owner: EmbeddingOwner::Article(article_id),
            chunk,
        }
    }

    pub fn article_id(&self) -> Option<Uuid> {
        match self.owner {
            EmbeddingOwner::Article(id) => Some(id),
        }
    }
}

impl fmt::Display for EmbeddingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.owner {
            EmbeddingOwner::Article(id) => write!(f, "article:{}:chunk:{}", id, self.chunk),
        }
    }
}

impl FromStr for EmbeddingKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::InvalidFormat {
            message: format!("embedding key '{}'", s),
        };

        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            ["article", id, "chunk", index] => {
                let id = Uuid::parse_str(id).map_err(|_| invalid())?;
                let chunk = index.parse().map_err(|_| invalid())?;
                Ok(EmbeddingKey::article_chunk(id, chunk))
            }
            _ => Err(invalid()),
        }
    }
}

impl Serialize for EmbeddingKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EmbeddingKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A stored embedding scored against a query
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimilarEmbedding {
    pub key: EmbeddingKey,
    pub score: f32,
    /// Text the vector was computed from
    pub text: String,
}

/// Cosine similarity of two vectors of equal length.
///
/// Returns `None` on a dimension mismatch and `0.0` when either vector has
/// zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Some(0.0);
    }

    Some(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_format_round_trips() {
        let id = Uuid::now_v7();
        let key = EmbeddingKey::article_chunk(id, 3);
        let rendered = key.to_string();
        assert_eq!(rendered, format!("article:{}:chunk:3", id));
        assert_eq!(rendered.parse::<EmbeddingKey>().unwrap(), key);
    }

    #[test]
    fn test_malformed_keys_are_rejected() {
        assert!("article:not-a-uuid:chunk:1".parse::<EmbeddingKey>().is_err());
        assert!("dialog:x".parse::<EmbeddingKey>().is_err());
        let id = Uuid::now_v7();
        assert!(format!("article:{}:chunk:-1", id).parse::<EmbeddingKey>().is_err());
    }

    #[test]
    fn test_cosine_similarity() {
        let same = cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
        assert!((same - 1.0).abs() < 1e-6);

        let orthogonal = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert!(orthogonal.abs() < 1e-6);

        let opposite = cosine_similarity(&[1.0, 1.0], &[-1.0, -1.0]).unwrap();
        assert!((opposite + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_edge_cases() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), Some(0.0));
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 1.0]), None);
    }
}
