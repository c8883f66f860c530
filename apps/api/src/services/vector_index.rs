use crate::{
    error::Result,
    ml::Embedder,
    services::pinecone::{PineconeClient, QueryMatch},
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// One similarity-search match, in index rank order
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Indexed text; its first token is the catalog key
    pub content: String,
    pub score: Option<f32>,
}

impl SearchHit {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            score: None,
        }
    }
}

/// Nearest-neighbour search over the indexed tagged descriptions
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>>;
}

/// Embeds the query and searches a Pinecone index
pub struct PineconeIndex {
    embedder: Arc<dyn Embedder>,
    pinecone: PineconeClient,
    content_field: String,
}

impl PineconeIndex {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        pinecone: PineconeClient,
        content_field: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            pinecone,
            content_field: content_field.into(),
        }
    }

    fn to_hit(&self, query_match: QueryMatch) -> SearchHit {
        let content = query_match
            .metadata
            .as_ref()
            .and_then(|metadata| metadata.get(&self.content_field))
            .and_then(|value| value.as_str())
            .map(str::to_string)
            // vectors upserted without metadata are keyed by ISBN
            .unwrap_or(query_match.id);

        SearchHit {
            content,
            score: query_match.score,
        }
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        let embedding = self.embedder.encode(query).await?;
        let response = self.pinecone.query(&embedding, k).await?;

        debug!(
            "Pinecone returned {} matches for '{}'",
            response.matches.len(),
            query
        );

        Ok(response
            .matches
            .into_iter()
            .map(|query_match| self.to_hit(query_match))
            .collect())
    }
}
