use crate::{
    error::{ApiError, Result},
    models::{parse_catalog_key, Book},
    services::{catalog::Catalog, vector_index::VectorIndex},
};
use std::{collections::HashSet, sync::Arc, time::Duration};
use tracing::{debug, warn};

/// Runs similarity search and joins the hits back to the catalog
#[derive(Clone)]
pub struct RetrievalAdapter {
    catalog: Arc<Catalog>,
    index: Arc<dyn VectorIndex>,
    timeout: Duration,
}

impl RetrievalAdapter {
    pub fn new(catalog: Arc<Catalog>, index: Arc<dyn VectorIndex>, timeout: Duration) -> Self {
        Self {
            catalog,
            index,
            timeout,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Return up to `top_k` catalog books, in the order the index ranked them.
    ///
    /// Hits without a leading catalog key, hits for keys missing from the
    /// catalog, and repeated keys are skipped.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Book>> {
        if top_k == 0 {
            return Err(ApiError::InvalidInput("top_k must be at least 1".into()));
        }

        debug!("Searching for: '{}' (top_k={})", query, top_k);

        let hits = tokio::time::timeout(self.timeout, self.index.similarity_search(query, top_k))
            .await
            .map_err(|_| {
                ApiError::Timeout(format!(
                    "Similarity search exceeded {}s",
                    self.timeout.as_secs_f32()
                ))
            })??;

        if hits.is_empty() {
            warn!("No results found for query: '{}'", query);
            return Ok(Vec::new());
        }

        let mut seen = HashSet::with_capacity(hits.len());
        let mut books = Vec::with_capacity(top_k.min(hits.len()));

        for hit in &hits {
            let Some(key) = parse_catalog_key(&hit.content) else {
                warn!("Failed to parse catalog key from hit: '{}'", preview(&hit.content));
                continue;
            };

            if !seen.insert(key) {
                continue;
            }

            match self.catalog.get(key) {
                Some(book) => {
                    debug!("Matched '{}' (score: {:?})", book.title, hit.score);
                    books.push(book.clone())
                }
                None => warn!("Search hit {} is not in the catalog", key),
            }

            if books.len() == top_k {
                break;
            }
        }

        debug!(
            "Found {} matching books from {} hits",
            books.len(),
            hits.len()
        );
        Ok(books)
    }
}

fn preview(content: &str) -> &str {
    let end = content
        .char_indices()
        .nth(60)
        .map(|(i, _)| i)
        .unwrap_or(content.len());
    &content[..end]
}
