use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Re-export types from book.rs
pub use book::{parse_catalog_key, split_genres, Book, CatalogKey, CatalogRow};

mod book;

/// Request body shared by every pipeline endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecommendationRequest {
    /// Free-text query, or a book description for the description-based endpoints
    #[schema(example = "a cozy mystery set in a seaside village")]
    pub query: String,
    /// Number of books to retrieve; the configured default applies when omitted
    #[serde(default)]
    #[schema(example = 5, minimum = 1)]
    pub top_k: Option<usize>,
}

/// Book metadata returned alongside a recommendation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookSummary {
    pub title: String,
    pub thumbnail: Option<String>,
    pub description: String,
}

/// Response of the `recommend` endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecommendationResponse {
    /// Narrative recommendation written by the language model
    pub recommendations: String,
    pub original_query: String,
    pub processing_time_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub books: Option<Vec<BookSummary>>,
}

/// Response of the `generate-description` endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DescriptionResponse {
    #[serde(rename = "enhanced")]
    pub enhanced_description: String,
    pub processing_time_ms: f64,
}

/// One numbered entry of a description-based recommendation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RankedBook {
    pub rank: usize,
    pub title: String,
    pub author: String,
    pub thumbnail: Option<String>,
    pub genres: Vec<String>,
}

/// Response of the `recommendation-by-book-id` endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SimilarBooksResponse {
    /// Search query derived from the submitted description
    pub search_query: String,
    pub recommendations: Vec<RankedBook>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub processing_time_ms: f64,
}

/// Health check response structure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    /// Current timestamp in RFC3339 format
    #[schema(example = "2024-01-15T10:30:00Z")]
    pub timestamp: String,
    pub books_loaded: usize,
}

/// Error response structure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Invalid input: Query cannot be empty")]
    pub error: String,
    #[schema(example = 400)]
    pub status: u16,
}
