pub mod catalog;
pub mod formatter;
pub mod llm;
pub mod pinecone;
pub mod prompts;
pub mod recommendation;
pub mod retrieval;
pub mod vector_index;

#[cfg(test)]
pub(crate) mod testing;

// Re-export public types
pub use catalog::Catalog;
pub use llm::{GeminiClient, LanguageModel};
pub use pinecone::PineconeClient;
pub use recommendation::{PipelineOptions, RecommendationService};
pub use retrieval::RetrievalAdapter;
pub use vector_index::{PineconeIndex, SearchHit, VectorIndex};
