use crate::{
    error::{ApiError, Result},
    models::{
        Book, BookSummary, DescriptionResponse, RankedBook, RecommendationResponse,
        SimilarBooksResponse,
    },
    services::{
        catalog::Catalog,
        formatter::clean_model_output,
        llm::LanguageModel,
        prompts::{self, PromptTemplate},
        retrieval::RetrievalAdapter,
        vector_index::VectorIndex,
    },
};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{debug, info, warn};

pub const NO_RESULTS_MESSAGE: &str = "Sorry, I couldn't find any relevant books.";
const UNKNOWN_AUTHOR: &str = "Unknown";
const SEARCH_QUERY_TEMPERATURE: f32 = 0.2;

/// Knobs of the shared retrieval + generation pipeline
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Template used by `recommend`
    pub template: PromptTemplate,
    pub include_purchase_links: bool,
    /// Return title/thumbnail/description of the retrieved books with the narrative
    pub include_book_metadata: bool,
    pub temperature: f32,
    pub default_top_k: usize,
    pub max_top_k: usize,
    pub index_timeout: Duration,
    pub llm_timeout: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            template: PromptTemplate::Bookworm,
            include_purchase_links: false,
            include_book_metadata: true,
            temperature: 0.7,
            default_top_k: 5,
            max_top_k: 50,
            index_timeout: Duration::from_secs(15),
            llm_timeout: Duration::from_secs(30),
        }
    }
}

/// Process-wide pipeline context, built once at startup and shared read-only by handlers
#[derive(Clone)]
pub struct RecommendationService {
    retrieval: RetrievalAdapter,
    llm: Arc<dyn LanguageModel>,
    options: PipelineOptions,
}

impl RecommendationService {
    pub fn new(
        catalog: Arc<Catalog>,
        index: Arc<dyn VectorIndex>,
        llm: Arc<dyn LanguageModel>,
        options: PipelineOptions,
    ) -> Self {
        if !options.template.uses_books() {
            warn!(
                "Template {:?} does not render retrieved books; recommendations will ignore them",
                options.template
            );
        }

        Self {
            retrieval: RetrievalAdapter::new(catalog, index, options.index_timeout),
            llm,
            options,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        self.retrieval.catalog()
    }

    /// Apply the default and bounds to a requested result count
    pub fn resolve_top_k(&self, requested: Option<usize>) -> Result<usize> {
        let top_k = requested.unwrap_or(self.options.default_top_k);
        if top_k == 0 || top_k > self.options.max_top_k {
            return Err(ApiError::InvalidInput(format!(
                "top_k must be between 1 and {}",
                self.options.max_top_k
            )));
        }
        Ok(top_k)
    }

    /// Retrieve similar books and ask the model for a narrative recommendation.
    ///
    /// The model is not called when retrieval finds nothing.
    pub async fn recommend(
        &self,
        query: &str,
        top_k: Option<usize>,
    ) -> Result<RecommendationResponse> {
        let start = Instant::now();
        let search_text = require_text(query, "Query")?;
        let top_k = self.resolve_top_k(top_k)?;

        info!("Recommendation request: query='{}', top_k={}", search_text, top_k);

        let books = self.retrieval.retrieve(search_text, top_k).await?;
        if books.is_empty() {
            info!("No relevant books for '{}', skipping generation", search_text);
            return Ok(RecommendationResponse {
                recommendations: NO_RESULTS_MESSAGE.to_string(),
                original_query: query.to_string(),
                processing_time_ms: elapsed_ms(start),
                books: self.options.include_book_metadata.then(Vec::new),
            });
        }

        let prompt = prompts::render_recommendation(
            self.options.template,
            search_text,
            &books,
            self.options.include_purchase_links,
        );
        let recommendations = self.complete(&prompt, self.options.temperature).await?;

        let processing_time_ms = elapsed_ms(start);
        info!("Request processed in {:.2}ms", processing_time_ms);

        Ok(RecommendationResponse {
            recommendations,
            original_query: query.to_string(),
            processing_time_ms,
            books: self
                .options
                .include_book_metadata
                .then(|| books.iter().map(summarize).collect()),
        })
    }

    /// Rewrite a single description in the store's tone
    pub async fn generate_description(&self, description: &str) -> Result<DescriptionResponse> {
        let start = Instant::now();
        let description = require_text(description, "Description")?;

        let prompt = prompts::render_description(PromptTemplate::DescriptionRewrite, description);
        let enhanced_description = self.complete(&prompt, self.options.temperature).await?;

        Ok(DescriptionResponse {
            enhanced_description,
            processing_time_ms: elapsed_ms(start),
        })
    }

    /// Derive a search query from a description, then recommend books for it
    pub async fn recommend_by_description(
        &self,
        description: &str,
        top_k: Option<usize>,
    ) -> Result<SimilarBooksResponse> {
        let start = Instant::now();
        let description = require_text(description, "Description")?;
        let top_k = self.resolve_top_k(top_k)?;

        let prompt = prompts::render_description(PromptTemplate::SearchQuery, description);
        let completion = self.complete(&prompt, SEARCH_QUERY_TEMPERATURE).await?;
        let search_query = first_line(&completion).ok_or_else(|| {
            ApiError::ModelError("Model returned an empty search query".to_string())
        })?;

        info!("Derived search query: '{}'", search_query);

        let books = self.retrieval.retrieve(&search_query, top_k).await?;
        let message = books.is_empty().then(|| NO_RESULTS_MESSAGE.to_string());

        let recommendations = books
            .iter()
            .enumerate()
            .map(|(i, book)| RankedBook {
                rank: i + 1,
                title: book.title.clone(),
                author: book
                    .authors
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
                thumbnail: book.thumbnail.clone(),
                genres: book.genres.clone(),
            })
            .collect();

        Ok(SimilarBooksResponse {
            search_query,
            recommendations,
            message,
            processing_time_ms: elapsed_ms(start),
        })
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        debug!("Prompt:\n{}", prompt);

        let generation = self.llm.generate(prompt, temperature);
        let raw = tokio::time::timeout(self.options.llm_timeout, generation)
            .await
            .map_err(|_| {
                ApiError::Timeout(format!(
                    "Language model exceeded {}s",
                    self.options.llm_timeout.as_secs_f32()
                ))
            })??;

        Ok(clean_model_output(&raw))
    }
}

fn require_text<'a>(text: &'a str, field: &str) -> Result<&'a str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput(format!("{} cannot be empty", field)));
    }
    Ok(trimmed)
}

fn first_line(text: &str) -> Option<String> {
    text.lines()
        .map(|line| line.trim().trim_matches('"').trim())
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

fn summarize(book: &Book) -> BookSummary {
    BookSummary {
        title: book.title.clone(),
        thumbnail: book.thumbnail.clone(),
        description: book.description.clone(),
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
