//! In-process collaborators for pipeline and handler tests.

use crate::{
    error::{ApiError, Result},
    models::Book,
    services::{catalog::Catalog, llm::LanguageModel, vector_index::SearchHit, VectorIndex},
};
use async_trait::async_trait;
use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

pub fn book(isbn13: u64, title: &str, authors: Option<&str>, genres: &[&str]) -> Book {
    let description = format!("Description of {}", title);
    Book {
        isbn13,
        title: title.to_string(),
        authors: authors.map(str::to_string),
        tagged_description: format!("{} {}", isbn13, description),
        description,
        thumbnail: Some(format!("http://books.example/{}.jpg", isbn13)),
        genres: genres.iter().map(|g| g.to_string()).collect(),
        purchase_link: None,
    }
}

pub fn sample_catalog() -> Catalog {
    Catalog::from_books(vec![
        book(
            9780000000001,
            "Test Book",
            Some("Jane Doe"),
            &["Fiction", "Adventure"],
        ),
        book(9780000000002, "Second Book", None, &[]),
        book(9780000000003, "Third Book", Some("John Roe"), &["Mystery"]),
    ])
    .unwrap()
}

pub struct FakeIndex {
    hits: Vec<SearchHit>,
    error: Option<String>,
    delay: Option<Duration>,
    queries: Mutex<Vec<String>>,
}

impl FakeIndex {
    pub fn with_hits(contents: &[&str]) -> Self {
        Self {
            hits: contents.iter().map(|c| SearchHit::new(*c)).collect(),
            error: None,
            delay: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Self::with_hits(&[])
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorIndex for FakeIndex {
    async fn similarity_search(&self, query: &str, _k: usize) -> Result<Vec<SearchHit>> {
        self.queries.lock().unwrap().push(query.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.error {
            Some(message) => Err(ApiError::ExternalServiceError(message.clone())),
            None => Ok(self.hits.clone()),
        }
    }
}

/// Replays canned completions in order and records every prompt
pub struct FakeLanguageModel {
    responses: Mutex<VecDeque<Result<String>>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl FakeLanguageModel {
    pub fn replying(responses: &[&str]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().map(|r| Ok(r.to_string())).collect()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            responses: Mutex::new(VecDeque::from([Err(ApiError::ModelError(
                message.to_string(),
            ))])),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for FakeLanguageModel {
    async fn generate(&self, prompt: &str, _temperature: f32) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::ModelError("no canned response left".into())))
    }
}
