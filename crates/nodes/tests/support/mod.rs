//! In-process fakes of the port traits.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use nodes::{Collaborators, Orchestrator, PipelineSettings};
use pipeline::{
    Article, ArticleNumber, ArticleSource, ArticleValidator, CompositionRequest, DocumentId,
    InsightExtraction, InsightExtractor, LlmError, PostComposer, PostId, PublishError,
    PublishReceipt, Publisher, RotationState, SourceError, StateStore, StateStoreError, Timestamp,
};

pub fn article_url(n: u32) -> String {
    format!("https://www.linkedin.com/pulse/newsletter-article-{n}-jane-doe-lim-id{n}x/")
}

pub fn articles() -> Vec<Article> {
    (1..=5)
        .map(|n| {
            let url = if n == 5 { String::new() } else { article_url(n) };
            Article::new(
                ArticleNumber::new(n),
                format!("Article {n}"),
                url,
                format!("Body of article {n}. ").repeat(20),
            )
        })
        .collect()
}

pub fn insights(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("Insight {i}")).collect()
}

// ---------------------------------------------------------------------------

pub struct FakeSource {
    pub articles: Mutex<Vec<Article>>,
    pub calls: AtomicUsize,
    pub unavailable: bool,
}

impl FakeSource {
    pub fn new(articles: Vec<Article>) -> Self {
        Self {
            articles: Mutex::new(articles),
            calls: AtomicUsize::new(0),
            unavailable: false,
        }
    }
}

#[async_trait]
impl ArticleSource for FakeSource {
    async fn fetch_articles(&self, document: &DocumentId) -> Result<Vec<Article>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(SourceError::Unavailable {
                document: document.to_string(),
                message: "connection refused".into(),
            });
        }
        Ok(self.articles.lock().unwrap().clone())
    }
}

// ---------------------------------------------------------------------------

pub struct FakeExtractor {
    pub insights: Vec<String>,
    pub calls: AtomicUsize,
}

impl FakeExtractor {
    pub fn new(insights: Vec<String>) -> Self {
        Self {
            insights,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl InsightExtractor for FakeExtractor {
    async fn extract(&self, article: &Article) -> Result<InsightExtraction, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(InsightExtraction {
            key_insights: self
                .insights
                .iter()
                .map(|i| format!("{i} of article {}", article.number))
                .collect(),
            themes: vec!["Data strategy".into()],
            ..Default::default()
        })
    }
}

// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeComposer {
    pub requests: Mutex<Vec<CompositionRequest>>,
}

impl FakeComposer {
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl PostComposer for FakeComposer {
    async fn compose(&self, request: &CompositionRequest) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(format!("{} ({})", request.insight, request.focus))
    }
}

// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakePublisher {
    pub posts: Mutex<Vec<String>>,
    pub rate_limited: bool,
}

impl FakePublisher {
    pub fn calls(&self) -> usize {
        self.posts.lock().unwrap().len()
    }
}

#[async_trait]
impl Publisher for FakePublisher {
    async fn publish(&self, text: &str) -> Result<PublishReceipt, PublishError> {
        let mut posts = self.posts.lock().unwrap();
        posts.push(text.to_string());
        if self.rate_limited {
            return Err(PublishError::RateLimited {
                retry_after: Some(Duration::from_secs(900)),
            });
        }
        Ok(PublishReceipt {
            post_id: PostId::new(format!("post-{}", posts.len())).unwrap(),
            published_at: Timestamp::now(),
            effective_length: self.effective_length(text),
        })
    }
}

// ---------------------------------------------------------------------------

/// Keeps the record as serialised bytes so tests can compare them exactly.
#[derive(Default)]
pub struct MemoryStore {
    pub bytes: Mutex<Option<Vec<u8>>>,
    pub saves: AtomicUsize,
}

impl MemoryStore {
    pub fn with_state(state: &RotationState) -> Self {
        Self {
            bytes: Mutex::new(Some(serde_json::to_vec(state).unwrap())),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn snapshot(&self) -> Option<Vec<u8>> {
        self.bytes.lock().unwrap().clone()
    }

    pub fn state(&self) -> RotationState {
        match self.snapshot() {
            Some(bytes) => serde_json::from_slice(&bytes).unwrap(),
            None => RotationState::default(),
        }
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load(&self) -> Result<RotationState, StateStoreError> {
        Ok(self.state())
    }

    async fn save(&self, state: &RotationState) -> Result<(), StateStoreError> {
        *self.bytes.lock().unwrap() = Some(serde_json::to_vec(state)?);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------

pub struct Harness {
    pub source: Arc<FakeSource>,
    pub extractor: Arc<FakeExtractor>,
    pub composer: Arc<FakeComposer>,
    pub publisher: Arc<FakePublisher>,
    pub store: Arc<MemoryStore>,
}

impl Harness {
    pub fn new(state: Option<RotationState>) -> Self {
        Self::with_parts(
            FakeSource::new(articles()),
            FakeExtractor::new(insights(7)),
            FakePublisher::default(),
            state,
        )
    }

    pub fn with_parts(
        source: FakeSource,
        extractor: FakeExtractor,
        publisher: FakePublisher,
        state: Option<RotationState>,
    ) -> Self {
        let store = match state {
            Some(s) => MemoryStore::with_state(&s),
            None => MemoryStore::default(),
        };
        Self {
            source: Arc::new(source),
            extractor: Arc::new(extractor),
            composer: Arc::new(FakeComposer::default()),
            publisher: Arc::new(publisher),
            store: Arc::new(store),
        }
    }

    pub fn collaborators(&self) -> Arc<Collaborators> {
        Arc::new(Collaborators {
            source: self.source.clone(),
            extractor: self.extractor.clone(),
            composer: self.composer.clone(),
            publisher: self.publisher.clone(),
            store: self.store.clone(),
        })
    }

    pub fn settings(&self) -> PipelineSettings {
        PipelineSettings {
            document: DocumentId::new("newsletter-doc").unwrap(),
            validator: ArticleValidator::default(),
        }
    }

    pub fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(self.collaborators(), self.settings())
    }
}

/// A state whose caches are already filled for all five articles.
pub fn warmed_state(current_article: u32, current_variation: u32) -> RotationState {
    let mut state = RotationState {
        current_article: ArticleNumber::new(current_article),
        current_variation: pipeline::VariationNumber::new(current_variation),
        articles_cache: articles(),
        ..RotationState::default()
    };
    for article in articles() {
        let extraction = InsightExtraction {
            key_insights: insights(7),
            themes: vec!["Data strategy".into()],
            ..Default::default()
        };
        state.analysis_cache.insert(
            article.number,
            pipeline::Analysis::from_extraction(&article, extraction),
        );
    }
    state
}
