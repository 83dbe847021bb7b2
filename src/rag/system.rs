//! The query coordinator.

use super::{CourseAnalytics, CourseIndexer, IngestReport, QueryResponse};
use crate::agent::Generator;
use crate::config::{Prompts, Settings};
use crate::document::{Course, DocumentProcessor};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::Result;
use crate::llm::{AnthropicClient, ModelClient};
use crate::session::SessionManager;
use crate::tools::{ContentSearchTool, OutlineTool, ToolExecutor, ToolRegistry};
use crate::vector_store::{self, CourseStore, VectorStore};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Course materials question answering system.
pub struct RagSystem {
    indexer: CourseIndexer,
    store: Arc<CourseStore>,
    generator: Generator,
    registry: ToolRegistry,
    sessions: SessionManager,
    max_rounds: u32,
}

impl RagSystem {
    /// Create a system with the configured model, embedder and store.
    pub fn new(settings: &Settings) -> Result<Self> {
        let client: Arc<dyn ModelClient> = Arc::new(AnthropicClient::from_settings(&settings.llm)?);
        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::from_settings(&settings.embedding)?);

        let backend = vector_store::open_backend(settings)?;

        Self::with_components(settings, client, embedder, backend)
    }

    /// Create a system with custom components.
    pub fn with_components(
        settings: &Settings,
        client: Arc<dyn ModelClient>,
        embedder: Arc<dyn Embedder>,
        backend: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let store = Arc::new(
            CourseStore::new(backend, embedder, settings.search.max_results)
                .with_course_match_threshold(settings.search.course_match_threshold),
        );

        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(ContentSearchTool::new(store.clone())))?;
        registry.register(Arc::new(OutlineTool::new(store.clone())))?;
        debug!("Registered tools: {:?}", registry.tool_names());

        Ok(Self {
            indexer: CourseIndexer::new(
                DocumentProcessor::new(settings.search.chunk_size, settings.search.chunk_overlap),
                store.clone(),
            ),
            store,
            generator: Generator::from_settings(client, &settings.llm, &prompts),
            registry,
            sessions: SessionManager::new(settings.session.max_history)
                .with_max_sessions(settings.session.max_sessions),
            max_rounds: settings.llm.max_rounds,
        })
    }

    pub fn store(&self) -> Arc<CourseStore> {
        self.store.clone()
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Answer a question, continuing `session_id` or starting a new session.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn query(&self, query: &str, session_id: Option<&str>) -> Result<QueryResponse> {
        let session_id = match session_id {
            Some(id) => id.to_string(),
            None => self.sessions.create_session(),
        };
        let history = self.sessions.history(&session_id);

        // Each query gets its own citation log.
        let registry = self.registry.fork();
        registry.reset_citations();

        let answer = self
            .generator
            .generate(
                query,
                history.as_deref(),
                &registry.definitions(),
                Some(&registry as &dyn ToolExecutor),
                self.max_rounds,
            )
            .await?;

        let sources = registry.session_citations();
        registry.reset_citations();

        self.sessions.add_exchange(&session_id, query, &answer)?;
        debug!("Answered with {} sources in {}", sources.len(), session_id);

        Ok(QueryResponse {
            answer,
            sources,
            session_id,
        })
    }

    /// Index one course document, replacing any earlier version of the
    /// course. Returns the course and the number of chunks stored.
    pub async fn add_course_document(&self, path: &Path) -> Result<(Course, usize)> {
        self.indexer.add_course_document(path).await
    }

    /// Index every supported document in `folder`.
    pub async fn add_course_folder(&self, folder: &Path, clear_existing: bool) -> Result<IngestReport> {
        self.indexer.add_course_folder(folder, clear_existing).await
    }

    /// Number and titles of indexed courses.
    pub async fn course_analytics(&self) -> Result<CourseAnalytics> {
        let course_titles = self.store.course_titles().await?;
        Ok(CourseAnalytics {
            total_courses: course_titles.len(),
            course_titles,
        })
    }
}
