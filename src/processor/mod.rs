//! Resource processing engine
//!
//! Maps a clinical resource to a computed content value (summary or
//! interpretation), consulting a persistent cache first and invoking the
//! LLM collaborator on a miss. The read-check-compute-persist sequence
//! for the shared result map runs under a single critical section per
//! processor instance, so concurrent calls never lose a committed write.
//! Duplicate LLM invocations for concurrent first-misses of the same key
//! are accepted; the last writer wins.

mod interpreter;
mod summary;

pub use interpreter::{Interpretation, ResourceInterpreter};
pub use summary::{ResourceSummary, Summary};

use crate::error::{Error, Result};
use crate::llm::{LlmService, OneShotContext, PromptSchema};
use crate::storage::KeyValueStore;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;

/// A clinical resource the engine can process.
///
/// The key must be stable per resource; the canonical text is what the
/// model sees (typically the resource's JSON representation).
pub trait FhirResource {
    /// Stable, unique identifier of this resource
    fn key(&self) -> &str;

    /// Canonical textual representation handed to the model
    fn canonical_text(&self) -> String;
}

/// Plain record form of a FHIR resource
#[derive(Debug, Clone)]
pub struct FhirRecord {
    /// Stable resource identifier (e.g. `Observation/blood-pressure-1`)
    pub key: String,

    /// Resource body as JSON
    pub body: serde_json::Value,
}

impl FhirRecord {
    /// Create a record from a key and JSON body
    pub fn new(key: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            key: key.into(),
            body,
        }
    }
}

impl FhirResource for FhirRecord {
    fn key(&self) -> &str {
        &self.key
    }

    fn canonical_text(&self) -> String {
        self.body.to_string()
    }
}

/// Content value cacheable by the engine.
///
/// Round-trippable through a single descriptive string: `parse` inverts
/// `description`. A failed parse means the model reply (or a cached
/// entry) does not fit the schema.
pub trait Content: Clone + Send + Sync + Sized {
    /// Schema name used in error reporting
    const KIND: &'static str;

    /// Construct from the descriptive string, `None` when it does not fit
    fn parse(raw: &str) -> Option<Self>;

    /// Lossless descriptive string form
    fn description(&self) -> String;
}

/// Generic cache/compute engine for one content schema.
///
/// Holds the result map in memory, mirrors every mutation to the
/// injected store under a fixed storage key, and serializes writers.
/// Two processor instances are fully independent.
pub struct ResourceProcessor<C: Content> {
    llm: Arc<dyn LlmService>,
    store: Arc<dyn KeyValueStore>,
    storage_key: String,
    prompt: String,
    schema: RwLock<PromptSchema>,
    results: RwLock<HashMap<String, String>>,
    // Guards the read-modify-persist sequence; the map lock alone is not
    // held across the persistence await.
    write_gate: Mutex<()>,
    _content: PhantomData<C>,
}

impl<C: Content> ResourceProcessor<C> {
    /// Create a processor, loading any previously persisted cache.
    ///
    /// A failed or malformed read falls back to an empty cache and is
    /// reported on the warning channel only.
    pub async fn new(
        llm: Arc<dyn LlmService>,
        store: Arc<dyn KeyValueStore>,
        storage_key: impl Into<String>,
        prompt: impl Into<String>,
        schema: PromptSchema,
    ) -> Self {
        let storage_key = storage_key.into();
        let results = match store.read(&storage_key).await {
            Ok(Some(value)) => match serde_json::from_value::<HashMap<String, String>>(value) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!(key = %storage_key, "Discarding malformed cache: {}", e);
                    HashMap::new()
                }
            },
            Ok(None) => HashMap::new(),
            Err(e) => {
                tracing::warn!(key = %storage_key, "Failed to load cache: {}", e);
                HashMap::new()
            }
        };

        Self {
            llm,
            store,
            storage_key,
            prompt: prompt.into(),
            schema: RwLock::new(schema),
            results: RwLock::new(results),
            write_gate: Mutex::new(()),
            _content: PhantomData,
        }
    }

    /// Produce the content for a resource.
    ///
    /// Returns the cached value when present (and non-empty) unless
    /// `force_reload` is set; otherwise invokes the LLM once, caches the
    /// parsed result, and persists the whole map best-effort.
    pub async fn process<R: FhirResource>(&self, resource: &R, force_reload: bool) -> Result<C> {
        if !force_reload {
            if let Some(cached) = self.cached_result(resource) {
                tracing::debug!(key = %resource.key(), "Cache hit");
                return Ok(cached);
            }
        }

        let schema = self
            .schema
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let context = OneShotContext {
            system_messages: vec![self.prompt.clone(), resource.canonical_text()],
        };

        tracing::debug!(key = %resource.key(), model = %schema.model, "Invoking LLM");
        let reply = self.llm.one_shot(&schema, context).await?;

        let content =
            C::parse(&reply).ok_or_else(|| Error::NotParsable(C::KIND.to_string()))?;

        let _gate = self.write_gate.lock().await;
        let snapshot = {
            let mut results = self
                .results
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            results.insert(resource.key().to_string(), content.description());
            results.clone()
        };
        match serde_json::to_value(&snapshot) {
            Ok(value) => {
                if let Err(e) = self.store.store(&self.storage_key, value).await {
                    tracing::warn!(key = %self.storage_key, "Failed to persist cache: {}", e);
                }
            }
            Err(e) => {
                tracing::warn!(key = %self.storage_key, "Failed to encode cache: {}", e);
            }
        }

        Ok(content)
    }

    /// Pure cache lookup, no side effects and no LLM call.
    ///
    /// Empty cached descriptions count as absent.
    pub fn cached_result<R: FhirResource>(&self, resource: &R) -> Option<C> {
        let results = self.results.read().unwrap_or_else(PoisonError::into_inner);
        let raw = results.get(resource.key())?;
        if raw.is_empty() {
            return None;
        }
        C::parse(raw)
    }

    /// Swap the model/prompt configuration used by future `process` calls.
    ///
    /// Existing cache entries stay valid.
    pub fn update_schema(&self, schema: PromptSchema) {
        *self.schema.write().unwrap_or_else(PoisonError::into_inner) = schema;
    }
}
