//! Interpretation facade over the processing engine

use super::{Content, FhirResource, ResourceProcessor};
use crate::error::Result;
use crate::llm::{LlmService, PromptSchema};
use crate::storage::KeyValueStore;
use std::sync::Arc;

/// Storage key for the interpretation cache
const STORAGE_KEY: &str = "fhirsight.interpretations";

/// System prompt steering the model towards an in-depth interpretation
const INTERPRETATION_PROMPT: &str = "You are assisting a patient in understanding their own \
health records. Interpret the following FHIR resource in plain language: explain what was \
measured or recorded, what the values mean, and whether anything falls outside typical \
ranges. Do not provide medical advice; encourage the patient to discuss findings with \
their care team. The resource follows as JSON.";

/// In-depth plain-language interpretation of a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpretation(String);

impl Interpretation {
    /// The interpretation text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Content for Interpretation {
    const KIND: &'static str = "interpretation";

    fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }
        Some(Self(raw.to_string()))
    }

    fn description(&self) -> String {
        self.0.clone()
    }
}

/// Typed facade producing cached interpretations of clinical resources
pub struct ResourceInterpreter {
    processor: ResourceProcessor<Interpretation>,
}

impl ResourceInterpreter {
    /// Create an interpreter backed by the given collaborators
    pub async fn new(
        llm: Arc<dyn LlmService>,
        store: Arc<dyn KeyValueStore>,
        schema: PromptSchema,
    ) -> Self {
        Self {
            processor: ResourceProcessor::new(
                llm,
                store,
                STORAGE_KEY,
                INTERPRETATION_PROMPT,
                schema,
            )
            .await,
        }
    }

    /// Interpret a resource, consulting the cache first
    pub async fn interpret<R: FhirResource>(
        &self,
        resource: &R,
        force_reload: bool,
    ) -> Result<Interpretation> {
        self.processor.process(resource, force_reload).await
    }

    /// Cached interpretation, if any
    pub fn cached_interpretation<R: FhirResource>(&self, resource: &R) -> Option<Interpretation> {
        self.processor.cached_result(resource)
    }

    /// Swap the model configuration for future calls
    pub fn change_schema(&self, schema: PromptSchema) {
        self.processor.update_schema(schema);
    }
}
