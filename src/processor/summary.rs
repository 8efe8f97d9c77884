//! Summary facade over the processing engine

use super::{Content, FhirResource, ResourceProcessor};
use crate::error::Result;
use crate::llm::{LlmService, PromptSchema};
use crate::storage::KeyValueStore;
use std::sync::Arc;

/// Storage key for the summary cache
const STORAGE_KEY: &str = "fhirsight.summaries";

/// System prompt steering the model towards a short titled summary
const SUMMARY_PROMPT: &str = "You are assisting a patient in understanding their own health \
records. Summarize the following FHIR resource in two parts: a short title of at most five \
words on the first line, then a one-to-two sentence summary on the following lines. Use \
plain language a patient can understand. The resource follows as JSON.";

/// Short titled summary of a resource.
///
/// Encoded as `"title\nsummary"`. Parsing strips blank lines: the first
/// non-blank line is the title, the remaining non-blank lines joined by
/// newlines form the body. A single-line input is both title and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Short display title
    pub title: String,

    /// Summary body
    pub summary: String,
}

impl Content for Summary {
    const KIND: &'static str = "summary";

    fn parse(raw: &str) -> Option<Self> {
        let mut lines = raw.lines().filter(|l| !l.trim().is_empty());
        let title = lines.next()?.to_string();
        let rest: Vec<&str> = lines.collect();
        let summary = if rest.is_empty() {
            title.clone()
        } else {
            rest.join("\n")
        };
        Some(Self { title, summary })
    }

    fn description(&self) -> String {
        format!("{}\n{}", self.title, self.summary)
    }
}

/// Typed facade producing cached summaries of clinical resources
pub struct ResourceSummary {
    processor: ResourceProcessor<Summary>,
}

impl ResourceSummary {
    /// Create a summarizer backed by the given collaborators
    pub async fn new(
        llm: Arc<dyn LlmService>,
        store: Arc<dyn KeyValueStore>,
        schema: PromptSchema,
    ) -> Self {
        Self {
            processor: ResourceProcessor::new(llm, store, STORAGE_KEY, SUMMARY_PROMPT, schema)
                .await,
        }
    }

    /// Summarize a resource, consulting the cache first
    pub async fn summarize<R: FhirResource>(
        &self,
        resource: &R,
        force_reload: bool,
    ) -> Result<Summary> {
        self.processor.process(resource, force_reload).await
    }

    /// Cached summary, if any
    pub fn cached_summary<R: FhirResource>(&self, resource: &R) -> Option<Summary> {
        self.processor.cached_result(resource)
    }

    /// Swap the model configuration for future calls
    pub fn change_schema(&self, schema: PromptSchema) {
        self.processor.update_schema(schema);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedLlm;
    use crate::processor::FhirRecord;
    use crate::storage::MemoryStore;
    use serde_json::json;

    #[test]
    fn test_parse_title_and_body() {
        let s = Summary::parse("Title\nLine1\nLine2").unwrap();
        assert_eq!(s.title, "Title");
        assert_eq!(s.summary, "Line1\nLine2");
    }

    #[test]
    fn test_parse_empty_fails() {
        assert!(Summary::parse("").is_none());
        assert!(Summary::parse("\n\n  \n").is_none());
    }

    #[test]
    fn test_parse_single_line_duplicates_title() {
        let s = Summary::parse("OnlyOneLine").unwrap();
        assert_eq!(s.title, "OnlyOneLine");
        assert_eq!(s.summary, "OnlyOneLine");
    }

    #[test]
    fn test_parse_strips_blank_line_runs() {
        let s = Summary::parse("Title\n\nLine1\n\nLine2\n\n").unwrap();
        assert_eq!(s.title, "Title");
        assert_eq!(s.summary, "Line1\nLine2");
    }

    #[test]
    fn test_description_round_trip() {
        let s = Summary {
            title: "Blood Pressure".to_string(),
            summary: "Your reading was 120/80.\nThat is a healthy value.".to_string(),
        };
        assert_eq!(Summary::parse(&s.description()).unwrap(), s);
    }

    #[tokio::test]
    async fn test_summarize_and_cache() {
        let llm = Arc::new(ScriptedLlm::new(["Blood Pressure\nYour reading was normal."]));
        let summarizer = ResourceSummary::new(
            llm.clone(),
            Arc::new(MemoryStore::new()),
            PromptSchema::for_model("test-model"),
        )
        .await;

        let resource = FhirRecord::new("obs-bp", json!({"resourceType": "Observation"}));
        let summary = summarizer.summarize(&resource, false).await.unwrap();
        assert_eq!(summary.title, "Blood Pressure");
        assert_eq!(summary.summary, "Your reading was normal.");

        assert_eq!(summarizer.cached_summary(&resource), Some(summary));
        assert_eq!(llm.call_count(), 1);
    }
}
