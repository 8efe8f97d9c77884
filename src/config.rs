//! Study deployment configuration
//!
//! A deployment ships a single JSON configuration file carrying the
//! launch mode and the study definitions (tasks, questions, API key,
//! optional report email and encryption public key). Ranges are
//! string-encoded as `"lo...hi"` and the public key is embedded as
//! base64 of its PEM bytes, preserving the exported file layout.

use crate::crypto::PublicKey;
use crate::error::{Error, Result};
use crate::study::{AnswerOptions, QuestionKind, Study, SurveyTask, TaskQuestion};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;

/// Prefix selecting a named answer-options preset
const PRESET_PREFIX: &str = "preset:";

/// Top-level configuration file contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfiguration {
    /// How the app launches
    pub launch_mode: LaunchMode,

    /// Study definitions available to this deployment
    pub studies: Vec<StudyDefinition>,
}

impl AppConfiguration {
    /// Load a configuration file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = tokio::fs::read(path.as_ref()).await?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// Write the configuration file
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let data = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(path.as_ref(), data).await?;
        Ok(())
    }

    /// Materialize every study definition into its domain form
    pub fn studies(&self) -> Result<Vec<Study>> {
        self.studies.iter().cloned().map(StudyDefinition::into_study).collect()
    }
}

/// App launch mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LaunchMode {
    /// Ordinary record-exploration deployment
    Ordinary,

    /// Research study deployment with survey collection
    Study,
}

/// Serialized study definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyDefinition {
    /// Stable study identifier
    pub id: String,

    /// Display title
    pub title: String,

    /// Explainer text shown during enrollment
    pub explainer: String,

    /// API key for LLM access
    pub api_key: String,

    /// Address study reports are announced to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_email: Option<String>,

    /// Base64 of the PEM-encoded report encryption public key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_public_key: Option<String>,

    /// Task definitions
    pub tasks: Vec<TaskDefinition>,
}

impl StudyDefinition {
    /// Convert into the domain study, decoding keys and ranges
    pub fn into_study(self) -> Result<Study> {
        let encryption_public_key = self
            .encryption_public_key
            .as_deref()
            .map(|encoded| {
                let pem = BASE64.decode(encoded).map_err(|e| {
                    Error::Config(format!("invalid base64 encryption key: {}", e))
                })?;
                PublicKey::from_pem(&pem)
            })
            .transpose()?;

        let tasks = self
            .tasks
            .into_iter()
            .map(TaskDefinition::into_task)
            .collect::<Result<Vec<_>>>()?;

        Ok(Study {
            id: self.id,
            title: self.title,
            explainer: self.explainer,
            api_key: self.api_key,
            report_email: self.report_email,
            encryption_public_key,
            tasks,
        })
    }
}

/// Serialized task definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinition {
    /// Stable task identifier
    pub id: String,

    /// Display title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Instructions shown before the questions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    /// Assistant message bound, string-encoded as `"lo...hi"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_message_limit: Option<String>,

    /// Question definitions
    pub questions: Vec<QuestionDefinition>,
}

impl TaskDefinition {
    fn into_task(self) -> Result<SurveyTask> {
        let assistant_message_limit = self
            .assistant_message_limit
            .as_deref()
            .map(parse_range)
            .transpose()?;

        let questions = self
            .questions
            .into_iter()
            .map(QuestionDefinition::into_question)
            .collect::<Result<Vec<_>>>()?;

        Ok(SurveyTask {
            id: self.id,
            title: self.title,
            instructions: self.instructions,
            assistant_message_limit,
            questions,
        })
    }
}

/// Question kind tag in the configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestionKindTag {
    Scale,
    FreeText,
    NetPromoterScore,
    Instructional,
}

/// Serialized question definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDefinition {
    /// Question text
    pub text: String,

    /// Answer shape
    pub kind: QuestionKindTag,

    /// Whether the question may stay unanswered
    #[serde(default)]
    pub optional: bool,

    /// Scale options: compact encoding, or `preset:<name>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,

    /// Score bound, string-encoded as `"lo...hi"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
}

impl QuestionDefinition {
    fn into_question(self) -> Result<TaskQuestion> {
        let kind = match self.kind {
            QuestionKindTag::Scale => {
                let encoded = self.options.as_deref().ok_or_else(|| {
                    Error::Config(format!("scale question '{}' has no options", self.text))
                })?;
                let options = resolve_options(encoded)?;
                if options.is_empty() {
                    return Err(Error::Config(format!(
                        "scale question '{}' has empty options",
                        self.text
                    )));
                }
                QuestionKind::Scale(options)
            }
            QuestionKindTag::FreeText => QuestionKind::FreeText,
            QuestionKindTag::NetPromoterScore => {
                let encoded = self.range.as_deref().ok_or_else(|| {
                    Error::Config(format!("score question '{}' has no range", self.text))
                })?;
                QuestionKind::NetPromoterScore(parse_range(encoded)?)
            }
            QuestionKindTag::Instructional => QuestionKind::Instructional,
        };

        Ok(TaskQuestion::new(self.text, kind, self.optional))
    }
}

/// Resolve a compact options encoding, honoring `preset:` lookups
fn resolve_options(encoded: &str) -> Result<AnswerOptions> {
    if let Some(name) = encoded.strip_prefix(PRESET_PREFIX) {
        return AnswerOptions::preset(name)
            .ok_or_else(|| Error::Config(format!("unknown answer options preset '{}'", name)));
    }
    Ok(AnswerOptions::from_encoded(encoded))
}

/// Parse a `"lo...hi"` range string
fn parse_range(encoded: &str) -> Result<RangeInclusive<i64>> {
    let (lo, hi) = encoded
        .split_once("...")
        .ok_or_else(|| Error::Config(format!("invalid range '{}', expected 'lo...hi'", encoded)))?;
    let lo: i64 = lo
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("invalid range bound '{}'", lo)))?;
    let hi: i64 = hi
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("invalid range bound '{}'", hi)))?;
    if lo > hi {
        return Err(Error::Config(format!("empty range '{}'", encoded)));
    }
    Ok(lo..=hi)
}
