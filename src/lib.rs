//! Fhirsight - FHIR resource interpretation and study data collection
//!
//! Fhirsight lets a health application hand clinical FHIR resources to an
//! LLM for patient-facing summaries and interpretations, caching every
//! result so a resource is explained at most once, and collects survey
//! answers for research studies whose reports leave the device only in
//! encrypted form.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                        Caller (app/UI)                     │
//! └──────┬──────────────────────────────┬──────────────────────┘
//!        │                              │
//! ┌──────▼───────────────────┐   ┌──────▼──────────────────────┐
//! │  ResourceInterpreter /   │   │  Study / SurveyTask /       │
//! │  ResourceSummary facades │   │  TaskQuestion state machine │
//! └──────┬───────────────────┘   └──────┬──────────────────────┘
//!        │                              │
//! ┌──────▼───────────────────┐   ┌──────▼──────────────────────┐
//! │  ResourceProcessor       │   │  StudyReport + ECIES seal   │
//! │  (cache, single-writer)  │   │  (X25519/HKDF/AES-GCM)      │
//! └──┬───────────────┬───────┘   └─────────────────────────────┘
//!    │               │
//! ┌──▼─────────┐ ┌───▼──────────┐
//! │ LlmService │ │ KeyValueStore│   (injected collaborators)
//! └────────────┘ └──────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`processor`]: cache/compute engine plus the summary and interpretation facades
//! - [`study`]: survey answer model, validation, and report assembly
//! - [`crypto`]: ECIES sealing for study reports and PEM key handling
//! - [`llm`]: one-shot LLM collaborator contract
//! - [`storage`]: key-value persistence collaborator and file-backed store
//! - [`config`]: study deployment configuration

pub mod config;
pub mod crypto;
pub mod error;
pub mod llm;
pub mod processor;
pub mod storage;
pub mod study;

pub use config::AppConfiguration;
pub use error::{Error, Result};
