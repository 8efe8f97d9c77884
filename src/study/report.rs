//! Study report assembly and sealing
//!
//! On completion the accumulated answers are flattened into a
//! serializable report, encoded as JSON, and sealed with the study's
//! public key so only the study owner can read the upload.

use super::{Answer, QuestionKind, Study};
use crate::crypto;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Flattened answer form carried in a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum ReportedAnswer {
    /// 1-based scale option index
    Scale(i64),

    /// Free-form text
    FreeText(String),

    /// Numeric score
    NetPromoterScore(i64),

    /// Question left unanswered (optional questions only)
    Unanswered,
}

impl From<&Answer> for ReportedAnswer {
    fn from(answer: &Answer) -> Self {
        match answer {
            Answer::Scale(v) => ReportedAnswer::Scale(*v),
            Answer::FreeText(s) => ReportedAnswer::FreeText(s.clone()),
            Answer::NetPromoterScore(v) => ReportedAnswer::NetPromoterScore(*v),
            Answer::Unanswered => ReportedAnswer::Unanswered,
        }
    }
}

/// One question's entry in a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    /// Question text as shown to the participant
    pub question: String,

    /// The answer given
    #[serde(flatten)]
    pub answer: ReportedAnswer,
}

/// One task's entry in a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskReport {
    /// Task identifier
    pub task_id: String,

    /// Answers, in question order, instructional questions excluded
    pub answers: Vec<AnswerRecord>,
}

/// Serializable snapshot of a study's answers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyReport {
    /// Study identifier
    pub study_id: String,

    /// Assembly time
    pub created_at: DateTime<Utc>,

    /// Per-task answers
    pub tasks: Vec<TaskReport>,
}

impl StudyReport {
    /// Snapshot the current answers of a study.
    ///
    /// Instructional questions carry no answer and are left out.
    pub fn from_study(study: &Study) -> Self {
        let tasks = study
            .tasks
            .iter()
            .map(|task| TaskReport {
                task_id: task.id.clone(),
                answers: task
                    .questions
                    .iter()
                    .filter(|q| !matches!(q.kind, QuestionKind::Instructional))
                    .map(|q| AnswerRecord {
                        question: q.text.clone(),
                        answer: ReportedAnswer::from(q.answer()),
                    })
                    .collect(),
            })
            .collect();

        Self {
            study_id: study.id.clone(),
            created_at: Utc::now(),
            tasks,
        }
    }
}

impl Study {
    /// Assemble the current answers into a report
    pub fn report(&self) -> StudyReport {
        StudyReport::from_study(self)
    }

    /// Serialize the report and seal it with the study's public key.
    ///
    /// Fails when the study configuration carries no encryption key.
    pub fn sealed_report(&self) -> Result<Vec<u8>> {
        let key = self.encryption_public_key.as_ref().ok_or_else(|| {
            Error::Config(format!("study '{}' has no encryption public key", self.id))
        })?;
        let payload = serde_json::to_vec(&self.report())?;
        crypto::seal(&payload, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PrivateKey;
    use crate::study::{AnswerOptions, SurveyTask, TaskQuestion};

    fn sample_study() -> Study {
        let task = SurveyTask::new(
            "exit-survey",
            vec![
                TaskQuestion::new("Read this first.", QuestionKind::Instructional, false),
                TaskQuestion::new(
                    "How easy was the app?",
                    QuestionKind::Scale(AnswerOptions::preset("ease5").unwrap()),
                    false,
                ),
                TaskQuestion::new(
                    "Would you recommend it?",
                    QuestionKind::NetPromoterScore(0..=10),
                    false,
                ),
                TaskQuestion::new("Comments?", QuestionKind::FreeText, true),
            ],
        );
        Study {
            id: "study-1".to_string(),
            title: "Pilot".to_string(),
            explainer: "A pilot study".to_string(),
            api_key: "key".to_string(),
            report_email: Some("reports@example.org".to_string()),
            encryption_public_key: None,
            tasks: vec![task],
        }
    }

    #[test]
    fn test_report_skips_instructional_questions() {
        let mut study = sample_study();
        study.submit_answer(Answer::Scale(4), "exit-survey", 1).unwrap();
        study
            .submit_answer(Answer::NetPromoterScore(9), "exit-survey", 2)
            .unwrap();

        let report = study.report();
        assert_eq!(report.study_id, "study-1");
        assert_eq!(report.tasks.len(), 1);

        let answers = &report.tasks[0].answers;
        assert_eq!(answers.len(), 3);
        assert_eq!(answers[0].answer, ReportedAnswer::Scale(4));
        assert_eq!(answers[1].answer, ReportedAnswer::NetPromoterScore(9));
        assert_eq!(answers[2].answer, ReportedAnswer::Unanswered);
    }

    #[test]
    fn test_sealed_report_requires_key() {
        let study = sample_study();
        assert!(matches!(study.sealed_report(), Err(Error::Config(_))));
    }

    #[test]
    fn test_sealed_report_round_trip() {
        let private = PrivateKey::generate();
        let mut study = sample_study();
        study.encryption_public_key = Some(private.public_key());
        study.submit_answer(Answer::Scale(5), "exit-survey", 1).unwrap();
        study
            .submit_answer(Answer::FreeText("worked well".to_string()), "exit-survey", 3)
            .unwrap();

        let sealed = study.sealed_report().unwrap();
        let opened = crypto::open(&sealed, &private).unwrap();
        let report: StudyReport = serde_json::from_slice(&opened).unwrap();

        assert_eq!(report.study_id, "study-1");
        assert_eq!(report.tasks[0].answers[0].answer, ReportedAnswer::Scale(5));
        assert_eq!(
            report.tasks[0].answers[2].answer,
            ReportedAnswer::FreeText("worked well".to_string())
        );
    }

    #[test]
    fn test_report_json_round_trip() {
        let study = sample_study();
        let report = study.report();
        let json = serde_json::to_string(&report).unwrap();
        let parsed: StudyReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
    }
}
