//! Survey answer model for research study deployments
//!
//! A [`Study`] owns its [`SurveyTask`]s, each of which owns an ordered
//! list of [`TaskQuestion`]s. Answers enter the tree only through the
//! validating update path, so any non-unanswered value held by a
//! question is valid by construction.

mod report;

pub use report::{AnswerRecord, ReportedAnswer, StudyReport, TaskReport};

use crate::crypto::PublicKey;
use crate::error::{Error, Result};
use std::ops::RangeInclusive;

/// Ordered list of display labels for a scale question.
///
/// Labels are kept in order and by identity: the same text may appear
/// more than once and is not collapsed by value. The compact string
/// encoding joins labels with commas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOptions(Vec<String>);

impl AnswerOptions {
    /// Create from a list of labels
    pub fn new(labels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(labels.into_iter().map(Into::into).collect())
    }

    /// Number of options
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The labels, in display order
    pub fn labels(&self) -> &[String] {
        &self.0
    }

    /// Compact comma-separated encoding
    pub fn encode(&self) -> String {
        self.0.join(",")
    }

    /// Parse the compact encoding
    pub fn from_encoded(encoded: &str) -> Self {
        if encoded.is_empty() {
            return Self(Vec::new());
        }
        Self(encoded.split(',').map(str::to_string).collect())
    }

    /// Resolve a named preset
    pub fn preset(name: &str) -> Option<Self> {
        let labels: &[&str] = match name {
            "agreement5" => &[
                "Strongly disagree",
                "Disagree",
                "Neutral",
                "Agree",
                "Strongly agree",
            ],
            "satisfaction5" => &[
                "Very dissatisfied",
                "Dissatisfied",
                "Neutral",
                "Satisfied",
                "Very satisfied",
            ],
            "frequency5" => &["Never", "Rarely", "Sometimes", "Often", "Always"],
            "ease5" => &["Very hard", "Hard", "Neutral", "Easy", "Very easy"],
            _ => return None,
        };
        Some(Self::new(labels.iter().copied()))
    }
}

/// The answer shape a question expects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    /// Pick one of an ordered list of labels, answered as 1-based index
    Scale(AnswerOptions),

    /// Free-form text
    FreeText,

    /// Numeric score within the configured range
    NetPromoterScore(RangeInclusive<i64>),

    /// Display-only text, never answered
    Instructional,
}

/// A submitted (or absent) answer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Answer {
    /// 1-based option index of a scale question
    Scale(i64),

    /// Free-form text
    FreeText(String),

    /// Numeric score
    NetPromoterScore(i64),

    /// No answer given
    #[default]
    Unanswered,
}

impl Answer {
    /// Whether this is the unanswered state
    pub fn is_unanswered(&self) -> bool {
        matches!(self, Answer::Unanswered)
    }
}

/// A single question within a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuestion {
    /// Question text shown to the participant
    pub text: String,

    /// Expected answer shape
    pub kind: QuestionKind,

    /// Whether the participant may leave the question unanswered
    pub optional: bool,

    answer: Answer,
}

impl TaskQuestion {
    /// Create an unanswered question.
    ///
    /// Instructional questions are always optional regardless of the
    /// flag passed in.
    pub fn new(text: impl Into<String>, kind: QuestionKind, optional: bool) -> Self {
        let optional = optional || matches!(kind, QuestionKind::Instructional);
        Self {
            text: text.into(),
            kind,
            optional,
            answer: Answer::Unanswered,
        }
    }

    /// Current answer
    pub fn answer(&self) -> &Answer {
        &self.answer
    }

    /// Submit an answer, validating it against the question kind.
    ///
    /// Optional questions accept `Unanswered` unconditionally (reset).
    /// Otherwise the variant must match the kind, and bounded kinds
    /// additionally check the range: `1..=option_count` for scales, the
    /// configured range for net promoter scores.
    pub fn update_answer(&mut self, answer: Answer) -> Result<()> {
        if self.optional && answer.is_unanswered() {
            self.answer = Answer::Unanswered;
            return Ok(());
        }

        match (&self.kind, &answer) {
            (QuestionKind::Scale(options), Answer::Scale(value)) => {
                let expected = 1..=options.len() as i64;
                if !expected.contains(value) {
                    return Err(Error::InvalidRange(expected));
                }
            }
            (QuestionKind::NetPromoterScore(range), Answer::NetPromoterScore(value)) => {
                if !range.contains(value) {
                    return Err(Error::InvalidRange(range.clone()));
                }
            }
            (QuestionKind::FreeText, Answer::FreeText(_)) => {}
            _ => return Err(Error::TypeMismatch),
        }

        self.answer = answer;
        Ok(())
    }

    /// Force the answer back to unanswered, bypassing validation
    pub fn reset(&mut self) {
        self.answer = Answer::Unanswered;
    }

    /// Whether this question no longer blocks completion
    pub fn is_satisfied(&self) -> bool {
        self.optional || !self.answer.is_unanswered()
    }
}

/// A named group of questions within a study
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyTask {
    /// Stable task identifier
    pub id: String,

    /// Display title
    pub title: Option<String>,

    /// Instructions shown before the questions
    pub instructions: Option<String>,

    /// Bound on assistant messages exchanged before this task unlocks
    pub assistant_message_limit: Option<RangeInclusive<i64>>,

    /// Questions, in display order
    pub questions: Vec<TaskQuestion>,
}

impl SurveyTask {
    /// Create a task with the given questions
    pub fn new(id: impl Into<String>, questions: Vec<TaskQuestion>) -> Self {
        Self {
            id: id.into(),
            title: None,
            instructions: None,
            assistant_message_limit: None,
            questions,
        }
    }

    /// Submit an answer to the question at `index`
    pub fn update_answer(&mut self, answer: Answer, index: usize) -> Result<()> {
        let question = self
            .questions
            .get_mut(index)
            .ok_or(Error::InvalidQuestionIndex(index))?;
        question.update_answer(answer)
    }

    /// Whether every question is optional or answered
    pub fn is_fully_answered(&self) -> bool {
        self.questions.iter().all(TaskQuestion::is_satisfied)
    }

    /// Reset every question to unanswered
    pub fn reset(&mut self) {
        for question in &mut self.questions {
            question.reset();
        }
    }
}

/// A configured research deployment
#[derive(Debug, Clone)]
pub struct Study {
    /// Stable study identifier
    pub id: String,

    /// Display title
    pub title: String,

    /// Explainer text shown during enrollment
    pub explainer: String,

    /// API key the deployment uses for LLM access
    pub api_key: String,

    /// Address study reports are announced to, if any
    pub report_email: Option<String>,

    /// Public key reports are sealed with before upload, if any
    pub encryption_public_key: Option<PublicKey>,

    /// Tasks, in display order
    pub tasks: Vec<SurveyTask>,
}

impl Study {
    /// Look up a task by id
    pub fn task(&self, task_id: &str) -> Option<&SurveyTask> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    /// Submit an answer into the task/question tree
    pub fn submit_answer(
        &mut self,
        answer: Answer,
        task_id: &str,
        question_index: usize,
    ) -> Result<()> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))?;
        task.update_answer(answer, question_index)
    }

    /// Whether every task is fully answered
    pub fn is_fully_answered(&self) -> bool {
        self.tasks.iter().all(SurveyTask::is_fully_answered)
    }

    /// Force every question in every task back to unanswered
    pub fn reset_all_answers(&mut self) {
        for task in &mut self.tasks {
            task.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scale_question(options: usize) -> TaskQuestion {
        let labels: Vec<String> = (1..=options).map(|i| format!("Option {}", i)).collect();
        TaskQuestion::new(
            "How do you rate this?",
            QuestionKind::Scale(AnswerOptions::new(labels)),
            false,
        )
    }

    fn study_with_one_task() -> Study {
        let mut task = SurveyTask::new(
            "exit-survey",
            vec![
                scale_question(5),
                TaskQuestion::new("Anything else?", QuestionKind::FreeText, true),
            ],
        );
        task.title = Some("Exit survey".to_string());
        Study {
            id: "study-1".to_string(),
            title: "Pilot".to_string(),
            explainer: "A pilot study".to_string(),
            api_key: "key".to_string(),
            report_email: None,
            encryption_public_key: None,
            tasks: vec![task],
        }
    }

    #[test]
    fn test_scale_accepts_in_range() {
        let mut q = scale_question(5);
        for value in 1..=5 {
            q.update_answer(Answer::Scale(value)).unwrap();
            assert_eq!(q.answer(), &Answer::Scale(value));
        }
    }

    #[test]
    fn test_scale_rejects_out_of_range() {
        let mut q = scale_question(5);
        for value in [0, 6] {
            let err = q.update_answer(Answer::Scale(value)).unwrap_err();
            assert!(matches!(err, Error::InvalidRange(range) if range == (1..=5)));
        }
        assert!(q.answer().is_unanswered());
    }

    #[test]
    fn test_nps_range() {
        let mut q = TaskQuestion::new(
            "How likely are you to recommend us?",
            QuestionKind::NetPromoterScore(0..=10),
            false,
        );
        q.update_answer(Answer::NetPromoterScore(0)).unwrap();
        q.update_answer(Answer::NetPromoterScore(10)).unwrap();
        for value in [-1, 11] {
            let err = q.update_answer(Answer::NetPromoterScore(value)).unwrap_err();
            assert!(matches!(err, Error::InvalidRange(range) if range == (0..=10)));
        }
    }

    #[test]
    fn test_type_mismatch() {
        let mut q = scale_question(3);
        let err = q
            .update_answer(Answer::FreeText("three".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch));

        // Required question cannot be un-answered through the normal path
        q.update_answer(Answer::Scale(2)).unwrap();
        let err = q.update_answer(Answer::Unanswered).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch));
        assert_eq!(q.answer(), &Answer::Scale(2));
    }

    #[test]
    fn test_free_text_accepts_any_string() {
        let mut q = TaskQuestion::new("Comments?", QuestionKind::FreeText, false);
        q.update_answer(Answer::FreeText(String::new())).unwrap();
        q.update_answer(Answer::FreeText("lots of text".to_string()))
            .unwrap();
    }

    #[test]
    fn test_optional_accepts_unanswered_any_time() {
        let mut q = TaskQuestion::new("Comments?", QuestionKind::FreeText, true);
        q.update_answer(Answer::FreeText("something".to_string()))
            .unwrap();
        q.update_answer(Answer::Unanswered).unwrap();
        assert!(q.answer().is_unanswered());
    }

    #[test]
    fn test_instructional_always_optional_and_satisfied() {
        let q = TaskQuestion::new("Read this first.", QuestionKind::Instructional, false);
        assert!(q.optional);
        assert!(q.is_satisfied());

        let mut q = q;
        let err = q.update_answer(Answer::FreeText("ok".to_string())).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch));
        q.update_answer(Answer::Unanswered).unwrap();
    }

    #[test]
    fn test_task_invalid_index() {
        let mut task = SurveyTask::new("t", vec![scale_question(3)]);
        let err = task.update_answer(Answer::Scale(1), 1).unwrap_err();
        assert!(matches!(err, Error::InvalidQuestionIndex(1)));
    }

    #[test]
    fn test_study_unknown_task() {
        let mut study = study_with_one_task();
        let err = study
            .submit_answer(Answer::Scale(1), "no-such-task", 0)
            .unwrap_err();
        assert!(matches!(err, Error::TaskNotFound(id) if id == "no-such-task"));
    }

    #[test]
    fn test_completion_and_reset() {
        let mut study = study_with_one_task();
        assert!(!study.is_fully_answered());

        // The free-text question is optional, so the scale alone completes it
        study.submit_answer(Answer::Scale(3), "exit-survey", 0).unwrap();
        assert!(study.is_fully_answered());
        assert!(study.task("exit-survey").unwrap().is_fully_answered());

        study.reset_all_answers();
        assert!(!study.is_fully_answered());
        for question in &study.tasks[0].questions {
            assert!(question.answer().is_unanswered());
        }
    }

    #[test]
    fn test_answer_options_encoding() {
        let options = AnswerOptions::new(["Never", "Sometimes", "Always"]);
        assert_eq!(options.encode(), "Never,Sometimes,Always");
        assert_eq!(AnswerOptions::from_encoded("Never,Sometimes,Always"), options);
        assert!(AnswerOptions::from_encoded("").is_empty());
    }

    #[test]
    fn test_answer_options_keep_repeated_labels() {
        let options = AnswerOptions::new(["Yes", "Yes", "No"]);
        assert_eq!(options.len(), 3);
        assert_eq!(options.labels()[0], options.labels()[1]);
    }

    #[test]
    fn test_answer_options_presets() {
        let agreement = AnswerOptions::preset("agreement5").unwrap();
        assert_eq!(agreement.len(), 5);
        assert_eq!(agreement.labels()[0], "Strongly disagree");
        assert!(AnswerOptions::preset("unknown").is_none());
    }
}
