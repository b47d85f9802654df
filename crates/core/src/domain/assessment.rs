// Assessment Domain Model
//
// A job's assessment is one aggregate document: sections own their questions,
// and the whole tree is replaced on every save.

use crate::domain::error::{DomainError, Result};
use crate::domain::job::JobId;
use crate::domain::response::{ResponseValue, Responses};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Assessment ID (opaque)
pub type AssessmentId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    SingleChoice,
    MultiChoice,
    ShortText,
    LongText,
    Numeric,
    FileUpload,
}

impl QuestionType {
    pub fn is_choice(&self) -> bool {
        matches!(self, QuestionType::SingleChoice | QuestionType::MultiChoice)
    }
}

/// Optional per-question constraints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

/// Expected answer(s) of the referenced question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    One(String),
    AnyOf(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub question_id: String,
    pub value: ConditionValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    #[serde(rename = "question")]
    pub prompt: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<Validation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional_on: Option<Condition>,
}

impl Question {
    pub fn new(id: impl Into<String>, kind: QuestionType, prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            prompt: prompt.into(),
            required: false,
            options: Vec::new(),
            validation: None,
            conditional_on: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_validation(mut self, validation: Validation) -> Self {
        self.validation = Some(validation);
        self
    }

    pub fn shown_when(mut self, question_id: impl Into<String>, value: ConditionValue) -> Self {
        self.conditional_on = Some(Condition {
            question_id: question_id.into(),
            value,
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Assessment Entity (at most one per job)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: AssessmentId,
    pub job_id: JobId,
    pub title: String,
    #[serde(default)]
    pub sections: Vec<Section>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Assessment {
    /// All questions in document order.
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.sections.iter().flat_map(|section| section.questions.iter())
    }

    pub fn find_question(&self, question_id: &str) -> Option<&Question> {
        self.questions().find(|question| question.id == question_id)
    }

    /// Questions shown for the current responses, in document order.
    pub fn visible_questions<'a>(&'a self, responses: &'a Responses) -> Vec<&'a Question> {
        self.questions()
            .filter(|question| is_visible(question, responses))
            .collect()
    }
}

/// Conditional visibility.
///
/// Unconditional questions are always shown. Otherwise the referenced question's
/// current answer must equal the expected value, or be a member of the expected set.
/// Only text answers can match; numbers, choice sets and files never do.
pub fn is_visible(question: &Question, responses: &Responses) -> bool {
    let Some(condition) = &question.conditional_on else {
        return true;
    };
    let Some(ResponseValue::Text(answer)) = responses.get(&condition.question_id) else {
        return false;
    };
    match &condition.value {
        ConditionValue::One(expected) => answer == expected,
        ConditionValue::AnyOf(expected) => expected.iter().any(|value| value == answer),
    }
}

/// Structural checks on a section tree before it is saved.
///
/// Question ids are unique, choice questions have options, and every
/// condition points at a question that appears earlier in the document.
pub fn validate_sections(sections: &[Section]) -> Result<()> {
    let mut section_ids = HashSet::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for section in sections {
        if !section_ids.insert(section.id.as_str()) {
            return Err(DomainError::InvalidAssessment(format!(
                "duplicate section id {}",
                section.id
            )));
        }
        for question in &section.questions {
            if question.kind.is_choice() && question.options.is_empty() {
                return Err(DomainError::InvalidAssessment(format!(
                    "choice question {} has no options",
                    question.id
                )));
            }
            if let Some(condition) = &question.conditional_on {
                if !seen.contains(condition.question_id.as_str()) {
                    return Err(DomainError::InvalidAssessment(format!(
                        "question {} depends on {} which does not precede it",
                        question.id, condition.question_id
                    )));
                }
            }
            if !seen.insert(question.id.as_str()) {
                return Err(DomainError::InvalidAssessment(format!(
                    "duplicate question id {}",
                    question.id
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assessment() -> Assessment {
        Assessment {
            id: "assessment-1".into(),
            job_id: "job-1".into(),
            title: "Backend Assessment".into(),
            sections: vec![Section {
                id: "s1".into(),
                title: "Basics".into(),
                description: None,
                questions: vec![
                    Question::new("q1", QuestionType::SingleChoice, "Relocate?")
                        .with_options(["Yes", "No"]),
                    Question::new("q2", QuestionType::ShortText, "Preferred city?")
                        .shown_when("q1", ConditionValue::One("Yes".into())),
                    Question::new("q3", QuestionType::LongText, "Why not?").shown_when(
                        "q1",
                        ConditionValue::AnyOf(vec!["No".into(), "Maybe".into()]),
                    ),
                ],
            }],
            created_at: 0,
            updated_at: 0,
        }
    }

    fn ids(questions: Vec<&Question>) -> Vec<&str> {
        questions.iter().map(|q| q.id.as_str()).collect()
    }

    #[test]
    fn test_visibility_follows_current_answer() {
        let assessment = assessment();
        let mut responses = Responses::new();
        assert_eq!(ids(assessment.visible_questions(&responses)), vec!["q1"]);

        responses.insert("q1".into(), ResponseValue::Text("Yes".into()));
        assert_eq!(ids(assessment.visible_questions(&responses)), vec!["q1", "q2"]);

        responses.insert("q2".into(), ResponseValue::Text("Lisbon".into()));
        responses.insert("q1".into(), ResponseValue::Text("No".into()));
        assert_eq!(ids(assessment.visible_questions(&responses)), vec!["q1", "q3"]);
        // Answers to questions that became hidden are kept.
        assert!(responses.contains_key("q2"));
    }

    #[test]
    fn test_non_text_answers_never_match() {
        let question = Question::new("q2", QuestionType::ShortText, "?")
            .shown_when("q1", ConditionValue::One("5".into()));
        let mut responses = Responses::new();
        responses.insert("q1".into(), ResponseValue::Number(5.0));
        assert!(!is_visible(&question, &responses));
    }

    #[test]
    fn test_validate_sections_rejects_forward_reference() {
        let mut sections = assessment().sections;
        sections[0].questions.swap(0, 1);
        assert!(validate_sections(&sections).is_err());
    }

    #[test]
    fn test_validate_sections_rejects_duplicates_and_empty_choices() {
        let mut sections = assessment().sections;
        sections[0].questions[2].id = "q1".into();
        sections[0].questions[2].conditional_on = None;
        assert!(validate_sections(&sections).is_err());

        let mut sections = assessment().sections;
        sections[0].questions[0].options.clear();
        assert!(validate_sections(&sections).is_err());

        assert!(validate_sections(&assessment().sections).is_ok());
    }

    #[test]
    fn test_question_wire_format() {
        let value = serde_json::to_value(&assessment().sections[0].questions[2]).unwrap();
        assert_eq!(value["type"], "long-text");
        assert_eq!(value["question"], "Why not?");
        assert_eq!(value["conditionalOn"]["value"], serde_json::json!(["No", "Maybe"]));
    }
}
