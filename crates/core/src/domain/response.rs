// Assessment Response Domain Model

use crate::domain::assessment::{is_visible, Assessment, AssessmentId, Question, QuestionType};
use crate::domain::candidate::CandidateId;
use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reference to an uploaded file (the bytes live elsewhere).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// One answer, tagged by the kind of question it answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ResponseValue {
    /// single-choice, short-text, long-text
    Text(String),
    /// numeric
    Number(f64),
    /// multi-choice
    Choices(Vec<String>),
    /// file-upload
    File(FileRef),
}

impl ResponseValue {
    pub fn is_blank(&self) -> bool {
        match self {
            ResponseValue::Text(text) => text.trim().is_empty(),
            ResponseValue::Number(n) => n.is_nan(),
            ResponseValue::Choices(choices) => choices.is_empty(),
            ResponseValue::File(file) => file.name.trim().is_empty(),
        }
    }
}

/// Answers keyed by question id
pub type Responses = BTreeMap<String, ResponseValue>;

/// Submitted answers (immutable once stored)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResponse {
    pub id: String,
    pub assessment_id: AssessmentId,
    pub candidate_id: CandidateId,
    pub responses: Responses,
    pub submitted_at: i64,
}

/// Validate a full submission against the assessment it answers.
///
/// Every answer must belong to a known question and fit its type and constraints.
/// Required questions must be answered only while they are visible.
pub fn validate_responses(assessment: &Assessment, responses: &Responses) -> Result<()> {
    for (question_id, value) in responses {
        let question = assessment.find_question(question_id).ok_or_else(|| {
            DomainError::InvalidResponse {
                question_id: question_id.clone(),
                reason: "no such question".to_string(),
            }
        })?;
        check_answer(question, value)?;
    }

    for question in assessment.questions() {
        if !question.required || !is_visible(question, responses) {
            continue;
        }
        let answered = responses
            .get(&question.id)
            .map(|value| !value.is_blank())
            .unwrap_or(false);
        if !answered {
            return Err(invalid(question, "required".to_string()));
        }
    }
    Ok(())
}

/// Type and constraint check for a single answer.
pub fn check_answer(question: &Question, value: &ResponseValue) -> Result<()> {
    let validation = question.validation.clone().unwrap_or_default();

    match (question.kind, value) {
        (QuestionType::SingleChoice, ResponseValue::Text(choice)) => {
            if !choice.is_empty() && !question.options.contains(choice) {
                return Err(invalid(question, format!("'{}' is not an option", choice)));
            }
        }
        (QuestionType::MultiChoice, ResponseValue::Choices(choices)) => {
            if let Some(bad) = choices.iter().find(|c| !question.options.contains(*c)) {
                return Err(invalid(question, format!("'{}' is not an option", bad)));
            }
        }
        (QuestionType::ShortText | QuestionType::LongText, ResponseValue::Text(text)) => {
            if let Some(max_length) = validation.max_length {
                if text.chars().count() > max_length {
                    return Err(invalid(
                        question,
                        format!("longer than {} characters", max_length),
                    ));
                }
            }
        }
        (QuestionType::Numeric, ResponseValue::Number(n)) => {
            if !n.is_finite() {
                return Err(invalid(question, "not a finite number".to_string()));
            }
            if let Some(min) = validation.min {
                if *n < min {
                    return Err(invalid(question, format!("{} is below {}", n, min)));
                }
            }
            if let Some(max) = validation.max {
                if *n > max {
                    return Err(invalid(question, format!("{} is above {}", n, max)));
                }
            }
        }
        (QuestionType::FileUpload, ResponseValue::File(_)) => {}
        (kind, _) => {
            return Err(invalid(
                question,
                format!("answer kind does not fit a {:?} question", kind),
            ))
        }
    }
    Ok(())
}

fn invalid(question: &Question, reason: String) -> DomainError {
    DomainError::InvalidResponse {
        question_id: question.id.clone(),
        reason,
    }
}
