// Candidate Domain Model

use crate::domain::error::{DomainError, Result};
use crate::domain::job::JobId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Candidate ID (opaque)
pub type CandidateId = String;

/// Hiring pipeline stage
///
/// Declaration order is the pipeline order. `Rejected` is reachable from any stage,
/// and the transition engine accepts any jump between stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Applied,
    Screen,
    Tech,
    Offer,
    Hired,
    Rejected,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Applied,
        Stage::Screen,
        Stage::Tech,
        Stage::Offer,
        Stage::Hired,
        Stage::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Applied => "applied",
            Stage::Screen => "screen",
            Stage::Tech => "tech",
            Stage::Offer => "offer",
            Stage::Hired => "hired",
            Stage::Rejected => "rejected",
        }
    }

    /// Board column heading
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Applied => "Applied",
            Stage::Screen => "Screening",
            Stage::Tech => "Technical",
            Stage::Offer => "Offer",
            Stage::Hired => "Hired",
            Stage::Rejected => "Rejected",
        }
    }

    /// Next step along the happy path (`None` once hired or rejected).
    pub fn next(&self) -> Option<Stage> {
        match self {
            Stage::Applied => Some(Stage::Screen),
            Stage::Screen => Some(Stage::Tech),
            Stage::Tech => Some(Stage::Offer),
            Stage::Offer => Some(Stage::Hired),
            Stage::Hired | Stage::Rejected => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Hired | Stage::Rejected)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        Stage::ALL
            .iter()
            .copied()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| DomainError::UnknownStage(s.to_string()))
    }
}

/// Candidate Entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub stage: Stage,
    /// Weak reference: the job is not required to exist.
    pub job_id: JobId,
    pub applied_at: i64, // epoch ms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
}

/// Fields accepted when creating a candidate (id and appliedAt are assigned).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewCandidate {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub stage: Option<Stage>,
    pub job_id: JobId,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub resume_url: Option<String>,
}

impl Candidate {
    /// Build a validated candidate; the stage defaults to `applied`.
    pub fn create(id: impl Into<String>, applied_at: i64, req: NewCandidate) -> Result<Self> {
        validate_name(&req.name)?;
        validate_email(&req.email)?;
        if req.job_id.trim().is_empty() {
            return Err(DomainError::MissingField("jobId"));
        }

        Ok(Self {
            id: id.into(),
            name: req.name.trim().to_string(),
            email: req.email.trim().to_string(),
            phone: req.phone,
            stage: req.stage.unwrap_or(Stage::Applied),
            job_id: req.job_id,
            applied_at,
            notes: req.notes,
            resume_url: req.resume_url,
        })
    }
}

/// Partial candidate update.
///
/// `stage` flows through the stage transition engine; `note` annotates the
/// resulting timeline event and is never stored on the candidate itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CandidatePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
    #[serde(default, skip_serializing)]
    pub note: Option<String>,
}

impl CandidatePatch {
    pub fn stage(stage: Stage) -> Self {
        Self {
            stage: Some(stage),
            ..Default::default()
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn normalize(&mut self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
            self.name = Some(name.trim().to_string());
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
            self.email = Some(email.trim().to_string());
        }
        if let Some(job_id) = &self.job_id {
            if job_id.trim().is_empty() {
                return Err(DomainError::MissingField("jobId"));
            }
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(DomainError::MissingField("name"));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(DomainError::MissingField("email"));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(DomainError::InvalidField {
            field: "email",
            reason: format!("'{}' is not an email address", email),
        }),
    }
}
