// Job Domain Model

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Job ID (opaque)
pub type JobId = String;

const MAX_TITLE_LEN: usize = 100;

/// Job posting status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Active,
    Archived,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Active => "active",
            JobStatus::Archived => "archived",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(JobStatus::Active),
            "archived" => Ok(JobStatus::Archived),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

/// Job Entity
///
/// `order` is the job's slot in the dense `0..N-1` order space shared by all jobs.
/// It is assigned on creation and only ever changed by the reorder engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub title: String,
    pub slug: String,
    pub status: JobStatus,
    #[serde(default)]
    pub tags: Vec<String>,
    pub order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    pub created_at: i64, // epoch ms
}

/// Fields accepted when creating a job (id, order and createdAt are assigned).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewJob {
    pub title: String,
    /// Derived from the title when absent.
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(rename = "type", default)]
    pub job_type: Option<String>,
}

impl NewJob {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

impl Job {
    /// Build a validated job from a creation request.
    ///
    /// # Arguments
    ///
    /// * `id` - Unique job ID (injected, not generated)
    /// * `order` - Next free slot in the order space (count of existing jobs)
    /// * `created_at` - Creation timestamp in epoch ms (injected, not system time)
    /// * `req` - Creation request
    pub fn create(id: impl Into<String>, order: i64, created_at: i64, req: NewJob) -> Result<Self> {
        validate_title(&req.title)?;
        let slug = match req.slug {
            Some(slug) => slug,
            None => slugify(&req.title),
        };
        validate_slug(&slug)?;

        Ok(Self {
            id: id.into(),
            title: req.title.trim().to_string(),
            slug,
            status: req.status.unwrap_or(JobStatus::Active),
            tags: normalize_tags(req.tags),
            order,
            description: req.description,
            location: req.location,
            job_type: req.job_type,
            created_at,
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == JobStatus::Active
    }
}

/// Partial job update. Absent fields are left untouched.
///
/// `order` is deliberately not patchable: moving a job goes through the reorder engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
}

impl JobPatch {
    pub fn status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Validate and normalize in place (trimmed title, de-duplicated tags).
    pub fn normalize(&mut self) -> Result<()> {
        if let Some(title) = &self.title {
            validate_title(title)?;
            self.title = Some(title.trim().to_string());
        }
        if let Some(slug) = &self.slug {
            validate_slug(slug)?;
        }
        if let Some(tags) = self.tags.take() {
            self.tags = Some(normalize_tags(tags));
        }
        Ok(())
    }
}

fn validate_title(title: &str) -> Result<()> {
    let title = title.trim();
    if title.is_empty() {
        return Err(DomainError::MissingField("title"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(DomainError::InvalidField {
            field: "title",
            reason: format!("longer than {} characters", MAX_TITLE_LEN),
        });
    }
    Ok(())
}

/// Check the url-safe slug format: non-empty, `[a-z0-9-]` only.
pub fn validate_slug(slug: &str) -> Result<()> {
    let valid = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(DomainError::InvalidSlug(slug.to_string()))
    }
}

/// Suggest a slug for a title: lowercase, drop punctuation, whitespace runs become one hyphen.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let kept: String = lowered
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-')
        .collect();

    let mut slug = String::with_capacity(kept.len());
    for c in kept.trim().chars() {
        let c = if c.is_whitespace() { '-' } else { c };
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }
    slug
}

// Order-preserving de-duplication; blank tags are dropped.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}
