// Query Engine: filter, stable sort, paginate
//
// Engines receive collection snapshots in insertion order. All sorts are stable,
// so ties keep insertion order.

use crate::domain::{Candidate, Job, JobStatus, Stage};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const DEFAULT_JOB_PAGE_SIZE: usize = 10;
pub const DEFAULT_CANDIDATE_PAGE_SIZE: usize = 50;

/// One page of a filtered, sorted collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

/// Slice `items` into 1-based page `page`. A page past the end is empty, not an error.
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Result<Page<T>> {
    if page == 0 {
        return Err(AppError::Validation("page must be at least 1".to_string()));
    }
    if page_size == 0 {
        return Err(AppError::Validation("pageSize must be at least 1".to_string()));
    }

    let total = items.len();
    let start = (page - 1).saturating_mul(page_size);
    let data = items.into_iter().skip(start).take(page_size).collect();

    Ok(Page {
        data,
        total,
        page,
        page_size,
        total_pages: total.div_ceil(page_size),
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobSort {
    #[default]
    Order,
    Title,
}

impl FromStr for JobSort {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "order" => Ok(JobSort::Order),
            "title" => Ok(JobSort::Title),
            other => Err(AppError::Validation(format!("unknown sort key {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobQuery {
    /// Case-insensitive substring over title and tags
    pub search: Option<String>,
    pub status: Option<JobStatus>,
    pub sort: JobSort,
    pub page: usize,
    pub page_size: usize,
}

impl Default for JobQuery {
    fn default() -> Self {
        Self {
            search: None,
            status: None,
            sort: JobSort::Order,
            page: 1,
            page_size: DEFAULT_JOB_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateQuery {
    /// Case-insensitive substring over name and email
    pub search: Option<String>,
    pub stage: Option<Stage>,
    pub job_id: Option<String>,
    pub page: usize,
    pub page_size: usize,
}

impl Default for CandidateQuery {
    fn default() -> Self {
        Self {
            search: None,
            stage: None,
            job_id: None,
            page: 1,
            page_size: DEFAULT_CANDIDATE_PAGE_SIZE,
        }
    }
}

// Lowercased needle, or None when the search matches everything.
fn needle(search: &Option<String>) -> Option<String> {
    search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

pub fn query_jobs(mut jobs: Vec<Job>, query: &JobQuery) -> Result<Page<Job>> {
    if let Some(needle) = needle(&query.search) {
        jobs.retain(|job| {
            contains(&job.title, &needle) || job.tags.iter().any(|tag| contains(tag, &needle))
        });
    }
    if let Some(status) = query.status {
        jobs.retain(|job| job.status == status);
    }

    match query.sort {
        JobSort::Order => jobs.sort_by_key(|job| job.order),
        JobSort::Title => jobs.sort_by_cached_key(|job| job.title.to_lowercase()),
    }

    paginate(jobs, query.page, query.page_size)
}

/// Newest applications first.
pub fn query_candidates(
    mut candidates: Vec<Candidate>,
    query: &CandidateQuery,
) -> Result<Page<Candidate>> {
    if let Some(needle) = needle(&query.search) {
        candidates.retain(|c| contains(&c.name, &needle) || contains(&c.email, &needle));
    }
    if let Some(stage) = query.stage {
        candidates.retain(|c| c.stage == stage);
    }
    if let Some(job_id) = &query.job_id {
        candidates.retain(|c| &c.job_id == job_id);
    }

    candidates.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));

    paginate(candidates, query.page, query.page_size)
}
