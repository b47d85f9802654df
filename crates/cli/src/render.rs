// Terminal rendering for façade results

use colored::Colorize;
use tabled::{Table, Tabled};
use talentflow_core::application::{Page, Upserted};
use talentflow_core::domain::{
    Assessment, AssessmentResponse, Candidate, Job, JobStatus, Stage, TimelineEvent,
};

#[derive(Tabled)]
struct JobRow {
    order: i64,
    id: String,
    title: String,
    slug: String,
    status: String,
    tags: String,
}

impl From<&Job> for JobRow {
    fn from(job: &Job) -> Self {
        Self {
            order: job.order,
            id: job.id.clone(),
            title: job.title.clone(),
            slug: job.slug.clone(),
            status: match job.status {
                JobStatus::Active => "active".green().to_string(),
                JobStatus::Archived => "archived".dimmed().to_string(),
            },
            tags: job.tags.join(", "),
        }
    }
}

#[derive(Tabled)]
struct CandidateRow {
    id: String,
    name: String,
    email: String,
    stage: String,
    job: String,
    applied: String,
}

impl From<&Candidate> for CandidateRow {
    fn from(candidate: &Candidate) -> Self {
        Self {
            id: candidate.id.clone(),
            name: candidate.name.clone(),
            email: candidate.email.clone(),
            stage: stage_label(candidate.stage),
            job: candidate.job_id.clone(),
            applied: date(candidate.applied_at),
        }
    }
}

#[derive(Tabled)]
struct EventRow {
    when: String,
    from: String,
    to: String,
    note: String,
}

#[derive(Tabled)]
struct ResponseRow {
    id: String,
    candidate: String,
    submitted: String,
    answers: usize,
}

pub fn date(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| millis.to_string())
}

fn stage_label(stage: Stage) -> String {
    match stage {
        Stage::Hired => stage.label().green().to_string(),
        Stage::Rejected => stage.label().red().to_string(),
        Stage::Offer => stage.label().yellow().to_string(),
        _ => stage.label().to_string(),
    }
}

fn page_footer<T>(page: &Page<T>) {
    println!(
        "{}",
        format!(
            "Page {}/{} ({} total, {} per page)",
            page.page,
            page.total_pages.max(1),
            page.total,
            page.page_size
        )
        .dimmed()
    );
}

pub fn jobs(page: &Page<Job>) {
    if page.data.is_empty() {
        println!("{}", "No jobs match".yellow());
    } else {
        let rows: Vec<JobRow> = page.data.iter().map(JobRow::from).collect();
        println!("{}", Table::new(rows));
    }
    page_footer(page);
}

pub fn candidates(page: &Page<Candidate>) {
    if page.data.is_empty() {
        println!("{}", "No candidates match".yellow());
    } else {
        let rows: Vec<CandidateRow> = page.data.iter().map(CandidateRow::from).collect();
        println!("{}", Table::new(rows));
    }
    page_footer(page);
}

pub fn job(headline: &str, job: &Job) {
    println!("{}", format!("✓ {}", headline).green().bold());
    println!();
    println!("{}", Table::new(vec![JobRow::from(job)]));
}

pub fn candidate(headline: &str, candidate: &Candidate) {
    println!("{}", format!("✓ {}", headline).green().bold());
    println!();
    println!("{}", Table::new(vec![CandidateRow::from(candidate)]));
}

pub fn timeline(candidate_id: &str, events: &[TimelineEvent]) {
    if events.is_empty() {
        println!("{}", format!("No timeline for {}", candidate_id).yellow());
        return;
    }
    println!("{}", format!("Timeline for {}:", candidate_id).cyan().bold());
    let rows: Vec<EventRow> = events
        .iter()
        .map(|e| EventRow {
            when: date(e.timestamp),
            from: e
                .from_stage
                .map(|s| s.label().to_string())
                .unwrap_or_else(|| "-".to_string()),
            to: stage_label(e.to_stage),
            note: e.note.clone().unwrap_or_default(),
        })
        .collect();
    println!("{}", Table::new(rows));
}

pub fn assessment(job_id: &str, assessment: Option<&Assessment>) {
    let Some(assessment) = assessment else {
        println!("{}", format!("No assessment for {}", job_id).yellow());
        return;
    };
    println!(
        "{} {} ({})",
        "Assessment:".cyan().bold(),
        assessment.title,
        assessment.id
    );
    for section in &assessment.sections {
        println!();
        println!("  {}", section.title.bold());
        for question in &section.questions {
            let marker = if question.required { "*" } else { " " };
            let condition = question
                .conditional_on
                .as_ref()
                .map(|c| format!(" [when {}]", c.question_id).dimmed().to_string())
                .unwrap_or_default();
            println!(
                "  {} {} {}{}",
                marker.red(),
                question.id.dimmed(),
                question.prompt,
                condition
            );
        }
    }
}

pub fn upserted(upserted: &Upserted) {
    let verb = if upserted.created { "created" } else { "updated" };
    println!(
        "{}",
        format!("✓ Assessment {} {}", upserted.assessment.id, verb)
            .green()
            .bold()
    );
}

pub fn responses(job_id: &str, responses: &[AssessmentResponse]) {
    if responses.is_empty() {
        println!("{}", format!("No responses for {}", job_id).yellow());
        return;
    }
    let rows: Vec<ResponseRow> = responses
        .iter()
        .map(|r| ResponseRow {
            id: r.id.clone(),
            candidate: r.candidate_id.clone(),
            submitted: date(r.submitted_at),
            answers: r.responses.len(),
        })
        .collect();
    println!("{}", Table::new(rows));
}
