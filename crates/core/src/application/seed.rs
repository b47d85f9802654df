// Demo data generator
//
// Fills an empty store with jobs, candidates (with consistent timelines) and
// assessments in one write batch. Output depends only on the RNG seed and the
// reference instant, and every generated instant is strictly before it.

use crate::domain::{
    slugify, Assessment, Candidate, ConditionValue, Job, JobStatus, Question, QuestionType,
    Section, Stage, TimelineEvent, Validation,
};
use crate::error::Result;
use crate::port::{table, EntityStore, WriteBatch};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::info;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;
const YEAR_MS: i64 = 365 * DAY_MS;
const STEP_MS: i64 = 3 * DAY_MS;

const JOB_TITLES: [&str; 25] = [
    "Senior Frontend Engineer",
    "Backend Developer",
    "Full Stack Engineer",
    "DevOps Engineer",
    "Product Manager",
    "UX Designer",
    "Data Scientist",
    "Mobile Developer",
    "QA Engineer",
    "Engineering Manager",
    "Technical Writer",
    "Sales Engineer",
    "Customer Success Manager",
    "Marketing Manager",
    "HR Business Partner",
    "Financial Analyst",
    "Operations Manager",
    "Security Engineer",
    "Machine Learning Engineer",
    "Solutions Architect",
    "Business Analyst",
    "Scrum Master",
    "Technical Recruiter",
    "Product Designer",
    "Content Strategist",
];

const TAGS: [&str; 10] = [
    "Remote",
    "Hybrid",
    "On-site",
    "Full-time",
    "Contract",
    "Senior",
    "Mid-level",
    "Junior",
    "Urgent",
    "Featured",
];

const JOB_TYPES: [&str; 3] = ["Full-time", "Contract", "Part-time"];

const CITIES: [&str; 8] = [
    "Lisbon", "Berlin", "Toronto", "Austin", "Bangalore", "Nairobi", "Melbourne", "Warsaw",
];

const FIRST_NAMES: [&str; 16] = [
    "Ada", "Grace", "Alan", "Barbara", "Edsger", "Frances", "Donald", "Margaret", "Ken",
    "Radia", "Dennis", "Hedy", "John", "Katherine", "Linus", "Sophie",
];

const LAST_NAMES: [&str; 16] = [
    "Lovelace", "Hopper", "Turing", "Liskov", "Dijkstra", "Allen", "Knuth", "Hamilton",
    "Thompson", "Perlman", "Ritchie", "Lamarr", "Backus", "Johnson", "Torvalds", "Wilson",
];

const NOTES: [&str; 5] = [
    "Referred by a current employee.",
    "Strong portfolio, follow up on availability.",
    "Prefers remote work.",
    "Requested a later start date.",
    "Great communication during the intro call.",
];

const OPTIONS: [&str; 8] = [
    "Strongly Agree",
    "Agree",
    "Neutral",
    "Disagree",
    "Strongly Disagree",
    "Yes",
    "No",
    "Maybe",
];

const PROMPTS: [&str; 8] = [
    "How many years of professional experience do you have?",
    "Are you comfortable working across time zones?",
    "Describe a project you are proud of?",
    "Which tools do you use daily?",
    "Would you relocate for this role?",
    "What is your notice period?",
    "How do you approach code review?",
    "Upload a work sample?",
];

const QUESTION_TYPES: [QuestionType; 6] = [
    QuestionType::SingleChoice,
    QuestionType::MultiChoice,
    QuestionType::ShortText,
    QuestionType::LongText,
    QuestionType::Numeric,
    QuestionType::FileUpload,
];

/// Seeding parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SeedConfig {
    pub seed: u64,
    /// Reference instant (epoch ms); generated dates fall in the year before it
    pub now: i64,
    pub jobs: usize,
    pub candidates: usize,
    pub assessments: usize,
}

impl SeedConfig {
    pub fn new(seed: u64, now: i64) -> Self {
        Self {
            seed,
            now,
            jobs: 25,
            candidates: 1000,
            assessments: 5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// True when the store already held jobs and nothing was written
    pub skipped: bool,
    pub jobs: usize,
    pub candidates: usize,
    pub timeline_events: usize,
    pub assessments: usize,
}

/// Populate an empty store. Skips when any job exists.
///
/// Everything lands in a single commit, so a failure leaves the store empty and
/// a retry seeds from scratch.
pub async fn seed_database(store: &dyn EntityStore, config: &SeedConfig) -> Result<SeedReport> {
    let jobs_table = table::<Job>(store);
    if jobs_table.count().await? > 0 {
        info!("Database already seeded");
        return Ok(SeedReport {
            skipped: true,
            ..Default::default()
        });
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let jobs = generate_jobs(&mut rng, config);
    let (candidates, events) = generate_candidates(&mut rng, config, &jobs);
    let assessments = generate_assessments(&mut rng, config, &jobs);

    let mut batch = WriteBatch::new();
    for job in &jobs {
        batch.add(job)?;
    }
    for candidate in &candidates {
        batch.add(candidate)?;
    }
    for event in &events {
        batch.add(event)?;
    }
    for assessment in &assessments {
        batch.add(assessment)?;
    }
    store.commit(batch).await?;

    let report = SeedReport {
        skipped: false,
        jobs: jobs.len(),
        candidates: candidates.len(),
        timeline_events: events.len(),
        assessments: assessments.len(),
    };
    info!(
        jobs = report.jobs,
        candidates = report.candidates,
        timeline_events = report.timeline_events,
        assessments = report.assessments,
        "Database seeded"
    );
    Ok(report)
}

// An instant in the year before `now`, at least `headroom` ms before it.
fn past_instant(rng: &mut StdRng, now: i64, headroom: i64) -> i64 {
    now - rng.gen_range(headroom + 1..=YEAR_MS)
}

fn pick<'a>(rng: &mut StdRng, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

fn pick_many(rng: &mut StdRng, items: &[&str], min: usize, max: usize) -> Vec<String> {
    let n = rng.gen_range(min..=max);
    items
        .choose_multiple(rng, n)
        .map(|s| s.to_string())
        .collect()
}

fn generate_jobs(rng: &mut StdRng, config: &SeedConfig) -> Vec<Job> {
    (0..config.jobs)
        .map(|i| {
            let title = JOB_TITLES[i % JOB_TITLES.len()];
            Job {
                id: format!("job-{}", i + 1),
                title: title.to_string(),
                slug: format!("{}-{}", slugify(title), i),
                status: if rng.gen_bool(0.7) {
                    JobStatus::Active
                } else {
                    JobStatus::Archived
                },
                tags: pick_many(rng, &TAGS, 2, 4),
                order: i as i64,
                description: Some(format!(
                    "We are hiring a {} to join a small, product-focused team.",
                    title
                )),
                location: Some(pick(rng, &CITIES).to_string()),
                job_type: Some(pick(rng, &JOB_TYPES).to_string()),
                created_at: past_instant(rng, config.now, 0),
            }
        })
        .collect()
}

// Stage path from creation to `stage`. Rejection happens from a random earlier stage.
fn stage_path(rng: &mut StdRng, stage: Stage) -> Vec<Stage> {
    let last_step = if stage == Stage::Rejected {
        Stage::ALL[rng.gen_range(0..4)]
    } else {
        stage
    };

    let mut path = vec![Stage::Applied];
    while let Some(&current) = path.last() {
        if current == last_step || current.is_terminal() {
            break;
        }
        match current.next() {
            Some(next) => path.push(next),
            None => break,
        }
    }
    if stage == Stage::Rejected {
        path.push(Stage::Rejected);
    }
    path
}

fn generate_candidates(
    rng: &mut StdRng,
    config: &SeedConfig,
    jobs: &[Job],
) -> (Vec<Candidate>, Vec<TimelineEvent>) {
    let mut candidates = Vec::with_capacity(config.candidates);
    let mut events = Vec::new();

    for i in 0..config.candidates {
        let id = format!("candidate-{}", i + 1);
        let first = pick(rng, &FIRST_NAMES);
        let last = pick(rng, &LAST_NAMES);
        let stage = Stage::ALL[rng.gen_range(0..Stage::ALL.len())];
        let path = stage_path(rng, stage);
        // The last transition must still fall before `now`.
        let span = (path.len() as i64 - 1) * STEP_MS;
        let applied_at = past_instant(rng, config.now, span);
        let job_id = jobs
            .choose(rng)
            .map(|job| job.id.clone())
            .unwrap_or_default();

        events.push(TimelineEvent::creation(
            format!("timeline-{}-1", i + 1),
            &id,
            Stage::Applied,
            applied_at,
        ));
        for (j, pair) in path.windows(2).enumerate() {
            let step = j as i64 + 1;
            let note = rng
                .gen_bool(0.5)
                .then(|| pick(rng, &NOTES).to_string());
            events.push(TimelineEvent::transition(
                format!("timeline-{}-{}", i + 1, step + 1),
                &id,
                pair[0],
                pair[1],
                applied_at + step * STEP_MS,
                note,
            ));
        }

        candidates.push(Candidate {
            id,
            name: format!("{} {}", first, last),
            email: format!("{}.{}{}@example.com", first, last, i + 1).to_lowercase(),
            phone: Some(format!("+1-555-{:04}", rng.gen_range(0..10_000))),
            stage,
            job_id,
            applied_at,
            notes: rng.gen_bool(0.3).then(|| pick(rng, &NOTES).to_string()),
            resume_url: None,
        });
    }
    (candidates, events)
}

fn generate_question(rng: &mut StdRng, id: String, previous: Option<&Question>) -> Question {
    let kind = QUESTION_TYPES[rng.gen_range(0..QUESTION_TYPES.len())];
    let mut question = Question::new(id, kind, pick(rng, &PROMPTS));
    question.required = rng.gen_bool(0.5);

    match kind {
        QuestionType::SingleChoice | QuestionType::MultiChoice => {
            question.options = pick_many(rng, &OPTIONS, 4, 4);
        }
        QuestionType::Numeric => {
            question.validation = Some(Validation {
                min: Some(0.0),
                max: Some(100.0),
                max_length: None,
            });
        }
        QuestionType::ShortText | QuestionType::LongText => {
            question.validation = Some(Validation {
                max_length: Some(if kind == QuestionType::ShortText { 100 } else { 1000 }),
                ..Default::default()
            });
        }
        QuestionType::FileUpload => {}
    }

    if let Some(prev) = previous {
        if prev.kind == QuestionType::SingleChoice && rng.gen_bool(0.2) {
            if let Some(first) = prev.options.first() {
                question = question.shown_when(prev.id.clone(), ConditionValue::One(first.clone()));
            }
        }
    }
    question
}

fn generate_assessments(rng: &mut StdRng, config: &SeedConfig, jobs: &[Job]) -> Vec<Assessment> {
    let chosen: Vec<&Job> = jobs.choose_multiple(rng, config.assessments).collect();

    chosen
        .into_iter()
        .enumerate()
        .map(|(idx, job)| {
            let sections = (0..rng.gen_range(2..=4))
                .map(|i| {
                    let mut questions: Vec<Question> = Vec::new();
                    for j in 0..rng.gen_range(3..=5) {
                        let question =
                            generate_question(rng, format!("q-{}-{}-{}", idx, i, j), questions.last());
                        questions.push(question);
                    }
                    Section {
                        id: format!("section-{}-{}", idx, i),
                        title: format!("Part {}", i + 1),
                        description: Some(format!("Questions about the {} role.", job.title)),
                        questions,
                    }
                })
                .collect();

            let created_at = past_instant(rng, config.now, 0);
            Assessment {
                id: format!("assessment-{}", idx + 1),
                job_id: job.id.clone(),
                title: format!("{} Assessment", job.title),
                sections,
                created_at,
                updated_at: rng.gen_range(created_at..config.now),
            }
        })
        .collect()
}
