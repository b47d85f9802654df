//! TalentFlow CLI - Command-line access to the TalentFlow data layer
//!
//! Every data command goes through the access façade, so simulated latency and
//! injected failures apply exactly as they would for any other caller.

mod logging;
mod render;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use talentflow_core::application::{
    seed_database, ApiRequest, AssessmentDraft, CandidateQuery, JobQuery, JobSort, ReorderBody,
    SeedConfig, Submission, TalentApi,
};
use talentflow_core::domain::{CandidatePatch, JobPatch, JobStatus, NewCandidate, NewJob, Stage};
use talentflow_core::port::{
    EntityStore, FaultConfig, FaultPolicy, NoFaults, RandomFaultPolicy, SystemTimeProvider,
    TimeProvider, UuidProvider, Verb,
};
use talentflow_infra_sqlite::SqliteEntityStore;
use tracing::info;

const DEFAULT_DB_PATH: &str = "~/.talentflow/talentflow.db";
const DEFAULT_SEED: u64 = 42;

#[derive(Parser)]
#[command(name = "talentflow")]
#[command(about = "TalentFlow applicant-tracking data layer", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// SQLite database path (`:memory:` for a throwaway session)
    #[arg(long, global = true, env = "TALENTFLOW_DB_PATH", default_value = DEFAULT_DB_PATH)]
    db: String,

    /// Disable simulated latency and failures
    #[arg(long, global = true)]
    no_faults: bool,

    /// RNG seed for seeding and fault injection
    #[arg(long, global = true, env = "TALENTFLOW_SEED")]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Populate an empty database with sample jobs, candidates and assessments
    Seed,

    /// Job postings
    #[command(subcommand)]
    Jobs(JobsCommand),

    /// Candidates and their pipeline
    #[command(subcommand)]
    Candidates(CandidatesCommand),

    /// Per-job assessment forms
    #[command(subcommand)]
    Assessments(AssessmentsCommand),

    /// Send a raw request and print the JSON response
    Request {
        /// GET, POST, PUT or PATCH
        verb: Verb,

        /// Resource path, e.g. /jobs/job-1/reorder
        path: String,

        /// Query string, e.g. "search=rust&page=2"
        #[arg(short, long, default_value = "")]
        query: String,

        /// JSON body
        #[arg(short, long)]
        body: Option<String>,
    },
}

#[derive(Args)]
struct PageArgs {
    #[arg(long, default_value = "1")]
    page: usize,

    #[arg(long)]
    page_size: Option<usize>,
}

#[derive(Subcommand)]
enum JobsCommand {
    /// List jobs
    List {
        #[arg(short, long)]
        search: Option<String>,

        #[arg(long)]
        status: Option<JobStatus>,

        /// order or title
        #[arg(long, default_value = "order")]
        sort: JobSort,

        #[command(flatten)]
        paging: PageArgs,
    },

    /// Create a job at the end of the order
    Create {
        #[arg(short, long)]
        title: String,

        /// Derived from the title when omitted
        #[arg(long)]
        slug: Option<String>,

        #[arg(long = "tag")]
        tags: Vec<String>,

        #[arg(long)]
        archived: bool,
    },

    /// Edit job fields
    Update {
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(long)]
        slug: Option<String>,

        #[arg(long)]
        status: Option<JobStatus>,

        /// Replaces all tags
        #[arg(long = "tag")]
        tags: Option<Vec<String>>,
    },

    /// Move a job to another position
    Reorder {
        id: String,

        #[arg(long)]
        to: i64,

        /// Expected current position
        #[arg(long)]
        from: Option<i64>,
    },
}

#[derive(Subcommand)]
enum CandidatesCommand {
    /// List candidates, newest first
    List {
        #[arg(short, long)]
        search: Option<String>,

        #[arg(long)]
        stage: Option<Stage>,

        #[arg(long)]
        job: Option<String>,

        #[command(flatten)]
        paging: PageArgs,
    },

    /// Add a candidate
    Create {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        job: String,

        #[arg(long)]
        stage: Option<Stage>,
    },

    /// Move a candidate to another stage
    Move {
        id: String,

        stage: Stage,

        /// Annotates the timeline event
        #[arg(long)]
        note: Option<String>,
    },

    /// Show a candidate's stage history
    Timeline { id: String },
}

#[derive(Subcommand)]
enum AssessmentsCommand {
    /// Show the assessment for a job
    Show { job_id: String },

    /// Create or replace the assessment for a job from a JSON file
    Put {
        job_id: String,

        #[arg(short, long)]
        file: String,
    },

    /// Submit answers from a JSON file
    Submit {
        job_id: String,

        #[arg(short, long)]
        file: String,
    },

    /// List submitted responses for a job
    Responses { job_id: String },
}

/// Map the `--db` flag onto a sqlx connection URL.
fn database_url(db: &str) -> String {
    if db.starts_with("sqlite:") {
        db.to_string()
    } else if db == ":memory:" {
        "sqlite::memory:".to_string()
    } else {
        format!("sqlite://{}", shellexpand::tilde(db))
    }
}

fn ensure_parent_dir(db: &str) -> Result<()> {
    if db.starts_with("sqlite:") || db == ":memory:" {
        return Ok(());
    }
    let expanded = shellexpand::tilde(db).into_owned();
    if let Some(parent) = Path::new(&expanded).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    Ok(())
}

fn fault_policy(no_faults: bool, seed: Option<u64>) -> Result<Arc<dyn FaultPolicy>> {
    if no_faults {
        return Ok(Arc::new(NoFaults));
    }
    let config = FaultConfig::from_env().context("Invalid fault configuration")?;
    let policy = match seed {
        Some(seed) => RandomFaultPolicy::seeded(config, seed)?,
        None => RandomFaultPolicy::new(config)?,
    };
    Ok(Arc::new(policy))
}

fn read_json<T: DeserializeOwned>(file: &str) -> Result<T> {
    let path = shellexpand::tilde(file).into_owned();
    let raw = std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path))
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging(logging::LogFormat::from_env())?;
    let cli = Cli::parse();

    ensure_parent_dir(&cli.db)?;
    let url = database_url(&cli.db);
    info!(database = %url, "Opening database");
    let store: Arc<dyn EntityStore> = Arc::new(
        SqliteEntityStore::open(&url)
            .await
            .context("Failed to open database")?,
    );
    let api = TalentApi::new(
        store,
        Arc::new(UuidProvider),
        Arc::new(SystemTimeProvider),
        fault_policy(cli.no_faults, cli.seed)?,
    );

    let outcome = run(&api, cli.command, cli.seed.unwrap_or(DEFAULT_SEED)).await;
    if let Err(e) = &outcome {
        if let Some(app) = e.downcast_ref::<talentflow_core::AppError>() {
            if app.is_retryable() {
                eprintln!("{}", "Request failed transiently; it is safe to retry".yellow());
            }
        }
    }
    outcome
}

async fn run(api: &TalentApi, command: Commands, seed: u64) -> Result<()> {
    match command {
        // Seeding writes straight to the store, outside fault injection.
        Commands::Seed => {
            let config = SeedConfig::new(seed, SystemTimeProvider.now_millis());
            let report = seed_database(api.store().as_ref(), &config).await?;
            if report.skipped {
                println!("{}", "Database already holds jobs; nothing seeded".yellow());
            } else {
                println!("{}", "✓ Database seeded".green().bold());
                println!("  {} {}", "Jobs:".bold(), report.jobs);
                println!("  {} {}", "Candidates:".bold(), report.candidates);
                println!("  {} {}", "Timeline events:".bold(), report.timeline_events);
                println!("  {} {}", "Assessments:".bold(), report.assessments);
            }
        }

        Commands::Jobs(JobsCommand::List {
            search,
            status,
            sort,
            paging,
        }) => {
            let mut query = JobQuery {
                search,
                status,
                sort,
                page: paging.page,
                ..Default::default()
            };
            if let Some(size) = paging.page_size {
                query.page_size = size;
            }
            render::jobs(&api.list_jobs(&query).await?);
        }

        Commands::Jobs(JobsCommand::Create {
            title,
            slug,
            tags,
            archived,
        }) => {
            let req = NewJob {
                title,
                slug,
                tags,
                status: archived.then_some(JobStatus::Archived),
                ..Default::default()
            };
            let job = api.create_job(req).await?;
            render::job(&format!("Job {} created", job.id), &job);
        }

        Commands::Jobs(JobsCommand::Update {
            id,
            title,
            slug,
            status,
            tags,
        }) => {
            let patch = JobPatch {
                title,
                slug,
                status,
                tags,
                ..Default::default()
            };
            let job = api.update_job(&id, patch).await?;
            render::job(&format!("Job {} updated", job.id), &job);
        }

        Commands::Jobs(JobsCommand::Reorder { id, to, from }) => {
            let body = ReorderBody {
                from_order: from,
                to_order: to,
            };
            api.reorder_job(&id, body).await?;
            println!("{}", format!("✓ Job {} moved to {}", id, to).green().bold());
        }

        Commands::Candidates(CandidatesCommand::List {
            search,
            stage,
            job,
            paging,
        }) => {
            let mut query = CandidateQuery {
                search,
                stage,
                job_id: job,
                page: paging.page,
                ..Default::default()
            };
            if let Some(size) = paging.page_size {
                query.page_size = size;
            }
            render::candidates(&api.list_candidates(&query).await?);
        }

        Commands::Candidates(CandidatesCommand::Create {
            name,
            email,
            job,
            stage,
        }) => {
            let req = NewCandidate {
                name,
                email,
                job_id: job,
                stage,
                ..Default::default()
            };
            let candidate = api.create_candidate(req).await?;
            render::candidate(&format!("Candidate {} created", candidate.id), &candidate);
        }

        Commands::Candidates(CandidatesCommand::Move { id, stage, note }) => {
            let mut patch = CandidatePatch::stage(stage);
            patch.note = note;
            let candidate = api.update_candidate(&id, patch).await?;
            render::candidate(
                &format!("Candidate {} is now {}", candidate.id, candidate.stage.label()),
                &candidate,
            );
        }

        Commands::Candidates(CandidatesCommand::Timeline { id }) => {
            render::timeline(&id, &api.candidate_timeline(&id).await?);
        }

        Commands::Assessments(AssessmentsCommand::Show { job_id }) => {
            let assessment = api.get_assessment(&job_id).await?;
            render::assessment(&job_id, assessment.as_ref());
        }

        Commands::Assessments(AssessmentsCommand::Put { job_id, file }) => {
            let draft: AssessmentDraft = read_json(&file)?;
            render::upserted(&api.put_assessment(&job_id, draft).await?);
        }

        Commands::Assessments(AssessmentsCommand::Submit { job_id, file }) => {
            let submission: Submission = read_json(&file)?;
            let response = api.submit_assessment(&job_id, submission).await?;
            println!(
                "{}",
                format!("✓ Response {} recorded", response.id).green().bold()
            );
        }

        Commands::Assessments(AssessmentsCommand::Responses { job_id }) => {
            render::responses(&job_id, &api.assessment_responses(&job_id).await?);
        }

        Commands::Request {
            verb,
            path,
            query,
            body,
        } => {
            let body = body
                .map(|raw| serde_json::from_str(&raw))
                .transpose()
                .context("Invalid JSON body")?;
            let request = ApiRequest::route(verb, &path, &query, body)?;
            let response = api.handle(request).await;
            let status = if response.is_success() {
                response.status.to_string().green()
            } else {
                response.status.to_string().red()
            };
            eprintln!("{} {}", "Status:".bold(), status);
            println!("{}", serde_json::to_string_pretty(&response.body)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_url_forms() {
        assert_eq!(database_url(":memory:"), "sqlite::memory:");
        assert_eq!(database_url("sqlite://tmp/x.db"), "sqlite://tmp/x.db");
        assert_eq!(database_url("/var/tf.db"), "sqlite:///var/tf.db");
        assert!(!database_url("~/tf.db").contains('~'));
    }

    #[test]
    fn test_cli_parses_nested_commands() {
        let cli = Cli::try_parse_from([
            "talentflow",
            "--no-faults",
            "jobs",
            "reorder",
            "job-3",
            "--to",
            "0",
        ])
        .unwrap();
        assert!(cli.no_faults);
        assert!(matches!(
            cli.command,
            Commands::Jobs(JobsCommand::Reorder { to: 0, from: None, .. })
        ));

        let cli =
            Cli::try_parse_from(["talentflow", "candidates", "move", "candidate-1", "tech"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Candidates(CandidatesCommand::Move {
                stage: Stage::Tech,
                ..
            })
        ));
    }

    #[test]
    fn test_cli_rejects_unknown_stage() {
        assert!(Cli::try_parse_from(["talentflow", "candidates", "move", "c1", "limbo"]).is_err());
    }

    #[tokio::test]
    async fn test_commands_run_against_memory_store() {
        let store: Arc<dyn EntityStore> =
            Arc::new(SqliteEntityStore::open("sqlite::memory:").await.unwrap());
        let api = TalentApi::new(
            store,
            Arc::new(UuidProvider),
            Arc::new(SystemTimeProvider),
            Arc::new(NoFaults),
        );

        let create = Cli::try_parse_from(["talentflow", "jobs", "create", "--title", "Rust Dev"])
            .unwrap();
        tokio_test::assert_ok!(run(&api, create.command, DEFAULT_SEED).await);
        let page = api.list_jobs(&JobQuery::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].slug, "rust-dev");

        let missing = Cli::try_parse_from(["talentflow", "jobs", "reorder", "job-x", "--to", "0"])
            .unwrap();
        tokio_test::assert_err!(run(&api, missing.command, DEFAULT_SEED).await);
    }
}
