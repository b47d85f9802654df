// End-to-End Test
// Seed -> browse -> reorder with an optimistic list -> move a candidate -> answer an assessment

use std::sync::Arc;
use talentflow_core::application::{
    move_job_in_page, seed_database, CandidateQuery, JobQuery, OptimisticView, ReorderBody,
    SeedConfig, Submission, TalentApi,
};
use talentflow_core::domain::{
    verify_chain, CandidatePatch, QuestionType, ResponseValue, Responses, Stage,
};
use talentflow_core::port::fault_policy::mocks::ScriptedFaults;
use talentflow_core::port::id_provider::mocks::SequentialIdProvider;
use talentflow_core::port::time_provider::mocks::ManualClock;
use talentflow_core::port::MemoryEntityStore;

const NOW: i64 = 1_720_000_000_000;

async fn seeded() -> (TalentApi, Arc<ScriptedFaults>) {
    let store = Arc::new(MemoryEntityStore::new());
    let report = seed_database(store.as_ref(), &SeedConfig::new(2024, NOW))
        .await
        .unwrap();
    assert_eq!(
        (report.jobs, report.candidates, report.assessments),
        (25, 1000, 5)
    );
    assert!(report.timeline_events >= report.candidates);

    let faults = Arc::new(ScriptedFaults::new());
    let api = TalentApi::new(
        store,
        Arc::new(SequentialIdProvider::new()),
        Arc::new(ManualClock::stepping(NOW, 1_000)),
        faults.clone(),
    );
    (api, faults)
}

#[tokio::test]
async fn test_seeded_board_walkthrough() {
    let (api, faults) = seeded().await;

    // Browse: 25 jobs paginate 10/10/5.
    let first = api.list_jobs(&JobQuery::default()).await.unwrap();
    assert_eq!((first.total, first.total_pages, first.data.len()), (25, 3, 10));

    // Drag the fourth job to the top; the optimistic page matches the server.
    let mut view = OptimisticView::new(first.data.clone());
    let dragged = first.data[3].clone();
    view.apply(
        |page| {
            move_job_in_page(page, &dragged.id, 0);
        },
        api.reorder_job(
            &dragged.id,
            ReorderBody {
                from_order: Some(3),
                to_order: 0,
            },
        ),
    )
    .await
    .unwrap();
    let server = api.list_jobs(&JobQuery::default()).await.unwrap();
    assert_eq!(view.get(), &server.data);

    // A failed drag snaps back.
    faults.fail_next();
    let before = view.get().clone();
    let dropped = view
        .apply(
            |page| {
                move_job_in_page(page, &before[9].id, 1);
            },
            api.reorder_job(
                &before[9].id,
                ReorderBody {
                    from_order: Some(9),
                    to_order: 1,
                },
            ),
        )
        .await;
    assert!(dropped.is_err());
    assert_eq!(view.get(), &before);
    assert_eq!(api.list_jobs(&JobQuery::default()).await.unwrap().data, before);

    // Kanban: advance one applied candidate to screen.
    let applied = api
        .list_candidates(&CandidateQuery {
            stage: Some(Stage::Applied),
            page_size: 5,
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(applied.total > 0);
    let candidate = applied.data[0].clone();
    let history_before = api.candidate_timeline(&candidate.id).await.unwrap();

    let moved = api
        .update_candidate(
            &candidate.id,
            CandidatePatch::stage(Stage::Screen).with_note("Strong portfolio"),
        )
        .await
        .unwrap();
    assert_eq!(moved.stage, Stage::Screen);

    let history = api.candidate_timeline(&candidate.id).await.unwrap();
    assert_eq!(history.len(), history_before.len() + 1);
    verify_chain(&history).unwrap();
    assert_eq!(history.last().unwrap().note.as_deref(), Some("Strong portfolio"));
}

/// Live stage changes on seeded histories extend the chain instead of interleaving with it
#[tokio::test]
async fn test_live_moves_extend_seeded_timelines() {
    let (api, _) = seeded().await;
    let newest = api
        .list_candidates(&CandidateQuery {
            page_size: 200,
            ..Default::default()
        })
        .await
        .unwrap()
        .data;

    let mut moved = 0;
    for candidate in newest {
        let history = api.candidate_timeline(&candidate.id).await.unwrap();
        if history.len() < 3 {
            continue;
        }
        let target = if candidate.stage == Stage::Rejected {
            Stage::Screen
        } else {
            Stage::Rejected
        };

        let updated = api
            .update_candidate(&candidate.id, CandidatePatch::stage(target))
            .await
            .unwrap();
        let events = api.candidate_timeline(&candidate.id).await.unwrap();
        assert_eq!(events.len(), history.len() + 1, "{}", candidate.id);
        verify_chain(&events).unwrap_or_else(|e| panic!("{}: {}", candidate.id, e));
        assert_eq!(events.last().unwrap().to_stage, updated.stage, "{}", candidate.id);
        assert_eq!(events.last().unwrap().timestamp, events.iter().map(|e| e.timestamp).max().unwrap());

        moved += 1;
        if moved == 30 {
            break;
        }
    }
    assert_eq!(moved, 30);
}

#[tokio::test]
async fn test_seeded_assessment_can_be_answered() {
    let (api, _) = seeded().await;
    let jobs = api
        .list_jobs(&JobQuery {
            page_size: 25,
            ..Default::default()
        })
        .await
        .unwrap()
        .data;

    let mut found = None;
    for job in &jobs {
        if let Some(assessment) = api.get_assessment(&job.id).await.unwrap() {
            found = Some((job.id.clone(), assessment));
            break;
        }
    }
    let (job_id, assessment) = found.expect("seeding creates assessments");
    assert!((2..=4).contains(&assessment.sections.len()));

    // Answer every question visible after choosing the first option everywhere.
    let mut responses = Responses::new();
    for _ in 0..3 {
        for question in assessment.visible_questions(&responses.clone()) {
            let answer = match question.kind {
                QuestionType::SingleChoice => ResponseValue::Text(question.options[0].clone()),
                QuestionType::MultiChoice => ResponseValue::Choices(vec![question.options[0].clone()]),
                QuestionType::ShortText | QuestionType::LongText => ResponseValue::Text("ok".into()),
                QuestionType::Numeric => {
                    let validation = question.validation.clone().unwrap_or_default();
                    ResponseValue::Number(validation.min.unwrap_or(1.0))
                }
                QuestionType::FileUpload => ResponseValue::File(talentflow_core::domain::FileRef {
                    name: "resume.pdf".into(),
                    size: None,
                    content_type: None,
                }),
            };
            responses.entry(question.id.clone()).or_insert(answer);
        }
    }

    let candidate = api
        .list_candidates(&CandidateQuery::default())
        .await
        .unwrap()
        .data[0]
        .clone();
    let stored = api
        .submit_assessment(
            &job_id,
            Submission {
                assessment_id: assessment.id.clone(),
                candidate_id: candidate.id,
                responses,
            },
        )
        .await
        .unwrap();

    let listed = api.assessment_responses(&job_id).await.unwrap();
    assert_eq!(listed, vec![stored]);
}
