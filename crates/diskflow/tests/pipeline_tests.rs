// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! End-to-end pipeline tests.
//!
//! These exercise the orchestrator / scheduler / poller / interpreter
//! stack together against scripted collaborators:
//!
//! 1. **Resumability**: a 25-disk universe with batch size 10 completes
//!    across three invocations with correct checkpoint positions.
//! 2. **Idempotence**: a resumed run finds the same violations as an
//!    uninterrupted one.
//! 3. **Partial failure**: a poisoned disk never sinks the run.
//! 4. **Fatal paths**: persistence failures surface instead of being
//!    swallowed.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use diskflow::{
    Checkpoint, CheckpointStore, Error, MemoryCheckpointStore, PipelineConfig,
    PipelineOrchestrator, PipelineSummary, PollPolicy, RunOutcome, CHECKPOINT_KEY,
};
use diskflow_testing::{
    clean_record, disks, invalid_record, violation_record, FailingCheckpointStore, MockBehavior,
    MockEntitySource, MockForecastAnalyzer,
};

fn analyzer_with_violations(violating: &[usize]) -> MockForecastAnalyzer {
    let mut analyzer = MockForecastAnalyzer::completing_with(clean_record());
    for index in violating {
        analyzer = analyzer.with_behavior(
            &format!("DISK-{index:03}"),
            MockBehavior::Complete(violation_record(95.0, *index % 7)),
        );
    }
    analyzer
}

// =============================================================================
// Resumability
// =============================================================================

#[tokio::test]
async fn test_25_disks_batch_10_complete_across_three_invocations() {
    let store = Arc::new(MemoryCheckpointStore::new());
    let orchestrator = PipelineOrchestrator::new(
        MockEntitySource::with_disks(disks(25)),
        Arc::new(analyzer_with_violations(&[3, 12, 24])),
        Arc::clone(&store),
        PipelineConfig::default().with_batch_size(10),
    );

    // First invocation: disks 0-9.
    let first = orchestrator.run("run-1").await.unwrap();
    match &first {
        RunOutcome::Incomplete {
            processed, total, ..
        } => {
            assert_eq!(*processed, 10);
            assert_eq!(*total, 25);
        }
        RunOutcome::Complete(_) => panic!("expected incomplete after first invocation"),
    }
    let checkpoint = store.load("run-1", CHECKPOINT_KEY).await.unwrap().unwrap();
    assert_eq!(checkpoint.start_index, 10);
    assert_eq!(checkpoint.summary.metrics.attempted_disks(), 10);

    // Second invocation: disks 10-19.
    let second = orchestrator.run("run-1").await.unwrap();
    assert!(!second.is_complete());
    let checkpoint = store.load("run-1", CHECKPOINT_KEY).await.unwrap().unwrap();
    assert_eq!(checkpoint.start_index, 20);

    // Third invocation: disks 20-24, run completes, checkpoint cleared.
    let third = orchestrator.run("run-1").await.unwrap();
    let summary = match third {
        RunOutcome::Complete(summary) => summary,
        RunOutcome::Incomplete { .. } => panic!("expected completion on third invocation"),
    };
    assert!(store.load("run-1", CHECKPOINT_KEY).await.unwrap().is_none());

    assert_eq!(summary.metrics.analyzed_disks, 25);
    assert_eq!(summary.metrics.total_disks, 25);
    assert_eq!(summary.violations.len(), 3);
    assert_eq!(summary.metrics.disks_with_violations, 3);
}

#[tokio::test]
async fn test_resumed_run_matches_uninterrupted_run() {
    let violating = [2usize, 7, 11, 18, 23];

    let run_to_completion = |batch_size: usize| async move {
        let orchestrator = PipelineOrchestrator::new(
            MockEntitySource::with_disks(disks(25)),
            Arc::new(analyzer_with_violations(&violating)),
            MemoryCheckpointStore::new(),
            PipelineConfig::default().with_batch_size(batch_size),
        );
        let mut invocations = 0;
        loop {
            invocations += 1;
            assert!(invocations <= 30, "run did not converge");
            if let RunOutcome::Complete(summary) = orchestrator.run("run-x").await.unwrap() {
                break summary;
            }
        }
    };

    let uninterrupted = run_to_completion(25).await;
    let resumed = run_to_completion(4).await;

    let ids = |summary: &PipelineSummary| -> BTreeSet<String> {
        summary
            .violations
            .iter()
            .map(|violation| violation.disk_id.clone())
            .collect()
    };
    assert_eq!(ids(&uninterrupted), ids(&resumed));
    assert_eq!(
        uninterrupted.metrics.analyzed_disks,
        resumed.metrics.analyzed_disks
    );
}

#[tokio::test]
async fn test_fresh_run_single_invocation_never_persists_checkpoint() {
    let store = Arc::new(MemoryCheckpointStore::new());
    let orchestrator = PipelineOrchestrator::new(
        MockEntitySource::with_disks(disks(5)),
        Arc::new(MockForecastAnalyzer::completing_with(clean_record())),
        Arc::clone(&store),
        PipelineConfig::default(),
    );

    let outcome = orchestrator.run("run-1").await.unwrap();
    assert!(outcome.is_complete());
    assert!(store.is_empty());
}

// =============================================================================
// Partial Failure Containment
// =============================================================================

#[tokio::test]
async fn test_poisoned_disk_does_not_sink_the_run() {
    let universe = disks(8);
    let analyzer = MockForecastAnalyzer::completing_with(clean_record())
        .with_behavior(&universe[4].disk_id, MockBehavior::ErrorOnSubmit);
    let orchestrator = PipelineOrchestrator::new(
        MockEntitySource::with_disks(universe),
        Arc::new(analyzer),
        MemoryCheckpointStore::new(),
        PipelineConfig::default(),
    );

    let outcome = orchestrator.run("run-1").await.unwrap();
    let summary = match outcome {
        RunOutcome::Complete(summary) => summary,
        RunOutcome::Incomplete { .. } => panic!("expected completion"),
    };
    assert_eq!(summary.metrics.analyzed_disks, 7);
    assert_eq!(summary.metrics.failed_disks, 1);
}

#[tokio::test(start_paused = true)]
async fn test_poll_timeout_disk_counts_failed_and_run_completes() {
    let universe = disks(3);
    let analyzer = MockForecastAnalyzer::completing_with(clean_record())
        .with_behavior(&universe[1].disk_id, MockBehavior::NeverComplete);
    let config = PipelineConfig::default().with_poll_policy(PollPolicy {
        max_attempts: 3,
        max_elapsed: Duration::from_secs(3600),
        initial_delay: Duration::from_secs(2),
        delay_increment: Duration::from_millis(500),
    });
    let orchestrator = PipelineOrchestrator::new(
        MockEntitySource::with_disks(universe),
        Arc::new(analyzer),
        MemoryCheckpointStore::new(),
        config,
    );

    let outcome = orchestrator.run("run-1").await.unwrap();
    assert!(outcome.is_complete());
    assert_eq!(outcome.summary().metrics.failed_disks, 1);
    assert_eq!(outcome.summary().metrics.analyzed_disks, 2);
}

#[tokio::test(start_paused = true)]
async fn test_slow_analyzer_resolves_through_polling() {
    let universe = disks(2);
    let analyzer = MockForecastAnalyzer::completing_with(clean_record()).with_behavior(
        &universe[0].disk_id,
        MockBehavior::CompleteAfterPolls(4, violation_record(97.0, 1)),
    );
    let orchestrator = PipelineOrchestrator::new(
        MockEntitySource::with_disks(universe),
        Arc::new(analyzer),
        MemoryCheckpointStore::new(),
        PipelineConfig::default(),
    );

    let outcome = orchestrator.run("run-1").await.unwrap();
    let summary = outcome.summary();
    assert_eq!(summary.violations.len(), 1);
    assert_eq!(summary.violations[0].days_until_full, 2);
}

// =============================================================================
// Interpretation End-to-End
// =============================================================================

#[tokio::test]
async fn test_invalid_quality_counts_analyzed_but_not_violating() {
    let universe = disks(4);
    let analyzer = MockForecastAnalyzer::completing_with(clean_record())
        .with_behavior(&universe[2].disk_id, MockBehavior::Complete(invalid_record()));
    let orchestrator = PipelineOrchestrator::new(
        MockEntitySource::with_disks(universe),
        Arc::new(analyzer),
        MemoryCheckpointStore::new(),
        PipelineConfig::default(),
    );

    let outcome = orchestrator.run("run-1").await.unwrap();
    let summary = outcome.summary();
    assert_eq!(summary.metrics.analyzed_disks, 4);
    assert_eq!(summary.metrics.invalid_predictions, 1);
    assert_eq!(summary.metrics.valid_predictions, 3);
    assert!(summary.violations.is_empty());
}

#[tokio::test]
async fn test_violation_fields_reach_the_summary_contract() {
    let universe = disks(1);
    let analyzer = MockForecastAnalyzer::completing_with(violation_record(95.0, 3));
    let orchestrator = PipelineOrchestrator::new(
        MockEntitySource::with_disks(universe.clone()),
        Arc::new(analyzer),
        MemoryCheckpointStore::new(),
        PipelineConfig::default(),
    );

    let outcome = orchestrator.run("run-1").await.unwrap();
    let json = serde_json::to_value(&outcome).unwrap();
    let violation = &json["violations"][0];
    assert_eq!(violation["diskId"], universe[0].disk_id);
    assert_eq!(violation["hostId"], universe[0].host_id);
    assert_eq!(violation["daysUntilFull"], 4);
    assert_eq!(violation["currentUsage"], 95.0);
    assert_eq!(violation["confidence"], 0.95);
    assert!(violation["predictedDate"].is_string());
}

// =============================================================================
// Fatal Paths
// =============================================================================

#[tokio::test]
async fn test_checkpoint_save_failure_is_fatal() {
    let orchestrator = PipelineOrchestrator::new(
        MockEntitySource::with_disks(disks(25)),
        Arc::new(MockForecastAnalyzer::completing_with(clean_record())),
        FailingCheckpointStore::new().failing_save(),
        PipelineConfig::default().with_batch_size(10),
    );

    let err = orchestrator.run("run-1").await.unwrap_err();
    assert!(matches!(err, Error::Checkpoint(_)), "got {err}");
}

#[tokio::test]
async fn test_checkpoint_load_failure_is_fatal() {
    let orchestrator = PipelineOrchestrator::new(
        MockEntitySource::with_disks(disks(5)),
        Arc::new(MockForecastAnalyzer::completing_with(clean_record())),
        FailingCheckpointStore::new().failing_load(),
        PipelineConfig::default(),
    );

    let err = orchestrator.run("run-1").await.unwrap_err();
    assert!(matches!(err, Error::Checkpoint(_)), "got {err}");
}

#[tokio::test]
async fn test_resume_preserves_earlier_violations() {
    let store = Arc::new(MemoryCheckpointStore::new());
    let orchestrator = PipelineOrchestrator::new(
        MockEntitySource::with_disks(disks(6)),
        Arc::new(analyzer_with_violations(&[1])),
        Arc::clone(&store),
        PipelineConfig::default().with_batch_size(3),
    );

    let first = orchestrator.run("run-1").await.unwrap();
    assert!(!first.is_complete());
    assert_eq!(first.summary().violations.len(), 1);

    let second = orchestrator.run("run-1").await.unwrap();
    let summary = match second {
        RunOutcome::Complete(summary) => summary,
        RunOutcome::Incomplete { .. } => panic!("expected completion"),
    };
    // Violations from the first slice survive the resume.
    assert_eq!(summary.violations.len(), 1);
    assert_eq!(summary.violations[0].disk_id, "DISK-001");
    assert_eq!(summary.metrics.analyzed_disks, 6);
}

#[tokio::test]
async fn test_checkpoint_invariant_holds_after_each_invocation() {
    let store = Arc::new(MemoryCheckpointStore::new());
    let universe = disks(12);
    let analyzer = MockForecastAnalyzer::completing_with(clean_record())
        .with_behavior(&universe[2].disk_id, MockBehavior::ErrorOnSubmit);
    let orchestrator = PipelineOrchestrator::new(
        MockEntitySource::with_disks(universe),
        Arc::new(analyzer),
        Arc::clone(&store),
        PipelineConfig::default().with_batch_size(5),
    );

    let mut expected_index = 0usize;
    loop {
        let outcome = orchestrator.run("run-1").await.unwrap();
        match store.load("run-1", CHECKPOINT_KEY).await.unwrap() {
            Some(Checkpoint {
                start_index,
                summary,
            }) => {
                expected_index += 5;
                assert_eq!(start_index, expected_index);
                assert_eq!(summary.metrics.attempted_disks() as usize, start_index);
                assert_eq!(
                    summary.violations.len(),
                    summary.metrics.disks_with_violations as usize
                );
            }
            None => {
                assert!(outcome.is_complete());
                break;
            }
        }
    }
}
