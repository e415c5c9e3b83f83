// tests/orchestration.rs
mod common;
use crate::common::builders::{fast_readiness, ManifestBuilder, TestPlanBuilder};
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use svctest::errors::SvctestError;
use svctest::exec::{ExecSession, FixedTerminal, TerminalProbe};
use svctest::lifecycle::{LifecycleCoordinator, ReadinessPolicy};
use svctest::manifest::ServiceSpec;
use svctest::runner::run_tests;
use svctest::types::{ReleaseRef, RunTimeout, TestOutcome};
use svctest_test_utils::fake_platform::{Call, FakePlatform};

type TestResult = Result<(), Box<dyn Error>>;

fn detached() -> Arc<dyn TerminalProbe> {
    Arc::new(FixedTerminal::detached())
}

fn web_and_worker() -> svctest::manifest::Manifest {
    ManifestBuilder::new()
        .service("web", "")
        .service("worker", "pytest")
        .build()
}

#[tokio::test]
async fn manifest_without_tests_spawns_nothing() -> TestResult {
    init_tracing();

    let manifest = ManifestBuilder::new()
        .service("web", "")
        .service("worker", "")
        .build();
    let platform = Arc::new(FakePlatform::new(manifest));
    let plan = TestPlanBuilder::new("shop").release("R1").build();

    let summary = with_timeout(run_tests(platform.clone(), detached(), &plan)).await?;

    assert!(platform.spawned_services().is_empty());
    assert!(platform.stopped_ids().is_empty());
    assert_eq!(summary.skipped(), 2);
    assert_eq!(summary.tested(), 0);
    Ok(())
}

#[tokio::test]
async fn worker_test_runs_inside_sleeping_placeholder() -> TestResult {
    init_tracing();

    let platform = Arc::new(FakePlatform::new(web_and_worker()));
    let plan = TestPlanBuilder::new("shop").release("R1").timeout(1200).build();

    let summary = with_timeout(run_tests(platform.clone(), detached(), &plan)).await?;

    assert_eq!(platform.spawned_services(), vec!["worker".to_string()]);
    assert_eq!(platform.spawn_commands(), vec!["sleep 1200".to_string()]);
    assert_eq!(platform.exec_commands(), vec!["pytest".to_string()]);
    assert_eq!(platform.stopped_ids(), platform.spawned_ids());
    assert_eq!(
        summary.results,
        vec![
            ("web".to_string(), TestOutcome::Skipped),
            ("worker".to_string(), TestOutcome::Exited(0)),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn non_zero_exit_is_a_test_failure_and_process_is_stopped_once() -> TestResult {
    init_tracing();

    let platform = Arc::new(FakePlatform::new(web_and_worker()).with_exit_code("worker", 2));
    let plan = TestPlanBuilder::new("shop").release("R1").timeout(1200).build();

    let err = with_timeout(run_tests(platform.clone(), detached(), &plan))
        .await
        .unwrap_err();

    match &err {
        SvctestError::TestFailure { service, code } => {
            assert_eq!(service, "worker");
            assert_eq!(*code, 2);
        }
        other => panic!("expected TestFailure, got {other:?}"),
    }
    assert_eq!(err.exit_code(), Some(2));
    assert!(err.to_string().contains("exit 2"));
    assert_eq!(platform.spawned_services(), vec!["worker".to_string()]);
    assert_eq!(platform.stopped_ids(), vec!["worker-1".to_string()]);
    Ok(())
}

#[tokio::test]
async fn first_failure_stops_remaining_services() -> TestResult {
    init_tracing();

    let manifest = ManifestBuilder::new()
        .service("api", "make test")
        .service("web", "")
        .service("worker", "pytest")
        .build();
    let platform = Arc::new(FakePlatform::new(manifest).with_exit_code("api", 1));
    let plan = TestPlanBuilder::new("shop").release("R1").build();

    let err = with_timeout(run_tests(platform.clone(), detached(), &plan))
        .await
        .unwrap_err();

    assert_eq!(err.exit_code(), Some(1));
    assert_eq!(platform.spawned_services(), vec!["api".to_string()]);
    assert_eq!(platform.exec_commands(), vec!["make test".to_string()]);
    Ok(())
}

#[tokio::test]
async fn services_run_sequentially_in_manifest_order() -> TestResult {
    init_tracing();

    let manifest = ManifestBuilder::new()
        .service("worker", "pytest")
        .service("api", "make test")
        .build();
    let platform = Arc::new(FakePlatform::new(manifest));
    let plan = TestPlanBuilder::new("shop").release("R1").build();

    with_timeout(run_tests(platform.clone(), detached(), &plan)).await?;

    // Each service's process is stopped before the next one is spawned.
    let lifecycle: Vec<String> = platform
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Run { service, .. } => Some(format!("run:{service}")),
            Call::Stop { id } => Some(format!("stop:{id}")),
            _ => None,
        })
        .collect();
    assert_eq!(
        lifecycle,
        vec!["run:worker", "stop:worker-1", "run:api", "stop:api-2"]
    );
    Ok(())
}

#[tokio::test]
async fn spawn_failure_aborts_without_cleanup() -> TestResult {
    init_tracing();

    let manifest = ManifestBuilder::new()
        .service("api", "make test")
        .service("worker", "pytest")
        .build();
    let platform = Arc::new(FakePlatform::new(manifest).failing_spawn("api"));
    let plan = TestPlanBuilder::new("shop").release("R1").build();

    let err = with_timeout(run_tests(platform.clone(), detached(), &plan))
        .await
        .unwrap_err();

    assert!(matches!(err, SvctestError::Spawn { ref service, .. } if service == "api"));
    assert!(platform.stopped_ids().is_empty());
    assert!(platform.exec_commands().is_empty());
    assert_eq!(platform.spawned_services(), vec!["api".to_string()]);
    Ok(())
}

#[tokio::test]
async fn exec_transport_failure_still_stops_process() -> TestResult {
    init_tracing();

    let platform = Arc::new(FakePlatform::new(web_and_worker()).failing_exec("worker"));
    let plan = TestPlanBuilder::new("shop").release("R1").build();

    let err = with_timeout(run_tests(platform.clone(), detached(), &plan))
        .await
        .unwrap_err();

    assert!(matches!(err, SvctestError::ExecTransport { .. }));
    assert_eq!(err.exit_code(), None);
    assert_eq!(platform.stopped_ids(), vec!["worker-1".to_string()]);
    Ok(())
}

#[tokio::test]
async fn readiness_timeout_stops_process_and_never_execs() -> TestResult {
    init_tracing();

    let platform = Arc::new(FakePlatform::new(web_and_worker()).never_ready("worker"));
    let plan = TestPlanBuilder::new("shop").release("R1").build();

    let err = with_timeout(run_tests(platform.clone(), detached(), &plan))
        .await
        .unwrap_err();

    match err {
        SvctestError::ReadinessTimeout { process, waited } => {
            assert_eq!(process, "worker-1");
            assert!(waited >= fast_readiness().deadline);
        }
        other => panic!("expected ReadinessTimeout, got {other:?}"),
    }
    assert!(platform.exec_commands().is_empty());
    assert_eq!(platform.stopped_ids(), vec!["worker-1".to_string()]);

    let polls = platform
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::Get { .. }))
        .count();
    assert!(polls > 1, "expected repeated status polls, got {polls}");
    Ok(())
}

#[tokio::test]
async fn pending_process_is_polled_until_running() -> TestResult {
    init_tracing();

    let platform = Arc::new(FakePlatform::new(web_and_worker()).pending_polls(3));
    let plan = TestPlanBuilder::new("shop").release("R1").build();

    with_timeout(run_tests(platform.clone(), detached(), &plan)).await?;

    let polls = platform
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::Get { .. }))
        .count();
    assert_eq!(polls, 4);
    assert_eq!(platform.exec_commands(), vec!["pytest".to_string()]);
    Ok(())
}

#[tokio::test]
async fn huge_poll_interval_is_capped_by_the_deadline() -> TestResult {
    init_tracing();

    let huge = Duration::from_secs(u64::MAX / 2 + 1);
    let policy = ReadinessPolicy {
        initial_interval: huge,
        max_interval: huge,
        deadline: Duration::from_millis(20),
    };
    let platform = Arc::new(FakePlatform::new(web_and_worker()).pending_polls(1));
    let plan = TestPlanBuilder::new("shop")
        .release("R1")
        .readiness(policy)
        .build();

    with_timeout(run_tests(platform.clone(), detached(), &plan)).await?;

    assert_eq!(platform.exec_commands(), vec!["pytest".to_string()]);
    assert_eq!(platform.stopped_ids(), vec!["worker-1".to_string()]);
    Ok(())
}

#[tokio::test]
async fn stop_failure_does_not_mask_a_passing_test() -> TestResult {
    init_tracing();

    let platform = Arc::new(FakePlatform::new(web_and_worker()).failing_stop());
    let plan = TestPlanBuilder::new("shop").release("R1").build();

    let summary = with_timeout(run_tests(platform.clone(), detached(), &plan)).await?;

    assert_eq!(summary.tested(), 1);
    assert_eq!(platform.stopped_ids(), vec!["worker-1".to_string()]);
    Ok(())
}

#[tokio::test]
async fn every_exec_gets_a_session_from_the_terminal_probe() -> TestResult {
    init_tracing();

    let manifest = ManifestBuilder::new()
        .service("api", "make test")
        .service("worker", "pytest")
        .build();
    let platform = Arc::new(FakePlatform::new(manifest));
    let plan = TestPlanBuilder::new("shop").release("R1").build();
    let terminal: Arc<dyn TerminalProbe> = Arc::new(FixedTerminal::new(false, Some((100, 30))));

    with_timeout(run_tests(platform.clone(), terminal, &plan)).await?;

    let expected = ExecSession::build(false, Some((100, 30)));
    assert_eq!(platform.exec_sessions(), vec![expected, expected]);
    assert!(expected.entrypoint);
    assert_eq!(expected.tty, Some(false));
    Ok(())
}

#[tokio::test]
async fn dropped_coordinator_future_still_stops_process() -> TestResult {
    init_tracing();

    let platform = Arc::new(FakePlatform::new(web_and_worker()).hanging_exec("worker"));
    let coordinator = LifecycleCoordinator::new(
        platform.clone(),
        "shop",
        ReleaseRef::new("R1"),
        RunTimeout::default(),
        fast_readiness(),
    );
    let service = ServiceSpec::new("worker", "pytest");
    let session = ExecSession::build(false, None);

    let res = tokio::time::timeout(
        Duration::from_millis(100),
        coordinator.run_test(&service, &session),
    )
    .await;
    assert!(res.is_err(), "exec should still have been running");

    // The stop is handed to the runtime when the guard is dropped.
    for _ in 0..50 {
        if !platform.stopped_ids().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(platform.stopped_ids(), vec!["worker-1".to_string()]);
    Ok(())
}

#[tokio::test]
async fn coordinator_skips_services_without_a_test() -> TestResult {
    init_tracing();

    let platform = Arc::new(FakePlatform::new(web_and_worker()));
    let coordinator = LifecycleCoordinator::new(
        platform.clone(),
        "shop",
        ReleaseRef::new("R1"),
        RunTimeout::default(),
        fast_readiness(),
    );

    let outcome = coordinator
        .run_test(&ServiceSpec::new("web", ""), &ExecSession::build(true, None))
        .await?;

    assert_eq!(outcome, TestOutcome::Skipped);
    assert!(platform.calls().is_empty());
    Ok(())
}
