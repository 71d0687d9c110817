//! Admission, rejection and session handling

mod common;

use std::fs;
use std::sync::Arc;

use common::{orchestrator, FakeExec, FakeProbe, Fixture, Recorder};
use cttc::adapters::MpscChannel;
use cttc::app::run_session;
use cttc::{CuttingMode, DomainError, JobId, JobState, JobStatus, TrimError};

#[tokio::test]
async fn test_one_job_per_session() {
    let fixture = Fixture::new();
    let exec = Arc::new(FakeExec::blocking_at(0));
    let orchestrator = orchestrator(Arc::new(FakeProbe::with_gop(10.0)), exec.clone());
    let recorder = Arc::new(Recorder::default());

    let first = orchestrator
        .start("editor", fixture.request("a.mp4", &[(10.0, 20.0)]), recorder.clone())
        .await
        .unwrap();
    exec.blocked.notified().await;

    let second = orchestrator
        .start("editor", fixture.request("b.mp4", &[(10.0, 20.0)]), recorder.clone())
        .await;
    match second {
        Err(TrimError::JobAlreadyRunning { job_id }) => assert_eq!(job_id, first.job_id.to_string()),
        other => panic!("expected JobAlreadyRunning, got {:?}", other.map(|h| h.job_id)),
    }
    assert_eq!(orchestrator.registry().active_job("editor"), Some(first.job_id.clone()));

    first.cancel();
    assert_eq!(first.wait().await.state, JobState::Cancelled);
    assert!(orchestrator.registry().is_empty());

    // The slot is free again once the job has ended
    let third = orchestrator
        .start("editor", fixture.request("c.mp4", &[(10.0, 20.0)]), recorder.clone())
        .await
        .unwrap();
    third.cancel();
    third.wait().await;
}

#[tokio::test]
async fn test_removing_everything_is_rejected() {
    let fixture = Fixture::new();
    let recorder = Arc::new(Recorder::default());
    let orchestrator = orchestrator(Arc::new(FakeProbe::with_gop(10.0)), Arc::new(FakeExec::default()));

    let err = orchestrator
        .start("test", fixture.request("out.mp4", &[(0.0, 120.0)]), recorder.clone())
        .await
        .err()
        .unwrap();

    assert!(matches!(err, TrimError::Domain(DomainError::EmptyPlan)), "{:?}", err);
    assert!(!fixture.output("out.mp4").exists());
    assert!(recorder.events().is_empty());
    assert!(orchestrator.registry().is_empty());
}

#[tokio::test]
async fn test_existing_output_needs_overwrite() {
    let fixture = Fixture::new();
    fs::write(fixture.output("out.mp4"), b"old").unwrap();
    let orchestrator = orchestrator(Arc::new(FakeProbe::with_gop(10.0)), Arc::new(FakeExec::default()));

    let err = orchestrator
        .start("test", fixture.request("out.mp4", &[(10.0, 20.0)]), Arc::new(Recorder::default()))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, TrimError::OverwriteConflict { .. }), "{:?}", err);
    assert_eq!(fs::read(fixture.output("out.mp4")).unwrap(), b"old");

    let mut request = fixture.request("out.mp4", &[(10.0, 20.0)]);
    request.overwrite = true;
    let job = orchestrator
        .start("test", request, Arc::new(Recorder::default()))
        .await
        .unwrap()
        .wait()
        .await;
    assert_eq!(job.state, JobState::Completed);
    assert_eq!(fs::read_to_string(fixture.output("out.mp4")).unwrap(), "[0-10][20-120]");
}

#[tokio::test]
async fn test_source_cannot_be_its_own_output() {
    let fixture = Fixture::new();
    let orchestrator = orchestrator(Arc::new(FakeProbe::with_gop(10.0)), Arc::new(FakeExec::default()));

    let mut request = fixture.request("source.mp4", &[(10.0, 20.0)]);
    request.overwrite = true;
    let err = orchestrator
        .start("test", request, Arc::new(Recorder::default()))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, TrimError::OverwriteConflict { .. }), "{:?}", err);
}

#[tokio::test]
async fn test_request_validation_errors() {
    let fixture = Fixture::new();
    let orchestrator = orchestrator(Arc::new(FakeProbe::with_gop(10.0)), Arc::new(FakeExec::default()));
    let channel = Arc::new(Recorder::default());

    let mut missing = fixture.request("out.mp4", &[(10.0, 20.0)]);
    missing.source_path = fixture.output("missing.mp4");
    let err = orchestrator.start("test", missing, channel.clone()).await.err().unwrap();
    assert!(matches!(err, TrimError::InputNotFound { .. }), "{:?}", err);

    let err = orchestrator
        .start("test", fixture.request("out.mp4", &[]), channel.clone())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, TrimError::Domain(DomainError::InvalidRange(_))), "{:?}", err);

    let err = orchestrator
        .start("test", fixture.request("out.mp4", &[(10.0, 30.0), (20.0, 40.0)]), channel.clone())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, TrimError::Domain(DomainError::OverlapRejected { .. })), "{:?}", err);

    let err = orchestrator
        .start("test", fixture.request("out.mp4", &[(100.0, 130.0)]), channel.clone())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, TrimError::Domain(DomainError::InvalidRange(_))), "{:?}", err);

    assert!(channel.events().is_empty());
}

#[tokio::test]
async fn test_cancel_unknown_job() {
    let orchestrator = orchestrator(Arc::new(FakeProbe::with_gop(10.0)), Arc::new(FakeExec::default()));
    assert!(!orchestrator.cancel(&JobId::from("nope")));
}

#[tokio::test]
async fn test_session_reports_malformed_lines_and_runs_jobs() {
    let fixture = Fixture::new();
    let orchestrator = orchestrator(Arc::new(FakeProbe::with_gop(10.0)), Arc::new(FakeExec::default()));
    let recorder = Arc::new(Recorder::default());

    let trim = serde_json::json!({
        "action": "trim",
        "source_path": fixture.source,
        "output_path": fixture.output("out.mp4"),
        "removal_ranges": [{"start": 10.0, "end": 20.0}],
    });
    let input = format!(
        "this is not json\n\n{}\n{{\"action\":\"cancel\",\"job_id\":\"unknown\"}}\n",
        trim
    );

    run_session(orchestrator.clone(), "remote", input.as_bytes(), recorder.clone())
        .await
        .unwrap();

    let events = recorder.events();
    assert_eq!(events[0].status, JobStatus::Error);
    assert_eq!(events[0].job_id, JobId::from(""));
    assert!(events[0].message.contains("Malformed"), "{}", events[0].message);

    // The job started by the session either completed or was cancelled at end of input
    let terminal = recorder.terminal();
    assert_eq!(terminal.len(), 2);
    assert!(matches!(
        terminal[1].status,
        JobStatus::Completed | JobStatus::Cancelled
    ));
    assert!(orchestrator.registry().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_session_is_free_once_terminal_event_arrives() {
    let fixture = Fixture::new();
    let orchestrator = orchestrator(Arc::new(FakeProbe::with_gop(10.0)), Arc::new(FakeExec::default()));
    let mut handles = Vec::new();

    for i in 0..50 {
        let (channel, mut events) = MpscChannel::pair();
        let output = format!("out_{}.mp4", i);
        let handle = orchestrator
            .start("editor", fixture.request(&output, &[(10.0, 20.0)]), Arc::new(channel))
            .await
            .unwrap_or_else(|e| panic!("start {} rejected: {}", i, e));

        loop {
            let event = events.recv().await.expect("channel closed before a terminal event");
            if event.is_terminal() {
                assert_eq!(event.status, JobStatus::Completed, "{}", event.message);
                break;
            }
        }
        handles.push(handle);
    }

    for handle in handles {
        assert_eq!(handle.wait().await.state, JobState::Completed);
    }
    assert!(orchestrator.registry().is_empty());
}

#[tokio::test]
async fn test_unencodable_codec_needs_lossless_mode() {
    let fixture = Fixture::new();
    let exec = Arc::new(FakeExec::default());
    let orchestrator = orchestrator(Arc::new(FakeProbe::with_codec(10.0, "theora")), exec.clone());
    let recorder = Arc::new(Recorder::default());

    let mut request = fixture.request("out.ogv", &[(15.0, 20.0)]);
    request.cutting_mode = CuttingMode::FrameAccurate;
    let err = orchestrator
        .start("test", request, recorder.clone())
        .await
        .err()
        .unwrap();
    match err {
        TrimError::UnsupportedCodec { codec } => assert_eq!(codec, "theora"),
        other => panic!("expected UnsupportedCodec, got {:?}", other),
    }
    assert!(recorder.events().is_empty());
    assert!(exec.calls().is_empty());
    assert!(orchestrator.registry().is_empty());

    // Stream copy never needs an encoder
    let job = orchestrator
        .start("test", fixture.request("out.ogv", &[(15.0, 20.0)]), recorder.clone())
        .await
        .unwrap()
        .wait()
        .await;
    assert_eq!(job.state, JobState::Completed);
}

#[tokio::test]
async fn test_session_end_cancels_running_job() {
    let fixture = Fixture::new();
    let exec = Arc::new(FakeExec::blocking_at(0));
    let orchestrator = orchestrator(Arc::new(FakeProbe::with_gop(10.0)), exec.clone());
    let recorder = Arc::new(Recorder::default());

    let trim = serde_json::json!({
        "action": "trim",
        "source_path": fixture.source,
        "output_path": fixture.output("out.mp4"),
        "removal_ranges": [{"start": 10.0, "end": 20.0}],
    });
    let input = format!("{}\n", trim);

    tokio::time::timeout(
        std::time::Duration::from_secs(5),
        run_session(orchestrator.clone(), "remote", input.as_bytes(), recorder.clone()),
    )
    .await
    .expect("session did not cancel its job")
    .unwrap();

    let terminal = recorder.terminal();
    assert_eq!(terminal.len(), 1);
    assert_eq!(terminal[0].status, JobStatus::Cancelled);
    assert!(!fixture.output("out.mp4").exists());
    assert!(orchestrator.registry().is_empty());
}
