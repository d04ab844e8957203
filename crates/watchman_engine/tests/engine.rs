use std::time::Duration;

use pretty_assertions::assert_eq;
use watchman_engine::{
    AtomicFileWriter, ClientSettings, EngineEvent, EngineHandle, PollOutcome, PollSettings,
    UploadFile, UploadResponse,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn engine_for(server: &MockServer) -> EngineHandle {
    EngineHandle::new(ClientSettings {
        base_url: server.uri(),
        poll: PollSettings {
            interval: Duration::from_millis(20),
            max_duration: None,
        },
        ..ClientSettings::default()
    })
    .expect("engine")
}

/// Waits for the next event matching `want`, skipping everything else.
async fn next_event(
    engine: &EngineHandle,
    want: impl Fn(&EngineEvent) -> bool,
) -> EngineEvent {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        while let Some(event) = engine.try_recv() {
            if want(&event) {
                return event;
            }
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for engine event"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn upload_then_poll_delivers_events() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"job_id":"job-1"}"#, "application/json"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/status/job-1"))
        .respond_with(ResponseTemplate::new(202))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/status/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"done".to_vec(), "video/mp4"))
        .with_priority(2)
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    engine.upload(
        9,
        UploadFile {
            name: "clip.mp4".to_string(),
            mime_type: "video/mp4".to_string(),
            bytes: b"bytes".to_vec(),
        },
    );
    let event = next_event(&engine, |e| matches!(e, EngineEvent::UploadCompleted { .. })).await;
    assert_eq!(
        event,
        EngineEvent::UploadCompleted {
            ticket: 9,
            result: Ok(UploadResponse::Job {
                job_id: "job-1".to_string()
            }),
        }
    );

    engine.start_polling(3, "job-1");
    let event = next_event(&engine, |e| matches!(e, EngineEvent::PollCompleted { .. })).await;
    match event {
        EngineEvent::PollCompleted {
            poll,
            job_id,
            outcome: PollOutcome::Ready(artifact),
        } => {
            assert_eq!(poll, 3);
            assert_eq!(job_id, "job-1");
            assert_eq!(artifact.bytes, b"done");
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn new_poll_replaces_running_one() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status/slow"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/status/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    engine.start_polling(1, "slow");
    next_event(&engine, |e| matches!(e, EngineEvent::PollProgress(p) if p.poll == 1)).await;

    engine.start_polling(2, "gone");
    let event = next_event(&engine, |e| matches!(e, EngineEvent::PollCompleted { .. })).await;
    assert_eq!(
        event,
        EngineEvent::PollCompleted {
            poll: 2,
            job_id: "gone".to_string(),
            outcome: PollOutcome::NotFound,
        }
    );

    // The replaced poller stops querying.
    tokio::time::sleep(Duration::from_millis(60)).await;
    let settled = server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == "/api/status/slow")
        .count();
    tokio::time::sleep(Duration::from_millis(100)).await;
    let later = server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == "/api/status/slow")
        .count();
    assert_eq!(settled, later);
}

#[tokio::test]
async fn saving_commands_report_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/is-saving"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"saving":false}"#, "application/json"),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/start-saving"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    engine.load_saving_state();
    let event = next_event(&engine, |e| matches!(e, EngineEvent::SavingState(_))).await;
    assert_eq!(event, EngineEvent::SavingState(Ok(false)));

    engine.set_saving(true);
    let event = next_event(&engine, |e| matches!(e, EngineEvent::SavingToggled { .. })).await;
    assert_eq!(
        event,
        EngineEvent::SavingToggled {
            enable: true,
            result: Ok(()),
        }
    );
}

#[tokio::test]
async fn footage_commands_report_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/footages"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"["a.mp4"]"#, "application/json"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/footages/a.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"seg".to_vec(), "video/mp4"))
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    engine.list_footages();
    let event = next_event(&engine, |e| matches!(e, EngineEvent::FootagesListed(_))).await;
    assert_eq!(event, EngineEvent::FootagesListed(Ok(vec!["a.mp4".to_string()])));

    engine.fetch_footage("a.mp4");
    match next_event(&engine, |e| matches!(e, EngineEvent::FootageFetched { .. })).await {
        EngineEvent::FootageFetched { name, result } => {
            assert_eq!(name, "a.mp4");
            assert_eq!(result.expect("fetched").bytes, b"seg");
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn atomic_writer_replaces_existing_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let writer = AtomicFileWriter::new(dir.path().join("out"));

    let first = writer.write("processed_video.mp4", b"one").expect("write");
    let second = writer.write("processed_video.mp4", b"two").expect("rewrite");

    assert_eq!(first, second);
    assert_eq!(std::fs::read(&second).expect("read"), b"two");
    assert!(writer.write("..", b"x").is_err());
}
