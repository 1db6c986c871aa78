//! Start/stop/liveness of the supervised process against real `sh` children.

#![cfg(unix)]

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use printmon_supervisor::{
    ProcessStatus, ReadOutcome, StartOutcome, StopOutcome, SupervisedProcess, SupervisorError,
};
use tempfile::TempDir;

use common::{spawn_count, wait_until, write_script, COUNTING_SERVER};

async fn read_until(process: &SupervisedProcess, wanted: &str) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if let ReadOutcome::Line(line) = process.read_line(Duration::from_millis(100)).await {
            if line == wanted {
                return true;
            }
        }
    }
    false
}

#[tokio::test]
async fn repeated_start_spawns_one_process() {
    let dir = TempDir::new().unwrap();
    let process = SupervisedProcess::new(write_script(&dir, COUNTING_SERVER));

    let first = process.start().await.expect("first start");
    let StartOutcome::Started { pid } = first else {
        panic!("expected Started, got {first:?}");
    };
    for _ in 0..3 {
        assert_eq!(
            process.start().await.expect("repeat start"),
            StartOutcome::AlreadyRunning { pid }
        );
    }

    assert!(wait_until(Duration::from_secs(5), || spawn_count(dir.path()) >= 1).await);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(spawn_count(dir.path()), 1);
    assert!(process.is_running());

    process.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_starts_spawn_one_process() {
    let dir = TempDir::new().unwrap();
    let process = Arc::new(SupervisedProcess::new(write_script(&dir, COUNTING_SERVER)));

    let starts: Vec<_> = (0..4)
        .map(|_| {
            let process = process.clone();
            tokio::spawn(async move { process.start().await })
        })
        .collect();

    let mut started = 0;
    for start in starts {
        if let StartOutcome::Started { .. } = start.await.expect("join").expect("start") {
            started += 1;
        }
    }
    assert_eq!(started, 1, "exactly one caller may launch the server");

    assert!(wait_until(Duration::from_secs(5), || spawn_count(dir.path()) >= 1).await);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(spawn_count(dir.path()), 1);

    process.stop().await;
}

#[tokio::test]
async fn stop_without_process_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    let process = SupervisedProcess::new(write_script(&dir, COUNTING_SERVER));

    assert_eq!(process.stop().await, StopOutcome::NotRunning);
    assert_eq!(process.stop().await, StopOutcome::NotRunning);
    assert_eq!(process.status(), ProcessStatus::Absent);
    assert!(!process.is_running());
}

#[tokio::test]
async fn graceful_stop_clears_handle() {
    let dir = TempDir::new().unwrap();
    let process = SupervisedProcess::new(write_script(&dir, COUNTING_SERVER));

    process.start().await.expect("start");
    assert!(read_until(&process, "server ready").await);

    let outcome = process.stop().await;
    assert!(matches!(outcome, StopOutcome::Exited { .. }), "got {outcome:?}");
    assert!(!process.is_running());
    assert_eq!(process.status(), ProcessStatus::Absent);
    assert_eq!(process.pid(), None);
}

#[tokio::test]
async fn stop_escalates_to_kill_when_termination_is_ignored() {
    let dir = TempDir::new().unwrap();
    let mut spec = write_script(
        &dir,
        "trap '' TERM\necho ready\nwhile :; do sleep 1; done\n",
    );
    spec.stop_timeout = Duration::from_millis(300);
    let process = SupervisedProcess::new(spec);

    process.start().await.expect("start");
    assert!(read_until(&process, "ready").await, "trap must be installed");

    let began = Instant::now();
    assert_eq!(process.stop().await, StopOutcome::Killed);
    assert!(began.elapsed() < Duration::from_secs(4));
    assert!(!process.is_running());
    assert_eq!(process.status(), ProcessStatus::Absent);
}

#[tokio::test]
async fn start_then_stop_leaves_no_trace() {
    let dir = TempDir::new().unwrap();
    let process = SupervisedProcess::new(write_script(&dir, COUNTING_SERVER));

    for _ in 0..2 {
        process.start().await.expect("start");
        assert!(process.is_running());
        // The spawn is recorded before the script prints its banner.
        assert!(read_until(&process, "server ready").await);
        process.stop().await;
        assert!(!process.is_running());
        assert_eq!(process.status(), ProcessStatus::Absent);
    }
    assert_eq!(spawn_count(dir.path()), 2);
}

#[tokio::test]
async fn missing_script_is_reported() {
    let dir = TempDir::new().unwrap();
    let mut spec = write_script(&dir, COUNTING_SERVER);
    spec.script = dir.path().join("printer_app.py");
    let process = SupervisedProcess::new(spec);

    let err = process.start().await.expect_err("missing script");
    assert!(matches!(err, SupervisorError::ScriptNotFound { .. }), "got {err:?}");
    assert!(err.to_string().contains("printer_app.py"));
    assert_eq!(process.status(), ProcessStatus::Absent);
}

#[tokio::test]
async fn launch_failure_is_reported() {
    let dir = TempDir::new().unwrap();
    let mut spec = write_script(&dir, COUNTING_SERVER);
    spec.program = dir.path().join("no-such-interpreter").display().to_string();
    let process = SupervisedProcess::new(spec);

    let err = process.start().await.expect_err("bad interpreter");
    assert!(matches!(err, SupervisorError::Spawn { .. }), "got {err:?}");
    assert!(!process.is_running());
}

#[tokio::test]
async fn exited_process_is_not_running_and_can_be_restarted() {
    let dir = TempDir::new().unwrap();
    let process = SupervisedProcess::new(write_script(&dir, "exit 3\n"));

    process.start().await.expect("start");
    assert!(
        wait_until(Duration::from_secs(5), || !process.is_running()).await,
        "liveness must follow the OS"
    );
    assert_eq!(process.status(), ProcessStatus::Exited { code: Some(3) });

    let restarted = process.start().await.expect("restart");
    assert!(matches!(restarted, StartOutcome::Started { .. }));
    assert!(wait_until(Duration::from_secs(5), || !process.is_running()).await);
    assert_eq!(
        process.stop().await,
        StopOutcome::AlreadyExited { code: Some(3) }
    );
    assert_eq!(process.status(), ProcessStatus::Absent);
}

#[tokio::test]
async fn stdout_and_stderr_interleave_in_emission_order() {
    let dir = TempDir::new().unwrap();
    let process = SupervisedProcess::new(write_script(
        &dir,
        "i=0\n\
         while [ $i -lt 200 ]; do echo out$i; echo err$i 1>&2; i=$((i+1)); done\n\
         exec sleep 30\n",
    ));
    process.start().await.expect("start");

    let mut seen = Vec::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    while seen.len() < 400 && Instant::now() < deadline {
        if let ReadOutcome::Line(line) = process.read_line(Duration::from_millis(100)).await {
            seen.push(line);
        }
    }
    let expected: Vec<String> = (0..200)
        .flat_map(|i| [format!("out{i}"), format!("err{i}")])
        .collect();
    assert_eq!(seen, expected);

    process.stop().await;
}
