//! Admission control properties, checked against every store backend

use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use taskmgr_errors::{Error, PlatformError};
use taskmgr_gate::{FileGateStore, GateStore, PosixGateStore, MAX_CAPACITY};
use taskmgr_ops::{
    adjust_capacity, create, destroy, execute, run, status, AdjustDirection, CommandOutcome,
    OperationResult, OpsContextBuilder, OpsCtx,
};
use taskmgr_platform::{CommandStatus, Platform, PlatformCommand, ProcessOperations};
use taskmgr_types::{GateName, OperationRequest};
use tempfile::TempDir;
use uuid::Uuid;

fn unique_name() -> GateName {
    GateName::new(format!("taskmgr-ops-{}", Uuid::new_v4().simple()))
}

struct Cleanup {
    store: Arc<dyn GateStore>,
    name: GateName,
}

impl Drop for Cleanup {
    fn drop(&mut self) {
        let _ = self.store.unlink(&self.name);
    }
}

fn context(store: &Arc<dyn GateStore>, process: impl ProcessOperations + 'static) -> OpsCtx {
    OpsContextBuilder::new()
        .with_store(Arc::clone(store))
        .with_platform(Platform::new(Box::new(process)))
        .build()
        .unwrap()
}

fn shell_context(store: &Arc<dyn GateStore>) -> OpsCtx {
    OpsContextBuilder::new()
        .with_store(Arc::clone(store))
        .with_platform(Platform::current())
        .build()
        .unwrap()
}

async fn capacity(ctx: &OpsCtx, gate: &GateName) -> i64 {
    match status(ctx, gate).await.unwrap() {
        OperationResult::Status { capacity, .. } => capacity,
        other => panic!("unexpected result: {other:?}"),
    }
}

fn exit_code(err: &Error) -> i32 {
    err.exit_code()
}

/// Records the gate's capacity at the moment the command "runs"
struct Probe {
    store: Arc<dyn GateStore>,
    gate: GateName,
    seen: Arc<Mutex<Vec<i64>>>,
}

#[async_trait]
impl ProcessOperations for Probe {
    async fn execute_command(&self, _cmd: PlatformCommand) -> Result<CommandStatus, PlatformError> {
        let value = self.store.open(&self.gate).unwrap().value().unwrap();
        self.seen.lock().unwrap().push(value);
        Ok(CommandStatus {
            status: ExitStatus::from_raw(0),
        })
    }
}

/// Never manages to start anything
struct Unlaunchable {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ProcessOperations for Unlaunchable {
    async fn execute_command(&self, cmd: PlatformCommand) -> Result<CommandStatus, PlatformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(PlatformError::CommandLaunchFailed {
            command: cmd.display().to_string(),
            message: "No such file or directory (os error 2)".into(),
        })
    }
}

struct Panicking;

#[async_trait]
impl ProcessOperations for Panicking {
    async fn execute_command(&self, _cmd: PlatformCommand) -> Result<CommandStatus, PlatformError> {
        panic!("command runner blew up");
    }
}

async fn create_is_idempotent(store: Arc<dyn GateStore>) {
    let ctx = shell_context(&store);
    let gate = unique_name();
    let _cleanup = Cleanup { store: Arc::clone(&store), name: gate.clone() };

    create(&ctx, &gate, 2).await.unwrap();
    create(&ctx, &gate, 9).await.unwrap();
    assert_eq!(capacity(&ctx, &gate).await, 2);
}

async fn negative_initial_is_a_create_failure(store: Arc<dyn GateStore>) {
    let ctx = shell_context(&store);
    let gate = unique_name();

    let err = create(&ctx, &gate, -1).await.unwrap_err();
    assert_eq!(exit_code(&err), 3);
    assert!(status(&ctx, &gate).await.is_err());
}

async fn run_releases_whatever_the_command_does(store: Arc<dyn GateStore>) {
    let ctx = shell_context(&store);
    let gate = unique_name();
    let _cleanup = Cleanup { store: Arc::clone(&store), name: gate.clone() };
    create(&ctx, &gate, 1).await.unwrap();

    let ok = run(&ctx, &OperationRequest::run(gate.clone(), vec!["true".into()]))
        .await
        .unwrap();
    assert!(matches!(
        ok,
        OperationResult::Ran(ref r) if matches!(r.outcome, CommandOutcome::Exited { code: Some(0), .. })
    ));
    assert_eq!(capacity(&ctx, &gate).await, 1);

    let failed = run(&ctx, &OperationRequest::run(gate.clone(), vec!["exit 3".into()]))
        .await
        .unwrap();
    match failed {
        OperationResult::Ran(report) => assert_eq!(
            report.outcome,
            CommandOutcome::Exited {
                command: "exit 3".into(),
                code: Some(3)
            }
        ),
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(capacity(&ctx, &gate).await, 1);

    let empty = run(&ctx, &OperationRequest::run(gate.clone(), Vec::new()))
        .await
        .unwrap();
    assert!(matches!(empty, OperationResult::Ran(ref r) if r.outcome == CommandOutcome::Skipped));
    assert_eq!(capacity(&ctx, &gate).await, 1);
}

async fn run_holds_one_unit_while_the_command_runs(store: Arc<dyn GateStore>) {
    let gate = unique_name();
    let _cleanup = Cleanup { store: Arc::clone(&store), name: gate.clone() };
    let seen = Arc::new(Mutex::new(Vec::new()));
    let ctx = context(
        &store,
        Probe {
            store: Arc::clone(&store),
            gate: gate.clone(),
            seen: Arc::clone(&seen),
        },
    );
    create(&ctx, &gate, 2).await.unwrap();

    let request = OperationRequest::run(gate.clone(), vec!["a".into(), "b".into(), "c".into()]);
    let result = run(&ctx, &request).await.unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![1]);
    assert_eq!(capacity(&ctx, &gate).await, 2);
    match result {
        OperationResult::Ran(report) => assert_eq!(report.ignored_commands, 2),
        other => panic!("unexpected result: {other:?}"),
    }
}

async fn run_releases_when_launch_fails(store: Arc<dyn GateStore>) {
    let gate = unique_name();
    let _cleanup = Cleanup { store: Arc::clone(&store), name: gate.clone() };
    let calls = Arc::new(AtomicUsize::new(0));
    let ctx = context(&store, Unlaunchable { calls: Arc::clone(&calls) });
    create(&ctx, &gate, 1).await.unwrap();

    let result = run(&ctx, &OperationRequest::run(gate.clone(), vec!["make".into()]))
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(matches!(
        result,
        OperationResult::Ran(ref r) if matches!(r.outcome, CommandOutcome::LaunchFailed { .. })
    ));
    assert_eq!(capacity(&ctx, &gate).await, 1);
}

async fn run_releases_when_the_runner_panics(store: Arc<dyn GateStore>) {
    let gate = unique_name();
    let _cleanup = Cleanup { store: Arc::clone(&store), name: gate.clone() };
    let ctx = Arc::new(context(&store, Panicking));
    create(&ctx, &gate, 1).await.unwrap();

    let task = {
        let ctx = Arc::clone(&ctx);
        let request = OperationRequest::run(gate.clone(), vec!["boom".into()]);
        tokio::spawn(async move { run(&ctx, &request).await.map(|_| ()) })
    };
    assert!(task.await.unwrap_err().is_panic());
    assert_eq!(capacity(&ctx, &gate).await, 1);
}

async fn run_blocks_until_a_unit_is_available(store: Arc<dyn GateStore>) {
    let gate = unique_name();
    let _cleanup = Cleanup { store: Arc::clone(&store), name: gate.clone() };
    let ctx = Arc::new(shell_context(&store));
    create(&ctx, &gate, 0).await.unwrap();

    let mut task = {
        let ctx = Arc::clone(&ctx);
        let request = OperationRequest::run(gate.clone(), vec!["true".into()]);
        tokio::spawn(async move { run(&ctx, &request).await.map(|_| ()) })
    };

    assert!(tokio::time::timeout(Duration::from_millis(200), &mut task)
        .await
        .is_err());

    adjust_capacity(&ctx, &gate, 1).await.unwrap();
    tokio::time::timeout(Duration::from_secs(10), task)
        .await
        .expect("run should finish once a unit is posted")
        .unwrap()
        .unwrap();
    assert_eq!(capacity(&ctx, &gate).await, 1);
}

async fn grow_is_immediate_and_shrink_waits(store: Arc<dyn GateStore>) {
    let gate = unique_name();
    let _cleanup = Cleanup { store: Arc::clone(&store), name: gate.clone() };
    let ctx = Arc::new(shell_context(&store));
    create(&ctx, &gate, 1).await.unwrap();

    let grown = adjust_capacity(&ctx, &gate, 2).await.unwrap();
    assert_eq!(
        grown,
        OperationResult::Adjusted {
            gate: gate.clone(),
            direction: AdjustDirection::Grow,
            units: 2
        }
    );
    assert_eq!(capacity(&ctx, &gate).await, 3);

    adjust_capacity(&ctx, &gate, -3).await.unwrap();
    assert_eq!(capacity(&ctx, &gate).await, 0);

    let mut shrink = {
        let ctx = Arc::clone(&ctx);
        let gate = gate.clone();
        tokio::spawn(async move { adjust_capacity(&ctx, &gate, -1).await.map(|_| ()) })
    };
    assert!(tokio::time::timeout(Duration::from_millis(200), &mut shrink)
        .await
        .is_err());

    adjust_capacity(&ctx, &gate, 1).await.unwrap();
    tokio::time::timeout(Duration::from_secs(10), shrink)
        .await
        .expect("shrink should finish once a unit is posted")
        .unwrap()
        .unwrap();
    assert_eq!(capacity(&ctx, &gate).await, 0);
}

async fn grow_stops_at_first_failed_post(store: Arc<dyn GateStore>) {
    let ctx = shell_context(&store);
    let gate = unique_name();
    let _cleanup = Cleanup { store: Arc::clone(&store), name: gate.clone() };
    let max = i64::from(MAX_CAPACITY);

    create(&ctx, &gate, max - 2).await.unwrap();

    let err = adjust_capacity(&ctx, &gate, 5).await.unwrap_err();
    assert_eq!(exit_code(&err), 5);
    assert!(err.to_string().starts_with(&format!("increase sem {gate} failed: ")));

    // The two posts that fit stay applied.
    assert_eq!(capacity(&ctx, &gate).await, max);
}

async fn destroy_then_reuse(store: Arc<dyn GateStore>) {
    let ctx = shell_context(&store);
    let gate = unique_name();
    let _cleanup = Cleanup { store: Arc::clone(&store), name: gate.clone() };

    create(&ctx, &gate, 5).await.unwrap();
    destroy(&ctx, &gate).await.unwrap();
    assert_eq!(exit_code(&status(&ctx, &gate).await.unwrap_err()), 4);

    create(&ctx, &gate, 1).await.unwrap();
    assert_eq!(capacity(&ctx, &gate).await, 1);
}

async fn unknown_gate_fails_closed(store: Arc<dyn GateStore>) {
    let gate = unique_name();
    let calls = Arc::new(AtomicUsize::new(0));
    let ctx = context(&store, Unlaunchable { calls: Arc::clone(&calls) });

    let err = status(&ctx, &gate).await.unwrap_err();
    assert_eq!(exit_code(&err), 4);
    assert!(err.to_string().starts_with(&format!("open sem {gate} failed: ")));

    assert_eq!(exit_code(&adjust_capacity(&ctx, &gate, 1).await.unwrap_err()), 4);
    assert_eq!(exit_code(&adjust_capacity(&ctx, &gate, -1).await.unwrap_err()), 4);

    let request = OperationRequest::run(gate.clone(), vec!["true".into()]);
    assert_eq!(exit_code(&run(&ctx, &request).await.unwrap_err()), 4);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    assert_eq!(exit_code(&destroy(&ctx, &gate).await.unwrap_err()), 7);
    assert!(store.open(&gate).is_err());
}

async fn execute_dispatches_by_kind(store: Arc<dyn GateStore>) {
    let ctx = shell_context(&store);
    let gate = unique_name();
    let _cleanup = Cleanup { store: Arc::clone(&store), name: gate.clone() };

    let created = execute(&ctx, &OperationRequest::create(gate.clone(), 4))
        .await
        .unwrap();
    assert_eq!(created, OperationResult::Created { gate: gate.clone(), initial: 4 });

    execute(&ctx, &OperationRequest::adjust(gate.clone(), -1))
        .await
        .unwrap();
    let reported = execute(&ctx, &OperationRequest::status(gate.clone()))
        .await
        .unwrap();
    assert_eq!(reported, OperationResult::Status { gate: gate.clone(), capacity: 3 });

    let destroyed = execute(&ctx, &OperationRequest::destroy(gate.clone()))
        .await
        .unwrap();
    assert_eq!(destroyed.gate(), &gate);
}

fn posix_store() -> ((), Arc<dyn GateStore>) {
    ((), Arc::new(PosixGateStore::new()))
}

fn file_store() -> (TempDir, Arc<dyn GateStore>) {
    let dir = TempDir::new().expect("tempdir");
    let store = Arc::new(FileGateStore::new(dir.path(), Duration::from_millis(5)));
    (dir, store)
}

macro_rules! ops_suite {
    ($backend:ident, $make:expr) => {
        mod $backend {
            use super::*;

            ops_suite!(@case $make;
                create_is_idempotent,
                negative_initial_is_a_create_failure,
                run_releases_whatever_the_command_does,
                run_holds_one_unit_while_the_command_runs,
                run_releases_when_launch_fails,
                run_releases_when_the_runner_panics,
                run_blocks_until_a_unit_is_available,
                grow_is_immediate_and_shrink_waits,
                grow_stops_at_first_failed_post,
                destroy_then_reuse,
                unknown_gate_fails_closed,
                execute_dispatches_by_kind,
            );
        }
    };
    (@case $make:expr; $($case:ident),+ $(,)?) => {
        $(
            #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
            async fn $case() {
                let (_guard, store) = $make;
                super::$case(store).await;
            }
        )+
    };
}

ops_suite!(posix, posix_store());
ops_suite!(file, file_store());
