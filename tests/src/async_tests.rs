//! Task-level tests on a paused tokio clock

use std::sync::Arc;
use std::time::Duration;

use hvac_core::{
    default_config, AdjustDirection, HalError, HeartbeatError, Mode, SharedState, SystemState,
    TaskId,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::sim::{
    heartbeat_loop, input_loop, output_loop, report_loop, to_std, Led, Panel, TokioGates,
};

struct Board {
    shared: Arc<SharedState>,
    panel: Arc<Panel>,
    gates: Arc<TokioGates>,
    reports: mpsc::UnboundedReceiver<hvac_core::StatusSnapshot>,
    heartbeat: JoinHandle<HeartbeatError>,
    tasks: Vec<JoinHandle<()>>,
}

impl Board {
    fn start() -> Self {
        let config = default_config();
        let shared = Arc::new(SharedState::from_config(&config));
        let panel = Arc::new(Panel::new(config.normal_state));
        let gates = Arc::new(TokioGates::new());
        let (tx, reports) = mpsc::unbounded_channel();

        let input = to_std(config.input_period);
        let tasks = vec![
            tokio::spawn(input_loop(shared.clone(), panel.clone(), gates.clone(), input)),
            tokio::spawn(output_loop(shared.clone(), panel.clone(), gates.clone(), to_std(config.output_period))),
            tokio::spawn(report_loop(shared.clone(), config.report_every_ticks(), input, tx)),
        ];
        let heartbeat = tokio::spawn(heartbeat_loop(panel.clone(), gates.clone()));

        Self { shared, panel, gates, reports, heartbeat, tasks }
    }

    fn stop(self) {
        for task in &self.tasks {
            task.abort();
        }
        self.heartbeat.abort();
    }
}

#[tokio::test(start_paused = true)]
async fn test_heat_drives_leds() {
    let board = Board::start();
    board.panel.set_celsius(18.0);
    board.panel.select(Mode::auto(SystemState::Heat));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(board.panel.led(Led::Fan));
    assert!(board.panel.led(Led::Heat));
    assert!(!board.panel.led(Led::Cool));

    board.panel.set_celsius(26.0);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!board.panel.led(Led::Fan));
    assert!(board.panel.led(Led::Heat));

    board.stop();
}

#[tokio::test(start_paused = true)]
async fn test_off_parks_heartbeat_until_mode_change() {
    println!("💤 Off mode parks the heartbeat");
    let board = Board::start();

    board.panel.select(Mode::auto(SystemState::Off));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(board.gates.is_suspended(TaskId::Output));
    assert!(board.gates.is_suspended(TaskId::Heartbeat));

    let parked = board.panel.heartbeat_toggles();
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(board.panel.heartbeat_toggles(), parked);

    // The input edge wakes the output task, which resumes the heartbeat
    board.panel.select(Mode::auto(SystemState::Cool));
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!board.gates.is_suspended(TaskId::Output));
    assert!(!board.gates.is_suspended(TaskId::Heartbeat));
    assert!(board.panel.heartbeat_toggles() > parked);

    board.stop();
}

#[tokio::test(start_paused = true)]
async fn test_heartbeat_follows_pot() {
    let board = Board::start();
    board.panel.select(Mode::fan_on());

    // 15 ms half-period
    board.panel.set_pot(0);
    tokio::time::sleep(Duration::from_millis(10)).await;
    let start = board.panel.heartbeat_toggles();
    tokio::time::sleep(Duration::from_millis(150)).await;
    let fast = board.panel.heartbeat_toggles() - start;

    // 15000 + 100 * 4000 / 4 = 115 ms half-period
    board.panel.set_pot(4_000);
    tokio::time::sleep(Duration::from_millis(200)).await;
    let start = board.panel.heartbeat_toggles();
    tokio::time::sleep(Duration::from_millis(1150)).await;
    let slow = board.panel.heartbeat_toggles() - start;

    assert!((9..=11).contains(&fast), "fast toggles: {}", fast);
    assert!((9..=11).contains(&slow), "slow toggles: {}", slow);

    board.stop();
}

#[tokio::test(start_paused = true)]
async fn test_heartbeat_failure_is_fatal() {
    let board = Board::start();
    board.panel.select(Mode::fan_on());
    tokio::time::sleep(Duration::from_millis(50)).await;

    board.panel.break_pot();
    let error = tokio::time::timeout(Duration::from_secs(2), board.heartbeat)
        .await
        .expect("heartbeat should stop")
        .unwrap();
    assert_eq!(error, HeartbeatError::SampleUnavailable(HalError::AdcError));

    for task in board.tasks {
        task.abort();
    }
}

#[tokio::test(start_paused = true)]
async fn test_setpoint_press_reports_immediately() {
    let mut board = Board::start();
    board.panel.select(Mode::auto(SystemState::Heat));
    board.panel.set_celsius(25.0);

    // Startup report and the mode edge
    tokio::time::sleep(Duration::from_millis(20)).await;
    while board.reports.try_recv().is_ok() {}

    let shared = board.shared.clone();
    let panel = board.panel.clone();
    std::thread::spawn(move || panel.press_setpoint(&shared, AdjustDirection::Increase))
        .join()
        .unwrap();

    let report = tokio::time::timeout(Duration::from_millis(10), board.reports.recv())
        .await
        .expect("edge report within one input period")
        .unwrap();
    assert_eq!(report.setpoint, 25.5);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(board.panel.led(Led::Fan));

    board.stop();
}

#[tokio::test(start_paused = true)]
async fn test_periodic_reports_every_second() {
    let mut board = Board::start();
    board.panel.select(Mode::auto(SystemState::Cool));

    tokio::time::sleep(Duration::from_millis(3_500)).await;
    let mut count = 0;
    while board.reports.try_recv().is_ok() {
        count += 1;
    }
    // Startup, mode edge, then one per second
    assert!((4..=5).contains(&count), "reports: {}", count);

    board.stop();
}

#[test]
fn test_heartbeat_gate_waits_for_normal() {
    use hvac_core::{Scheduler, TaskPriority};
    use tokio_test::{assert_pending, assert_ready, task};

    let gates = TokioGates::new();
    gates.set_priority(TaskId::Heartbeat, TaskPriority::Suspended);

    let mut gate = task::spawn(gates.heartbeat_gate());
    assert_pending!(gate.poll());

    // Output commands do not open the heartbeat gate
    gates.set_priority(TaskId::Output, TaskPriority::Normal);
    assert_pending!(gate.poll());

    gates.set_priority(TaskId::Heartbeat, TaskPriority::Normal);
    assert!(gate.is_woken());
    assert_ready!(gate.poll());
}

#[test]
fn test_output_gate_opens_on_input_edge() {
    use hvac_core::{Scheduler, TaskPriority};
    use tokio_test::{assert_pending, assert_ready, task};

    let gates = TokioGates::new();
    tokio_test::block_on(gates.output_gate());

    gates.set_priority(TaskId::Output, TaskPriority::Suspended);
    let mut gate = task::spawn(gates.output_gate());
    assert_pending!(gate.poll());

    gates.notify_input_edge();
    assert_ready!(gate.poll());
}

#[test]
fn test_edge_before_suspend_still_wakes_output() {
    use hvac_core::{Scheduler, TaskPriority};
    use tokio_test::{assert_ready, task};

    let gates = TokioGates::new();

    // Edge arrives while the output cycle that will suspend is still running
    gates.notify_input_edge();
    gates.set_priority(TaskId::Output, TaskPriority::Suspended);

    let mut gate = task::spawn(gates.output_gate());
    assert_ready!(gate.poll());
}
