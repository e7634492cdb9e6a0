//! Integration tests for progressive loading

use async_trait::async_trait;
use futures::channel::oneshot;
use futures::StreamExt;
use lod_config::StagePolicyTable;
use lod_scheduler::{
    ElementSubset, GeometryBuilder, LoadOutcome, SchedulerState, StageObserver, StagePlan,
    StageScheduler,
};
use lod_shared::{
    Dataset, DeviceCapability, DeviceTier, LodError, LodResult, LodStage, ManualClock,
    StageResult, Structure,
};
use parking_lot::Mutex;
use std::sync::Arc;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Builder that charges a fixed, per-stage time on a manual clock and
/// remembers what it was asked to build
struct ScriptedBuilder {
    clock: ManualClock,
    cost_ms: [u64; 3],
    fail_at: Option<LodStage>,
    calls: Arc<Mutex<Vec<(LodStage, Vec<usize>)>>>,
}

impl ScriptedBuilder {
    fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            cost_ms: [50, 400, 1_500],
            fail_at: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl GeometryBuilder for ScriptedBuilder {
    type Geometry = usize;

    async fn build(&self, subset: ElementSubset) -> LodResult<usize> {
        self.calls.lock().push((subset.stage, subset.indices.clone()));
        self.clock.advance(self.cost_ms[subset.stage as usize]);
        if self.fail_at == Some(subset.stage) {
            return Err(LodError::geometry_build(subset.stage, "out of vertex buffers"));
        }
        Ok(subset.len())
    }
}

#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl StageObserver for RecordingObserver {
    fn on_stage_complete(&self, result: &StageResult) {
        self.events.lock().push(format!("stage:{}", result.stage));
    }

    fn on_load_finished(&self, outcome: &LoadOutcome) {
        self.events.lock().push(format!("done:{}", outcome.status_message()));
    }
}

/// Builder whose first build waits until the test opens the gate
struct GatedBuilder {
    gate: Mutex<Option<oneshot::Receiver<()>>>,
}

#[async_trait]
impl GeometryBuilder for GatedBuilder {
    type Geometry = usize;

    async fn build(&self, subset: ElementSubset) -> LodResult<usize> {
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        Ok(subset.len())
    }
}

fn scheduler(builder: ScriptedBuilder, tier: DeviceTier) -> StageScheduler<ScriptedBuilder> {
    let clock = Arc::new(builder.clock.clone());
    StageScheduler::new(
        builder,
        StagePolicyTable::default(),
        DeviceCapability::for_tier(tier),
        clock,
    )
}

fn dataset(count: usize) -> Arc<dyn Dataset> {
    Arc::new(Structure::synthetic(count))
}

#[tokio::test]
async fn test_full_walk_on_desktop_yields_three_results() {
    init_logging();
    let scheduler = scheduler(ScriptedBuilder::new(ManualClock::new(0)), DeviceTier::Desktop);
    let load = scheduler.load_plan(dataset(50_000), StagePlan::full_walk(LodStage::Full));

    let (outputs, outcome) = load.finish().await;
    assert_eq!(outcome, LoadOutcome::Completed);
    assert_eq!(outputs.len(), 3);

    let policies = StagePolicyTable::default();
    let counts: Vec<usize> = outputs.iter().map(|o| o.result.element_count).collect();
    assert_eq!(counts, vec![100, 1_000, 50_000]);
    for output in &outputs {
        assert!(output.result.element_count <= policies.policy(output.result.stage).max_elements);
        assert_eq!(output.geometry, output.result.element_count);
    }
    assert!(counts.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn test_cancel_after_preview() {
    init_logging();
    let scheduler = scheduler(ScriptedBuilder::new(ManualClock::new(0)), DeviceTier::Desktop);
    let mut load = scheduler.load_plan(dataset(50_000), StagePlan::full_walk(LodStage::Full));

    let first = load.next().await.unwrap().unwrap();
    assert_eq!(first.result.stage, LodStage::Preview);
    assert_eq!(load.state(), SchedulerState::StageComplete(LodStage::Preview));

    load.cancel();
    assert_eq!(load.state(), SchedulerState::Cancelled);
    assert_eq!(load.outcome(), Some(LoadOutcome::Cancelled));
    assert!(load.next().await.is_none());
    assert_eq!(load.state(), SchedulerState::Cancelled);

    // only one stage was ever handed to the builder
    assert_eq!(scheduler.builder().calls.lock().len(), 1);
}

#[tokio::test]
async fn test_restart_begins_from_scratch() {
    init_logging();
    let scheduler = scheduler(ScriptedBuilder::new(ManualClock::new(0)), DeviceTier::Desktop);
    let data = dataset(20_000);

    let mut first = scheduler.load_plan(Arc::clone(&data), StagePlan::full_walk(LodStage::Full));
    first.next().await.unwrap().unwrap();
    first.cancel();
    assert!(first.next().await.is_none());

    let second = scheduler.load_plan(data, StagePlan::full_walk(LodStage::Full));
    let (outputs, outcome) = second.finish().await;
    assert_eq!(outcome, LoadOutcome::Completed);
    assert_eq!(outputs[0].result.stage, LodStage::Preview);
    assert_eq!(outputs.len(), 3);
}

#[tokio::test]
async fn test_memory_ceiling_stops_walk() {
    init_logging();
    let scheduler = scheduler(ScriptedBuilder::new(ManualClock::new(0)), DeviceTier::Mobile);
    let load = scheduler.load_plan(dataset(50_000), StagePlan::full_walk(LodStage::Full));
    let state = load.state_handle();

    let (outputs, outcome) = load.finish().await;
    assert_eq!(outputs.len(), 2);
    assert_eq!(
        outcome,
        LoadOutcome::AffordabilityCeiling {
            next_stage: LodStage::Full,
            estimated_bytes: 50_000 * 8 * 1024,
        }
    );
    assert!(!outcome.is_failure());
    assert_eq!(state.get(), SchedulerState::Idle);
}

#[tokio::test]
async fn test_build_failure_is_terminal() {
    init_logging();
    let mut builder = ScriptedBuilder::new(ManualClock::new(0));
    builder.fail_at = Some(LodStage::Interactive);
    let scheduler = scheduler(builder, DeviceTier::Desktop);
    let mut load = scheduler.load_plan(dataset(5_000), StagePlan::full_walk(LodStage::Full));

    assert!(load.next().await.unwrap().is_ok());
    let err = load.next().await.unwrap().unwrap_err();
    assert!(err.is_retryable());
    assert!(load.next().await.is_none());

    match load.outcome() {
        Some(LoadOutcome::Failed { stage, error }) => {
            assert_eq!(stage, LodStage::Interactive);
            assert_eq!(error, err);
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(load.state(), SchedulerState::Idle);
}

#[tokio::test]
async fn test_subsets_are_deterministic() {
    init_logging();
    let scheduler = scheduler(ScriptedBuilder::new(ManualClock::new(0)), DeviceTier::Desktop);
    let data = dataset(12_345);

    scheduler
        .load_plan(Arc::clone(&data), StagePlan::full_walk(LodStage::Full))
        .finish()
        .await;
    scheduler
        .load_plan(data, StagePlan::full_walk(LodStage::Full))
        .finish()
        .await;

    let calls = scheduler.builder().calls.lock();
    assert_eq!(calls.len(), 6);
    assert_eq!(calls[..3], calls[3..]);
}

#[tokio::test]
async fn test_budget_flags_from_clock() {
    init_logging();
    let mut builder = ScriptedBuilder::new(ManualClock::new(10_000));
    // Preview within 200 ms, Interactive over 1000 ms, Full exactly on 3000 ms
    builder.cost_ms = [150, 1_500, 3_000];
    let scheduler = scheduler(builder, DeviceTier::Desktop);

    let (outputs, _) = scheduler
        .load_plan(dataset(2_000), StagePlan::full_walk(LodStage::Full))
        .finish()
        .await;

    let flags: Vec<(u64, bool)> = outputs
        .iter()
        .map(|o| (o.result.elapsed_ms, o.result.met_budget))
        .collect();
    assert_eq!(flags, vec![(150, true), (1_500, false), (3_000, true)]);
}

#[tokio::test]
async fn test_observer_sees_events_in_order() {
    init_logging();
    let observer = Arc::new(RecordingObserver::default());
    let mut scheduler = scheduler(ScriptedBuilder::new(ManualClock::new(0)), DeviceTier::Mobile);
    scheduler.add_observer(observer.clone());

    scheduler
        .load_plan(dataset(50_000), StagePlan::full_walk(LodStage::Full))
        .finish()
        .await;

    assert_eq!(
        *observer.events.lock(),
        vec![
            "stage:Preview".to_string(),
            "stage:Interactive".to_string(),
            "done:loaded at reduced detail (device memory ceiling)".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_default_walk_starts_at_starting_stage() {
    init_logging();
    let scheduler = scheduler(ScriptedBuilder::new(ManualClock::new(0)), DeviceTier::Desktop);
    let load = scheduler.load_progressive(dataset(50_000), LodStage::Full);
    assert_eq!(load.plan().first(), Some(LodStage::Interactive));

    let (outputs, outcome) = load.finish().await;
    assert_eq!(outcome, LoadOutcome::Completed);
    let stages: Vec<LodStage> = outputs.iter().map(|o| o.result.stage).collect();
    assert_eq!(stages, vec![LodStage::Interactive, LodStage::Full]);

    let small = scheduler.load_progressive(dataset(300), LodStage::Full);
    assert_eq!(small.plan().stages(), &[LodStage::Full]);
}

#[tokio::test]
async fn test_state_history_of_completed_walk() {
    init_logging();
    let scheduler = scheduler(ScriptedBuilder::new(ManualClock::new(0)), DeviceTier::Desktop);
    let load = scheduler.load_plan(dataset(500), StagePlan::full_walk(LodStage::Interactive));
    let state = load.state_handle();
    load.finish().await;

    assert_eq!(
        state.history(),
        vec![
            SchedulerState::Idle,
            SchedulerState::Loading(LodStage::Preview),
            SchedulerState::StageComplete(LodStage::Preview),
            SchedulerState::Loading(LodStage::Interactive),
            SchedulerState::StageComplete(LodStage::Interactive),
            SchedulerState::Idle,
        ]
    );
}

#[tokio::test]
async fn test_cancel_then_drop_reports_cancelled() {
    init_logging();
    let observer = Arc::new(RecordingObserver::default());
    let mut scheduler = scheduler(ScriptedBuilder::new(ManualClock::new(0)), DeviceTier::Desktop);
    scheduler.add_observer(observer.clone());

    let mut load = scheduler.load_plan(dataset(50_000), StagePlan::full_walk(LodStage::Full));
    let state = load.state_handle();
    load.next().await.unwrap().unwrap();
    load.cancel();
    drop(load);

    assert_eq!(state.get(), SchedulerState::Cancelled);
    assert_eq!(
        *observer.events.lock(),
        vec!["stage:Preview".to_string(), "done:loading cancelled".to_string()]
    );
}

#[tokio::test]
async fn test_dropping_unfinished_load_cancels_it() {
    init_logging();
    let observer = Arc::new(RecordingObserver::default());
    let mut scheduler = scheduler(ScriptedBuilder::new(ManualClock::new(0)), DeviceTier::Desktop);
    scheduler.add_observer(observer.clone());

    let untouched = scheduler.load_plan(dataset(500), StagePlan::full_walk(LodStage::Full));
    let state = untouched.state_handle();
    drop(untouched);
    assert_eq!(state.history(), vec![SchedulerState::Idle, SchedulerState::Cancelled]);

    // a finished load has nothing left to report when dropped
    let done = scheduler.load_plan(dataset(500), StagePlan::full_walk(LodStage::Preview));
    let (_, outcome) = done.finish().await;
    assert_eq!(outcome, LoadOutcome::Completed);

    assert_eq!(
        *observer.events.lock(),
        vec![
            "done:loading cancelled".to_string(),
            "stage:Preview".to_string(),
            "done:loaded at requested detail".to_string(),
        ]
    );
    assert!(scheduler.builder().calls.lock().iter().all(|(s, _)| *s == LodStage::Preview));
}

#[tokio::test]
async fn test_cancel_during_build_waits_for_build() {
    init_logging();
    let (open, gate) = oneshot::channel();
    let builder = GatedBuilder {
        gate: Mutex::new(Some(gate)),
    };
    let clock = Arc::new(ManualClock::new(0));
    let observer = Arc::new(RecordingObserver::default());
    let mut scheduler = StageScheduler::new(
        builder,
        StagePolicyTable::default(),
        DeviceCapability::for_tier(DeviceTier::Desktop),
        clock,
    );
    scheduler.add_observer(observer.clone());

    let mut load = scheduler.load_plan(dataset(5_000), StagePlan::full_walk(LodStage::Full));
    let handle = load.cancel_handle();
    assert!(futures::poll!(load.next()).is_pending());
    assert_eq!(load.state(), SchedulerState::Loading(LodStage::Preview));

    handle.cancel();
    assert!(handle.is_cancelled());
    assert_eq!(load.state(), SchedulerState::Loading(LodStage::Preview));
    assert_eq!(load.outcome(), None);

    open.send(()).unwrap();
    let preview = load.next().await.unwrap().unwrap();
    assert_eq!(preview.result.stage, LodStage::Preview);
    assert_eq!(load.state(), SchedulerState::Cancelled);
    assert_eq!(load.outcome(), Some(LoadOutcome::Cancelled));
    assert!(load.next().await.is_none());

    assert_eq!(
        *observer.events.lock(),
        vec!["stage:Preview".to_string(), "done:loading cancelled".to_string()]
    );
}
