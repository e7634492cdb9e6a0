//! Progressive loading as a lazy stream of stage results

use crate::affordability::estimated_stage_bytes;
use crate::filter::ElementSubset;
use crate::observer::{LoadOutcome, StageObserver};
use crate::plan::StagePlan;
use crate::state::{SchedulerState, StateHandle};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use lod_analysis::ComplexityAnalyzer;
use lod_config::StagePolicyTable;
use lod_shared::{
    Clock, ComplexityDescriptor, Dataset, DeviceCapability, LodResult, LodStage, StageResult,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

/// Renderer-side geometry construction for one stage.
///
/// A call is atomic from the scheduler's point of view: it is awaited to
/// completion and never interrupted.
#[async_trait]
pub trait GeometryBuilder: Send + Sync + 'static {
    type Geometry: Send + 'static;

    async fn build(&self, subset: ElementSubset) -> LodResult<Self::Geometry>;
}

/// One stream item: the reported result plus the built geometry
#[derive(Debug)]
pub struct StageOutput<G> {
    pub result: StageResult,
    pub geometry: G,
}

/// Per-walk state shared by the stream, its cancel handles and the load
/// itself. The outcome slot doubles as the finish gate: whoever fills it
/// first reports the outcome, exactly once.
struct LoadControl {
    cancelled: AtomicBool,
    state: StateHandle,
    outcome: Mutex<Option<LoadOutcome>>,
    observers: Vec<Arc<dyn StageObserver>>,
}

impl LoadControl {
    fn set_state(&self, to: SchedulerState) {
        if let Err(err) = self.state.transition_to(to) {
            log::error!("{}", err);
        }
    }

    /// Observers are notified while the outcome slot is held, so they must
    /// not call back into the load.
    fn finish(&self, slot: &mut Option<LoadOutcome>, to: SchedulerState, outcome: LoadOutcome) {
        if self.state.get() != to {
            self.set_state(to);
        }
        for observer in &self.observers {
            observer.on_load_finished(&outcome);
        }
        *slot = Some(outcome);
    }

    /// Cancel now unless a build is in flight; an in-flight build finishes
    /// the walk as cancelled once it returns.
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        let mut slot = self.outcome.lock();
        if slot.is_none() && !matches!(self.state.get(), SchedulerState::Loading(_)) {
            log::info!("Progressive load cancelled at {}", self.state.get());
            self.finish(&mut slot, SchedulerState::Cancelled, LoadOutcome::Cancelled);
        }
    }

    /// The load was dropped; nothing of an unfinished walk will be built
    fn abandon(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        let mut slot = self.outcome.lock();
        if slot.is_none() {
            log::info!("Progressive load dropped at {}", self.state.get());
            self.finish(&mut slot, SchedulerState::Cancelled, LoadOutcome::Cancelled);
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Cancels a running load from anywhere. Between stages the walk ends at
/// once; during a build it ends when that build returns.
#[derive(Clone)]
pub struct CancelHandle {
    control: Arc<LoadControl>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.control.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.control.is_cancelled()
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Walks a dataset through the configured stages
pub struct StageScheduler<B: GeometryBuilder> {
    builder: Arc<B>,
    policies: StagePolicyTable,
    capability: DeviceCapability,
    clock: Arc<dyn Clock>,
    observers: Vec<Arc<dyn StageObserver>>,
}

impl<B: GeometryBuilder> StageScheduler<B> {
    pub fn new(
        builder: B,
        policies: StagePolicyTable,
        capability: DeviceCapability,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            builder: Arc::new(builder),
            policies,
            capability,
            clock,
            observers: Vec::new(),
        }
    }

    /// Observers apply to loads started after they are added
    pub fn add_observer(&mut self, observer: Arc<dyn StageObserver>) {
        self.observers.push(observer);
    }

    pub fn policies(&self) -> &StagePolicyTable {
        &self.policies
    }

    pub fn set_policies(&mut self, policies: StagePolicyTable) {
        self.policies = policies;
    }

    pub fn capability(&self) -> &DeviceCapability {
        &self.capability
    }

    pub fn set_capability(&mut self, capability: DeviceCapability) {
        self.capability = capability;
    }

    pub fn builder(&self) -> &B {
        &self.builder
    }

    /// Default plan: from the dataset's starting stage up to `target`
    pub fn plan_for(&self, descriptor: &ComplexityDescriptor, target: LodStage) -> StagePlan {
        StagePlan::from_start(descriptor, &self.capability, &self.policies, target)
    }

    /// Start a fresh walk up to `target`. Each call starts over; nothing is
    /// resumed from an earlier, cancelled walk.
    pub fn load_progressive(
        &self,
        dataset: Arc<dyn Dataset>,
        target: LodStage,
    ) -> ProgressiveLoad<B::Geometry> {
        let descriptor = ComplexityAnalyzer::analyze(dataset.as_ref());
        let plan = self.plan_for(&descriptor, target);
        self.start(dataset, descriptor, plan)
    }

    /// Start a walk over an explicit plan
    pub fn load_plan(
        &self,
        dataset: Arc<dyn Dataset>,
        plan: StagePlan,
    ) -> ProgressiveLoad<B::Geometry> {
        let descriptor = ComplexityAnalyzer::analyze(dataset.as_ref());
        self.start(dataset, descriptor, plan)
    }

    fn start(
        &self,
        dataset: Arc<dyn Dataset>,
        descriptor: ComplexityDescriptor,
        plan: StagePlan,
    ) -> ProgressiveLoad<B::Geometry> {
        log::info!(
            "Progressive load of {} elements ({}) over {:?}",
            descriptor.element_count,
            descriptor.size_class,
            plan.stages()
        );

        let control = Arc::new(LoadControl {
            cancelled: AtomicBool::new(false),
            state: StateHandle::new(),
            outcome: Mutex::new(None),
            observers: self.observers.clone(),
        });

        let walk = Walk {
            builder: Arc::clone(&self.builder),
            dataset,
            importance_order: None,
            descriptor,
            capability: self.capability,
            policies: self.policies.clone(),
            remaining: plan.stages().iter().copied().collect(),
            clock: Arc::clone(&self.clock),
            control: Arc::clone(&control),
        };

        ProgressiveLoad {
            inner: stream::unfold(walk, Walk::step).boxed(),
            plan,
            control,
        }
    }
}

/// A running progressive load.
///
/// Yields one item per built stage, in ascending stage order. A build failure
/// is yielded as `Err` and ends the stream. The stream is finite and cannot
/// be restarted. Dropping an unfinished load cancels it.
pub struct ProgressiveLoad<G> {
    inner: BoxStream<'static, LodResult<StageOutput<G>>>,
    plan: StagePlan,
    control: Arc<LoadControl>,
}

impl<G> ProgressiveLoad<G> {
    pub fn plan(&self) -> &StagePlan {
        &self.plan
    }

    pub fn cancel(&self) {
        self.control.cancel();
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            control: Arc::clone(&self.control),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.control.state.get()
    }

    pub fn state_handle(&self) -> StateHandle {
        self.control.state.clone()
    }

    /// `None` until the walk has ended
    pub fn outcome(&self) -> Option<LoadOutcome> {
        self.control.outcome.lock().clone()
    }

    /// Drive the load to its end, returning everything it produced
    pub async fn finish(mut self) -> (Vec<StageOutput<G>>, LoadOutcome) {
        let mut outputs = Vec::new();
        while let Some(item) = self.inner.next().await {
            if let Ok(output) = item {
                outputs.push(output);
            }
        }
        let outcome = self.outcome().unwrap_or(LoadOutcome::Cancelled);
        (outputs, outcome)
    }
}

impl<G> Drop for ProgressiveLoad<G> {
    fn drop(&mut self) {
        self.control.abandon();
    }
}

impl<G> Stream for ProgressiveLoad<G> {
    type Item = LodResult<StageOutput<G>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

struct Walk<B: GeometryBuilder> {
    builder: Arc<B>,
    dataset: Arc<dyn Dataset>,
    importance_order: Option<Vec<usize>>,
    descriptor: ComplexityDescriptor,
    capability: DeviceCapability,
    policies: StagePolicyTable,
    remaining: VecDeque<LodStage>,
    clock: Arc<dyn Clock>,
    control: Arc<LoadControl>,
}

impl<B: GeometryBuilder> Walk<B> {
    async fn step(mut self) -> Option<(LodResult<StageOutput<B::Geometry>>, Self)> {
        let stage = {
            let mut slot = self.control.outcome.lock();
            if slot.is_some() {
                return None;
            }

            let Some(&stage) = self.remaining.front() else {
                self.control.finish(&mut slot, SchedulerState::Idle, LoadOutcome::Completed);
                return None;
            };

            if self.control.is_cancelled() {
                log::info!("Progressive load cancelled before {} stage", stage);
                self.control.finish(&mut slot, SchedulerState::Cancelled, LoadOutcome::Cancelled);
                return None;
            }

            let estimated_bytes = estimated_stage_bytes(&self.descriptor, stage, &self.policies);
            if estimated_bytes > self.capability.memory_budget_bytes {
                log::warn!(
                    "Stopping before {} stage: ~{} MB estimated, {} MB budget",
                    stage,
                    estimated_bytes / (1024 * 1024),
                    self.capability.memory_budget_bytes / (1024 * 1024)
                );
                self.control.finish(
                    &mut slot,
                    SchedulerState::Idle,
                    LoadOutcome::AffordabilityCeiling {
                        next_stage: stage,
                        estimated_bytes,
                    },
                );
                return None;
            }

            self.remaining.pop_front();
            self.control.set_state(SchedulerState::Loading(stage));
            stage
        };

        let policy = *self.policies.policy(stage);
        let order = self
            .importance_order
            .get_or_insert_with(|| self.dataset.importance_order());
        let subset =
            ElementSubset::select(stage, self.dataset.elements(), order, policy.max_elements);
        let element_count = subset.len();

        let started_ms = self.clock.now_ms();
        let built = self.builder.build(subset).await;
        let elapsed_ms = self.clock.now_ms().saturating_sub(started_ms);

        let mut slot = self.control.outcome.lock();
        match built {
            Ok(geometry) => {
                let result = StageResult {
                    stage,
                    elapsed_ms,
                    element_count,
                    met_budget: elapsed_ms <= policy.load_budget_ms,
                };
                if result.met_budget {
                    log::info!(
                        "{} stage ready: {} elements in {} ms",
                        stage,
                        element_count,
                        elapsed_ms
                    );
                } else {
                    log::warn!(
                        "{} stage over budget: {} elements in {} ms (budget {} ms)",
                        stage,
                        element_count,
                        elapsed_ms,
                        policy.load_budget_ms
                    );
                }

                self.control.set_state(SchedulerState::StageComplete(stage));
                for observer in &self.control.observers {
                    observer.on_stage_complete(&result);
                }
                // cancelled while this stage was building
                if self.control.is_cancelled() {
                    log::info!("Progressive load cancelled after {} stage", stage);
                    self.control.finish(
                        &mut slot,
                        SchedulerState::Cancelled,
                        LoadOutcome::Cancelled,
                    );
                }
                drop(slot);
                Some((Ok(StageOutput { result, geometry }), self))
            }
            Err(error) => {
                log::error!("Geometry build failed at {} stage: {}", stage, error);
                self.control.finish(
                    &mut slot,
                    SchedulerState::Idle,
                    LoadOutcome::Failed {
                        stage,
                        error: error.clone(),
                    },
                );
                drop(slot);
                Some((Err(error), self))
            }
        }
    }
}
