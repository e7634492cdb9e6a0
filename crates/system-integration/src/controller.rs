//! `AdaptiveLodController`: one explicitly constructed instance per session

use crate::diagnostics::Diagnostics;
use crate::events::{BusObserver, ControllerEvent, EventBus};
use crate::quality_loop::QualityLoop;
use crate::Result;
use crossbeam_channel::Receiver;
use lod_analysis::{
    determine_starting_stage, ComplexityAnalyzer, DeviceProbe, ProbeReport, RenderContextInfo,
};
use lod_config::{ConfigValidator, LodConfig};
use lod_profiler::{BottleneckReport, FrameStats, PerformanceProfiler};
use lod_quality::{QualityController, TickDecision};
use lod_scheduler::{GeometryBuilder, ProgressiveLoad, StagePlan, StageScheduler};
use lod_shared::{
    Clock, ComplexityDescriptor, Dataset, DeviceCapability, LodStage, QualityChangeEvent,
    QualityLevel, QualityProfile, SystemClock,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// What the controller decided about a freshly parsed dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparedDataset {
    pub descriptor: ComplexityDescriptor,
    pub starting_stage: LodStage,
}

pub struct AdaptiveLodController<B: GeometryBuilder> {
    session_id: Uuid,
    config: LodConfig,
    probe_report: ProbeReport,
    capability: DeviceCapability,
    profiler: Arc<Mutex<PerformanceProfiler>>,
    quality: Arc<Mutex<QualityController>>,
    scheduler: StageScheduler<B>,
    bus: EventBus,
    loads: BusObserver,
    clock: Arc<dyn Clock>,
    prepared: Option<PreparedDataset>,
}

impl<B: GeometryBuilder> AdaptiveLodController<B> {
    /// Probe the render context and wire every component together
    pub fn new(config: LodConfig, context: &dyn RenderContextInfo, builder: B) -> Result<Self> {
        Self::with_clock(config, context, builder, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(
        config: LodConfig,
        context: &dyn RenderContextInfo,
        builder: B,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        ConfigValidator::validate(&config)?;

        let probe_report = DeviceProbe::new(config.probe.clone()).probe_with_report(context);
        let capability = config.effective_capability(probe_report.capability);

        let profiler = PerformanceProfiler::new(
            &config.profiler,
            config.quality.target_fps,
            capability.memory_budget_bytes,
        )?;
        let quality =
            QualityController::new(config.quality.clone(), &capability, Arc::clone(&clock))?;

        let bus = EventBus::new();
        let loads = BusObserver::new(bus.clone());
        let mut scheduler =
            StageScheduler::new(builder, config.stages.clone(), capability, Arc::clone(&clock));
        scheduler.add_observer(Arc::new(loads.clone()));

        let session_id = Uuid::new_v4();
        log::info!(
            "LOD controller {} ready on {} tier ({} MB budget)",
            session_id,
            capability.tier,
            capability.memory_budget_bytes / (1024 * 1024)
        );

        Ok(Self {
            session_id,
            config,
            probe_report,
            capability,
            profiler: Arc::new(Mutex::new(profiler)),
            quality: Arc::new(Mutex::new(quality)),
            scheduler,
            bus,
            loads,
            clock,
            prepared: None,
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn config(&self) -> &LodConfig {
        &self.config
    }

    /// Probed capability with any configured memory override applied
    pub fn capability(&self) -> &DeviceCapability {
        &self.capability
    }

    pub fn probe_report(&self) -> &ProbeReport {
        &self.probe_report
    }

    pub fn scheduler(&self) -> &StageScheduler<B> {
        &self.scheduler
    }

    /// Analyze a dataset and decide where its load should begin
    pub fn prepare_dataset(&mut self, dataset: &dyn Dataset) -> PreparedDataset {
        let descriptor = ComplexityAnalyzer::analyze(dataset);
        let starting_stage =
            determine_starting_stage(&descriptor, &self.capability, &self.config.stages);
        log::info!(
            "Dataset with {} elements ({}) starts at {}",
            descriptor.element_count,
            descriptor.size_class,
            starting_stage
        );
        let prepared = PreparedDataset {
            descriptor,
            starting_stage,
        };
        self.prepared = Some(prepared.clone());
        prepared
    }

    pub fn load_progressive(
        &mut self,
        dataset: Arc<dyn Dataset>,
        target: LodStage,
    ) -> ProgressiveLoad<B::Geometry> {
        self.prepare_dataset(dataset.as_ref());
        self.scheduler.load_progressive(dataset, target)
    }

    pub fn load_plan(
        &mut self,
        dataset: Arc<dyn Dataset>,
        plan: StagePlan,
    ) -> ProgressiveLoad<B::Geometry> {
        self.prepare_dataset(dataset.as_ref());
        self.scheduler.load_plan(dataset, plan)
    }

    /// Feed one rendered frame into the profiler. Invalid samples are logged
    /// and dropped.
    pub fn record_frame(
        &self,
        duration_ms: f64,
        draw_calls: u32,
        primitives: u64,
        memory_bytes: u64,
    ) {
        // rejected samples are logged and counted by the profiler
        self.profiler
            .lock()
            .record_frame(duration_ms, draw_calls, primitives, memory_bytes)
            .ok();
    }

    /// Tick the quality loop if its poll interval has elapsed. For driving
    /// the loop from the render thread, once per frame.
    pub fn poll_quality(&self) -> Option<TickDecision> {
        let decision = {
            let profiler = self.profiler.lock();
            self.quality.lock().maybe_tick(&profiler)?
        };
        if let TickDecision::Changed(event) = decision {
            self.bus.publish(ControllerEvent::QualityChanged(event));
        }
        Some(decision)
    }

    /// Run one quality tick now
    pub fn tick_quality(&self) -> TickDecision {
        let stats = self.profiler.lock().rolling_stats();
        let decision = self.quality.lock().tick_with_stats(stats.as_ref());
        if let TickDecision::Changed(event) = decision {
            self.bus.publish(ControllerEvent::QualityChanged(event));
        }
        decision
    }

    pub fn set_quality_level(&self, level: QualityLevel) -> Option<QualityChangeEvent> {
        let event = self.quality.lock().set_quality_level(level);
        if let Some(event) = event {
            self.bus.publish(ControllerEvent::QualityChanged(event));
        }
        event
    }

    pub fn set_auto_adjust(&self, enabled: bool) {
        self.quality.lock().set_auto_adjust(enabled);
    }

    pub fn quality_level(&self) -> QualityLevel {
        self.quality.lock().level()
    }

    pub fn quality_profile(&self) -> QualityProfile {
        self.quality.lock().profile()
    }

    pub fn rolling_stats(&self) -> Option<FrameStats> {
        self.profiler.lock().rolling_stats()
    }

    pub fn classify_bottleneck(&self) -> BottleneckReport {
        self.profiler.lock().classify_bottleneck()
    }

    /// Stage, load and quality events, in the order they happened
    pub fn subscribe(&self) -> Receiver<ControllerEvent> {
        self.bus.subscribe()
    }

    pub fn diagnostics(&self) -> Diagnostics {
        let profiler = self.profiler.lock();
        let quality = self.quality.lock();
        Diagnostics {
            session_id: self.session_id,
            generated_at: chrono::Utc::now(),
            capability: self.capability,
            probe_limiting_factor: self.probe_report.limiting_factor.clone(),
            quality: quality.settings(),
            quality_profile: quality.profile(),
            stats: profiler.rolling_stats(),
            bottleneck: profiler.classify_bottleneck(),
            total_frames: profiler.total_frames(),
            rejected_samples: profiler.rejected_samples(),
            dataset: self.prepared.as_ref().map(|p| p.descriptor.clone()),
            starting_stage: self.prepared.as_ref().map(|p| p.starting_stage),
            last_load: self.loads.last_outcome(),
        }
    }

    /// Apply a new configuration. The quality level and cooldown carry over;
    /// frame history is kept unless the ring shape or frame target changed.
    pub fn reconfigure(&mut self, config: LodConfig) -> Result<()> {
        ConfigValidator::validate(&config)?;
        let capability = config.effective_capability(self.probe_report.capability);

        {
            let mut profiler = self.profiler.lock();
            if config.profiler != self.config.profiler
                || config.quality.target_fps != self.config.quality.target_fps
            {
                *profiler = PerformanceProfiler::new(
                    &config.profiler,
                    config.quality.target_fps,
                    capability.memory_budget_bytes,
                )?;
            } else {
                profiler.set_memory_budget(capability.memory_budget_bytes);
            }
        }
        self.quality.lock().set_config(config.quality.clone())?;
        self.scheduler.set_policies(config.stages.clone());
        self.scheduler.set_capability(capability);
        if let Some(prepared) = self.prepared.as_mut() {
            prepared.starting_stage =
                determine_starting_stage(&prepared.descriptor, &capability, &config.stages);
        }

        log::info!("LOD controller {} reconfigured", self.session_id);
        self.capability = capability;
        self.config = config;
        Ok(())
    }

    /// Run the quality loop on a tokio interval instead of from the render
    /// thread. Must be called inside a tokio runtime.
    pub fn spawn_quality_loop(&self) -> QualityLoop {
        QualityLoop::spawn(
            Arc::clone(&self.profiler),
            Arc::clone(&self.quality),
            self.bus.clone(),
            Duration::from_millis(self.config.quality.poll_interval_ms),
        )
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}
