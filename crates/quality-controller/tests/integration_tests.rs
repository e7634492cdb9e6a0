//! Integration tests for the adaptive quality loop

use lod_config::{ConfigFormat, ConfigParser, LodConfig};
use lod_profiler::PerformanceProfiler;
use lod_quality::{QualityController, SkipReason, TickDecision};
use lod_shared::{DeviceCapability, DeviceTier, ManualClock, QualityChangeReason, QualityLevel};
use std::sync::Arc;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct Session {
    clock: ManualClock,
    profiler: PerformanceProfiler,
    controller: QualityController,
}

impl Session {
    fn new(config: &LodConfig, tier: DeviceTier) -> Self {
        let clock = ManualClock::new(0);
        let capability = config.effective_capability(DeviceCapability::for_tier(tier));
        let profiler = PerformanceProfiler::new(
            &config.profiler,
            config.quality.target_fps,
            capability.memory_budget_bytes,
        )
        .unwrap();
        let controller =
            QualityController::new(config.quality.clone(), &capability, Arc::new(clock.clone()))
                .unwrap();
        Self {
            clock,
            profiler,
            controller,
        }
    }

    /// Render `frames` frames at `fps`, ticking through `maybe_tick` as a
    /// render loop would
    fn run(&mut self, fps: f64, frames: usize) -> Vec<TickDecision> {
        let frame_ms = 1_000.0 / fps;
        let mut decisions = Vec::new();
        for _ in 0..frames {
            self.clock.advance(frame_ms.round() as u64);
            self.profiler.record_frame(frame_ms, 100, 200_000, 0).unwrap();
            if let Some(decision) = self.controller.maybe_tick(&self.profiler) {
                decisions.push(decision);
            }
        }
        decisions
    }
}

#[test]
fn test_sustained_slow_frames_step_down_gradually() {
    init_logging();
    let mut session = Session::new(&LodConfig::default(), DeviceTier::Laptop);
    assert_eq!(session.controller.level(), QualityLevel::High);

    // 10 seconds at 20 fps
    let decisions = session.run(20.0, 200);
    let changes: Vec<(u64, QualityLevel)> = decisions
        .iter()
        .filter_map(|d| d.change())
        .map(|e| (e.at_ms, e.new_level))
        .collect();

    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0].1, QualityLevel::Medium);
    assert_eq!(changes[1].1, QualityLevel::Low);
    assert!(changes[1].0 - changes[0].0 >= 3_000);
    assert_eq!(session.controller.level(), QualityLevel::Low);
}

#[test]
fn test_fast_frames_climb_to_extreme_and_stop() {
    init_logging();
    let mut session = Session::new(&LodConfig::default(), DeviceTier::Mobile);
    assert_eq!(session.controller.level(), QualityLevel::Low);

    // 30 seconds at 125 fps
    session.run(125.0, 3_750);
    assert_eq!(session.controller.level(), QualityLevel::Extreme);
}

#[test]
fn test_early_ticks_wait_for_data() {
    init_logging();
    let mut session = Session::new(&LodConfig::default(), DeviceTier::Desktop);
    let decisions = session.run(20.0, 25);
    assert!(decisions.iter().all(|d| matches!(
        d,
        TickDecision::Skipped(SkipReason::InsufficientData { .. })
    )));
    assert_eq!(session.controller.level(), QualityLevel::Ultra);
}

#[test]
fn test_configured_thresholds() {
    init_logging();
    let json = r#"{
        "quality": {
            "target_fps": 30,
            "min_fps": 20,
            "cooldown_ms": 1000,
            "min_sample_count": 10,
            "initial_level": "medium"
        }
    }"#;
    let config = ConfigParser::parse_string(json, ConfigFormat::Json).unwrap();
    let mut session = Session::new(&config, DeviceTier::Desktop);
    assert_eq!(session.controller.level(), QualityLevel::Medium);

    // 25 fps is fine against a 20 fps floor
    let decisions = session.run(25.0, 100);
    assert!(decisions.iter().all(|d| d.change().is_none()));

    // 40 fps beats 30 * 1.2
    let decisions = session.run(40.0, 200);
    let first = decisions.iter().find_map(|d| d.change()).unwrap();
    assert_eq!(first.reason, QualityChangeReason::HeadroomAvailable);
    assert_eq!(first.new_level, QualityLevel::High);
}

#[test]
fn test_manual_override_then_automatic_recovery() {
    init_logging();
    let mut session = Session::new(&LodConfig::default(), DeviceTier::Desktop);
    let events = session.controller.subscribe();

    session.controller.set_quality_level(QualityLevel::Extreme);
    session.run(20.0, 60);
    assert_eq!(session.controller.level(), QualityLevel::Ultra);

    let reasons: Vec<QualityChangeReason> = events.try_iter().map(|e| e.reason).collect();
    assert_eq!(
        reasons,
        vec![
            QualityChangeReason::ManualOverride,
            QualityChangeReason::PerformanceBelowThreshold
        ]
    );
}

#[test]
fn test_decisions_serialize_with_tags() {
    init_logging();
    let mut session = Session::new(&LodConfig::default(), DeviceTier::Desktop);
    let decisions = session.run(20.0, 60);

    let waiting = serde_json::to_value(decisions[0]).unwrap();
    assert_eq!(waiting["decision"], "skipped");
    assert_eq!(waiting["reason"], "insufficientData");

    let changed = decisions.iter().find(|d| d.change().is_some()).unwrap();
    let json = serde_json::to_value(changed).unwrap();
    assert_eq!(json["decision"], "changed");
    assert_eq!(json["previous_level"], "ultra");
    assert_eq!(json["new_level"], "high");

    let back: TickDecision = serde_json::from_value(json).unwrap();
    assert_eq!(back.change().map(|e| e.new_level), Some(QualityLevel::High));
}
