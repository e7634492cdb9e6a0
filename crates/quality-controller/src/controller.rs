//! Adaptive quality loop
//!
//! A single-step hill climb on mean fps. Each automatic change moves exactly
//! one level and starts a cooldown during which no further automatic change
//! may happen, however extreme the measurements.

use crate::settings::{QualitySettings, SkipReason, TickDecision};
use crate::{QualityError, Result};
use crossbeam_channel::{Receiver, Sender};
use lod_config::{quality_profile, QualityControlConfig};
use lod_profiler::{FrameStats, PerformanceProfiler};
use lod_shared::{
    Clock, DeviceCapability, QualityChangeEvent, QualityChangeReason, QualityLevel, QualityProfile,
};
use std::sync::Arc;

pub struct QualityController {
    settings: QualitySettings,
    config: QualityControlConfig,
    clock: Arc<dyn Clock>,
    last_tick_ms: Option<u64>,
    subscribers: Vec<Sender<QualityChangeEvent>>,
}

impl QualityController {
    /// Start at the configured level, or the device's recommendation
    pub fn new(
        config: QualityControlConfig,
        capability: &DeviceCapability,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        check_thresholds(&config)?;
        let level = config
            .initial_level
            .unwrap_or(capability.recommended_quality);
        log::info!(
            "Quality controller starting at {} (auto-adjust {})",
            level,
            if config.auto_adjust_enabled { "on" } else { "off" }
        );

        Ok(Self {
            settings: QualitySettings::new(level, config.auto_adjust_enabled),
            config,
            clock,
            last_tick_ms: None,
            subscribers: Vec::new(),
        })
    }

    pub fn level(&self) -> QualityLevel {
        self.settings.level
    }

    pub fn settings(&self) -> QualitySettings {
        self.settings
    }

    pub fn config(&self) -> &QualityControlConfig {
        &self.config
    }

    /// Rendering toggles for the current level
    pub fn profile(&self) -> QualityProfile {
        quality_profile(self.settings.level)
    }

    /// Receive every quality change, in order
    pub fn subscribe(&mut self) -> Receiver<QualityChangeEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Replace thresholds; the current level and cooldown carry over
    pub fn set_config(&mut self, config: QualityControlConfig) -> Result<()> {
        check_thresholds(&config)?;
        self.settings.auto_adjust_enabled = config.auto_adjust_enabled;
        self.config = config;
        Ok(())
    }

    pub fn set_auto_adjust(&mut self, enabled: bool) {
        if self.settings.auto_adjust_enabled != enabled {
            log::info!("Quality auto-adjust {}", if enabled { "enabled" } else { "disabled" });
        }
        self.settings.auto_adjust_enabled = enabled;
    }

    /// Set the level directly. Does not start a cooldown, so the next
    /// automatic change is not delayed. Returns `None` if nothing changed.
    pub fn set_quality_level(&mut self, level: QualityLevel) -> Option<QualityChangeEvent> {
        if level == self.settings.level {
            return None;
        }
        let event = QualityChangeEvent {
            previous_level: self.settings.level,
            new_level: level,
            reason: QualityChangeReason::ManualOverride,
            mean_fps: None,
            at_ms: self.clock.now_ms(),
        };
        self.settings.level = level;
        log::info!("Quality set to {} ({})", level, event.reason);
        self.publish(event);
        Some(event)
    }

    /// Tick only if the poll interval has elapsed since the last tick.
    /// Cheap enough to call once per frame.
    pub fn maybe_tick(&mut self, profiler: &PerformanceProfiler) -> Option<TickDecision> {
        let now = self.clock.now_ms();
        if let Some(last) = self.last_tick_ms {
            if now.saturating_sub(last) < self.config.poll_interval_ms {
                return None;
            }
        }
        Some(self.tick(profiler))
    }

    pub fn tick(&mut self, profiler: &PerformanceProfiler) -> TickDecision {
        self.tick_with_stats(profiler.rolling_stats().as_ref())
    }

    /// One step of the loop against already-computed statistics
    pub fn tick_with_stats(&mut self, stats: Option<&FrameStats>) -> TickDecision {
        let now = self.clock.now_ms();
        self.last_tick_ms = Some(now);

        let decision = self.decide(stats, now);
        match &decision {
            TickDecision::Skipped(reason) => log::debug!("Quality tick skipped: {}", reason),
            TickDecision::Unchanged { mean_fps } => {
                log::debug!("Quality stays {} at {:.1} fps", self.settings.level, mean_fps)
            }
            TickDecision::Changed(event) => {
                log::info!(
                    "Quality {} -> {} ({}, {:.1} fps)",
                    event.previous_level,
                    event.new_level,
                    event.reason,
                    event.mean_fps.unwrap_or_default()
                );
                self.publish(*event);
            }
        }
        decision
    }

    fn decide(&mut self, stats: Option<&FrameStats>, now: u64) -> TickDecision {
        if !self.settings.auto_adjust_enabled {
            return TickDecision::Skipped(SkipReason::AutoAdjustDisabled);
        }

        let held = stats.map(|s| s.sample_count).unwrap_or(0);
        let stats = match stats {
            Some(stats) if held >= self.config.min_sample_count => stats,
            _ => {
                return TickDecision::Skipped(SkipReason::InsufficientData {
                    held,
                    required: self.config.min_sample_count,
                })
            }
        };

        let remaining_ms = self
            .settings
            .cooldown_remaining(now, self.config.cooldown_ms);
        if remaining_ms > 0 {
            return TickDecision::Skipped(SkipReason::Cooldown { remaining_ms });
        }

        let mean_fps = stats.mean_fps;
        let step = if mean_fps < self.config.min_fps as f64 {
            self.settings
                .level
                .downgraded()
                .map(|level| (level, QualityChangeReason::PerformanceBelowThreshold))
        } else if mean_fps > self.config.upgrade_threshold_fps() {
            self.settings
                .level
                .upgraded()
                .map(|level| (level, QualityChangeReason::HeadroomAvailable))
        } else {
            None
        };

        match step {
            Some((new_level, reason)) => {
                let event = QualityChangeEvent {
                    previous_level: self.settings.level,
                    new_level,
                    reason,
                    mean_fps: Some(mean_fps),
                    at_ms: now,
                };
                self.settings.level = new_level;
                self.settings.last_automatic_change_ms = Some(now);
                TickDecision::Changed(event)
            }
            None => TickDecision::Unchanged { mean_fps },
        }
    }

    fn publish(&mut self, event: QualityChangeEvent) {
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }
}

fn check_thresholds(config: &QualityControlConfig) -> Result<()> {
    if config.min_fps >= config.target_fps {
        return Err(QualityError::InvalidThresholds {
            min_fps: config.min_fps,
            target_fps: config.target_fps,
        });
    }
    if config.headroom_factor <= 1.0 {
        return Err(QualityError::InvalidHeadroom(config.headroom_factor));
    }
    Ok(())
}
