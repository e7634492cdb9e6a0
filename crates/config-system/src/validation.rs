//! Configuration validation utilities

use crate::{ConfigError, LodConfig, Result};
use lod_shared::LodStage;

const MIN_MEMORY_BUDGET_BYTES: u64 = 1024 * 1024;

/// Configuration validator with comprehensive checks
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a complete configuration
    pub fn validate(config: &LodConfig) -> Result<()> {
        Self::validate_quality(&config.quality)?;
        Self::validate_memory(&config.memory)?;
        Self::validate_stages(&config.stages)?;
        Self::validate_profiler(&config.profiler)?;
        Self::validate_probe(&config.probe)?;

        // Cross-field validation
        Self::validate_cross_field(config)?;

        Ok(())
    }

    fn validate_quality(quality: &crate::QualityControlConfig) -> Result<()> {
        if quality.target_fps == 0 || quality.target_fps > 240 {
            return Err(ConfigError::Validation(format!(
                "Invalid target_fps: {}. Must be between 1 and 240",
                quality.target_fps
            )));
        }

        if quality.min_fps >= quality.target_fps {
            return Err(ConfigError::Validation(format!(
                "min_fps ({}) must be below target_fps ({})",
                quality.min_fps, quality.target_fps
            )));
        }

        if !(quality.headroom_factor > 1.0) {
            return Err(ConfigError::Validation(format!(
                "Invalid headroom_factor: {}. Must be greater than 1.0",
                quality.headroom_factor
            )));
        }

        if quality.min_sample_count == 0 {
            return Err(ConfigError::Validation(
                "min_sample_count must be at least 1".to_string(),
            ));
        }

        if quality.poll_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "poll_interval_ms must be at least 1".to_string(),
            ));
        }

        if quality.cooldown_ms < quality.poll_interval_ms {
            log::warn!(
                "cooldown_ms ({}) is shorter than poll_interval_ms ({}); every tick may adjust quality",
                quality.cooldown_ms,
                quality.poll_interval_ms
            );
        }

        Ok(())
    }

    fn validate_memory(memory: &crate::MemoryConfig) -> Result<()> {
        if let Some(budget) = memory.memory_budget_bytes {
            if budget < MIN_MEMORY_BUDGET_BYTES {
                return Err(ConfigError::Validation(format!(
                    "Memory budget too low: {} bytes. Minimum is 1MB",
                    budget
                )));
            }
        }
        Ok(())
    }

    fn validate_stages(stages: &crate::StagePolicyTable) -> Result<()> {
        for stage in LodStage::ALL {
            let policy = stages.policy(stage);
            if policy.max_elements == 0 {
                return Err(ConfigError::Validation(format!(
                    "{stage} stage must allow at least one element"
                )));
            }
            if policy.load_budget_ms == 0 {
                return Err(ConfigError::Validation(format!(
                    "{stage} stage load budget must be positive"
                )));
            }
            if !(policy.target_frame_time_ms > 0.0) {
                return Err(ConfigError::Validation(format!(
                    "{stage} stage target frame time must be positive, got {}",
                    policy.target_frame_time_ms
                )));
            }
            if let Some(next) = stage.next() {
                let next_policy = stages.policy(next);
                if next_policy.max_elements < policy.max_elements {
                    return Err(ConfigError::Validation(format!(
                        "{next} stage cap ({}) is below {stage} stage cap ({})",
                        next_policy.max_elements, policy.max_elements
                    )));
                }
                if next_policy.bytes_per_element < policy.bytes_per_element {
                    return Err(ConfigError::Validation(format!(
                        "{next} stage per-element estimate ({}) is below {stage} ({})",
                        next_policy.bytes_per_element, policy.bytes_per_element
                    )));
                }
            }
        }
        Ok(())
    }

    fn validate_profiler(profiler: &crate::ProfilerConfig) -> Result<()> {
        if profiler.capacity == 0 {
            return Err(ConfigError::Validation(
                "Profiler capacity must be at least 1".to_string(),
            ));
        }

        if !(profiler.dropped_frame_factor >= 1.0) {
            return Err(ConfigError::Validation(format!(
                "Invalid dropped_frame_factor: {}. Must be at least 1.0",
                profiler.dropped_frame_factor
            )));
        }

        let bottleneck = &profiler.bottleneck;
        if !(bottleneck.memory_pressure_ratio > 0.0 && bottleneck.memory_pressure_ratio <= 1.0) {
            return Err(ConfigError::Validation(format!(
                "Invalid memory_pressure_ratio: {}. Must be in (0.0, 1.0]",
                bottleneck.memory_pressure_ratio
            )));
        }
        if bottleneck.cpu_min_draw_calls < 0.0
            || bottleneck.cpu_max_primitives_per_draw <= 0.0
            || bottleneck.gpu_min_primitives < 0.0
        {
            return Err(ConfigError::Validation(
                "Bottleneck thresholds must be non-negative".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_probe(probe: &crate::ProbeConfig) -> Result<()> {
        let requirements = probe.requirements();
        for pair in requirements.windows(2) {
            let (better_tier, better) = pair[0];
            let (worse_tier, worse) = pair[1];
            if better.min_texture_dimension < worse.min_texture_dimension
                || better.min_memory_mb < worse.min_memory_mb
            {
                return Err(ConfigError::Validation(format!(
                    "{better_tier} tier requirements must not be lower than {worse_tier}"
                )));
            }
        }

        for (tier, _) in requirements {
            let capability = probe.capabilities.capability(tier);
            if capability.tier != tier {
                return Err(ConfigError::Validation(format!(
                    "Capability entry for {tier} declares tier {}",
                    capability.tier
                )));
            }
        }

        Ok(())
    }

    fn validate_cross_field(config: &LodConfig) -> Result<()> {
        if config.quality.min_sample_count > config.profiler.capacity {
            return Err(ConfigError::Validation(format!(
                "min_sample_count ({}) exceeds profiler capacity ({}); the quality loop could never act",
                config.quality.min_sample_count, config.profiler.capacity
            )));
        }

        let full = config.stages.policy(LodStage::Full);
        let desktop = config.probe.capabilities.desktop;
        if full.max_elements < desktop.max_affordable_elements {
            log::warn!(
                "Full stage cap ({}) is below the desktop affordable element count ({})",
                full.max_elements,
                desktop.max_affordable_elements
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ConfigValidator::validate(&LodConfig::default()).is_ok());
    }

    #[test]
    fn test_fps_bounds() {
        let mut config = LodConfig::default();
        config.quality.target_fps = 0;
        assert!(ConfigValidator::validate(&config).is_err());

        let mut config = LodConfig::default();
        config.quality.min_fps = 60;
        assert!(ConfigValidator::validate(&config).is_err());

        let mut config = LodConfig::default();
        config.quality.headroom_factor = 1.0;
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_stage_ordering() {
        let mut config = LodConfig::default();
        config.stages.interactive.max_elements = 50;
        assert!(ConfigValidator::validate(&config).is_err());

        let mut config = LodConfig::default();
        config.stages.full.bytes_per_element = 1;
        assert!(ConfigValidator::validate(&config).is_err());

        let mut config = LodConfig::default();
        config.stages.preview.load_budget_ms = 0;
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_sample_count_must_fit_buffer() {
        let mut config = LodConfig::default();
        config.quality.min_sample_count = 121;
        assert!(ConfigValidator::validate(&config).is_err());

        config.profiler.capacity = 240;
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_memory_override_floor() {
        let mut config = LodConfig::default();
        config.memory.memory_budget_bytes = Some(1024);
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_probe_requirements_ordering() {
        let mut config = LodConfig::default();
        config.probe.laptop.min_memory_mb = 16_384;
        assert!(ConfigValidator::validate(&config).is_err());
    }
}
