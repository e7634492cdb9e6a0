//! Device capability probe
//!
//! Maps whatever the render context reports about itself onto one of four
//! fixed tiers. Missing or ambiguous introspection always resolves to the
//! most conservative tier; the probe never guesses upward.

use lod_config::ProbeConfig;
use lod_shared::{DeviceCapability, DeviceTier};
use serde::{Deserialize, Serialize};

/// Below this buffer size a context is capped at `Tablet`
const MIN_LAPTOP_BUFFER_BYTES: u64 = 128 * 1024 * 1024;

/// Graphics API reported by the context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GraphicsApi {
    WebGl1,
    WebGl2,
    WebGpu,
    OpenGl,
    Vulkan,
    Metal,
    Dx12,
    Unknown,
}

impl GraphicsApi {
    fn is_legacy(self) -> bool {
        matches!(self, GraphicsApi::WebGl1)
    }
}

/// Coarse adapter class, when the context exposes one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeviceClassHint {
    Discrete,
    Integrated,
    Handheld,
    Software,
}

/// Introspection a render context can offer. Every method may come back
/// empty; the probe treats absence as "assume the worst".
pub trait RenderContextInfo {
    fn graphics_api(&self) -> Option<GraphicsApi>;

    fn max_texture_dimension(&self) -> Option<u32>;

    fn max_buffer_size(&self) -> Option<u64>;

    /// Reported device memory in megabytes
    fn memory_hint_mb(&self) -> Option<u32>;

    fn device_class(&self) -> Option<DeviceClassHint> {
        None
    }
}

/// Plain-data context description, e.g. forwarded from a browser
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub api: Option<GraphicsApi>,
    pub max_texture_dimension: Option<u32>,
    pub max_buffer_size: Option<u64>,
    pub memory_hint_mb: Option<u32>,
    pub device_class: Option<DeviceClassHint>,
}

impl RenderContextInfo for ContextSnapshot {
    fn graphics_api(&self) -> Option<GraphicsApi> {
        self.api
    }

    fn max_texture_dimension(&self) -> Option<u32> {
        self.max_texture_dimension
    }

    fn max_buffer_size(&self) -> Option<u64> {
        self.max_buffer_size
    }

    fn memory_hint_mb(&self) -> Option<u32> {
        self.memory_hint_mb
    }

    fn device_class(&self) -> Option<DeviceClassHint> {
        self.device_class
    }
}

/// Probe result with the reason the tier was chosen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeReport {
    pub capability: DeviceCapability,
    pub limiting_factor: String,
}

/// Decision-table probe
#[derive(Debug, Clone, Default)]
pub struct DeviceProbe {
    config: ProbeConfig,
}

impl DeviceProbe {
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }

    /// Capability for the context
    pub fn probe(&self, ctx: &dyn RenderContextInfo) -> DeviceCapability {
        self.probe_with_report(ctx).capability
    }

    pub fn probe_with_report(&self, ctx: &dyn RenderContextInfo) -> ProbeReport {
        let (tier, limiting_factor) = self.classify(ctx);
        let capability = self.config.capabilities.capability(tier);
        log::info!(
            "Device probe: {} tier ({} elements, {} MB, {} quality) - {}",
            tier,
            capability.max_affordable_elements,
            capability.memory_budget_bytes / (1024 * 1024),
            capability.recommended_quality,
            limiting_factor
        );
        ProbeReport {
            capability,
            limiting_factor,
        }
    }

    fn classify(&self, ctx: &dyn RenderContextInfo) -> (DeviceTier, String) {
        let api = match ctx.graphics_api() {
            None | Some(GraphicsApi::Unknown) => {
                return (DeviceTier::Mobile, "graphics API not reported".to_string())
            }
            Some(api) => api,
        };
        let Some(texture) = ctx.max_texture_dimension() else {
            return (DeviceTier::Mobile, "texture limits not reported".to_string());
        };
        let Some(memory_mb) = ctx.memory_hint_mb() else {
            return (DeviceTier::Mobile, "memory hint not reported".to_string());
        };

        let (measured, mut reason) = self
            .config
            .requirements()
            .into_iter()
            .find(|(_, req)| {
                texture >= req.min_texture_dimension && memory_mb >= req.min_memory_mb
            })
            .map(|(tier, _)| {
                (
                    tier,
                    format!("texture {texture}px and {memory_mb} MB meet {tier} requirements"),
                )
            })
            .unwrap_or_else(|| {
                (
                    DeviceTier::Mobile,
                    format!("texture {texture}px and {memory_mb} MB below tablet requirements"),
                )
            });

        let mut ceiling = DeviceTier::Desktop;
        let mut lower_ceiling = |tier: DeviceTier, why: String| {
            if tier < ceiling {
                ceiling = tier;
                if tier < measured {
                    reason = why;
                }
            }
        };

        if api.is_legacy() {
            lower_ceiling(DeviceTier::Tablet, format!("{api:?} context"));
        }
        match ctx.device_class() {
            Some(DeviceClassHint::Software) => {
                lower_ceiling(DeviceTier::Mobile, "software rasterizer".to_string())
            }
            Some(DeviceClassHint::Handheld) => {
                lower_ceiling(DeviceTier::Tablet, "handheld device".to_string())
            }
            Some(DeviceClassHint::Integrated) => {
                lower_ceiling(DeviceTier::Laptop, "integrated GPU".to_string())
            }
            Some(DeviceClassHint::Discrete) | None => {}
        }
        if let Some(buffer) = ctx.max_buffer_size() {
            if buffer < MIN_LAPTOP_BUFFER_BYTES {
                lower_ceiling(DeviceTier::Tablet, format!("max buffer size {buffer} bytes"));
            }
        }

        let tier = measured.min(ceiling);
        (tier, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lod_shared::QualityLevel;

    fn desktop_snapshot() -> ContextSnapshot {
        ContextSnapshot {
            api: Some(GraphicsApi::WebGpu),
            max_texture_dimension: Some(16_384),
            max_buffer_size: Some(1 << 30),
            memory_hint_mb: Some(16_384),
            device_class: Some(DeviceClassHint::Discrete),
        }
    }

    #[test]
    fn test_tier_table() {
        let probe = DeviceProbe::default();

        let desktop = probe.probe(&desktop_snapshot());
        assert_eq!(desktop.tier, DeviceTier::Desktop);
        assert_eq!(desktop.max_affordable_elements, 100_000);
        assert_eq!(desktop.recommended_quality, QualityLevel::Ultra);
        assert_eq!(desktop.memory_budget_bytes, 1024 * 1024 * 1024);

        let laptop = probe.probe(&ContextSnapshot {
            max_texture_dimension: Some(8_192),
            memory_hint_mb: Some(8_192),
            ..desktop_snapshot()
        });
        assert_eq!(laptop.tier, DeviceTier::Laptop);
        assert_eq!(laptop.max_affordable_elements, 50_000);

        let tablet = probe.probe(&ContextSnapshot {
            max_texture_dimension: Some(4_096),
            memory_hint_mb: Some(4_096),
            ..desktop_snapshot()
        });
        assert_eq!(tablet.tier, DeviceTier::Tablet);
        assert_eq!(tablet.recommended_quality, QualityLevel::Medium);

        let mobile = probe.probe(&ContextSnapshot {
            max_texture_dimension: Some(2_048),
            memory_hint_mb: Some(1_024),
            ..desktop_snapshot()
        });
        assert_eq!(mobile.tier, DeviceTier::Mobile);
        assert_eq!(mobile.memory_budget_bytes, 128 * 1024 * 1024);
    }

    #[test]
    fn test_missing_introspection_is_mobile() {
        let probe = DeviceProbe::default();
        assert_eq!(probe.probe(&ContextSnapshot::default()).tier, DeviceTier::Mobile);

        let no_memory = ContextSnapshot {
            memory_hint_mb: None,
            ..desktop_snapshot()
        };
        assert_eq!(probe.probe(&no_memory).tier, DeviceTier::Mobile);

        let unknown_api = ContextSnapshot {
            api: Some(GraphicsApi::Unknown),
            ..desktop_snapshot()
        };
        assert_eq!(probe.probe(&unknown_api).tier, DeviceTier::Mobile);
    }

    #[test]
    fn test_ceilings_never_raise_tier() {
        let probe = DeviceProbe::default();

        let integrated = ContextSnapshot {
            device_class: Some(DeviceClassHint::Integrated),
            ..desktop_snapshot()
        };
        assert_eq!(probe.probe(&integrated).tier, DeviceTier::Laptop);

        let software = ContextSnapshot {
            device_class: Some(DeviceClassHint::Software),
            ..desktop_snapshot()
        };
        assert_eq!(probe.probe(&software).tier, DeviceTier::Mobile);

        let webgl1 = ContextSnapshot {
            api: Some(GraphicsApi::WebGl1),
            ..desktop_snapshot()
        };
        assert_eq!(probe.probe(&webgl1).tier, DeviceTier::Tablet);

        // a handheld ceiling doesn't lift a weak device above its measurements
        let weak_handheld = ContextSnapshot {
            max_texture_dimension: Some(2_048),
            device_class: Some(DeviceClassHint::Handheld),
            ..desktop_snapshot()
        };
        assert_eq!(probe.probe(&weak_handheld).tier, DeviceTier::Mobile);
    }

    #[test]
    fn test_report_names_limiting_factor() {
        let probe = DeviceProbe::default();
        let report = probe.probe_with_report(&ContextSnapshot {
            max_buffer_size: Some(64 * 1024 * 1024),
            ..desktop_snapshot()
        });
        assert_eq!(report.capability.tier, DeviceTier::Tablet);
        assert!(report.limiting_factor.contains("max buffer size"));
    }
}
