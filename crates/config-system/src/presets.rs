//! Static quality preset table

use lod_shared::{AntialiasingKind, QualityLevel, QualityProfile};

/// Rendering toggles for every quality level, lowest first
pub const QUALITY_PRESETS: [(QualityLevel, QualityProfile); 5] = [
    (
        QualityLevel::Low,
        QualityProfile {
            resolution_scale: 0.5,
            antialiasing: AntialiasingKind::None,
            shadows: false,
            ambient_occlusion: false,
            show_secondary_elements: false,
        },
    ),
    (
        QualityLevel::Medium,
        QualityProfile {
            resolution_scale: 0.75,
            antialiasing: AntialiasingKind::Fxaa,
            shadows: false,
            ambient_occlusion: false,
            show_secondary_elements: true,
        },
    ),
    (
        QualityLevel::High,
        QualityProfile {
            resolution_scale: 1.0,
            antialiasing: AntialiasingKind::Msaa4,
            shadows: true,
            ambient_occlusion: false,
            show_secondary_elements: true,
        },
    ),
    (
        QualityLevel::Ultra,
        QualityProfile {
            resolution_scale: 1.5,
            antialiasing: AntialiasingKind::Msaa4,
            shadows: true,
            ambient_occlusion: true,
            show_secondary_elements: true,
        },
    ),
    (
        QualityLevel::Extreme,
        QualityProfile {
            resolution_scale: 2.0,
            antialiasing: AntialiasingKind::Msaa8,
            shadows: true,
            ambient_occlusion: true,
            show_secondary_elements: true,
        },
    ),
];

/// Look up the profile for a level
pub fn quality_profile(level: QualityLevel) -> QualityProfile {
    QUALITY_PRESETS[level as usize].1
}
