//! One-shot analysis run at session start or dataset load
//!
//! The complexity analyzer summarises a parsed dataset; the device probe maps
//! render-context introspection onto a fixed capability tier. Both results are
//! read-only for the rest of the session.

pub mod complexity;
pub mod device_probe;
#[cfg(feature = "wgpu-probe")]
pub mod wgpu_probe;

pub use complexity::{determine_starting_stage, ComplexityAnalyzer};
pub use device_probe::{
    ContextSnapshot, DeviceClassHint, DeviceProbe, GraphicsApi, ProbeReport, RenderContextInfo,
};
#[cfg(feature = "wgpu-probe")]
pub use wgpu_probe::WgpuContext;
