//! `RenderContextInfo` for a native or browser `wgpu` adapter

use crate::device_probe::{DeviceClassHint, GraphicsApi, RenderContextInfo};

/// Introspection captured from a `wgpu::Adapter`.
///
/// wgpu does not report device memory, so callers that know it (from the
/// platform or a user setting) pass it through `with_memory_hint_mb`.
/// Without a hint the probe falls back to `Mobile`.
#[derive(Debug, Clone)]
pub struct WgpuContext {
    backend: wgpu::Backend,
    device_type: wgpu::DeviceType,
    max_texture_dimension: u32,
    max_buffer_size: u64,
    memory_hint_mb: Option<u32>,
}

impl WgpuContext {
    pub fn new(
        backend: wgpu::Backend,
        device_type: wgpu::DeviceType,
        limits: &wgpu::Limits,
    ) -> Self {
        Self {
            backend,
            device_type,
            max_texture_dimension: limits.max_texture_dimension_2d,
            max_buffer_size: limits.max_buffer_size,
            memory_hint_mb: None,
        }
    }

    pub fn from_adapter(adapter: &wgpu::Adapter) -> Self {
        let info = adapter.get_info();
        log::debug!(
            "wgpu adapter: {} ({:?}, {:?})",
            info.name,
            info.backend,
            info.device_type
        );
        Self::new(info.backend, info.device_type, &adapter.limits())
    }

    pub fn with_memory_hint_mb(mut self, memory_mb: u32) -> Self {
        self.memory_hint_mb = Some(memory_mb);
        self
    }
}

impl RenderContextInfo for WgpuContext {
    fn graphics_api(&self) -> Option<GraphicsApi> {
        let api = match self.backend {
            wgpu::Backend::Vulkan => GraphicsApi::Vulkan,
            wgpu::Backend::Metal => GraphicsApi::Metal,
            wgpu::Backend::Dx12 => GraphicsApi::Dx12,
            wgpu::Backend::Gl => GraphicsApi::OpenGl,
            wgpu::Backend::BrowserWebGpu => GraphicsApi::WebGpu,
            _ => GraphicsApi::Unknown,
        };
        Some(api)
    }

    fn max_texture_dimension(&self) -> Option<u32> {
        Some(self.max_texture_dimension)
    }

    fn max_buffer_size(&self) -> Option<u64> {
        Some(self.max_buffer_size)
    }

    fn memory_hint_mb(&self) -> Option<u32> {
        self.memory_hint_mb
    }

    fn device_class(&self) -> Option<DeviceClassHint> {
        match self.device_type {
            wgpu::DeviceType::DiscreteGpu => Some(DeviceClassHint::Discrete),
            wgpu::DeviceType::IntegratedGpu | wgpu::DeviceType::VirtualGpu => {
                Some(DeviceClassHint::Integrated)
            }
            wgpu::DeviceType::Cpu => Some(DeviceClassHint::Software),
            wgpu::DeviceType::Other => None,
        }
    }
}
