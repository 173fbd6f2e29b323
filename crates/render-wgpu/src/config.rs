/// Depth attachment format used by every pipeline.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Device and surface settings for [`crate::WgpuBackend`].
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Preferred swapchain format. Falls back to the surface's first
    /// supported format when unavailable.
    pub color_format: wgpu::TextureFormat,
    pub present_mode: wgpu::PresentMode,
    /// MSAA sample count; unsupported counts fall back to 1.
    pub sample_count: u32,
    pub power_preference: wgpu::PowerPreference,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            color_format: wgpu::TextureFormat::Bgra8Unorm,
            present_mode: wgpu::PresentMode::AutoVsync,
            sample_count: 1,
            power_preference: wgpu::PowerPreference::HighPerformance,
        }
    }
}

impl RendererConfig {
    /// Choose the swapchain format out of what the surface supports.
    pub fn pick_color_format(
        &self,
        supported: &[wgpu::TextureFormat],
    ) -> Option<wgpu::TextureFormat> {
        if supported.contains(&self.color_format) {
            Some(self.color_format)
        } else {
            supported.first().copied()
        }
    }
}
