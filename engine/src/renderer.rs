use anyhow::Result;
use log::*;
use winit::window::Window;

use crate::config::EngineConfig;
use crate::vulkan::VulkanRenderer;

pub use crate::vulkan::FrameStatus;

pub struct Renderer {
    vk_renderer: VulkanRenderer,
}

impl Renderer {
    /// Creates the Vulkan renderer for `window`.
    pub unsafe fn create(window: &Window, config: &EngineConfig) -> Result<Self> {
        let vk_renderer = VulkanRenderer::new(window, config)?;

        Ok(Self { vk_renderer })
    }

    /// Renders a frame.
    pub unsafe fn render(&mut self) -> Result<FrameStatus> {
        let status = self.vk_renderer.render()?;
        if !matches!(status, FrameStatus::Presented(_)) {
            debug!("Frame skipped: {:?}.", status);
        }
        Ok(status)
    }

    pub unsafe fn wait_idle(&self) -> Result<()> {
        self.vk_renderer.device_wait_idle()
    }

    pub unsafe fn destroy(&mut self) {
        self.vk_renderer.destroy();
    }
}
