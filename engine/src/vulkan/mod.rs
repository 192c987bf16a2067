use anyhow::{anyhow, Result};
use command_buffer::VulkanCommandBuffer;
use context::VulkanContext;
use device::VulkanDevice;
use instance::VulkanInstance;
use log::*;
use pipeline::VulkanPipeline;
use swapchain::VulkanSwapchain;
use sync::{FrameSync, VulkanQueue};
use vulkanalia::{
    loader::{LibloadingLoader, LIBRARY},
    Entry,
};

use crate::config::EngineConfig;

pub use error::{ErrorKind, VulkanError};
pub use surface::SurfaceProvider;
pub use sync::FrameStatus;

mod command_buffer;
mod constants;
mod context;
mod device;
mod error;
mod framebuffer;
mod image;
mod instance;
mod pipeline;
mod render_pass;
mod shader;
mod surface;
mod swapchain;
mod sync;

pub const VALIDATION_ENABLED: bool = constants::VALIDATION_ENABLED;

/// Owns every Vulkan object of the renderer.
///
/// Construction fills `context` step by step; teardown walks it backwards and
/// skips whatever was never created, so a failed construction still cleans up.
pub struct VulkanRenderer {
    entry: Entry,
    instance: Option<VulkanInstance>,
    device: Option<VulkanDevice>,
    context: VulkanContext,
}

impl VulkanRenderer {
    pub unsafe fn new(provider: &dyn SurfaceProvider, config: &EngineConfig) -> Result<Self> {
        let loader = LibloadingLoader::new(LIBRARY)?;
        let entry = Entry::new(loader).map_err(|b| anyhow!("{}", b))?;

        let mut renderer = VulkanRenderer {
            entry,
            instance: None,
            device: None,
            context: VulkanContext::default(),
        };

        if let Err(err) = renderer.initialize(provider, config) {
            error!("Renderer initialization failed: {}", err);
            renderer.destroy();
            return Err(err);
        }
        info!("Renderer initialized.");

        Ok(renderer)
    }

    unsafe fn initialize(
        &mut self,
        provider: &dyn SurfaceProvider,
        config: &EngineConfig,
    ) -> Result<()> {
        let context = &mut self.context;

        let instance = self.instance.insert(VulkanInstance::new(
            provider,
            &self.entry,
            config.validation,
        )?);
        if config.validation {
            instance.create_messenger(context)?;
        }
        instance.create_surface(provider, context)?;

        let device = self.device.insert(VulkanDevice::new(
            &self.entry,
            instance,
            config.validation,
            context,
        )?);

        VulkanSwapchain::build(provider.framebuffer_size(), instance, device, context)?;
        VulkanPipeline::build(
            device,
            &config.vertex_shader,
            &config.fragment_shader,
            context,
        )?;
        VulkanCommandBuffer::build(device, context)?;
        FrameSync::create(device, context)?;

        Ok(())
    }

    /// Renders and presents one frame. Stale-surface frames are skipped, not failed.
    pub unsafe fn render(&mut self) -> Result<FrameStatus> {
        let device = self
            .device
            .as_ref()
            .ok_or_else(|| anyhow!("Renderer has been destroyed."))?;

        let queue = VulkanQueue {
            device: &device.vk_device,
            queue: self.context.graphics_queue,
            swapchain: self.context.chain.swapchain,
        };

        let status = self
            .context
            .sync
            .draw_frame(&queue, &self.context.resources.command_buffers)?;
        trace!("Frame finished: {:?}.", status);

        Ok(status)
    }

    /// Blocks until the GPU has finished all submitted work.
    pub unsafe fn device_wait_idle(&self) -> Result<()> {
        if let Some(device) = &self.device {
            device.wait_idle()?;
        }
        Ok(())
    }

    /// Releases everything in reverse creation order. Safe to call more than once.
    pub unsafe fn destroy(&mut self) {
        let context = std::mem::take(&mut self.context);

        if let Some(device) = self.device.take() {
            for release in context.device_releases() {
                trace!("Releasing {:?}.", release);
                device.release(release);
            }
            device.destroy();
        }

        if let Some(instance) = self.instance.take() {
            for release in context.instance_releases() {
                trace!("Releasing {:?}.", release);
                instance.release(release);
            }
            instance.destroy();
        }
    }
}

impl Drop for VulkanRenderer {
    fn drop(&mut self) {
        unsafe { self.destroy() }
    }
}
