use vulkanalia::vk::{self, Handle};

use super::command_buffer::FrameResources;
use super::pipeline::VulkanPipeline;
use super::swapchain::{PresentationChain, SwapchainMetadata};
use super::sync::FrameSync;

/// The Vulkan handles and associated properties used by the renderer.
///
/// Every handle starts out null and is filled in by the construction step that
/// owns it, so a partially initialized context can always be torn down.
#[derive(Clone, Debug, Default)]
pub struct VulkanContext {
    pub messenger: vk::DebugUtilsMessengerEXT,
    pub surface: vk::SurfaceKHR,
    pub physical_device: vk::PhysicalDevice,
    pub queue_family_index: u32,
    pub graphics_queue: vk::Queue,
    pub metadata: SwapchainMetadata,
    pub chain: PresentationChain,
    pub pipeline: VulkanPipeline,
    pub resources: FrameResources,
    pub sync: FrameSync,
}

/// A single handle to destroy during teardown.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Release {
    Fence(vk::Fence),
    Semaphore(vk::Semaphore),
    CommandPool(vk::CommandPool),
    Framebuffer(vk::Framebuffer),
    Pipeline(vk::Pipeline),
    PipelineLayout(vk::PipelineLayout),
    RenderPass(vk::RenderPass),
    ImageView(vk::ImageView),
    Swapchain(vk::SwapchainKHR),
    Surface(vk::SurfaceKHR),
    Messenger(vk::DebugUtilsMessengerEXT),
}

fn push<H: Handle + Copy>(plan: &mut Vec<Release>, handle: H, release: fn(H) -> Release) {
    if !handle.is_null() {
        plan.push(release(handle));
    }
}

impl VulkanContext {
    /// Device-owned handles in exact reverse creation order, skipping any never created.
    ///
    /// Command buffers are freed with their pool and swapchain images with their
    /// swapchain, so neither appears here.
    pub fn device_releases(&self) -> Vec<Release> {
        let mut plan = Vec::new();

        push(&mut plan, self.sync.in_flight, Release::Fence);
        for semaphore in self.sync.render_finished.iter().rev() {
            push(&mut plan, *semaphore, Release::Semaphore);
        }
        push(&mut plan, self.sync.image_available, Release::Semaphore);

        push(&mut plan, self.resources.command_pool, Release::CommandPool);
        for framebuffer in self.resources.framebuffers.iter().rev() {
            push(&mut plan, *framebuffer, Release::Framebuffer);
        }

        push(&mut plan, self.pipeline.pipeline, Release::Pipeline);
        push(&mut plan, self.pipeline.pipeline_layout, Release::PipelineLayout);
        push(&mut plan, self.pipeline.render_pass, Release::RenderPass);

        for view in self.chain.image_views.iter().rev() {
            push(&mut plan, *view, Release::ImageView);
        }
        push(&mut plan, self.chain.swapchain, Release::Swapchain);

        plan
    }

    /// Instance-owned handles, released after the device is gone.
    pub fn instance_releases(&self) -> Vec<Release> {
        let mut plan = Vec::new();
        push(&mut plan, self.surface, Release::Surface);
        push(&mut plan, self.messenger, Release::Messenger);
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn built_through_pipeline() -> VulkanContext {
        let mut context = VulkanContext::default();
        context.messenger = vk::DebugUtilsMessengerEXT::from_raw(1);
        context.surface = vk::SurfaceKHR::from_raw(2);
        context.chain.swapchain = vk::SwapchainKHR::from_raw(3);
        context.chain.images = vec![vk::Image::from_raw(4), vk::Image::from_raw(5)];
        context.chain.image_views = vec![vk::ImageView::from_raw(6), vk::ImageView::from_raw(7)];
        context.pipeline.render_pass = vk::RenderPass::from_raw(8);
        context.pipeline.pipeline_layout = vk::PipelineLayout::from_raw(9);
        context.pipeline.pipeline = vk::Pipeline::from_raw(10);
        context
    }

    #[test]
    fn empty_context_releases_nothing() {
        let context = VulkanContext::default();
        assert!(context.device_releases().is_empty());
        assert!(context.instance_releases().is_empty());
    }

    #[test]
    fn unbuilt_frame_state_is_skipped_and_the_rest_released_in_reverse() {
        let context = built_through_pipeline();

        assert_eq!(
            context.device_releases(),
            vec![
                Release::Pipeline(vk::Pipeline::from_raw(10)),
                Release::PipelineLayout(vk::PipelineLayout::from_raw(9)),
                Release::RenderPass(vk::RenderPass::from_raw(8)),
                Release::ImageView(vk::ImageView::from_raw(7)),
                Release::ImageView(vk::ImageView::from_raw(6)),
                Release::Swapchain(vk::SwapchainKHR::from_raw(3)),
            ]
        );
        assert_eq!(
            context.instance_releases(),
            vec![
                Release::Surface(vk::SurfaceKHR::from_raw(2)),
                Release::Messenger(vk::DebugUtilsMessengerEXT::from_raw(1)),
            ]
        );
    }

    #[test]
    fn fully_built_context_releases_sync_objects_first() {
        let mut context = built_through_pipeline();
        context.resources.framebuffers =
            vec![vk::Framebuffer::from_raw(11), vk::Framebuffer::from_raw(12)];
        context.resources.command_pool = vk::CommandPool::from_raw(13);
        context.resources.command_buffers =
            vec![vk::CommandBuffer::from_raw(14), vk::CommandBuffer::from_raw(15)];
        context.sync.image_available = vk::Semaphore::from_raw(16);
        context.sync.render_finished =
            vec![vk::Semaphore::from_raw(17), vk::Semaphore::from_raw(18)];
        context.sync.in_flight = vk::Fence::from_raw(19);

        let plan = context.device_releases();
        assert_eq!(
            plan[..6],
            [
                Release::Fence(vk::Fence::from_raw(19)),
                Release::Semaphore(vk::Semaphore::from_raw(18)),
                Release::Semaphore(vk::Semaphore::from_raw(17)),
                Release::Semaphore(vk::Semaphore::from_raw(16)),
                Release::CommandPool(vk::CommandPool::from_raw(13)),
                Release::Framebuffer(vk::Framebuffer::from_raw(12)),
            ]
        );
        assert_eq!(plan.len(), 13);
        assert_eq!(
            plan.last(),
            Some(&Release::Swapchain(vk::SwapchainKHR::from_raw(3)))
        );
    }

    #[test]
    fn partially_created_sequences_only_release_what_exists() {
        let mut context = VulkanContext::default();
        context.chain.swapchain = vk::SwapchainKHR::from_raw(3);
        context.chain.image_views = vec![vk::ImageView::from_raw(6)];
        context.sync.image_available = vk::Semaphore::from_raw(16);
        context.sync.render_finished = vec![vk::Semaphore::from_raw(17)];

        assert_eq!(
            context.device_releases(),
            vec![
                Release::Semaphore(vk::Semaphore::from_raw(17)),
                Release::Semaphore(vk::Semaphore::from_raw(16)),
                Release::ImageView(vk::ImageView::from_raw(6)),
                Release::Swapchain(vk::SwapchainKHR::from_raw(3)),
            ]
        );
    }
}
