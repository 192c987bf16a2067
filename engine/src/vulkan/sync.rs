use anyhow::Result;
use log::*;
use vulkanalia::prelude::v1_0::*;
use vulkanalia::vk::KhrSwapchainExtension;
use vulkanalia::{VkResult, VkSuccessResult};

use super::context::VulkanContext;
use super::device::VulkanDevice;
use super::error::{reserve_handles, VulkanError};

/// Synchronization for a single frame in flight.
///
/// `image_available` is signaled by acquire and waited on by submit,
/// `render_finished[i]` is signaled by submit and waited on by the present of
/// image `i`, and `in_flight` is signaled when the GPU finishes the frame.
#[derive(Clone, Debug, Default)]
pub struct FrameSync {
    pub image_available: vk::Semaphore,
    pub render_finished: Vec<vk::Semaphore>,
    pub in_flight: vk::Fence,
}

/// How one pass through the frame protocol ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrameStatus {
    /// The image was rendered and queued for presentation.
    Presented(u32),
    /// The surface is stale; nothing was submitted this pass.
    SkippedAcquire,
    /// The image was rendered but the surface went stale before presentation.
    SkippedPresent(u32),
}

/// The queue operations the frame protocol is built from.
pub trait FrameQueue {
    /// Blocks until `fence` is signaled.
    unsafe fn wait_for_fence(&self, fence: vk::Fence) -> VkResult<()>;
    unsafe fn reset_fence(&self, fence: vk::Fence) -> VkResult<()>;
    /// Requests the next presentable image, signaling `signal` once it is free.
    unsafe fn acquire_next_image(&self, signal: vk::Semaphore) -> VkSuccessResult<u32>;
    unsafe fn submit(
        &self,
        command_buffer: vk::CommandBuffer,
        wait: vk::Semaphore,
        signal: vk::Semaphore,
        fence: vk::Fence,
    ) -> VkResult<()>;
    unsafe fn present(&self, image_index: u32, wait: vk::Semaphore)
        -> VkResult<vk::SuccessCode>;
}

impl FrameSync {
    pub unsafe fn create(device: &VulkanDevice, context: &mut VulkanContext) -> Result<()> {
        let semaphore_info = vk::SemaphoreCreateInfo::builder();
        let fence_info = vk::FenceCreateInfo::builder().flags(vk::FenceCreateFlags::SIGNALED);
        let image_count = context.chain.images.len();

        context.sync.image_available = device
            .vk_device
            .create_semaphore(&semaphore_info, None)
            .map_err(VulkanError::creation("image available semaphore"))?;
        info!("Image available semaphore created.");

        context.sync.render_finished = reserve_handles("render finished semaphores", image_count)?;
        for _ in 0..image_count {
            let semaphore = device
                .vk_device
                .create_semaphore(&semaphore_info, None)
                .map_err(VulkanError::creation("render finished semaphore"))?;
            context.sync.render_finished.push(semaphore);
        }
        info!("Created {} render finished semaphores.", image_count);

        // Starts signaled so the first frame does not wait forever.
        context.sync.in_flight = device
            .vk_device
            .create_fence(&fence_info, None)
            .map_err(VulkanError::creation("in-flight fence"))?;
        info!("In-flight fence created.");

        Ok(())
    }

    /// Runs one wait → acquire → submit → present pass.
    ///
    /// The fence is only reset once an image has been acquired, so a stale
    /// acquire leaves it signaled for the next pass.
    pub unsafe fn draw_frame<Q: FrameQueue>(
        &self,
        queue: &Q,
        command_buffers: &[vk::CommandBuffer],
    ) -> Result<FrameStatus, VulkanError> {
        queue
            .wait_for_fence(self.in_flight)
            .map_err(frame_error("wait for"))?;

        let image_index = match queue.acquire_next_image(self.image_available) {
            Ok((index, vk::SuccessCode::SUBOPTIMAL_KHR)) => {
                debug!("Acquired suboptimal swapchain image {}.", index);
                index
            }
            Ok((index, _)) => index,
            Err(vk::ErrorCode::OUT_OF_DATE_KHR) => {
                info!("Swapchain out of date, skipping frame.");
                return Ok(FrameStatus::SkippedAcquire);
            }
            Err(code) => return Err(frame_error("acquire image for")(code)),
        };

        let slot = image_index as usize;
        let (command_buffer, render_finished) =
            match (command_buffers.get(slot), self.render_finished.get(slot)) {
                (Some(command_buffer), Some(render_finished)) => {
                    (*command_buffer, *render_finished)
                }
                _ => {
                    return Err(VulkanError::Frame {
                        stage: "index resources for",
                        code: vk::ErrorCode::UNKNOWN,
                    })
                }
            };

        queue
            .reset_fence(self.in_flight)
            .map_err(frame_error("reset fence for"))?;

        queue
            .submit(
                command_buffer,
                self.image_available,
                render_finished,
                self.in_flight,
            )
            .map_err(frame_error("submit"))?;

        match queue.present(image_index, render_finished) {
            Ok(vk::SuccessCode::SUBOPTIMAL_KHR) | Err(vk::ErrorCode::OUT_OF_DATE_KHR) => {
                info!("Swapchain out of date, not recreating.");
                Ok(FrameStatus::SkippedPresent(image_index))
            }
            Ok(_) => Ok(FrameStatus::Presented(image_index)),
            Err(code) => Err(frame_error("present")(code)),
        }
    }
}

fn frame_error(stage: &'static str) -> impl FnOnce(vk::ErrorCode) -> VulkanError {
    move |code| VulkanError::Frame { stage, code }
}

/// The graphics queue and swapchain of a fully built renderer.
pub struct VulkanQueue<'a> {
    pub device: &'a Device,
    pub queue: vk::Queue,
    pub swapchain: vk::SwapchainKHR,
}

impl FrameQueue for VulkanQueue<'_> {
    unsafe fn wait_for_fence(&self, fence: vk::Fence) -> VkResult<()> {
        self.device.wait_for_fences(&[fence], true, u64::MAX)?;
        Ok(())
    }

    unsafe fn reset_fence(&self, fence: vk::Fence) -> VkResult<()> {
        self.device.reset_fences(&[fence])
    }

    unsafe fn acquire_next_image(&self, signal: vk::Semaphore) -> VkSuccessResult<u32> {
        self.device
            .acquire_next_image_khr(self.swapchain, u64::MAX, signal, vk::Fence::null())
    }

    unsafe fn submit(
        &self,
        command_buffer: vk::CommandBuffer,
        wait: vk::Semaphore,
        signal: vk::Semaphore,
        fence: vk::Fence,
    ) -> VkResult<()> {
        let wait_semaphores = &[wait];
        let wait_stages = &[vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = &[command_buffer];
        let signal_semaphores = &[signal];
        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(wait_semaphores)
            .wait_dst_stage_mask(wait_stages)
            .command_buffers(command_buffers)
            .signal_semaphores(signal_semaphores);

        self.device.queue_submit(self.queue, &[submit_info], fence)
    }

    unsafe fn present(
        &self,
        image_index: u32,
        wait: vk::Semaphore,
    ) -> VkResult<vk::SuccessCode> {
        let wait_semaphores = &[wait];
        let swapchains = &[self.swapchain];
        let image_indices = &[image_index];
        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(wait_semaphores)
            .swapchains(swapchains)
            .image_indices(image_indices);

        self.device.queue_present_khr(self.queue, &present_info)
    }
}
