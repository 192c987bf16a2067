use vulkanalia::prelude::v1_0::*;
use vulkanalia::window as vk_window;
use winit::window::Window;

/// Supplies the platform window the presentation surface is bound to.
pub trait SurfaceProvider {
    /// Instance extensions the platform needs to present to this window.
    fn required_extensions(&self) -> &'static [&'static vk::ExtensionName];

    /// Creates the platform surface for this window.
    unsafe fn create_surface(&self, instance: &Instance) -> VkResult<vk::SurfaceKHR>;

    /// Current framebuffer size in physical pixels.
    fn framebuffer_size(&self) -> (u32, u32);
}

impl SurfaceProvider for Window {
    fn required_extensions(&self) -> &'static [&'static vk::ExtensionName] {
        vk_window::get_required_instance_extensions(self)
    }

    unsafe fn create_surface(&self, instance: &Instance) -> VkResult<vk::SurfaceKHR> {
        vk_window::create_surface(instance, self, self)
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        let size = self.inner_size();
        (size.width, size.height)
    }
}
