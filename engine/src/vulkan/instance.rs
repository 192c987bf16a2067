use anyhow::{anyhow, Result};
use log::*;
use std::collections::HashSet;
use std::ffi::CStr;
use std::os::raw::c_void;
use vulkanalia::prelude::v1_0::*;
use vulkanalia::vk::ExtDebugUtilsExtension;
use vulkanalia::vk::KhrSurfaceExtension;

use super::constants;
use super::context::{Release, VulkanContext};
use super::error::VulkanError;
use super::surface::SurfaceProvider;

#[derive(Debug)]
pub struct VulkanInstance {
    pub vk_instance: Instance,
}

impl VulkanInstance {
    pub unsafe fn new(
        provider: &dyn SurfaceProvider,
        entry: &Entry,
        validation: bool,
    ) -> Result<VulkanInstance> {
        // Application Info
        let application_info = vk::ApplicationInfo::builder()
            .application_name(b"Hello Triangle\0")
            .application_version(vk::make_version(1, 0, 0))
            .engine_name(b"No Engine\0")
            .engine_version(vk::make_version(1, 0, 0))
            .api_version(vk::make_version(1, 2, 0));

        // Layers
        let available_layers = entry
            .enumerate_instance_layer_properties()
            .map_err(VulkanError::enumeration("instance layers"))?
            .iter()
            .map(|l| l.layer_name)
            .collect::<HashSet<_>>();

        if validation && !available_layers.contains(&constants::VALIDATION_LAYER) {
            return Err(anyhow!("Validation layer requested but not supported."));
        }

        let layers = if validation {
            vec![constants::VALIDATION_LAYER.as_ptr()]
        } else {
            Vec::new()
        };

        // Extensions
        let required = provider.required_extensions();
        info!("Window requires {} instance extensions:", required.len());
        for extension in required {
            info!("  - {}", extension);
        }

        let mut extensions = required.iter().map(|e| e.as_ptr()).collect::<Vec<_>>();

        // Required by Vulkan SDK on macOS since 1.3.216.
        let flags = if cfg!(target_os = "macos")
            && entry.version()? >= constants::PORTABILITY_MACOS_VERSION
        {
            info!("Enabling extensions for macOS portability.");
            extensions.push(
                vk::KHR_GET_PHYSICAL_DEVICE_PROPERTIES2_EXTENSION
                    .name
                    .as_ptr(),
            );
            extensions.push(vk::KHR_PORTABILITY_ENUMERATION_EXTENSION.name.as_ptr());
            vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR
        } else {
            vk::InstanceCreateFlags::empty()
        };

        if validation {
            extensions.push(vk::EXT_DEBUG_UTILS_EXTENSION.name.as_ptr());
        }

        // Create
        let mut info = vk::InstanceCreateInfo::builder()
            .application_info(&application_info)
            .enabled_layer_names(&layers)
            .enabled_extension_names(&extensions)
            .flags(flags);

        // Instance creation and destruction are covered by chaining the messenger info.
        let mut debug_info = debug_messenger_info();
        if validation {
            info = info.push_next(&mut debug_info);
        }

        let instance = entry
            .create_instance(&info, None)
            .map_err(VulkanError::creation("instance"))?;
        info!("Vulkan instance created.");

        Ok(VulkanInstance {
            vk_instance: instance,
        })
    }

    pub unsafe fn create_messenger(&self, context: &mut VulkanContext) -> Result<()> {
        context.messenger = self
            .vk_instance
            .create_debug_utils_messenger_ext(&debug_messenger_info(), None)
            .map_err(VulkanError::creation("debug messenger"))?;
        info!("Debug messenger created.");

        Ok(())
    }

    pub unsafe fn create_surface(
        &self,
        provider: &dyn SurfaceProvider,
        context: &mut VulkanContext,
    ) -> Result<()> {
        context.surface = provider
            .create_surface(&self.vk_instance)
            .map_err(VulkanError::creation("window surface"))?;
        info!("Window surface created.");

        Ok(())
    }

    /// Releases an instance-level handle. Device-level handles are ignored.
    pub unsafe fn release(&self, release: Release) {
        match release {
            Release::Surface(surface) => self.vk_instance.destroy_surface_khr(surface, None),
            Release::Messenger(messenger) => self
                .vk_instance
                .destroy_debug_utils_messenger_ext(messenger, None),
            other => warn!("Instance cannot release {:?}.", other),
        }
    }

    pub unsafe fn destroy(&self) {
        self.vk_instance.destroy_instance(None);
        info!("Vulkan instance destroyed.");
    }
}

fn debug_messenger_info() -> vk::DebugUtilsMessengerCreateInfoEXTBuilder<'static> {
    vk::DebugUtilsMessengerCreateInfoEXT::builder()
        .message_severity(vk::DebugUtilsMessageSeverityFlagsEXT::all())
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .user_callback(Some(debug_callback))
}

extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    type_: vk::DebugUtilsMessageTypeFlagsEXT,
    data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _: *mut c_void,
) -> vk::Bool32 {
    let data = unsafe { *data };
    let message = unsafe { CStr::from_ptr(data.message) }.to_string_lossy();

    if severity >= vk::DebugUtilsMessageSeverityFlagsEXT::ERROR {
        error!("({:?}) {}", type_, message);
    } else if severity >= vk::DebugUtilsMessageSeverityFlagsEXT::WARNING {
        warn!("({:?}) {}", type_, message);
    } else if severity >= vk::DebugUtilsMessageSeverityFlagsEXT::INFO {
        debug!("({:?}) {}", type_, message);
    } else {
        trace!("({:?}) {}", type_, message);
    }

    vk::FALSE
}
