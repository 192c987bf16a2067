use vulkanalia::{vk, Version};

pub const PORTABILITY_MACOS_VERSION: Version = Version::new(1, 3, 216);
pub const VALIDATION_ENABLED: bool = cfg!(debug_assertions);
pub const VALIDATION_LAYER: vk::ExtensionName =
    vk::ExtensionName::from_bytes(b"VK_LAYER_KHRONOS_validation");

pub const PREFERRED_SURFACE_FORMAT: vk::Format = vk::Format::B8G8R8A8_SRGB;
pub const PREFERRED_COLOR_SPACE: vk::ColorSpaceKHR = vk::ColorSpaceKHR::SRGB_NONLINEAR;
pub const PREFERRED_PRESENT_MODE: vk::PresentModeKHR = vk::PresentModeKHR::MAILBOX;
pub const FALLBACK_PRESENT_MODE: vk::PresentModeKHR = vk::PresentModeKHR::FIFO;

/// Physical device types in order of preference. `OTHER` is never selected.
pub const DEVICE_TYPE_PREFERENCE: [vk::PhysicalDeviceType; 4] = [
    vk::PhysicalDeviceType::DISCRETE_GPU,
    vk::PhysicalDeviceType::INTEGRATED_GPU,
    vk::PhysicalDeviceType::VIRTUAL_GPU,
    vk::PhysicalDeviceType::CPU,
];

pub const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 1.0, 1.0];
pub const TRIANGLE_VERTEX_COUNT: u32 = 3;
pub const SHADER_ENTRY_POINT: &[u8] = b"main\0";
