use std::path::PathBuf;

use thiserror::Error;
use vulkanalia::vk;

use super::shader::ShaderError;

/// Broad failure classes shared by every construction step and the frame loop.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A driver query returned a non-success status or an empty list.
    Enumeration,
    /// No candidate satisfied the required predicate.
    Selection,
    /// A create call returned a non-success status.
    ResourceCreation,
    /// Host memory for a per-image sequence could not be reserved.
    Allocation,
    /// A non-recoverable acquire/submit/present failure in the frame loop.
    Frame,
}

#[derive(Debug, Error)]
pub enum VulkanError {
    #[error("Failed to enumerate {what}: {code}.")]
    Enumeration {
        what: &'static str,
        code: vk::ErrorCode,
    },
    #[error("No physical devices found.")]
    NoAcceleratorFound,
    #[error("No suitable physical device found.")]
    NoSuitableAccelerator,
    #[error("No queue family supports both graphics and presentation.")]
    NoSuitableQueueFamily,
    #[error("Failed to create logical device: {0}.")]
    DeviceCreationFailed(vk::ErrorCode),
    #[error("Surface negotiation failed: {query} {reason}.")]
    SurfaceNegotiationFailed {
        query: &'static str,
        reason: NegotiationFailure,
    },
    #[error("Failed to load shader `{}`: {source}", path.display())]
    ShaderLoadFailed {
        path: PathBuf,
        #[source]
        source: ShaderError,
    },
    #[error("Failed to create shader module: {0}.")]
    ShaderModuleCreationFailed(vk::ErrorCode),
    #[error("Failed to create pipeline layout: {0}.")]
    PipelineLayoutCreationFailed(vk::ErrorCode),
    #[error("Failed to create graphics pipeline: {0}.")]
    PipelineCreationFailed(vk::ErrorCode),
    #[error("Failed to create {what}: {code}.")]
    ResourceCreation {
        what: &'static str,
        code: vk::ErrorCode,
    },
    #[error("Failed to allocate host memory for {count} {what}.")]
    Allocation { what: &'static str, count: usize },
    #[error("Failed to {stage} frame: {code}.")]
    Frame {
        stage: &'static str,
        code: vk::ErrorCode,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NegotiationFailure {
    Empty,
    Status(vk::ErrorCode),
}

impl std::fmt::Display for NegotiationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NegotiationFailure::Empty => write!(f, "returned no entries"),
            NegotiationFailure::Status(code) => write!(f, "returned {}", code),
        }
    }
}

impl VulkanError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VulkanError::Enumeration { .. }
            | VulkanError::NoAcceleratorFound
            | VulkanError::SurfaceNegotiationFailed { .. }
            | VulkanError::ShaderLoadFailed { .. } => ErrorKind::Enumeration,
            VulkanError::NoSuitableAccelerator | VulkanError::NoSuitableQueueFamily => {
                ErrorKind::Selection
            }
            VulkanError::DeviceCreationFailed(_)
            | VulkanError::ShaderModuleCreationFailed(_)
            | VulkanError::PipelineLayoutCreationFailed(_)
            | VulkanError::PipelineCreationFailed(_)
            | VulkanError::ResourceCreation { .. } => ErrorKind::ResourceCreation,
            VulkanError::Allocation { .. } => ErrorKind::Allocation,
            VulkanError::Frame { .. } => ErrorKind::Frame,
        }
    }

    /// The driver status carried by this error, if any.
    pub fn code(&self) -> Option<vk::ErrorCode> {
        match self {
            VulkanError::Enumeration { code, .. }
            | VulkanError::ResourceCreation { code, .. }
            | VulkanError::Frame { code, .. }
            | VulkanError::DeviceCreationFailed(code)
            | VulkanError::ShaderModuleCreationFailed(code)
            | VulkanError::PipelineLayoutCreationFailed(code)
            | VulkanError::PipelineCreationFailed(code) => Some(*code),
            VulkanError::SurfaceNegotiationFailed {
                reason: NegotiationFailure::Status(code),
                ..
            } => Some(*code),
            _ => None,
        }
    }

    pub(crate) fn creation(what: &'static str) -> impl FnOnce(vk::ErrorCode) -> VulkanError {
        move |code| VulkanError::ResourceCreation { what, code }
    }

    pub(crate) fn enumeration(what: &'static str) -> impl FnOnce(vk::ErrorCode) -> VulkanError {
        move |code| VulkanError::Enumeration { what, code }
    }
}

/// Reserves room for exactly `count` handles, reporting failure instead of aborting.
pub(crate) fn reserve_handles<T>(what: &'static str, count: usize) -> Result<Vec<T>, VulkanError> {
    let mut handles = Vec::new();
    handles
        .try_reserve_exact(count)
        .map_err(|_| VulkanError::Allocation { what, count })?;
    Ok(handles)
}
