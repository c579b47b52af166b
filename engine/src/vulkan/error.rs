use std::io;
use std::path::PathBuf;

use thiserror::Error;
use vulkanalia::vk;

/// Fatal failures raised while setting up or driving the renderer.
#[derive(Debug, Error)]
pub enum VulkanError {
    #[error("Missing {0}.")]
    Suitability(&'static str),
    #[error("Failed to find suitable physical device.")]
    NoSuitableDevice,
    #[error("Validation layer requested but not supported.")]
    ValidationLayerUnavailable,
    #[error("Failed to find suitable memory type.")]
    NoMemoryType,
    #[error("Failed to {operation}: {code}")]
    Call {
        operation: &'static str,
        code: vk::ErrorCode,
    },
    #[error("Failed to load shader `{}`", path.display())]
    Shader {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Tags a raw driver result with the operation that produced it.
pub trait VkResultExt<T> {
    fn check(self, operation: &'static str) -> Result<T, VulkanError>;
}

impl<T> VkResultExt<T> for Result<T, vk::ErrorCode> {
    fn check(self, operation: &'static str) -> Result<T, VulkanError> {
        self.map_err(|code| VulkanError::Call { operation, code })
    }
}
