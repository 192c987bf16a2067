use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use log::*;
use thiserror::Error;
use vulkanalia::bytecode::Bytecode;
use vulkanalia::prelude::v1_0::*;

use super::device::VulkanDevice;
use super::error::VulkanError;

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("file not found")]
    FileNotFound,
    #[error("read {read} of {expected} bytes")]
    ShortRead { read: usize, expected: usize },
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("{0} bytes is not a whole number of SPIR-V words")]
    Misaligned(usize),
}

/// Reads a shader blob whole. Its byte length becomes the module's code size.
pub fn load_bytes(path: &Path) -> Result<Vec<u8>, ShaderError> {
    let mut file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ShaderError::FileNotFound,
        _ => ShaderError::Io(e),
    })?;

    let expected = file.metadata()?.len() as usize;
    let mut bytes = Vec::with_capacity(expected);
    let read = file.read_to_end(&mut bytes)?;
    if read < expected {
        return Err(ShaderError::ShortRead { read, expected });
    }

    Ok(bytes)
}

/// A shader module that only lives for the duration of one pipeline build.
pub struct TransientShaderModule<'a> {
    device: &'a VulkanDevice,
    pub module: vk::ShaderModule,
}

impl<'a> TransientShaderModule<'a> {
    pub unsafe fn load(device: &'a VulkanDevice, path: &Path) -> Result<Self, VulkanError> {
        let bytes = load_bytes(path).map_err(|source| VulkanError::ShaderLoadFailed {
            path: path.to_path_buf(),
            source,
        })?;

        let bytecode = Bytecode::new(&bytes).map_err(|_| VulkanError::ShaderLoadFailed {
            path: path.to_path_buf(),
            source: ShaderError::Misaligned(bytes.len()),
        })?;

        let info = vk::ShaderModuleCreateInfo::builder()
            .code_size(bytecode.code_size())
            .code(bytecode.code());

        let module = device
            .vk_device
            .create_shader_module(&info, None)
            .map_err(VulkanError::ShaderModuleCreationFailed)?;

        info!(
            "Shader module `{}` created ({} bytes).",
            path.display(),
            bytecode.code_size()
        );

        Ok(Self { device, module })
    }
}

impl Drop for TransientShaderModule<'_> {
    fn drop(&mut self) {
        unsafe {
            self.device
                .vk_device
                .destroy_shader_module(self.module, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn scratch_file(name: &str, contents: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "engine-shader-{}-{}",
            std::process::id(),
            name
        ));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_the_exact_bytes() {
        let contents = [0x03, 0x02, 0x23, 0x07, 0, 0, 1, 0];
        let path = scratch_file("exact.spv", &contents);

        let bytes = load_bytes(&path).unwrap();
        assert_eq!(bytes, contents);

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn missing_file_is_reported_as_not_found() {
        let path = std::env::temp_dir().join("engine-shader-does-not-exist.spv");
        assert!(matches!(load_bytes(&path), Err(ShaderError::FileNotFound)));
    }

    #[test]
    fn empty_file_loads_as_empty_blob() {
        let path = scratch_file("empty.spv", &[]);
        assert!(load_bytes(&path).unwrap().is_empty());
        fs::remove_file(path).unwrap();
    }
}
