use std::path::{Path, PathBuf};

use crate::vulkan::VALIDATION_ENABLED;

/// Window and renderer settings fixed at startup.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,
    pub validation: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            title: String::from("Hello Vulkan"),
            width: 640,
            height: 480,
            vertex_shader: PathBuf::from("shaders/vert.spv"),
            fragment_shader: PathBuf::from("shaders/frag.spv"),
            validation: VALIDATION_ENABLED,
        }
    }
}

impl EngineConfig {
    /// Looks for `vert.spv` and `frag.spv` inside `dir`.
    pub fn with_shader_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        self.vertex_shader = dir.join("vert.spv");
        self.fragment_shader = dir.join("frag.spv");
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_demo_window() {
        let config = EngineConfig::default();

        assert_eq!(config.title, "Hello Vulkan");
        assert_eq!((config.width, config.height), (640, 480));
        assert_eq!(config.vertex_shader, Path::new("shaders/vert.spv"));
        assert_eq!(config.fragment_shader, Path::new("shaders/frag.spv"));
        assert_eq!(config.validation, cfg!(debug_assertions));
    }

    #[test]
    fn shader_dir_replaces_both_paths() {
        let config = EngineConfig::default().with_shader_dir("/opt/triangle/shaders");

        assert_eq!(
            config.vertex_shader,
            Path::new("/opt/triangle/shaders/vert.spv")
        );
        assert_eq!(
            config.fragment_shader,
            Path::new("/opt/triangle/shaders/frag.spv")
        );
        assert_eq!(config.title, "Hello Vulkan");
    }
}
