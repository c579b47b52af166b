use std::path::PathBuf;

use anyhow::{anyhow, Result};

use crate::vulkan::constants::MAX_FRAMES_IN_FLIGHT;

pub const VALIDATION_VAR: &str = "HELLO_TRIANGLE_VALIDATION";
pub const SHADER_DIR_VAR: &str = "HELLO_TRIANGLE_SHADER_DIR";

/// Startup parameters for the engine.
///
/// Everything that used to be a process-wide constant (validation layers,
/// window size, shader locations) is decided here and handed to the renderer
/// when it is created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub validation: bool,
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,
    pub frames_in_flight: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: "Hello Triangle".to_string(),
            width: 800,
            height: 600,
            validation: cfg!(debug_assertions),
            vertex_shader: PathBuf::from("shaders/vert.spv"),
            fragment_shader: PathBuf::from("shaders/frag.spv"),
            frames_in_flight: MAX_FRAMES_IN_FLIGHT,
        }
    }
}

impl EngineConfig {
    /// Defaults with overrides taken from the process environment.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(VALIDATION_VAR) {
            self.validation = parse_flag(&value)
                .ok_or_else(|| anyhow!("Invalid value `{}` for {}.", value, VALIDATION_VAR))?;
        }

        if let Some(dir) = lookup(SHADER_DIR_VAR) {
            let dir = PathBuf::from(dir);
            self.vertex_shader = dir.join("vert.spv");
            self.fragment_shader = dir.join("frag.spv");
        }

        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_tutorial_window() {
        let config = EngineConfig::default();
        assert_eq!((config.width, config.height), (800, 600));
        assert_eq!(config.frames_in_flight, 2);
        assert_eq!(config.vertex_shader, PathBuf::from("shaders/vert.spv"));
    }

    #[test]
    fn no_overrides_keeps_defaults() {
        let mut config = EngineConfig::default();
        config.apply_overrides(lookup(&[])).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn validation_override_is_parsed() {
        let mut config = EngineConfig::default();
        config
            .apply_overrides(lookup(&[(VALIDATION_VAR, "off")]))
            .unwrap();
        assert!(!config.validation);

        config
            .apply_overrides(lookup(&[(VALIDATION_VAR, " TRUE ")]))
            .unwrap();
        assert!(config.validation);
    }

    #[test]
    fn invalid_validation_value_is_rejected() {
        let mut config = EngineConfig::default();
        let error = config
            .apply_overrides(lookup(&[(VALIDATION_VAR, "maybe")]))
            .unwrap_err();
        assert!(error.to_string().contains(VALIDATION_VAR));
    }

    #[test]
    fn shader_dir_moves_both_shaders() {
        let mut config = EngineConfig::default();
        config
            .apply_overrides(lookup(&[(SHADER_DIR_VAR, "/opt/shaders")]))
            .unwrap();
        assert_eq!(config.vertex_shader, PathBuf::from("/opt/shaders/vert.spv"));
        assert_eq!(config.fragment_shader, PathBuf::from("/opt/shaders/frag.spv"));
    }
}
