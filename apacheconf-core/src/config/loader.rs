//! Configuration loader

use crate::config::TreeConfig;
use crate::error::{Error, Result};
use std::path::Path;

/// Configuration loader for various formats
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<TreeConfig> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let config = match ext {
            "json" => Self::from_json(&content)?,
            "toml" | "" => Self::from_toml(&content)?,
            _ => return Err(Error::Config(format!("Unknown config format: {}", ext))),
        };

        tracing::debug!(
            "Loaded tree config from {}: {} conditional blocks, {} modules, {} defines",
            path.display(),
            config.activation.conditional_blocks.len(),
            config.activation.loaded_modules.len(),
            config.activation.defines.len()
        );
        Ok(config)
    }

    /// Parse JSON configuration
    pub fn from_json(content: &str) -> Result<TreeConfig> {
        serde_json::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid JSON: {}", e)))
    }

    /// Parse TOML configuration
    pub fn from_toml(content: &str) -> Result<TreeConfig> {
        toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_loading() {
        let json = r#"{"activation": {"loaded_modules": ["ssl_module"]}}"#;
        let config = ConfigLoader::from_json(json).unwrap();
        assert!(config.activation.loaded_modules.contains("ssl_module"));
        // Unspecified fields fall back to the defaults
        assert!(config.activation.is_conditional("IfModule"));
    }

    #[test]
    fn test_toml_loading() {
        let toml = r#"
            [activation]
            conditional_blocks = ["IfModule"]
            defines = ["SSL"]
        "#;
        let config = ConfigLoader::from_toml(toml).unwrap();
        assert_eq!(config.activation.conditional_blocks, vec!["IfModule".to_string()]);
        assert!(!config.activation.is_conditional("IfDefine"));
        assert!(config.activation.defines.contains("SSL"));
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = ConfigLoader::from_toml("").unwrap();
        assert_eq!(config, TreeConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.toml");
        std::fs::write(&path, "[activation]\nloaded_modules = [\"mod_ssl.c\"]\n").unwrap();

        let config = ConfigLoader::load(&path).unwrap();
        assert!(config.activation.is_active("IfModule", &["ssl_module".to_string()]));
    }

    #[test]
    fn test_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.yaml");
        std::fs::write(&path, "").unwrap();
        assert!(matches!(ConfigLoader::load(&path), Err(Error::Config(_))));
    }
}
