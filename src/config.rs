use crate::error::{Result, VaeError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Architecture configuration shared by [`VAE`](crate::models::VAE) and
/// [`CVAE`](crate::models::CVAE), loaded from a TOML or JSON file.
///
/// Missing fields fall back to the MNIST defaults: 28x28 inputs, three
/// hidden layers of width 600, a 15-dimensional latent space and 10 classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaeConfig {
    /// Flattened input width, `image_height * image_width`.
    pub input_size: usize,
    pub image_height: usize,
    pub image_width: usize,
    /// Latent dimension Z.
    pub latent_size: usize,
    /// Width H_d of every hidden layer.
    pub hidden_dim: usize,
    /// Number of hidden layers in both encoder and decoder.
    pub hidden_layers: usize,
    /// Number of classes C used by the conditional model.
    pub num_classes: usize,
}

impl Default for VaeConfig {
    fn default() -> Self {
        Self {
            input_size: 28 * 28,
            image_height: 28,
            image_width: 28,
            latent_size: 15,
            hidden_dim: 600,
            hidden_layers: 3,
            num_classes: 10,
        }
    }
}

impl VaeConfig {
    /// Load configuration from the given path. Supports TOML or JSON based on
    /// the file extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let cfg: Self = if path.extension().and_then(|e| e.to_str()) == Some("json") {
            serde_json::from_str(&content)?
        } else {
            toml::from_str(&content)?
        };
        cfg.validate()?;
        crate::debug!("loaded config from {}: {:?}", path.display(), cfg);
        Ok(cfg)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject zero-sized layers and an input width that disagrees with the
    /// image dimensions.
    pub fn validate(&self) -> Result<()> {
        let dims = [
            ("input_size", self.input_size),
            ("latent_size", self.latent_size),
            ("hidden_dim", self.hidden_dim),
            ("hidden_layers", self.hidden_layers),
            ("num_classes", self.num_classes),
        ];
        for (name, v) in dims {
            if v == 0 {
                return Err(VaeError::InvalidConfig(format!("{name} must be non-zero")));
            }
        }
        if self.image_height * self.image_width != self.input_size {
            return Err(VaeError::InvalidConfig(format!(
                "input_size {} does not match image {}x{}",
                self.input_size, self.image_height, self.image_width
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_mnist_architecture() {
        let cfg = VaeConfig::default();
        assert_eq!(cfg.input_size, 784);
        assert_eq!(cfg.hidden_dim, 600);
        assert_eq!(cfg.latent_size, 15);
        assert_eq!(cfg.num_classes, 10);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = VaeConfig::from_toml_str("latent_size = 2\nhidden_dim = 64\n").unwrap();
        assert_eq!(cfg.latent_size, 2);
        assert_eq!(cfg.hidden_dim, 64);
        assert_eq!(cfg.input_size, 784);
    }

    #[test]
    fn rejects_inconsistent_image_size() {
        let err = VaeConfig::from_toml_str("input_size = 100").unwrap_err();
        assert!(matches!(err, VaeError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_zero_latent() {
        let cfg = VaeConfig {
            latent_size: 0,
            ..VaeConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn loads_json_by_extension() {
        let path = std::env::temp_dir().join(format!("vae_cfg_{}.json", std::process::id()));
        fs::write(&path, r#"{"latent_size": 4, "num_classes": 3}"#).unwrap();
        let cfg = VaeConfig::from_path(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(cfg.latent_size, 4);
        assert_eq!(cfg.num_classes, 3);
    }
}
