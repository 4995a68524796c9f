//! Saving and loading the policy network
//!
//! Two formats are understood:
//!
//! - Burn: `<stem>.mpk` holds the weights (named MessagePack record, full
//!   precision) and `<stem>.meta.json` holds [`ModelMetadata`]. The metadata
//!   is read first so the network can be rebuilt with the right shape before
//!   the weights are loaded into it.
//! - PyTorch: a `.pt`/`.pth` state dict of the original `DQN` module
//!   (`layer1`, `layer2`, `layer3`). The shape is read back from the weights.

use anyhow::{Context, Result, anyhow};
use burn::{
    module::Module,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
    tensor::backend::Backend,
};
use burn_import::pytorch::{LoadArgs, PyTorchFileRecorder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::network::{DqnConfig, DqnNetwork};

/// Metadata saved with the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Network shape
    pub network: DqnConfig,

    /// Version of the crate that wrote the file
    pub version: String,
}

impl ModelMetadata {
    pub fn new(network: DqnConfig) -> Self {
        Self {
            network,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// On-disk model formats, told apart by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Burn,
    PyTorch,
}

impl ModelFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("pt") | Some("pth") => ModelFormat::PyTorch,
            _ => ModelFormat::Burn,
        }
    }
}

/// Path of the metadata file that accompanies `path`
pub fn metadata_path(path: &Path) -> PathBuf {
    path.with_extension("meta.json")
}

/// Save a network and its metadata, creating parent directories as needed
pub fn save_network<B: Backend>(
    network: &DqnNetwork<B>,
    config: &DqnConfig,
    path: &Path,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    recorder
        .record(network.clone().into_record(), path.to_path_buf())
        .context("Failed to save network weights")?;

    let meta_path = metadata_path(path);
    let meta_json = serde_json::to_string_pretty(&ModelMetadata::new(config.clone()))
        .context("Failed to serialize metadata")?;
    std::fs::write(&meta_path, meta_json)
        .with_context(|| format!("Failed to write metadata to {:?}", meta_path))?;

    Ok(())
}

/// Load a trained network and its metadata.
///
/// Fails if either file is missing or unreadable, or if the metadata
/// describes a network that does not take the game's 5 features and
/// score its 4 actions.
pub fn load_network<B: Backend>(
    path: &Path,
    device: &B::Device,
) -> Result<(DqnNetwork<B>, ModelMetadata)> {
    let meta_path = metadata_path(path);
    let meta_json = std::fs::read_to_string(&meta_path)
        .with_context(|| format!("Failed to read metadata from {:?}", meta_path))?;
    let metadata: ModelMetadata =
        serde_json::from_str(&meta_json).context("Failed to deserialize metadata")?;

    metadata
        .network
        .validate()
        .map_err(|reason| anyhow!("Incompatible model {:?}: {}", path, reason))?;

    let network = metadata.network.init::<B>(device);
    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    let record = recorder
        .load(path.to_path_buf(), device)
        .with_context(|| format!("Failed to load network weights from {:?}", path))?;

    Ok((network.load_record(record), metadata))
}

/// Load a PyTorch state dict of the trained `DQN` module.
///
/// Linear weights are transposed from PyTorch's `[out, in]` layout by the
/// recorder. Fails if the file cannot be read or if the layers do not map
/// the game's 5 features onto its 4 actions.
pub fn load_pytorch_network<B: Backend>(
    path: &Path,
    device: &B::Device,
) -> Result<(DqnNetwork<B>, DqnConfig)> {
    let record = PyTorchFileRecorder::<FullPrecisionSettings>::default()
        .load(LoadArgs::new(path.to_path_buf()), device)
        .with_context(|| format!("Failed to load PyTorch weights from {:?}", path))?;

    let network = DqnConfig::default().init::<B>(device).load_record(record);
    let shape = network
        .shape()
        .and_then(|shape| shape.validate().map(|()| shape))
        .map_err(|reason| anyhow!("Incompatible model {:?}: {}", path, reason))?;

    Ok((network, shape))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::backend::{InferenceBackend, default_device};
    use crate::policy::features::FeatureVector;
    use std::io::Write;
    use tempfile::TempDir;

    fn pytorch_fixture() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/dqn_model.pt")
    }

    #[test]
    fn test_metadata_serialization() {
        let metadata = ModelMetadata::new(DqnConfig::default());
        let json = serde_json::to_string(&metadata).unwrap();
        let deserialized: ModelMetadata = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized, metadata);
        assert_eq!(deserialized.network.hidden_dim, 128);
    }

    #[test]
    fn test_save_and_load_preserves_outputs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("models").join("snake.mpk");
        let device = default_device();
        let config = DqnConfig::default();
        let network = config.init::<InferenceBackend>(&device);

        save_network(&network, &config, &path).unwrap();
        assert!(metadata_path(&path).exists());

        let (loaded, metadata) = load_network::<InferenceBackend>(&path, &device).unwrap();
        assert_eq!(metadata.network, config);

        let features = FeatureVector([0.0, 1.0, 1.0, 0.0, 4.0]);
        let expected = network.infer(&features, &device).unwrap();
        let actual = loaded.infer(&features, &device).unwrap();
        for (a, b) in expected.iter().zip(actual.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_load_missing_model() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.mpk");

        let result = load_network::<InferenceBackend>(&path, &default_device());
        assert!(result.is_err());
    }

    #[test]
    fn test_load_rejects_incompatible_shape() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("wide.mpk");
        let device = default_device();
        let config = DqnConfig {
            n_observations: 55,
            ..Default::default()
        };
        let network = config.init::<InferenceBackend>(&device);
        save_network(&network, &config, &path).unwrap();

        let err = load_network::<InferenceBackend>(&path, &device).unwrap_err();
        assert!(err.to_string().contains("Incompatible model"));
    }

    #[test]
    fn test_model_format_from_extension() {
        assert_eq!(ModelFormat::from_path(Path::new("best.pt")), ModelFormat::PyTorch);
        assert_eq!(ModelFormat::from_path(Path::new("a/b.pth")), ModelFormat::PyTorch);
        assert_eq!(ModelFormat::from_path(Path::new("snake.mpk")), ModelFormat::Burn);
        assert_eq!(ModelFormat::from_path(Path::new("snake")), ModelFormat::Burn);
    }

    #[test]
    fn test_load_pytorch_state_dict() {
        let device = default_device();

        let (network, shape) =
            load_pytorch_network::<InferenceBackend>(&pytorch_fixture(), &device).unwrap();
        assert_eq!(shape, DqnConfig::default());

        // reference scores computed from the same weights outside of burn
        let cases = [
            (
                FeatureVector([1.0, 0.0, 0.0, 1.0, 3.0]),
                [0.048249, -0.344861, -0.698105, -0.688791],
            ),
            (
                FeatureVector([0.0, 1.0, 1.0, 0.0, 1.0]),
                [-0.189174, -0.459086, -0.615636, -0.234054],
            ),
        ];
        for (features, expected) in cases {
            let scores = network.infer(&features, &device).unwrap();
            for (actual, expected) in scores.iter().zip(expected) {
                assert!(
                    (actual - expected).abs() < 1e-4,
                    "got {actual}, expected {expected}"
                );
            }
        }
    }

    #[test]
    fn test_load_pytorch_rejects_garbage() {
        let mut file = tempfile::Builder::new().suffix(".pt").tempfile().unwrap();
        file.write_all(b"not a zip archive").unwrap();

        let result = load_pytorch_network::<InferenceBackend>(file.path(), &default_device());
        assert!(result.is_err());
    }
}
