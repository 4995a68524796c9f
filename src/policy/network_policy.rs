use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use burn::tensor::backend::Backend;
use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::info;

use super::adapter::Policy;
use super::error::PolicyError;
use super::features::FeatureVector;
use super::network::DqnNetwork;
use super::persistence::{ModelFormat, load_network, load_pytorch_network};

/// Runs a trained [`DqnNetwork`] as the game's policy.
///
/// The forward pass happens on tokio's blocking pool so that inference never
/// stalls the tick loop.
pub struct NetworkPolicy<B: Backend> {
    network: Mutex<DqnNetwork<B>>,
    device: B::Device,
    name: String,
}

impl<B: Backend> NetworkPolicy<B> {
    pub fn new(network: DqnNetwork<B>, device: B::Device, name: impl Into<String>) -> Self {
        Self {
            network: Mutex::new(network),
            device,
            name: name.into(),
        }
    }

    /// Load a saved model from disk.
    ///
    /// `.pt`/`.pth` files are read as the original PyTorch state dict,
    /// anything else as a Burn record with its `.meta.json`.
    pub fn load(path: &Path, device: B::Device) -> Result<Self> {
        let network = match ModelFormat::from_path(path) {
            ModelFormat::PyTorch => {
                let (network, shape) = load_pytorch_network::<B>(path, &device)?;
                info!(
                    path = %path.display(),
                    hidden_dim = shape.hidden_dim,
                    "PyTorch policy model loaded"
                );
                network
            }
            ModelFormat::Burn => {
                let (network, metadata) = load_network::<B>(path, &device)?;
                info!(
                    path = %path.display(),
                    hidden_dim = metadata.network.hidden_dim,
                    version = %metadata.version,
                    "policy model loaded"
                );
                network
            }
        };
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());
        Ok(Self::new(network, device, name))
    }
}

impl<B: Backend> Policy for NetworkPolicy<B> {
    fn evaluate(
        &self,
        features: FeatureVector,
    ) -> BoxFuture<'static, Result<Vec<f32>, PolicyError>> {
        let network = match self.network.lock() {
            Ok(network) => network.clone(),
            Err(_) => {
                return futures::future::ready(Err(PolicyError::Unavailable(
                    "policy network lock poisoned".to_string(),
                )))
                .boxed();
            }
        };
        let device = self.device.clone();

        async move {
            tokio::task::spawn_blocking(move || network.infer(&features, &device))
                .await
                .map_err(|err| PolicyError::Unavailable(format!("inference task failed: {err}")))?
        }
        .boxed()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Stand-in used when no model could be loaded: every call fails, so the
/// game runs on manual input alone.
#[derive(Debug, Clone)]
pub struct UnavailablePolicy {
    reason: String,
}

impl UnavailablePolicy {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl Policy for UnavailablePolicy {
    fn evaluate(
        &self,
        _features: FeatureVector,
    ) -> BoxFuture<'static, Result<Vec<f32>, PolicyError>> {
        futures::future::ready(Err(PolicyError::Unavailable(self.reason.clone()))).boxed()
    }

    fn name(&self) -> &str {
        "manual only"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::backend::{InferenceBackend, default_device};
    use crate::policy::network::DqnConfig;
    use crate::policy::persistence::save_network;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_network_policy_scores() {
        let device = default_device();
        let network = DqnConfig::default().init::<InferenceBackend>(&device);
        let policy = NetworkPolicy::new(network, device, "fresh");

        let scores = policy
            .evaluate(FeatureVector([0.0, 1.0, 0.0, 1.0, 1.0]))
            .await
            .unwrap();

        assert_eq!(scores.len(), 4);
        assert_eq!(policy.name(), "fresh");
    }

    #[tokio::test]
    async fn test_network_policy_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("dqn_model.mpk");
        let device = default_device();
        let config = DqnConfig::default();
        save_network(&config.init::<InferenceBackend>(&device), &config, &path).unwrap();

        let policy = NetworkPolicy::<InferenceBackend>::load(&path, device).unwrap();
        assert_eq!(policy.name(), "dqn_model");

        let scores = policy
            .evaluate(FeatureVector([1.0, 0.0, 1.0, 0.0, 2.0]))
            .await
            .unwrap();
        assert!(scores.iter().all(|s| s.is_finite()));
    }

    #[tokio::test]
    async fn test_network_policy_loads_pytorch_model() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/dqn_model.pt");

        let policy = NetworkPolicy::<InferenceBackend>::load(&path, default_device()).unwrap();
        assert_eq!(policy.name(), "dqn_model");

        let scores = policy
            .evaluate(FeatureVector([1.0, 0.0, 0.0, 1.0, 3.0]))
            .await
            .unwrap();
        assert_eq!(scores.len(), 4);
        assert!((scores[0] - 0.048249).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_unavailable_policy_always_fails() {
        let policy = UnavailablePolicy::new("no model configured");

        let result = policy.evaluate(FeatureVector([0.0; 5])).await;

        assert_eq!(
            result,
            Err(PolicyError::Unavailable("no model configured".to_string()))
        );
        assert_eq!(policy.reason(), "no model configured");
    }
}
