//! Q-network that scores the four movement actions
//!
//! # Architecture
//!
//! ```text
//! Input: [batch, 5]   (see `FeatureVector`)
//!   ↓ Linear(5 → 128) + ReLU
//!   ↓ Linear(128 → 128) + ReLU
//!   ↓ Linear(128 → 4)
//! Output: [batch, 4]  scores for Up, Right, Down, Left
//! ```
//!
//! Dropout is only used while training and is absent here.
//!
//! # Example
//!
//! ```rust
//! use policy_snake::policy::DqnConfig;
//! use burn::backend::ndarray::NdArrayDevice;
//! use burn::backend::NdArray;
//! use burn::tensor::Tensor;
//!
//! type Backend = NdArray<f32>;
//!
//! let device = NdArrayDevice::default();
//! let network = DqnConfig::default().init::<Backend>(&device);
//!
//! let features = Tensor::zeros([2, 5], &device);
//! assert_eq!(network.forward(features).dims(), [2, 4]);
//! ```

use burn::{
    module::Module,
    nn::{Linear, LinearConfig},
    tensor::{Tensor, TensorData, activation::relu, backend::Backend},
};
use serde::{Deserialize, Serialize};

use super::adapter::ACTION_COUNT;
use super::error::PolicyError;
use super::features::{FEATURE_LEN, FeatureVector};

/// Configuration for the Q-network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DqnConfig {
    /// Number of input features (default: 5)
    pub n_observations: usize,

    /// Number of actions scored (default: 4)
    pub n_actions: usize,

    /// Width of both hidden layers (default: 128)
    pub hidden_dim: usize,
}

impl Default for DqnConfig {
    fn default() -> Self {
        Self {
            n_observations: FEATURE_LEN,
            n_actions: ACTION_COUNT,
            hidden_dim: 128,
        }
    }
}

impl DqnConfig {
    /// Initialize a network with freshly initialised weights
    pub fn init<B: Backend>(&self, device: &B::Device) -> DqnNetwork<B> {
        DqnNetwork {
            layer1: LinearConfig::new(self.n_observations, self.hidden_dim).init(device),
            layer2: LinearConfig::new(self.hidden_dim, self.hidden_dim).init(device),
            layer3: LinearConfig::new(self.hidden_dim, self.n_actions).init(device),
        }
    }

    /// Check that the network fits the game's feature and action layout
    pub fn validate(&self) -> Result<(), String> {
        if self.n_observations != FEATURE_LEN {
            return Err(format!(
                "model expects {} inputs, the game provides {}",
                self.n_observations, FEATURE_LEN
            ));
        }

        if self.n_actions != ACTION_COUNT {
            return Err(format!(
                "model scores {} actions, the game needs {}",
                self.n_actions, ACTION_COUNT
            ));
        }

        if self.hidden_dim == 0 {
            return Err("hidden_dim must be at least 1".to_string());
        }

        Ok(())
    }
}

/// Three-layer fully connected Q-network
#[derive(Module, Debug)]
pub struct DqnNetwork<B: Backend> {
    layer1: Linear<B>,
    layer2: Linear<B>,
    layer3: Linear<B>,
}

impl<B: Backend> DqnNetwork<B> {
    /// Forward pass: `[batch, n_observations]` → `[batch, n_actions]`
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = relu(self.layer1.forward(input));
        let x = relu(self.layer2.forward(x));
        self.layer3.forward(x)
    }

    /// Layer sizes read back from the weights.
    ///
    /// Weights loaded from a foreign file carry their own shapes, so this is
    /// how an imported network is checked before it is used.
    pub fn shape(&self) -> Result<DqnConfig, String> {
        let [n_observations, hidden_dim] = self.layer1.weight.dims();
        let [hidden_in, hidden_out] = self.layer2.weight.dims();
        let [output_in, n_actions] = self.layer3.weight.dims();

        if hidden_in != hidden_dim || hidden_out != hidden_dim || output_in != hidden_dim {
            return Err(format!(
                "hidden layers do not line up: {}x{}, {}x{}, {}x{}",
                n_observations, hidden_dim, hidden_in, hidden_out, output_in, n_actions
            ));
        }

        Ok(DqnConfig {
            n_observations,
            n_actions,
            hidden_dim,
        })
    }

    /// Score the actions for a single feature vector
    pub fn infer(
        &self,
        features: &FeatureVector,
        device: &B::Device,
    ) -> Result<Vec<f32>, PolicyError> {
        let input = Tensor::<B, 2>::from_data(
            TensorData::new(features.to_vec(), [1, FEATURE_LEN]),
            device,
        );

        self.forward(input)
            .into_data()
            .to_vec::<f32>()
            .map_err(|err| PolicyError::Unavailable(format!("unreadable model output: {err:?}")))
    }
}
