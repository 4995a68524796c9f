//! Policy Adapter: the bridge between the game and the trained model
//!
//! Provides:
//! - the 5-element feature vector the model was trained on
//! - the [`Policy`] trait and [`PolicyAdapter`] (timeouts, decoding, background calls)
//! - a Burn implementation of the model, its own on-disk format and the
//!   original PyTorch state dict

pub mod adapter;
pub mod backend;
pub mod error;
pub mod features;
pub mod network;
pub mod network_policy;
pub mod persistence;

pub use adapter::{
    ACTION_COUNT, DecisionOutcome, PendingDecision, Policy, PolicyAdapter, decode_scores,
};
pub use backend::{InferenceBackend, default_device};
pub use error::PolicyError;
pub use features::{FEATURE_LEN, FeatureVector, build_features, features_from_parts};
pub use network::{DqnConfig, DqnNetwork};
pub use network_policy::{NetworkPolicy, UnavailablePolicy};
pub use persistence::{
    ModelFormat, ModelMetadata, load_network, load_pytorch_network, save_network,
};
