//! Backend type alias and device management
//!
//! The policy network is tiny (a few thousand weights), so the CPU NdArray
//! backend is all inference needs.

use burn::backend::ndarray::{NdArray, NdArrayDevice};

/// Backend type for running the trained policy
pub type InferenceBackend = NdArray<f32>;

/// Get the default device for computation
pub fn default_device() -> NdArrayDevice {
    NdArrayDevice::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_device() {
        let device1 = default_device();
        let device2 = default_device();
        assert_eq!(
            std::mem::discriminant(&device1),
            std::mem::discriminant(&device2)
        );
    }
}
