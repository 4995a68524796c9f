use crate::game::{GameState, Position};

/// Number of inputs the policy model expects
pub const FEATURE_LEN: usize = 5;

/// Input vector handed to the policy.
///
/// Layout:
/// - 0: head is below the food (head.y > food.y)
/// - 1: head is above the food (head.y < food.y)
/// - 2: head is right of the food (head.x > food.x)
/// - 3: head is left of the food (head.x < food.x)
/// - 4: snake length
///
/// y grows downwards, so "below" means a larger row index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector(pub [f32; FEATURE_LEN]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.0.to_vec()
    }
}

/// Build the feature vector from head, food and length
pub fn features_from_parts(head: Position, food: Position, length: usize) -> FeatureVector {
    let flag = |condition: bool| if condition { 1.0 } else { 0.0 };
    FeatureVector([
        flag(head.y > food.y),
        flag(head.y < food.y),
        flag(head.x > food.x),
        flag(head.x < food.x),
        length as f32,
    ])
}

/// Build the feature vector for the current game state
pub fn build_features(state: &GameState) -> FeatureVector {
    features_from_parts(state.snake.head(), state.food, state.snake.len())
}
