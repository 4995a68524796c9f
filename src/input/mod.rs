pub mod arbiter;
pub mod handler;

pub use arbiter::{DirectionSource, Resolution, arbitrate, arbitrate_opening, resolve};
pub use handler::{InputHandler, KeyAction};
