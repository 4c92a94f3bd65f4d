pub mod client;
pub mod prompt;
pub mod types;

pub use client::{GenerativeImageClient, StaticVisionClient, VisionClient};
pub use prompt::build_prompt;
pub use types::{InlineImage, SimulationRequest, VisionError};
