pub mod coordinator;
pub mod draft;
pub mod handlers;
pub mod prompts;
pub mod similarity;

pub use coordinator::{MatchCoordinator, MatchSettings};
pub use draft::{DraftSettings, MessageDrafter};
