pub mod document;
pub mod handlers;
pub mod pipeline;
pub mod prompts;
pub mod skills;

pub use pipeline::ResumeIngestor;
pub use skills::SkillExtractor;
