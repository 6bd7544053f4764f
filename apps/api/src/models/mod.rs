pub mod match_record;
pub mod profile;
pub mod skills;

pub use match_record::{MatchRecord, MatchSummary};
pub use profile::{NewProfile, Profile, SkillUpdate};
pub use skills::SkillSet;
