//! Skill extraction: raw resume text to a deduplicated list of skill tokens.
//!
//! Primary path asks the text-completion service for a comma-separated list.
//! If that call fails for any reason, a curated vocabulary is matched against
//! the text instead. Extraction itself never fails.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use regex::Regex;
use tracing::{info, warn};

use crate::ingest::prompts::SKILL_EXTRACTION_PROMPT;
use crate::llm_client::prompts::PLAIN_OUTPUT_INSTRUCTION;
use crate::llm_client::{KeyPool, Sourced, TextCompletion};
use crate::models::skills::merge_skills;

/// Curated fallback vocabulary, in output order. Matched case-insensitively.
const FALLBACK_VOCABULARY: &[&str] = &[
    // Languages
    "Python",
    "Java",
    "JavaScript",
    "TypeScript",
    "C++",
    "C#",
    "PHP",
    "Ruby",
    "Go",
    "Rust",
    "Swift",
    // Frameworks
    "React",
    "Angular",
    "Vue",
    "Django",
    "Flask",
    "Spring",
    "Express",
    "Laravel",
    // Platforms and data stores
    "AWS",
    "Azure",
    "GCP",
    "Docker",
    "Kubernetes",
    "MongoDB",
    "PostgreSQL",
    "MySQL",
    // Tools
    "Git",
    "Jenkins",
    "Terraform",
    "Ansible",
    "Linux",
    "Windows",
    // Disciplines
    "Machine Learning",
    "AI",
    "Data Science",
    "DevOps",
    "Frontend",
    "Backend",
];

fn fallback_patterns() -> &'static [(&'static str, Regex)] {
    static PATTERNS: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        FALLBACK_VOCABULARY
            .iter()
            .map(|&name| {
                // Whole-token match; `\b` is useless around tokens ending in `+` or `#`.
                let term = regex::escape(name).replace(' ', r"\s+");
                let pattern = format!(r"(?i)(?:^|[^\w]){term}(?:$|[^\w])");
                let regex = Regex::new(&pattern).expect("fallback vocabulary pattern is valid");
                (name, regex)
            })
            .collect()
    })
}

/// Vocabulary matches found in `text`, canonical casing, vocabulary order.
pub fn fallback_skills(text: &str) -> Vec<String> {
    fallback_patterns()
        .iter()
        .filter(|(_, regex)| regex.is_match(text))
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Splits a completion response on commas, trims tokens, drops tokens of one
/// character or fewer, and removes case-insensitive duplicates.
pub fn parse_skill_list(raw: &str) -> Vec<String> {
    let tokens: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|token| token.chars().count() > 1)
        .map(str::to_string)
        .collect();
    merge_skills(&[], &tokens)
}

pub struct SkillExtractor {
    llm: Arc<dyn TextCompletion>,
    keys: Arc<KeyPool>,
    /// Fixed wait before every completion call to stay under the provider's rate limit.
    pacing: Duration,
}

impl SkillExtractor {
    pub fn new(llm: Arc<dyn TextCompletion>, keys: Arc<KeyPool>, pacing: Duration) -> Self {
        Self { llm, keys, pacing }
    }

    pub async fn extract_skills(&self, text: &str) -> Sourced<Vec<String>> {
        let prompt = format!(
            "{}\n\n{}",
            SKILL_EXTRACTION_PROMPT.replace("{resume_text}", text),
            PLAIN_OUTPUT_INSTRUCTION
        );

        if !self.pacing.is_zero() {
            info!("Pacing skill extraction call ({}ms)", self.pacing.as_millis());
            tokio::time::sleep(self.pacing).await;
        }

        match self.llm.complete(&prompt, self.keys.acquire()).await {
            Ok(raw) => {
                let skills = parse_skill_list(&raw);
                info!("Extracted {} skills with the text-completion service", skills.len());
                Sourced::Generated(skills)
            }
            Err(e) => {
                warn!("Skill extraction call failed, using vocabulary fallback: {e}");
                let skills = fallback_skills(text);
                info!("Fallback matched {} skills", skills.len());
                Sourced::Fallback(skills)
            }
        }
    }
}
