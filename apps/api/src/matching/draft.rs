//! Drafting of the single consolidated match notification.
//!
//! One message describes every ranked candidate. Prose comes from the
//! text-completion service when it answers; otherwise the same structured
//! data is rendered through a fixed template. Drafting never fails.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::llm_client::prompts::PLAIN_OUTPUT_INSTRUCTION;
use crate::llm_client::{KeyPool, Sourced, TextCompletion};
use crate::matching::prompts::CONSOLIDATED_MATCH_PROMPT;
use crate::matching::similarity::MatchCandidate;
use crate::models::Profile;

/// Common skills listed per candidate before eliding the rest.
const SHOWN_COMMON_SKILLS: usize = 3;

#[derive(Debug, Clone)]
pub struct DraftSettings {
    pub event_name: String,
    pub community_url: Option<String>,
}

pub fn subject_line(total_matches: usize) -> String {
    if total_matches == 1 {
        "1 Potential Teammate Found - Choose Your Dream Team!".to_string()
    } else {
        format!("{total_matches} Potential Teammates Found - Choose Your Dream Team!")
    }
}

/// Similarity as a whole percentage, truncated.
pub fn similarity_percent(similarity: f64) -> u32 {
    (similarity.clamp(0.0, 1.0) * 100.0) as u32
}

fn common_skills_summary(skills: &[String]) -> String {
    let shown = skills
        .iter()
        .take(SHOWN_COMMON_SKILLS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if skills.len() > SHOWN_COMMON_SKILLS {
        format!("{shown}...")
    } else {
        shown
    }
}

/// The structured candidate block shared by the prompt and the fallback template.
pub fn render_match_details(candidates: &[MatchCandidate]) -> String {
    candidates
        .iter()
        .enumerate()
        .map(|(i, c)| {
            format!(
                "{}. {} - {}\n   Email: {}\n   Skill Match: {}%\n   Common Skills: {}",
                i + 1,
                c.profile.display_name,
                c.profile.job_title_or("N/A"),
                c.profile.contact_address,
                similarity_percent(c.similarity),
                common_skills_summary(&c.common_skills),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn next_steps(settings: &DraftSettings) -> String {
    match &settings.community_url {
        Some(url) => format!("encourage connecting through the community server: {url}"),
        None => "encourage reaching out to the matches by email".to_string(),
    }
}

pub fn render_fallback(
    recipient: &Profile,
    candidates: &[MatchCandidate],
    settings: &DraftSettings,
) -> String {
    let total = candidates.len();
    let noun = if total == 1 { "teammate" } else { "teammates" };
    let community_step = match &settings.community_url {
        Some(url) => format!("2. Join the community server: {url}\n"),
        None => "2. Reply to this email if you have questions\n".to_string(),
    };

    format!(
        "Dear {name},\n\n\
         Great news! We found {total} potential {noun} for you at {event}.\n\n\
         Your potential team members:\n\n\
         {details}\n\n\
         These participants were matched on the skills you share with them.\n\n\
         Next steps:\n\
         1. Review the matches above\n\
         {community_step}\
         3. Reach out to the teammates that interest you\n\
         4. Start planning your project together\n\n\
         Tip: great teams combine different strengths. Look for teammates who complement your expertise.\n\n\
         Best regards,\n\
         The organizing team",
        name = recipient.display_name,
        event = settings.event_name,
        details = render_match_details(candidates),
    )
}

pub struct MessageDrafter {
    llm: Arc<dyn TextCompletion>,
    keys: Arc<KeyPool>,
    /// Fixed wait before every completion call.
    pacing: Duration,
    settings: DraftSettings,
}

impl MessageDrafter {
    pub fn new(
        llm: Arc<dyn TextCompletion>,
        keys: Arc<KeyPool>,
        pacing: Duration,
        settings: DraftSettings,
    ) -> Self {
        Self {
            llm,
            keys,
            pacing,
            settings,
        }
    }

    /// Drafts one message covering every candidate.
    pub async fn draft(&self, recipient: &Profile, candidates: &[MatchCandidate]) -> Sourced<String> {
        let prompt = format!(
            "{}\n\n{}",
            CONSOLIDATED_MATCH_PROMPT
                .replace("{event_name}", &self.settings.event_name)
                .replace("{recipient_name}", &recipient.display_name)
                .replace("{recipient_title}", recipient.job_title_or("Participant"))
                .replace("{total_matches}", &candidates.len().to_string())
                .replace("{match_details}", &render_match_details(candidates))
                .replace("{next_steps}", &next_steps(&self.settings)),
            PLAIN_OUTPUT_INSTRUCTION
        );

        if !self.pacing.is_zero() {
            info!("Pacing draft call ({}ms)", self.pacing.as_millis());
            tokio::time::sleep(self.pacing).await;
        }

        match self.llm.complete(&prompt, self.keys.acquire()).await {
            Ok(body) if !body.trim().is_empty() => {
                info!(
                    "Drafted consolidated message for {} ({} matches)",
                    recipient.id,
                    candidates.len()
                );
                Sourced::Generated(body.trim().to_string())
            }
            Ok(_) => {
                warn!("Draft call returned no text, using template");
                Sourced::Fallback(render_fallback(recipient, candidates, &self.settings))
            }
            Err(e) => {
                warn!("Draft call failed, using template: {e}");
                Sourced::Fallback(render_fallback(recipient, candidates, &self.settings))
            }
        }
    }
}
