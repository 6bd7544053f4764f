// Match notification LLM prompt templates.

pub const CONSOLIDATED_MATCH_PROMPT: &str = r#"Write a personalized email for a participant of {event_name} about ALL of their potential teammates.

RECIPIENT: {recipient_name} ({recipient_title})
TOTAL MATCHES FOUND: {total_matches}

MATCH DETAILS:
{match_details}

STRUCTURE:
1. Greeting: celebrate finding potential teammates
2. Overview: mention the total number of matches found
3. Team options: present every match with name, email and skill match percentage
4. Next steps: {next_steps}
5. Team formation tip: one or two sentences on choosing teammates
6. Closing: friendly sign-off from the organizing team

Keep it engaging, professional, and under 300 words. Return only the email body."#;
