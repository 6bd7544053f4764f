// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it;
// this file holds the pieces they have in common.

/// Instruction appended to prompts whose output is parsed mechanically.
pub const PLAIN_OUTPUT_INSTRUCTION: &str = "\
    Respond with the requested content only. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";
