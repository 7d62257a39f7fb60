// Shared prompt constants and prompt-building utilities.
// Each job that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Instruction appended to any prompt whose answer is parsed as JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "IMPORTANT: Return ONLY the JSON object, \
    no other text, no markdown code blocks, no explanations.";

/// Instruction appended to any prompt whose answer is posted publicly as-is.
pub const PUBLIC_STATEMENT_INSTRUCTION: &str = "Do not mention specific answers, \
    usernames, or make it obvious this came from a survey. \
    Return only the statement itself: no quotes, no hashtags, no preamble, no commentary.";

/// Hard character limit for a published statement.
pub const MAX_STATEMENT_CHARS: usize = 280;
