// All LLM prompt constants for the Summarizer job.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::models::{EntryBody, RawEntry};

/// System prompt for batch analysis — enforces JSON-only output.
pub const ANALYSIS_SYSTEM: &str = "You are a brilliant psychologist and data analyst \
    specializing in human behavior patterns. You excel at identifying deep psychological \
    themes and extracting meaningful insights from personal responses. \
    Always respond with clean JSON only, never use markdown formatting.";

/// Analysis prompt template.
/// Replace: {count}, {entries}, {json_only_instruction}
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"You are analyzing {count} user submissions to extract meaningful psychological and behavioral patterns.

DATA TO ANALYZE:
{entries}

ANALYSIS REQUIREMENTS:
Please analyze these submissions and identify:
1. Major recurring themes across users
2. Overall emotional tone of the submissions
3. Key behavioral or thought patterns
4. Primary concerns, fears, or anxieties expressed
5. Deep insights about human nature revealed
6. The overall sentiment across all submissions

OUTPUT FORMAT:
Return your analysis as a JSON object with this exact structure:

{
  "themes": ["theme1", "theme2", "theme3", "theme4", "theme5"],
  "emotional_tone": "detailed description of the overall emotional atmosphere",
  "key_patterns": ["pattern1", "pattern2", "pattern3", "pattern4"],
  "dominant_concerns": ["concern1", "concern2", "concern3", "concern4"],
  "insights": ["insight1", "insight2", "insight3", "insight4", "insight5"],
  "overall_sentiment": "positive|negative|neutral|mixed"
}

{json_only_instruction}"#;

/// Renders a batch as numbered, `---`-separated entry blocks.
pub fn render_entries(entries: &[RawEntry]) -> String {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let mut block = format!("Entry {}:\nUsername: @{}\n", index + 1, entry.author);
            match &entry.body {
                EntryBody::Truth {
                    first_question,
                    first_answer,
                    second_question,
                    second_answer,
                    generated_truth,
                } => {
                    block.push_str(&format!(
                        "Question 1: {first_question}\nAnswer 1: {first_answer}\n\
                         Question 2: {second_question}\nAnswer 2: {second_answer}\n\
                         Generated Truth: \"{generated_truth}\"\n"
                    ));
                }
                EntryBody::Wisdom { text } => {
                    block.push_str(&format!("Wisdom: {text}\n"));
                }
            }
            block.push_str(&format!("Timestamp: {}\n---", entry.created_at.to_rfc3339()));
            block
        })
        .collect::<Vec<_>>()
        .join("\n")
}
