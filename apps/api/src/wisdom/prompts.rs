// All LLM prompt constants for the Wisdom Publisher job.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::llm_client::prompts::{MAX_STATEMENT_CHARS, PUBLIC_STATEMENT_INSTRUCTION};
use crate::models::RawEntry;
use crate::wisdom::weighting::WeightedSummary;

/// System prompt for wisdom synthesis.
pub const WISDOM_SYSTEM: &str = "You are a wise philosopher who creates profound, \
    shareable insights from human experiences. Generate wisdom that resonates with \
    people and inspires reflection.";

/// Output rules shared by both prompt shapes.
/// Replace: {max_chars}, {public_statement_instruction}
const OUTPUT_RULES_TEMPLATE: &str = r#"Generate a single piece of profound wisdom (under {max_chars} characters) that would resonate on social media. The wisdom should be:
- Universally relatable
- Thought-provoking
- Inspirational or insightful
- Perfect for sharing and reflection

Create standalone wisdom that feels timeless and meaningful.
{public_statement_instruction}"#;

fn output_rules() -> String {
    OUTPUT_RULES_TEMPLATE
        .replace("{max_chars}", &MAX_STATEMENT_CHARS.to_string())
        .replace("{public_statement_instruction}", PUBLIC_STATEMENT_INSTRUCTION)
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join("; ")
    }
}

fn fresh_block(fresh: &[RawEntry]) -> String {
    fresh
        .iter()
        .enumerate()
        .map(|(i, entry)| format!("{}. {}", i + 1, entry.raw_text().replace('\n', "\n   ")))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Weighted prompt: one block per summary, then the freshest entries, then the rules.
pub fn build_weighted_prompt(weighted: &[WeightedSummary], fresh: &[RawEntry]) -> String {
    let mut prompt = String::from(
        "Below are thematic summaries of what our community has shared over recent periods.\n\
         Each summary has a WEIGHT and a VOLUME (number of submissions it covers). \
         Weights balance out uneven submission volume: let higher-weight summaries shape \
         the wisdom more than lower-weight ones.\n\n",
    );

    for (i, w) in weighted.iter().enumerate() {
        let payload = &w.summary.payload;
        prompt.push_str(&format!(
            "SUMMARY {} (weight {:.2}, volume {})\n\
             Themes: {}\n\
             Emotional tone: {}\n\
             Key patterns: {}\n\
             Insights: {}\n\n",
            i + 1,
            w.weight,
            w.summary.truth_count,
            join_or_none(&payload.themes),
            payload.emotional_tone,
            join_or_none(&payload.key_patterns),
            join_or_none(&payload.insights),
        ));
    }

    if !fresh.is_empty() {
        prompt.push_str("MOST RECENT SUBMISSIONS (for topical immediacy):\n");
        prompt.push_str(&fresh_block(fresh));
        prompt.push_str("\n\n");
    }

    prompt.push_str(&output_rules());
    prompt
}

/// Cold-start prompt used before any summary exists.
pub fn build_fresh_only_prompt(fresh: &[RawEntry]) -> String {
    format!(
        "Based on these human truths and reflections from our community:\n\n{}\n\n{}",
        fresh_block(fresh),
        output_rules()
    )
}
