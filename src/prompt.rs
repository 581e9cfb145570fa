// src/prompt.rs
//! Prompt construction for the idea generator.
//!
//! The wording is tunable. What is load-bearing for the normalizer is:
//! exactly six ideas, one per category below, JSON only, and the four
//! field names of [`crate::ideas::IdeaRecord`].

/// The six categories requested from the model, one idea each.
pub const IDEA_CATEGORIES: [&str; 6] = [
    "Practical tip",
    "Interactive question",
    "Special promotion",
    "Educational content",
    "Behind the scenes",
    "Viral trend",
];

const PERSONA: &str = "You are an expert social media content strategist for small businesses. \
You help local business owners publish posts that are easy to produce and drive engagement.";

const OUTPUT_RULES: &str = r#"Respond ONLY with a JSON object. Do not add any explanation, commentary, or markdown code fences.
The JSON object must have exactly this shape:
{
  "ideas": [
    {
      "category": "one of the categories above",
      "suggestedFormat": "post format, e.g. 15s reel, carousel, story poll",
      "hookTitle": "short attention-grabbing headline",
      "executionGuide": "1-2 sentences on how to make the post, ending with a call to action"
    }
  ]
}"#;

/// Build the full instruction for one business type.
///
/// Never fails: any input, including an empty string, yields a prompt. The
/// business type is embedded verbatim as the last line.
pub fn build_prompt(business_type: &str) -> String {
    let mut out = String::with_capacity(1024 + business_type.len());
    out.push_str(PERSONA);
    out.push_str("\n\n");
    out.push_str(&format!(
        "Generate exactly {} social media content ideas. Use each of the following categories exactly once, \
one idea per category, and do not repeat a category:\n",
        IDEA_CATEGORIES.len()
    ));
    for (i, category) in IDEA_CATEGORIES.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, category));
    }
    out.push('\n');
    out.push_str(OUTPUT_RULES);
    out.push_str("\n\nBusiness type: ");
    out.push_str(business_type);
    out
}
