//! Text-generation collaborator seam.
//!
//! The daemon never talks to a model vendor itself; whoever embeds it wires a
//! [`TextGenerator`] into `AppState`. Every call site catches failure and
//! degrades to a deterministic fallback, so a misbehaving backend can never
//! surface as a raw error.

use anyhow::bail;

pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Default wiring when no generation backend is configured: every call fails,
/// which routes each caller onto its fallback path.
pub struct DisabledGenerator;

impl TextGenerator for DisabledGenerator {
    fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
        bail!("no text generation backend configured")
    }
}

/// Models frequently wrap JSON in ```json fences despite instructions not to.
/// Strip the wrappers before parsing.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parse a fenced-or-bare JSON array out of a model reply.
pub fn parse_json_array(raw: &str) -> anyhow::Result<Vec<serde_json::Value>> {
    let cleaned = strip_code_fences(raw);
    let value: serde_json::Value = serde_json::from_str(&cleaned)?;
    match value {
        serde_json::Value::Array(items) => Ok(items),
        other => bail!("expected a JSON array, got: {}", other),
    }
}

pub fn topic_prompt(question: &str) -> String {
    format!(
        "Question: {}\nReturn ONLY a 1-2 word topic name for this question.",
        question
    )
}

/// A topic label comes back as free text; trim it down to the bare words.
pub fn clean_topic(raw: &str) -> String {
    raw.trim().replace('\'', "").replace('"', "")
}

pub fn quiz_prompt(unit: &str) -> String {
    format!(
        "Generate 5 Multiple Choice Questions (MCQs) for the unit \"{unit}\".\n\
         \n\
         STRICT JSON FORMAT REQUIRED:\n\
         [\n\
           {{\n\
             \"question\": \"Question text here?\",\n\
             \"options\": [\"Option A\", \"Option B\", \"Option C\", \"Option D\"],\n\
             \"answer\": \"Option A\"\n\
           }}\n\
         ]\n\
         Do not add any markdown, intro text, or explanation. JUST THE JSON ARRAY."
    )
}

pub fn insight_prompt(friction_units: &serde_json::Value) -> String {
    format!(
        "You are a senior academic analyst.\n\
         Analyze these problematic units where students have LOW marks and HIGH doubts:\n\
         {friction_units}\n\
         \n\
         Context:\n\
         - \"avg_marks\" is out of 100%.\n\
         - \"doubts\" is the count of questions asked.\n\
         \n\
         For EACH unit in the list, generate a teaching strategy in STRICT JSON format:\n\
         [\n\
           {{\n\
             \"unit\": \"Unit Name\",\n\
             \"observation\": \"Briefly state the marks vs doubts situation.\",\n\
             \"root_cause\": \"Suggest a likely pedagogical reason.\",\n\
             \"recommendation\": \"Suggest 1 specific active learning intervention.\"\n\
           }}\n\
         ]\n\
         \n\
         CRITICAL: RETURN ONLY THE JSON ARRAY. NO MARKDOWN. NO INTRO TEXT."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fences_stripped_before_parsing() {
        let raw = "```json\n[{\"unit\": \"Unit 2\"}]\n```";
        let items = parse_json_array(raw).expect("parse");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["unit"], "Unit 2");
    }

    #[test]
    fn bare_array_accepted() {
        let items = parse_json_array("[1, 2, 3]").expect("parse");
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn prose_reply_is_an_error() {
        assert!(parse_json_array("Sure! Here are your questions...").is_err());
        assert!(parse_json_array("{\"not\": \"an array\"}").is_err());
    }

    #[test]
    fn topic_labels_lose_wrapping_quotes() {
        assert_eq!(clean_topic(" 'Thermodynamics' \n"), "Thermodynamics");
        assert_eq!(clean_topic("\"Wave Optics\""), "Wave Optics");
    }

    #[test]
    fn disabled_generator_always_fails() {
        assert!(DisabledGenerator.generate("anything").is_err());
    }
}
