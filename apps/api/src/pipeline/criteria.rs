//! CriteriaSet — normalized structured representation of a CV or JD across
//! twelve fixed categories, plus the extraction adapter that produces it.
//!
//! Extraction never fails: unusable model output degrades silently to the
//! all-empty default so downstream scoring always receives a well-typed value.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::llm::ChatModel;
use crate::pipeline::prompts::{
    CV_EXTRACTION_PROMPT, CV_EXTRACTION_SYSTEM, JD_EXTRACTION_PROMPT, JD_EXTRACTION_SYSTEM,
};
use crate::registry::ArtifactKind;

/// Fixed mapping of criteria categories. Every field is always present
/// (defaulted to an empty list) regardless of what the model returned.
/// Elements are plain strings or small structured records — e.g. an experience
/// entry `{years, description}` or an education entry
/// `{degree, field, institution, preferred?}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CriteriaSet {
    pub skills: Vec<Value>,
    pub experience: Vec<Value>,
    pub education: Vec<Value>,
    pub certifications: Vec<Value>,
    pub projects: Vec<Value>,
    pub tools_technologies: Vec<Value>,
    pub domain_knowledge: Vec<Value>,
    pub languages: Vec<Value>,
    pub soft_skills: Vec<Value>,
    pub achievements: Vec<Value>,
    pub publications: Vec<Value>,
    pub other: Vec<Value>,
}

impl CriteriaSet {
    /// Builds a CriteriaSet from an arbitrary JSON value: each of the twelve
    /// fields is taken only when present and array-typed, otherwise left empty.
    pub fn from_value(value: &Value) -> Self {
        fn field(value: &Value, key: &str) -> Vec<Value> {
            match value.get(key) {
                Some(Value::Array(items)) => items.clone(),
                _ => Vec::new(),
            }
        }

        CriteriaSet {
            skills: field(value, "skills"),
            experience: field(value, "experience"),
            education: field(value, "education"),
            certifications: field(value, "certifications"),
            projects: field(value, "projects"),
            tools_technologies: field(value, "tools_technologies"),
            domain_knowledge: field(value, "domain_knowledge"),
            languages: field(value, "languages"),
            soft_skills: field(value, "soft_skills"),
            achievements: field(value, "achievements"),
            publications: field(value, "publications"),
            other: field(value, "other"),
        }
    }

    /// Concatenates every string value in the set, including strings nested in
    /// structured records, into one text blob for keyword matching.
    pub fn flatten_to_text(&self) -> String {
        let mut out = Vec::new();
        for items in [
            &self.skills,
            &self.experience,
            &self.education,
            &self.certifications,
            &self.projects,
            &self.tools_technologies,
            &self.domain_knowledge,
            &self.languages,
            &self.soft_skills,
            &self.achievements,
            &self.publications,
            &self.other,
        ] {
            for item in items {
                collect_strings(item, &mut out);
            }
        }
        out.join(" ")
    }

    pub fn is_empty(&self) -> bool {
        *self == CriteriaSet::default()
    }
}

fn collect_strings(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Array(items) => items.iter().for_each(|v| collect_strings(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_strings(v, out)),
        _ => {}
    }
}

/// Parses model output into a CriteriaSet, never failing.
///
/// Strict JSON parse first; on failure, recover the first top-level `{...}`
/// substring and retry. Anything still unusable yields the all-empty default.
pub fn parse_or_default(text: &str) -> CriteriaSet {
    let parsed = serde_json::from_str::<Value>(text)
        .ok()
        .or_else(|| recover_object(text).and_then(|s| serde_json::from_str::<Value>(s).ok()));

    match parsed {
        Some(value) if value.is_object() => CriteriaSet::from_value(&value),
        _ => {
            warn!("Failed to parse criteria output - using defaults");
            CriteriaSet::default()
        }
    }
}

/// Returns the substring spanning the first `{` through the last `}`, if any.
pub(crate) fn recover_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Extracts a CriteriaSet from free text for the given document kind.
///
/// Degrades to the empty default when no model is configured, the call fails,
/// or the output is unusable. This is a silent degrade, not a failure.
pub async fn extract_criteria(
    model: Option<&dyn ChatModel>,
    text: &str,
    kind: ArtifactKind,
) -> CriteriaSet {
    let Some(model) = model else {
        warn!("No LLM configured - returning default {kind:?} criteria");
        return CriteriaSet::default();
    };

    let (system, prompt) = match kind {
        ArtifactKind::Cv => (
            CV_EXTRACTION_SYSTEM,
            CV_EXTRACTION_PROMPT.replace("{CV_TEXT}", text),
        ),
        ArtifactKind::Jd => (
            JD_EXTRACTION_SYSTEM,
            JD_EXTRACTION_PROMPT.replace("{JD_TEXT}", text),
        ),
    };

    match model.complete(system, &prompt).await {
        Ok(raw) => parse_or_default(&raw),
        Err(e) => {
            warn!("Criteria extraction call failed ({e}) - using defaults");
            CriteriaSet::default()
        }
    }
}
