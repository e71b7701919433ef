//! ScoringResult model and the model-path scorer.
//!
//! The model path and the heuristic fallback produce the same structure; the
//! `provenance` discriminant is the single thing callers branch on, with
//! `fallback_reason` carried only on heuristic results.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::llm::ChatModel;
use crate::pipeline::criteria::{recover_object, CriteriaSet};
use crate::pipeline::heuristic::heuristic_score;
use crate::pipeline::prompts::{SCORING_PROMPT, SCORING_SYSTEM};

/// Rubric weights. These five criteria and their weights are an invariant of
/// the scoring contract — both paths populate exactly these keys.
pub const WEIGHT_SKILLS_EXPERIENCE: f64 = 0.55;
pub const WEIGHT_EDUCATION_CERTIFICATIONS: f64 = 0.15;
pub const WEIGHT_ACHIEVEMENTS_IMPACT: f64 = 0.15;
pub const WEIGHT_SOFT_SKILLS: f64 = 0.10;
pub const WEIGHT_LANGUAGES_CULTURAL_FIT: f64 = 0.05;

/// Which path produced a [`ScoringResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreProvenance {
    Model,
    Heuristic,
}

/// Score and explanation for one rubric criterion. Scores are integers in
/// [0, 100]; explanations are trimmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionScore {
    pub score: u32,
    pub explanation: String,
}

/// The five fixed rubric criteria.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriteriaScores {
    pub skills_experience: CriterionScore,
    pub education_certifications: CriterionScore,
    pub achievements_impact: CriterionScore,
    pub soft_skills: CriterionScore,
    pub languages_cultural_fit: CriterionScore,
}

/// Weighted five-criterion evaluation of a CV against a JD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    pub criteria_scores: CriteriaScores,
    pub final_score: u32,
    pub overall_summary: String,
    pub provenance: ScoreProvenance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

// Raw shapes for validating model output. `criteria_scores` must carry exactly
// the five rubric keys; numeric scores may arrive as floats and are normalized.
#[derive(Debug, Deserialize)]
struct RawScoringResult {
    criteria_scores: RawCriteriaScores,
    final_score: f64,
    overall_summary: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCriteriaScores {
    skills_experience: RawCriterionScore,
    education_certifications: RawCriterionScore,
    achievements_impact: RawCriterionScore,
    soft_skills: RawCriterionScore,
    languages_cultural_fit: RawCriterionScore,
}

#[derive(Debug, Deserialize)]
struct RawCriterionScore {
    score: f64,
    explanation: String,
}

/// Rounds to the nearest integer and clamps into [0, 100].
pub fn clamp_score(value: f64) -> u32 {
    let rounded = value.round();
    if rounded.is_nan() {
        return 0;
    }
    rounded.clamp(0.0, 100.0) as u32
}

impl RawCriterionScore {
    fn normalize(self) -> CriterionScore {
        CriterionScore {
            score: clamp_score(self.score),
            explanation: self.explanation.trim().to_string(),
        }
    }
}

impl RawScoringResult {
    fn normalize(self) -> ScoringResult {
        ScoringResult {
            criteria_scores: CriteriaScores {
                skills_experience: self.criteria_scores.skills_experience.normalize(),
                education_certifications: self.criteria_scores.education_certifications.normalize(),
                achievements_impact: self.criteria_scores.achievements_impact.normalize(),
                soft_skills: self.criteria_scores.soft_skills.normalize(),
                languages_cultural_fit: self.criteria_scores.languages_cultural_fit.normalize(),
            },
            final_score: clamp_score(self.final_score),
            overall_summary: self.overall_summary.trim().to_string(),
            provenance: ScoreProvenance::Model,
            fallback_reason: None,
        }
    }
}

/// Scores a CV criteria set against a JD criteria set.
///
/// The model path is attempted when a model is configured; any call failure or
/// output that does not validate against the rubric shape falls through to the
/// deterministic heuristic, with `fallback_reason` recording why. This
/// function always returns a usable result.
pub async fn score_cv_against_jd(
    model: Option<&dyn ChatModel>,
    jd_criteria: &CriteriaSet,
    cv_criteria: &CriteriaSet,
) -> ScoringResult {
    let Some(model) = model else {
        return fallback(jd_criteria, cv_criteria, "model unavailable");
    };

    let prompt = SCORING_PROMPT
        .replace(
            "{JD_CRITERIA}",
            &serde_json::to_string_pretty(jd_criteria).unwrap_or_default(),
        )
        .replace(
            "{CV_CRITERIA}",
            &serde_json::to_string_pretty(cv_criteria).unwrap_or_default(),
        );

    let raw = match model.complete(SCORING_SYSTEM, &prompt).await {
        Ok(raw) => raw,
        Err(e) if e.is_rate_limit() => {
            return fallback(jd_criteria, cv_criteria, "rate limit");
        }
        Err(e) => {
            return fallback(jd_criteria, cv_criteria, &format!("LLM error: {e}"));
        }
    };

    match parse_model_score(&raw) {
        Some(result) => result,
        None => fallback(jd_criteria, cv_criteria, "malformed output"),
    }
}

/// Strict parse of model scoring output, with the same first-`{`-to-last-`}`
/// recovery used by criteria extraction. `None` means malformed.
fn parse_model_score(raw: &str) -> Option<ScoringResult> {
    let parsed = serde_json::from_str::<RawScoringResult>(raw)
        .ok()
        .or_else(|| {
            recover_object(raw).and_then(|s| serde_json::from_str::<RawScoringResult>(s).ok())
        })?;
    Some(parsed.normalize())
}

fn fallback(jd: &CriteriaSet, cv: &CriteriaSet, reason: &str) -> ScoringResult {
    warn!("Scoring fell back to heuristic: {reason}");
    let mut result = heuristic_score(jd, cv);
    result.fallback_reason = Some(reason.to_string());
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::ScriptedModel;
    use crate::llm::LlmError;
    use serde_json::json;

    fn jd() -> CriteriaSet {
        CriteriaSet::from_value(&json!({
            "skills": ["Rust", "Tokio", "PostgreSQL"],
            "soft_skills": ["Communication"]
        }))
    }

    fn cv() -> CriteriaSet {
        CriteriaSet::from_value(&json!({
            "skills": ["Rust", "Tokio"],
            "languages": ["English"]
        }))
    }

    fn model_output() -> String {
        json!({
            "criteria_scores": {
                "skills_experience": { "score": 82, "explanation": " strong overlap " },
                "education_certifications": { "score": 70, "explanation": "BSc CS" },
                "achievements_impact": { "score": 55, "explanation": "some impact" },
                "soft_skills": { "score": 60, "explanation": "communication listed" },
                "languages_cultural_fit": { "score": 90, "explanation": "fluent English" }
            },
            "final_score": 74.6,
            "overall_summary": "  Good technical fit.  "
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_valid_model_output_is_normalized() {
        let model = ScriptedModel::always(&model_output());
        let result = score_cv_against_jd(Some(&model), &jd(), &cv()).await;

        assert_eq!(result.provenance, ScoreProvenance::Model);
        assert_eq!(result.fallback_reason, None);
        assert_eq!(result.final_score, 75); // rounded
        assert_eq!(result.criteria_scores.skills_experience.score, 82);
        assert_eq!(
            result.criteria_scores.skills_experience.explanation,
            "strong overlap"
        );
        assert_eq!(result.overall_summary, "Good technical fit.");
    }

    #[tokio::test]
    async fn test_out_of_range_scores_are_clamped() {
        let raw = model_output().replace("\"score\":82", "\"score\":140");
        let model = ScriptedModel::always(&raw);
        let result = score_cv_against_jd(Some(&model), &jd(), &cv()).await;
        assert!(result.criteria_scores.skills_experience.score <= 100);
    }

    #[tokio::test]
    async fn test_no_model_falls_back_with_reason() {
        let result = score_cv_against_jd(None, &jd(), &cv()).await;
        assert_eq!(result.provenance, ScoreProvenance::Heuristic);
        assert_eq!(result.fallback_reason.as_deref(), Some("model unavailable"));
    }

    #[tokio::test]
    async fn test_rate_limit_falls_back_with_reason() {
        let model = ScriptedModel::new(vec![Err(LlmError::RateLimited { retries: 3 })]);
        let result = score_cv_against_jd(Some(&model), &jd(), &cv()).await;
        assert_eq!(result.provenance, ScoreProvenance::Heuristic);
        assert_eq!(result.fallback_reason.as_deref(), Some("rate limit"));
    }

    #[tokio::test]
    async fn test_malformed_output_falls_back() {
        let model = ScriptedModel::always("I think the candidate is great, score 9/10!");
        let result = score_cv_against_jd(Some(&model), &jd(), &cv()).await;
        assert_eq!(result.provenance, ScoreProvenance::Heuristic);
        assert_eq!(result.fallback_reason.as_deref(), Some("malformed output"));
    }

    #[tokio::test]
    async fn test_missing_criterion_key_is_malformed() {
        let raw = model_output().replace("languages_cultural_fit", "languages");
        let model = ScriptedModel::always(&raw);
        let result = score_cv_against_jd(Some(&model), &jd(), &cv()).await;
        assert_eq!(result.fallback_reason.as_deref(), Some("malformed output"));
    }

    #[tokio::test]
    async fn test_extra_criterion_key_is_malformed() {
        let raw = model_output().replace(
            "\"skills_experience\"",
            "\"bonus\": {\"score\": 1, \"explanation\": \"x\"}, \"skills_experience\"",
        );
        let model = ScriptedModel::always(&raw);
        let result = score_cv_against_jd(Some(&model), &jd(), &cv()).await;
        assert_eq!(result.fallback_reason.as_deref(), Some("malformed output"));
    }

    #[tokio::test]
    async fn test_recovery_of_object_wrapped_in_prose() {
        let wrapped = format!("Here is my evaluation:\n{}\nHope this helps.", model_output());
        let model = ScriptedModel::always(&wrapped);
        let result = score_cv_against_jd(Some(&model), &jd(), &cv()).await;
        assert_eq!(result.provenance, ScoreProvenance::Model);
    }

    #[test]
    fn test_serialized_shape_omits_absent_fallback_reason() {
        let model = parse_model_score(&model_output()).unwrap();
        let value = serde_json::to_value(&model).unwrap();
        assert!(value.get("fallback_reason").is_none());
        assert_eq!(value["provenance"], "model");
        assert_eq!(
            value["criteria_scores"]
                .as_object()
                .unwrap()
                .len(),
            5
        );
    }

    #[test]
    fn test_clamp_score_bounds() {
        assert_eq!(clamp_score(-4.0), 0);
        assert_eq!(clamp_score(100.4), 100);
        assert_eq!(clamp_score(49.5), 50);
        assert_eq!(clamp_score(f64::NAN), 0);
    }

    #[test]
    fn test_weights_sum_to_one() {
        let sum = WEIGHT_SKILLS_EXPERIENCE
            + WEIGHT_EDUCATION_CERTIFICATIONS
            + WEIGHT_ACHIEVEMENTS_IMPACT
            + WEIGHT_SOFT_SKILLS
            + WEIGHT_LANGUAGES_CULTURAL_FIT;
        assert!((sum - 1.0).abs() < f64::EPSILON);
    }
}
