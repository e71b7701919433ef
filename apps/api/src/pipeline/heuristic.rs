//! Heuristic fallback scorer — pure, deterministic keyword-overlap scoring.
//!
//! Guarantees the pipeline always completes even with zero model availability.
//! The asymmetric floors keep a total-mismatch CV above zero (a literal 0 reads
//! as a system error rather than a genuine low match) while preserving the
//! rank order induced by keyword overlap.

use std::collections::BTreeSet;

use crate::pipeline::criteria::CriteriaSet;
use crate::pipeline::scoring::{
    clamp_score, CriteriaScores, CriterionScore, ScoreProvenance, ScoringResult,
    WEIGHT_ACHIEVEMENTS_IMPACT, WEIGHT_EDUCATION_CERTIFICATIONS, WEIGHT_LANGUAGES_CULTURAL_FIT,
    WEIGHT_SKILLS_EXPERIENCE, WEIGHT_SOFT_SKILLS,
};

const STOP_WORDS: [&str; 16] = [
    "and", "with", "for", "the", "this", "that", "have", "has", "are", "was", "were", "you",
    "our", "job", "role", "will",
];

/// Lowercases, strips everything outside `[a-z0-9+#-]` and space, splits on
/// whitespace, and drops short tokens and stop words. `BTreeSet` keeps the
/// missing-keyword report deterministic.
fn tokenize(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '+' | '#' | '-' | ' ') {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .filter(|w| w.len() > 2 && !STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// Scores a CV against a JD by keyword overlap. Pure and deterministic: the
/// same criteria sets always yield the same result.
pub fn heuristic_score(jd_criteria: &CriteriaSet, cv_criteria: &CriteriaSet) -> ScoringResult {
    let jd_tokens = tokenize(&jd_criteria.flatten_to_text());
    let cv_tokens = tokenize(&cv_criteria.flatten_to_text());

    let overlap = jd_tokens.intersection(&cv_tokens).count();
    let ratio = if jd_tokens.is_empty() {
        0.0
    } else {
        overlap as f64 / jd_tokens.len() as f64
    };

    // skills_experience tracks the overlap directly; the remaining criteria sit
    // at fixed offsets below it, each floored above zero.
    let skills = clamp_score(ratio * 100.0).clamp(20, 100) as i64;
    let education = (skills - 10).max(10) as u32;
    let achievements = (skills - 30).max(5) as u32;
    let soft_skills = (skills - 25).max(5) as u32;
    let languages = (skills - 15).max(5) as u32;
    let skills = skills as u32;

    let final_score = clamp_score(
        WEIGHT_SKILLS_EXPERIENCE * skills as f64
            + WEIGHT_EDUCATION_CERTIFICATIONS * education as f64
            + WEIGHT_ACHIEVEMENTS_IMPACT * achievements as f64
            + WEIGHT_SOFT_SKILLS * soft_skills as f64
            + WEIGHT_LANGUAGES_CULTURAL_FIT * languages as f64,
    );

    let missing: Vec<&str> = jd_tokens
        .difference(&cv_tokens)
        .take(5)
        .map(String::as_str)
        .collect();
    let coverage_line = format!(
        "Keyword overlap: {:.1}% of JD terms found in CV ({overlap}/{}).",
        ratio * 100.0,
        jd_tokens.len()
    );
    let missing_line = if missing.is_empty() {
        "Most JD terms present.".to_string()
    } else {
        format!("Missing/not prominent terms: {}.", missing.join(", "))
    };

    ScoringResult {
        criteria_scores: CriteriaScores {
            skills_experience: CriterionScore {
                score: skills,
                explanation: coverage_line.clone(),
            },
            education_certifications: CriterionScore {
                score: education,
                explanation: "Education signal approximated from overall keyword overlap."
                    .to_string(),
            },
            achievements_impact: CriterionScore {
                score: achievements,
                explanation: "Achievements rarely surface as JD keywords; discounted accordingly."
                    .to_string(),
            },
            soft_skills: CriterionScore {
                score: soft_skills,
                explanation: "Soft skills approximated from overall keyword overlap.".to_string(),
            },
            languages_cultural_fit: CriterionScore {
                score: languages,
                explanation: "Language and domain fit approximated from overall keyword overlap."
                    .to_string(),
            },
        },
        final_score,
        overall_summary: format!("{coverage_line} {missing_line}"),
        provenance: ScoreProvenance::Heuristic,
        fallback_reason: None,
    }
}
