// All LLM prompt constants for the scoring pipeline.

/// System prompt for CV criteria extraction — enforces JSON-only output.
pub const CV_EXTRACTION_SYSTEM: &str =
    "You are a strict JSON output generator for CV criteria extraction.";

/// System prompt for JD criteria extraction — enforces JSON-only output.
pub const JD_EXTRACTION_SYSTEM: &str =
    "You are a strict JSON output generator for Job Description criteria extraction.";

/// System prompt for CV-vs-JD scoring.
pub const SCORING_SYSTEM: &str = "You are a strict JSON output generator.";

/// CV extraction prompt template. Replace `{CV_TEXT}` before sending.
pub const CV_EXTRACTION_PROMPT: &str = r#"You are an information extraction assistant.
Your task is to extract structured data from a CV text.
Focus only on the requested criteria and ignore irrelevant text.

### Criteria to Extract:
1. Skills
2. Experience (years + description)
3. Education (degree, field, institution)
4. Certifications
5. Projects
6. Tools & Technologies
7. Domain Knowledge
8. Languages
9. Soft Skills
10. Achievements
11. Publications / Research
12. Other Relevant Info

### Output Format (JSON):
{
  "skills": [ "Python", "React", "Docker" ],
  "experience": [
    { "years": 3, "description": "Software Engineer at Company A working on Django and React" },
    { "years": 2, "description": "Frontend Developer at Company B focusing on Angular" }
  ],
  "education": [
    { "degree": "Bachelor", "field": "Computer Science", "institution": "University of X" }
  ],
  "certifications": ["AWS Certified Developer"],
  "projects": ["E-commerce web app using Django and React"],
  "tools_technologies": ["Git", "Kubernetes", "Jenkins"],
  "domain_knowledge": ["FinTech", "E-commerce"],
  "languages": ["English (Fluent)", "Vietnamese (Native)"],
  "soft_skills": ["Teamwork", "Leadership", "Communication"],
  "achievements": ["Employee of the Month 2022"],
  "publications": ["Paper on AI Optimization - IEEE 2021"],
  "other": ["Open-source contributor to Django"]
}

Return ONLY valid JSON matching the schema above (no markdown, no extra text).

Now extract the criteria from the following CV text:

{CV_TEXT}"#;

/// JD extraction prompt template. Replace `{JD_TEXT}` before sending.
pub const JD_EXTRACTION_PROMPT: &str = r#"You are an information extraction assistant.
Your task is to extract structured job requirements from a Job Description (JD) text.
Focus only on the requested criteria and ignore irrelevant text.

### Criteria to Extract:
1. Skills (required/desired)
2. Experience (years required, role context)
3. Education (degree, field, institution if specified)
4. Certifications (required or preferred)
5. Projects (type of projects expected)
6. Tools & Technologies
7. Domain Knowledge (industry/domain expertise required)
8. Languages (e.g., English, French, technical writing)
9. Soft Skills
10. Achievements (if company expects certain track record)
11. Publications / Research (if research role)
12. Other Relevant Info

### Output Format (JSON):
{
  "skills": [],
  "experience": [
    { "years_required": 3, "description": "Backend Developer experience" }
  ],
  "education": [
    { "degree": "Bachelor", "field": "Computer Science", "institution": null },
    { "degree": "Master", "field": "Computer Science", "institution": null, "preferred": true }
  ],
  "certifications": [],
  "projects": [],
  "tools_technologies": [],
  "domain_knowledge": [],
  "languages": [],
  "soft_skills": [],
  "achievements": [],
  "publications": [],
  "other": []
}

Return ONLY valid JSON matching the schema above (no markdown, no extra text).

Now extract the criteria from the following Job Description:

{JD_TEXT}"#;

/// Scoring prompt template. Replace `{JD_CRITERIA}` and `{CV_CRITERIA}` with the
/// JSON-serialized criteria sets before sending.
pub const SCORING_PROMPT: &str = r#"You are an assistant that strictly outputs JSON matching a schema.

JOB DESCRIPTION CRITERIA (JSON):
---
{JD_CRITERIA}
---

CANDIDATE CV CRITERIA (JSON):
---
{CV_CRITERIA}
---

Task: Compare the candidate CV criteria to the Job Description criteria and score the
fit on this weighted rubric (weights shown, each criterion scored 0-100):
1. skills_experience (55%): technical skills, tools, and relevant experience depth
2. education_certifications (15%): degrees, fields of study, certifications
3. achievements_impact (15%): track record, measurable accomplishments, publications
4. soft_skills (10%): communication, leadership, teamwork
5. languages_cultural_fit (5%): spoken languages and domain/cultural alignment

Return ONLY valid JSON with this exact schema (no markdown, no extra text):
{
  "criteria_scores": {
    "skills_experience": { "score": 0, "explanation": "..." },
    "education_certifications": { "score": 0, "explanation": "..." },
    "achievements_impact": { "score": 0, "explanation": "..." },
    "soft_skills": { "score": 0, "explanation": "..." },
    "languages_cultural_fit": { "score": 0, "explanation": "..." }
  },
  "final_score": 0,
  "overall_summary": "..."
}
final_score must be the weighted combination of the criterion scores.
If unsure, make a best-effort judgment."#;
