//! Cover-letter generation.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ai::prompts::{COVER_LETTER_MAX_TOKENS, COVER_LETTER_PROMPT_TEMPLATE, COVER_LETTER_SYSTEM};
use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::models::resume::ResumeContent;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverLetterRequest {
    #[serde(default)]
    pub job_posting: String,
    #[serde(default)]
    pub resume_content: ResumeContent,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub role: String,
    #[serde(default = "default_tone")]
    pub tone: String,
}

fn default_tone() -> String {
    "professional".to_string()
}

#[derive(Debug, Serialize)]
pub struct CoverLetterResponse {
    pub success: bool,
    pub content: String,
}

/// Fills the cover-letter template from the request.
pub fn build_prompt(request: &CoverLetterRequest) -> String {
    let resume = &request.resume_content;
    let info = resume.personal_info.clone().unwrap_or_default();

    let experience = if resume.experience.is_empty() {
        "No experience listed".to_string()
    } else {
        resume
            .experience
            .iter()
            .map(|exp| {
                format!(
                    "- {} at {} ({} - {}): {}",
                    exp.title, exp.company, exp.start_date, exp.end_date, exp.description
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let education = if resume.education.is_empty() {
        "No education listed".to_string()
    } else {
        resume
            .education
            .iter()
            .map(|edu| format!("- {} from {} ({})", edu.degree, edu.school, edu.year_label()))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let skills = if resume.skills.is_empty() {
        "No skills listed".to_string()
    } else {
        resume.skills.join(", ")
    };

    fill_template(
        COVER_LETTER_PROMPT_TEMPLATE,
        &[
            ("job_posting", request.job_posting.as_str()),
            ("company", request.company.as_str()),
            ("role", request.role.as_str()),
            ("tone", request.tone.as_str()),
            ("name", info.name.as_deref().unwrap_or("Applicant")),
            ("email", info.email.as_deref().unwrap_or("")),
            ("phone", info.phone.as_deref().unwrap_or("")),
            ("summary", resume.summary.as_deref().unwrap_or("")),
            ("experience", &experience),
            ("education", &education),
            ("skills", &skills),
        ],
    )
}

/// Single-pass `{key}` substitution; substituted text is never rescanned,
/// so user input containing braces passes through untouched.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() * 2);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, close))
        });
        match replaced {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

pub async fn generate_cover_letter(
    llm: &LlmClient,
    request: &CoverLetterRequest,
) -> Result<CoverLetterResponse, AppError> {
    let prompt = build_prompt(request);
    let content = llm
        .call_text(&prompt, COVER_LETTER_SYSTEM, COVER_LETTER_MAX_TOKENS)
        .await?;

    info!(
        "Cover letter generated for {} at {}",
        request.role, request.company
    );
    Ok(CoverLetterResponse {
        success: true,
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(body: serde_json::Value) -> CoverLetterRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_prompt_uses_placeholders_for_empty_resume() {
        let prompt = build_prompt(&request(serde_json::json!({
            "jobPosting": "We need a Rust engineer.",
            "resumeContent": {},
            "company": "Acme",
            "role": "Engineer",
            "tone": "enthusiastic"
        })));

        assert!(prompt.contains("Job Posting:\nWe need a Rust engineer."));
        assert!(prompt.contains("Company: Acme"));
        assert!(prompt.contains("Name: Applicant"));
        assert!(prompt.contains("No experience listed"));
        assert!(prompt.contains("No education listed"));
        assert!(prompt.contains("Skills: No skills listed"));
        assert!(prompt.contains("4. Uses a enthusiastic tone"));
    }

    #[test]
    fn test_prompt_renders_resume_sections() {
        let prompt = build_prompt(&request(serde_json::json!({
            "jobPosting": "Backend role",
            "resumeContent": {
                "personalInfo": { "name": "Jane Doe", "email": "jane@example.com" },
                "summary": "Systems engineer",
                "experience": [{
                    "title": "Engineer", "company": "Globex",
                    "startDate": "2019", "endDate": "2023",
                    "description": "Built billing"
                }],
                "education": [{ "degree": "BSc", "school": "MIT", "year": 2018 }],
                "skills": ["Rust", "SQL"]
            },
            "company": "Acme",
            "role": "Engineer",
            "tone": "formal"
        })));

        assert!(prompt.contains("Name: Jane Doe"));
        assert!(prompt.contains("- Engineer at Globex (2019 - 2023): Built billing"));
        assert!(prompt.contains("- BSc from MIT (2018)"));
        assert!(prompt.contains("Skills: Rust, SQL"));
    }

    #[test]
    fn test_user_braces_are_not_substituted() {
        let prompt = build_prompt(&request(serde_json::json!({
            "jobPosting": "Use {tone} and {company} literally",
            "company": "Acme",
            "role": "Engineer",
            "tone": "warm"
        })));
        assert!(prompt.contains("Use {tone} and {company} literally"));
    }

    #[test]
    fn test_fill_template_leaves_unknown_keys() {
        assert_eq!(fill_template("a {x} {y} {", &[("x", "1")]), "a 1 {y} {");
    }
}
