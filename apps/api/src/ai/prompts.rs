use crate::llm_client::prompts::JSON_OBJECT_INSTRUCTION;

pub const IMPROVE_RESUME_MAX_TOKENS: u32 = 2000;
pub const COVER_LETTER_MAX_TOKENS: u32 = 1000;

/// System prompt for resume improvement. The reply is parsed best-effort as JSON.
pub fn improve_resume_system() -> String {
    format!(
        "You are an expert resume writer and ATS optimization specialist. \
Analyze the provided resume content and provide specific improvements to:
1. Make it more ATS-friendly
2. Improve keyword optimization
3. Enhance impact statements with quantifiable results
4. Improve overall structure and readability
5. Suggest better action verbs and industry-specific terminology

Return your response as a JSON object with:
- \"improved_content\": The improved resume content
- \"suggestions\": Array of specific improvement suggestions
- \"ats_score\": Estimated ATS score (0-100)
- \"keywords_added\": Array of important keywords that were added

{JSON_OBJECT_INSTRUCTION}"
    )
}

pub fn improve_resume_prompt(resume_content: &str) -> String {
    format!("Please analyze and improve this resume content: {resume_content}")
}

pub const COVER_LETTER_SYSTEM: &str = "You are an expert career advisor and professional writer \
    who specializes in creating compelling, personalized cover letters that help candidates \
    stand out to employers.";

/// Cover-letter prompt template. Placeholders are filled by `cover_letter::build_prompt`.
pub const COVER_LETTER_PROMPT_TEMPLATE: &str = "Generate a professional cover letter based on the following information:

Job Posting:
{job_posting}

Company: {company}
Role: {role}
Tone: {tone}

Resume Information:
Name: {name}
Email: {email}
Phone: {phone}
Summary: {summary}

Work Experience:
{experience}

Education:
{education}

Skills: {skills}

Please generate a personalized cover letter that:
1. Addresses the specific role and company
2. Highlights relevant experience and skills from the resume
3. Matches the job requirements mentioned in the posting
4. Uses a {tone} tone
5. Is properly formatted with appropriate paragraphs
6. Includes a compelling opening and strong closing
7. Is approximately 300-400 words

The cover letter should be professional, engaging, and tailored specifically to this job opportunity.";
