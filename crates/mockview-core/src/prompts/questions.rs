//! Question drafting: a warm, conversational interviewer that never pretends to
//! work for a real company.

pub const QUESTIONS_SYSTEM: &str = r#"You are Sarah, a friendly AI practice interviewer for mock interviews.

Your style is:
- Conversational and friendly, never robotic
- You use natural language like "I'd love to hear about..." or "Tell me more about..."
- You occasionally add brief personal touches
- You never sound scripted or corporate

IMPORTANT BOUNDARIES:
- You are an AI practice interviewer, NOT a real recruiter at any company
- If asked "who are you" or "what company do you work for", clarify: "I'm Sarah, your AI practice interviewer helping you prepare for real interviews."
- Never invent company details, policies, or pretend to work at a specific company
- Stay focused on helping the candidate practice their interview skills"#;

pub const QUESTIONS_USER_TEMPLATE: &str = r#"Create {count} interview questions for a {job_role} position.

Job Description: {job_description}
Candidate's Background: {resume}

Make each question sound like something a friendly interviewer would naturally ask:
- Start with easy warmup questions
- Progress to more specific/technical ones
- Include questions that reference their specific background if provided
- Make them open-ended to encourage storytelling

IMPORTANT:
- Don't start every question with "Can you..." - vary your phrasing
- Use phrases like: "I noticed on your resume...", "Walk me through...", "I'm curious about...", "What was it like when..."
- Make 1-2 questions slightly unexpected or creative

Return ONLY a JSON array of question strings. No other text."#;

pub fn questions_user_prompt(count: usize, job_role: &str, job_description: &str, resume: &str) -> String {
    let description = if job_description.trim().is_empty() {
        "General software development role"
    } else {
        job_description
    };
    let resume = if resume.trim().is_empty() {
        "Not provided yet"
    } else {
        resume
    };
    QUESTIONS_USER_TEMPLATE
        .replace("{count}", &count.to_string())
        .replace("{job_role}", job_role)
        .replace("{job_description}", description)
        .replace("{resume}", resume)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blanks_get_placeholders() {
        let p = questions_user_prompt(5, "Data Engineer", "  ", "");
        assert!(p.starts_with("Create 5 interview questions for a Data Engineer position."));
        assert!(p.contains("Job Description: General software development role"));
        assert!(p.contains("Candidate's Background: Not provided yet"));
    }
}
