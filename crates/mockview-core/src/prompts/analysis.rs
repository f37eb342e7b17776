//! Scoring prompt: a hiring coach returns a JSON report over Q&A pairs.

use crate::analysis::QaPair;

pub const ANALYSIS_SYSTEM: &str = r#"You are an experienced hiring coach providing constructive, encouraging feedback. Your tone is:
- Supportive but honest - you genuinely want them to succeed
- Specific - reference exact things they said
- Actionable - give concrete tips they can use
- Balanced - highlight both strengths and growth areas"#;

const ANALYSIS_SCHEMA_HEAD: &str = r#"Provide detailed analysis as JSON only:
{
  "overallScore": <score 0-100 based on actual performance:
    0-40: Major gaps, needs significant practice
    40-60: Some good points but needs improvement
    60-75: Solid performance, minor areas to polish
    75-90: Strong performance
    90-100: Exceptional, interview-ready>,
  "categoryScores": {
    "communication": <0-100>,
    "technicalKnowledge": <0-100>,
    "problemSolving": <0-100>,
    "cultureFit": <0-100>,
    "confidence": <0-100>,
    "relevantExperience": <0-100>
  },
  "strengths": ["specific strength with example from their answer", "another specific strength", "third strength"],
  "areasForImprovement": ["specific area with actionable tip", "another area", "third area"],
  "detailedFeedback": "2-3 paragraphs of personalized feedback. Reference specific things they said. Be encouraging but honest. Give concrete advice.",
"#;

const ANALYSIS_SCHEMA_TAIL: &str = r#"  "hiringRecommendation": "Keep Practicing|Good Progress|Interview Ready|Expert Level",
  "interviewTips": ["specific actionable tip", "another tip", "third tip"]
}"#;

pub fn render_pairs(pairs: &[QaPair]) -> String {
    pairs
        .iter()
        .enumerate()
        .map(|(i, p)| format!("Q{}: {}\nAnswer: {}", i + 1, p.question, p.user_response))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

pub fn analysis_user_prompt(job_role: &str, job_description: &str, pairs: &[QaPair]) -> String {
    let description = if job_description.trim().is_empty() {
        String::new()
    } else {
        format!("Role Description: {}", job_description)
    };
    let per_question = (1..=pairs.len())
        .map(|n| {
            format!(
                r#"{{"questionNumber": {}, "rating": "excellent|good|average|needs improvement", "feedback": "specific feedback about THIS answer"}}"#,
                n
            )
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Review this interview for: {job_role}\n\n{description}\n\nINTERVIEW TRANSCRIPT:\n{transcript}\n\n{head}  \"questionFeedback\": [{per_question}],\n{tail}",
        transcript = render_pairs(pairs),
        head = ANALYSIS_SCHEMA_HEAD,
        tail = ANALYSIS_SCHEMA_TAIL,
    )
}
