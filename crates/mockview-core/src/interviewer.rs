//! The interviewer persona: questions, greeting, follow-ups and the final score.
//!
//! Every operation degrades to canned content when the model fails, so the
//! interview flow never blocks on the LLM collaborator.

use crate::analysis::{
    empty_transcript_analysis, extract_json_array, extract_json_object, fallback_analysis,
    AnalysisReport, QaPair,
};
use crate::llm::LlmBackend;
use crate::prompts;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

pub const FALLBACK_QUESTIONS: [&str; 8] = [
    "Can you tell me about yourself and your background?",
    "What interests you about this position?",
    "Describe a challenging project you worked on. What was your role and what was the outcome?",
    "How do you handle tight deadlines and pressure?",
    "What are your greatest strengths and how do they align with this role?",
    "Can you describe a time when you had to learn something new quickly?",
    "Where do you see yourself in five years?",
    "Do you have any questions for me about the role or company?",
];

const CLOSING_LINE: &str = "Thank you so much for all your thoughtful answers today! It was really great getting to know you better. We'll be in touch soon!";

/// A previous exchange used as follow-up context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub response: String,
}

pub struct Interviewer {
    llm: Arc<dyn LlmBackend>,
}

impl Interviewer {
    pub fn new(llm: Arc<dyn LlmBackend>) -> Self {
        Self { llm }
    }

    pub async fn generate_questions(
        &self,
        job_role: &str,
        job_description: &str,
        resume_text: &str,
        count: usize,
    ) -> Vec<String> {
        let user = prompts::questions_user_prompt(count, job_role, job_description, resume_text);
        let fallback = || {
            FALLBACK_QUESTIONS
                .iter()
                .take(count)
                .map(|q| q.to_string())
                .collect::<Vec<_>>()
        };

        let reply = match self.llm.complete(prompts::QUESTIONS_SYSTEM, &user, 0.9).await {
            Ok(r) => r,
            Err(e) => {
                warn!(target: "mockview::llm", "question generation failed: {}", e);
                return fallback();
            }
        };
        let parsed = extract_json_array(&reply)
            .and_then(|json| serde_json::from_str::<Vec<String>>(json).ok())
            .filter(|qs| !qs.is_empty());
        match parsed {
            Some(questions) => questions,
            None => {
                warn!(target: "mockview::llm", "question reply had no JSON array; using fallback");
                fallback()
            }
        }
    }

    pub async fn generate_greeting(&self, job_role: &str, candidate_name: &str) -> String {
        let user = prompts::greeting_user_prompt(job_role, candidate_name);
        match self.llm.complete(prompts::GREETING_SYSTEM, &user, 0.85).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => fallback_greeting(job_role, candidate_name),
            Err(e) => {
                warn!(target: "mockview::llm", "greeting generation failed: {}", e);
                fallback_greeting(job_role, candidate_name)
            }
        }
    }

    /// React to `answer` and transition to `next_question`, or close when there is none.
    pub async fn generate_follow_up(
        &self,
        question: &str,
        answer: &str,
        history: &[HistoryItem],
        next_question: Option<&str>,
    ) -> String {
        let recent = history[history.len().saturating_sub(2)..]
            .iter()
            .map(|h| format!("Interviewer: {}\nCandidate: {}", h.question, h.response))
            .collect::<Vec<_>>()
            .join("\n\n");
        let user = prompts::follow_up_user_prompt(&recent, question, answer, next_question);

        match self.llm.complete(prompts::FOLLOW_UP_SYSTEM, &user, 0.85).await {
            Ok(text) if !text.trim().is_empty() => text,
            other => {
                if let Err(e) = other {
                    warn!(target: "mockview::llm", "follow-up generation failed: {}", e);
                }
                match next_question {
                    Some(next) => format!(
                        "That's really helpful to know, thank you for sharing that. So, {}",
                        next
                    ),
                    None => CLOSING_LINE.to_string(),
                }
            }
        }
    }

    /// Score the paired transcript. Never fails: model errors yield the fallback report.
    pub async fn generate_analysis(
        &self,
        job_role: &str,
        job_description: &str,
        pairs: &[QaPair],
    ) -> AnalysisReport {
        if pairs.is_empty() {
            warn!(target: "mockview::llm", "no Q&A pairs to score; returning empty-transcript report");
            return empty_transcript_analysis();
        }

        let user = prompts::analysis_user_prompt(job_role, job_description, pairs);
        let reply = match self.llm.complete(prompts::ANALYSIS_SYSTEM, &user, 0.7).await {
            Ok(r) => r,
            Err(e) => {
                warn!(target: "mockview::llm", "analysis generation failed: {}", e);
                return fallback_analysis(pairs.len());
            }
        };

        let parsed = extract_json_object(&reply)
            .map(serde_json::from_str::<AnalysisReport>)
            .transpose();
        match parsed {
            Ok(Some(report)) => {
                info!(target: "mockview::llm", overall_score = report.overall_score, "analysis parsed");
                report
            }
            Ok(None) => {
                warn!(target: "mockview::llm", "analysis reply had no JSON object");
                fallback_analysis(pairs.len())
            }
            Err(e) => {
                warn!(target: "mockview::llm", "analysis JSON invalid: {}", e);
                fallback_analysis(pairs.len())
            }
        }
    }
}

fn fallback_greeting(job_role: &str, candidate_name: &str) -> String {
    let name = if candidate_name.trim().is_empty() {
        String::new()
    } else {
        format!("{}! ", candidate_name.trim())
    };
    format!(
        "Hey {}Thanks so much for joining me today! I'm Sarah, and I'll be chatting with you about the {} role. \
         Don't worry about being perfect - this is really just a conversation to get to know you better. \
         Take your time with answers, and feel free to ask me anything too. Ready to dive in?",
        name, job_role
    )
}
