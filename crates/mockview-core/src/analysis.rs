//! Scoring-report shape, transcript pairing and the canned fallback report.

use crate::model::{
    clamp_score, de_score, CategoryScores, InterviewAnalysis, QuestionFeedback, QuestionRating,
    TranscriptTurn,
};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static JSON_ARRAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\[.*\]").expect("valid regex"));
static JSON_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"));

/// First `[` through last `]` of a model reply, if any.
pub fn extract_json_array(text: &str) -> Option<&str> {
    JSON_ARRAY.find(text).map(|m| m.as_str())
}

/// First `{` through last `}` of a model reply, if any.
pub fn extract_json_object(text: &str) -> Option<&str> {
    JSON_OBJECT.find(text).map(|m| m.as_str())
}

/// One question paired with the candidate's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QaPair {
    pub question: String,
    pub user_response: String,
}

/// A conversation item as posted to the completion pipeline. Roles are free text:
/// `agent` and `ai` are the interviewer, `user` is the candidate, anything else is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationItem {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl From<&TranscriptTurn> for ConversationItem {
    fn from(turn: &TranscriptTurn) -> Self {
        Self {
            role: turn.role.as_str().to_string(),
            content: turn.content.clone(),
        }
    }
}

/// Pair interviewer turns with the candidate turn that follows them.
///
/// A later interviewer turn replaces a pending question that was never answered;
/// a candidate turn with no pending question is dropped.
pub fn pair_transcript(items: &[ConversationItem]) -> Vec<QaPair> {
    let mut pairs = Vec::new();
    let mut pending: Option<&str> = None;
    for item in items {
        match item.role.as_str() {
            "agent" | "ai" => pending = Some(item.content.as_str()),
            "user" => {
                if let Some(question) = pending.take().filter(|q| !q.is_empty()) {
                    pairs.push(QaPair {
                        question: question.to_string(),
                        user_response: item.content.clone(),
                    });
                }
            }
            _ => {}
        }
    }
    pairs
}

/// Scored report as produced by the LLM (camelCase keys).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    #[serde(deserialize_with = "de_score")]
    pub overall_score: u8,
    #[serde(default)]
    pub category_scores: CategoryScores,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub areas_for_improvement: Vec<String>,
    #[serde(default)]
    pub detailed_feedback: String,
    #[serde(default)]
    pub question_feedback: Vec<QuestionFeedback>,
    #[serde(default)]
    pub hiring_recommendation: String,
    #[serde(default)]
    pub interview_tips: Vec<String>,
}

impl AnalysisReport {
    /// Stored row for `interview_id`.
    pub fn into_record(self, interview_id: &str) -> InterviewAnalysis {
        InterviewAnalysis {
            id: uuid::Uuid::new_v4().to_string(),
            interview_id: interview_id.to_string(),
            overall_score: self.overall_score,
            category_scores: self.category_scores,
            strengths: self.strengths,
            areas_for_improvement: self.areas_for_improvement,
            detailed_feedback: self.detailed_feedback,
            question_feedback: self.question_feedback,
            hiring_recommendation: self.hiring_recommendation,
            interview_tips: self.interview_tips,
            created_at: Utc::now(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Canned report used when the scoring model is unavailable or unparseable.
pub fn fallback_analysis(question_count: usize) -> AnalysisReport {
    AnalysisReport {
        overall_score: clamp_score(72.0),
        category_scores: CategoryScores {
            communication: 70,
            technical_knowledge: 72,
            problem_solving: 75,
            culture_fit: 74,
            confidence: 68,
            relevant_experience: 73,
        },
        strengths: strings(&[
            "Completed the full interview practice session",
            "Showed commitment to improving interview skills",
            "Engaged thoughtfully with each question",
        ]),
        areas_for_improvement: strings(&[
            "Practice the STAR method for behavioral questions",
            "Prepare 2-3 strong examples from past experience",
            "Research the company and role before interviews",
        ]),
        detailed_feedback: "Great job completing this practice session! Keep practicing to build your confidence. \
            The more you interview, the more natural it becomes. Focus on having specific examples ready and \
            remember - interviews are conversations, not tests."
            .to_string(),
        question_feedback: (1..=question_count as u32)
            .map(|n| QuestionFeedback {
                question_number: n,
                rating: QuestionRating::Good,
                feedback: "Keep practicing with specific examples!".to_string(),
            })
            .collect(),
        hiring_recommendation: "Keep Practicing".to_string(),
        interview_tips: strings(&[
            "Use the STAR method: Situation, Task, Action, Result",
            "Prepare 3-5 stories that showcase different skills",
            "Have thoughtful questions ready for the interviewer",
        ]),
    }
}

/// Report for a call that produced no answerable question.
pub(crate) fn empty_transcript_analysis() -> AnalysisReport {
    AnalysisReport {
        detailed_feedback: "We couldn't capture enough of your interview responses to provide detailed feedback. \
            This may have happened if the interview ended too quickly or there was a connection issue. \
            Please try another practice interview."
            .to_string(),
        strengths: strings(&["You took the initiative to practice interviewing"]),
        areas_for_improvement: strings(&["Complete more questions for a full analysis"]),
        interview_tips: strings(&[
            "Speak clearly into the microphone",
            "Take your time to give complete answers",
            "Practice a full interview session",
        ]),
        ..fallback_analysis(0)
    }
}
