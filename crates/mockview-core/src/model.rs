//! Persisted records: interviews, per-question responses and scored analyses.
//!
//! Field names follow the stored row shape (snake_case); category scores and
//! question feedback keep the camelCase keys the scoring model produces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Who produced a transcript turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptRole {
    #[serde(alias = "ai")]
    Agent,
    User,
}

impl TranscriptRole {
    /// Provider roles: `"agent"` is the interviewer, everything else is the candidate.
    pub fn from_provider(role: &str) -> Self {
        if role == "agent" {
            Self::Agent
        } else {
            Self::User
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::User => "user",
        }
    }
}

/// One utterance in a call transcript. Order within a transcript is chronological.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptTurn {
    pub role: TranscriptRole,
    pub content: String,
}

impl TranscriptTurn {
    pub fn agent(content: impl Into<String>) -> Self {
        Self {
            role: TranscriptRole::Agent,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TranscriptRole::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    #[default]
    Setup,
    InProgress,
    Completed,
    Cancelled,
}

/// Fields supplied by the setup form when an interview is created.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewInterview {
    pub user_id: String,
    pub job_role: String,
    #[serde(default)]
    pub job_description: String,
    #[serde(default)]
    pub resume_text: Option<String>,
    #[serde(default = "default_question_count")]
    pub question_count: u32,
    #[serde(default)]
    pub experience_level: Option<String>,
    #[serde(default)]
    pub focus_area: Option<String>,
}

fn default_question_count() -> u32 {
    8
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interview {
    pub id: String,
    pub user_id: String,
    pub job_role: String,
    pub job_description: String,
    pub resume_text: Option<String>,
    pub question_count: u32,
    #[serde(default)]
    pub experience_level: Option<String>,
    #[serde(default)]
    pub focus_area: Option<String>,
    /// Raw transcript as delivered by the voice provider's webhook.
    #[serde(default)]
    pub transcript: Option<serde_json::Value>,
    pub status: InterviewStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub call_id: Option<String>,
    #[serde(default)]
    pub call_duration_ms: Option<u64>,
    pub created_at: DateTime<Utc>,
}

impl Interview {
    pub fn from_new(id: String, new: NewInterview) -> Self {
        Self {
            id,
            user_id: new.user_id,
            job_role: new.job_role,
            job_description: new.job_description,
            resume_text: new.resume_text,
            question_count: new.question_count,
            experience_level: new.experience_level,
            focus_area: new.focus_area,
            transcript: None,
            status: InterviewStatus::Setup,
            started_at: None,
            completed_at: None,
            call_id: None,
            call_duration_ms: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewResponse {
    pub id: String,
    pub interview_id: String,
    pub question_number: u32,
    pub question: String,
    pub user_response: String,
    pub ai_feedback: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Accepts any JSON number and clamps it into 0..=100.
pub(crate) fn de_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(clamp_score(raw))
}

pub(crate) fn clamp_score(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.round().clamp(0.0, 100.0) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScores {
    #[serde(deserialize_with = "de_score", default)]
    pub communication: u8,
    #[serde(deserialize_with = "de_score", default)]
    pub technical_knowledge: u8,
    #[serde(deserialize_with = "de_score", default)]
    pub problem_solving: u8,
    #[serde(deserialize_with = "de_score", default)]
    pub culture_fit: u8,
    #[serde(deserialize_with = "de_score", default)]
    pub confidence: u8,
    #[serde(deserialize_with = "de_score", default)]
    pub relevant_experience: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum QuestionRating {
    #[serde(rename = "excellent")]
    Excellent,
    #[serde(rename = "good")]
    Good,
    #[serde(rename = "average")]
    Average,
    #[serde(rename = "needs improvement")]
    NeedsImprovement,
}

impl From<String> for QuestionRating {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "excellent" => Self::Excellent,
            "average" => Self::Average,
            "needs improvement" | "needs_improvement" => Self::NeedsImprovement,
            _ => Self::Good,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionFeedback {
    pub question_number: u32,
    pub rating: QuestionRating,
    #[serde(default)]
    pub feedback: String,
}

/// Stored analysis row, keyed by interview id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewAnalysis {
    pub id: String,
    pub interview_id: String,
    pub overall_score: u8,
    pub category_scores: CategoryScores,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub detailed_feedback: String,
    pub question_feedback: Vec<QuestionFeedback>,
    pub hiring_recommendation: String,
    pub interview_tips: Vec<String>,
    pub created_at: DateTime<Utc>,
}
