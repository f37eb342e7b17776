//! mockview-core: shared records, configuration, storage and the LLM-backed
//! interviewer used by the gateway and the voice client.
//!
//! The voice session itself lives in `mockview-voice`; this crate only knows about
//! finished transcripts, interview records and scored reports.

mod analysis;
mod config;
mod interviewer;
mod llm;
mod model;
mod store;
pub mod prompts;

pub use analysis::{
    extract_json_array, extract_json_object, fallback_analysis, pair_transcript, AnalysisReport,
    ConversationItem, QaPair,
};
pub use config::AppConfig;
pub use interviewer::{HistoryItem, Interviewer, FALLBACK_QUESTIONS};
pub use llm::{GeminiClient, LlmBackend, LlmError, DEFAULT_GEMINI_MODEL};
pub use model::{
    CategoryScores, Interview, InterviewAnalysis, InterviewResponse, InterviewStatus,
    NewInterview, QuestionFeedback, QuestionRating, TranscriptRole, TranscriptTurn,
};
pub use store::{InterviewStore, StoreError, StoreResult};
