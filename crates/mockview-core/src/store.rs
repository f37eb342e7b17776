//! Interview store: sled trees for records plus a DashMap hot cache for
//! analysis lookups (the results view polls these every few seconds).
//!
//! Trees: `interviews` (id), `responses` (`{interview_id}/{question:04}/{uuid}`),
//! `analysis` (interview id), `tokens` (bearer token -> user id).

use crate::model::{
    Interview, InterviewAnalysis, InterviewResponse, InterviewStatus, NewInterview,
};
use chrono::Utc;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::{Db, Tree};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

const DB_DIR: &str = "mockview_db";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Sled(#[from] sled::Error),

    #[error("record encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub struct InterviewStore {
    db: Db,
    interviews: Tree,
    responses: Tree,
    analysis: Tree,
    tokens: Tree,
    analysis_cache: Arc<DashMap<String, InterviewAnalysis>>,
}

fn put<T: Serialize>(tree: &Tree, key: &str, value: &T) -> StoreResult<()> {
    tree.insert(key.as_bytes(), serde_json::to_vec(value)?)?;
    Ok(())
}

fn get<T: DeserializeOwned>(tree: &Tree, key: &str) -> StoreResult<Option<T>> {
    match tree.get(key.as_bytes())? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

impl InterviewStore {
    /// Opens (or creates) the store under `storage_path/mockview_db`.
    pub fn open<P: AsRef<Path>>(storage_path: P) -> StoreResult<Self> {
        Self::open_db(sled::open(storage_path.as_ref().join(DB_DIR))?)
    }

    /// In-memory store; nothing touches disk.
    pub fn temporary() -> StoreResult<Self> {
        Self::open_db(sled::Config::new().temporary(true).open()?)
    }

    fn open_db(db: Db) -> StoreResult<Self> {
        Ok(Self {
            interviews: db.open_tree("interviews")?,
            responses: db.open_tree("responses")?,
            analysis: db.open_tree("analysis")?,
            tokens: db.open_tree("tokens")?,
            db,
            analysis_cache: Arc::new(DashMap::new()),
        })
    }

    pub fn flush(&self) -> StoreResult<()> {
        self.db.flush()?;
        Ok(())
    }

    // -- auth ---------------------------------------------------------------

    pub fn register_token(&self, token: &str, user_id: &str) -> StoreResult<()> {
        self.tokens.insert(token.as_bytes(), user_id.as_bytes())?;
        Ok(())
    }

    /// User id owning `token`, if the token is known.
    pub fn verify_token(&self, token: &str) -> StoreResult<Option<String>> {
        if token.is_empty() {
            return Ok(None);
        }
        Ok(self
            .tokens
            .get(token.as_bytes())?
            .map(|v| String::from_utf8_lossy(&v).into_owned()))
    }

    // -- interviews ---------------------------------------------------------

    pub fn create_interview(&self, new: NewInterview) -> StoreResult<Interview> {
        let interview = Interview::from_new(uuid::Uuid::new_v4().to_string(), new);
        put(&self.interviews, &interview.id, &interview)?;
        debug!(target: "mockview::store", id = %interview.id, "interview created");
        Ok(interview)
    }

    pub fn get_interview(&self, id: &str) -> StoreResult<Option<Interview>> {
        get(&self.interviews, id)
    }

    fn update_interview<F>(&self, id: &str, f: F) -> StoreResult<Option<Interview>>
    where
        F: FnOnce(&mut Interview),
    {
        let Some(mut interview) = self.get_interview(id)? else {
            return Ok(None);
        };
        f(&mut interview);
        put(&self.interviews, id, &interview)?;
        Ok(Some(interview))
    }

    pub fn mark_in_progress(&self, id: &str, call_id: Option<&str>) -> StoreResult<Option<Interview>> {
        self.update_interview(id, |i| {
            i.status = InterviewStatus::InProgress;
            i.started_at = Some(Utc::now());
            if let Some(call_id) = call_id {
                i.call_id = Some(call_id.to_string());
            }
        })
    }

    pub fn mark_completed(&self, id: &str) -> StoreResult<Option<Interview>> {
        self.update_interview(id, |i| {
            i.status = InterviewStatus::Completed;
            i.completed_at = Some(Utc::now());
        })
    }

    pub fn mark_cancelled(&self, id: &str) -> StoreResult<Option<Interview>> {
        self.update_interview(id, |i| i.status = InterviewStatus::Cancelled)
    }

    /// Provider-side record of a finished call (webhook path). Also completes the interview.
    pub fn save_call_transcript(
        &self,
        id: &str,
        transcript: serde_json::Value,
        call_duration_ms: u64,
    ) -> StoreResult<Option<Interview>> {
        self.update_interview(id, |i| {
            i.transcript = Some(transcript);
            i.call_duration_ms = Some(call_duration_ms);
            i.status = InterviewStatus::Completed;
            i.completed_at = Some(Utc::now());
        })
    }

    // -- responses ----------------------------------------------------------

    pub fn insert_response(
        &self,
        interview_id: &str,
        question_number: u32,
        question: &str,
        user_response: &str,
    ) -> StoreResult<InterviewResponse> {
        let response = InterviewResponse {
            id: uuid::Uuid::new_v4().to_string(),
            interview_id: interview_id.to_string(),
            question_number,
            question: question.to_string(),
            user_response: user_response.to_string(),
            ai_feedback: None,
            created_at: Utc::now(),
        };
        let key = format!("{}/{:04}/{}", interview_id, question_number, response.id);
        put(&self.responses, &key, &response)?;
        Ok(response)
    }

    /// Responses for one interview ordered by question number.
    pub fn list_responses(&self, interview_id: &str) -> StoreResult<Vec<InterviewResponse>> {
        let prefix = format!("{}/", interview_id);
        self.responses
            .scan_prefix(prefix.as_bytes())
            .map(|kv| {
                let (_, v) = kv?;
                Ok(serde_json::from_slice(&v)?)
            })
            .collect()
    }

    // -- analysis -----------------------------------------------------------

    /// One analysis per interview; a later insert replaces the earlier one.
    pub fn insert_analysis(&self, analysis: &InterviewAnalysis) -> StoreResult<()> {
        put(&self.analysis, &analysis.interview_id, analysis)?;
        self.analysis_cache
            .insert(analysis.interview_id.clone(), analysis.clone());
        Ok(())
    }

    pub fn get_analysis(&self, interview_id: &str) -> StoreResult<Option<InterviewAnalysis>> {
        if let Some(hit) = self.analysis_cache.get(interview_id) {
            return Ok(Some(hit.clone()));
        }
        let found: Option<InterviewAnalysis> = get(&self.analysis, interview_id)?;
        if let Some(ref a) = found {
            self.analysis_cache.insert(interview_id.to_string(), a.clone());
        }
        Ok(found)
    }
}
