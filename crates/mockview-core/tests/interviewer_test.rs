//! Interviewer behaviour against scripted LLM replies.

use mockview_core::{
    pair_transcript, ConversationItem, HistoryItem, Interviewer, LlmBackend, LlmError,
    QuestionRating, FALLBACK_QUESTIONS,
};
use std::sync::{Arc, Mutex};

/// Replies with a fixed string (or fails) and records every user prompt it saw.
struct ScriptedLlm {
    reply: Option<String>,
    seen: Mutex<Vec<(String, f32)>>,
}

impl ScriptedLlm {
    fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply.to_string()),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait::async_trait]
impl LlmBackend for ScriptedLlm {
    async fn complete(&self, _system: &str, user: &str, temperature: f32) -> Result<String, LlmError> {
        self.seen.lock().unwrap().push((user.to_string(), temperature));
        self.reply.clone().ok_or(LlmError::MissingApiKey)
    }
}

#[tokio::test]
async fn questions_parse_from_chatty_reply() {
    let llm = ScriptedLlm::replying("Here are your questions:\n[\"Q one?\", \"Q two?\"]\nGood luck!");
    let interviewer = Interviewer::new(llm.clone());
    let qs = interviewer
        .generate_questions("SRE", "On-call heavy", "", 2)
        .await;
    assert_eq!(qs, vec!["Q one?".to_string(), "Q two?".to_string()]);
    assert_eq!(llm.seen.lock().unwrap()[0].1, 0.9);
}

#[tokio::test]
async fn questions_fall_back_to_fixed_set() {
    let interviewer = Interviewer::new(ScriptedLlm::failing());
    let qs = interviewer.generate_questions("SRE", "", "", 3).await;
    assert_eq!(qs.len(), 3);
    assert_eq!(qs[0], FALLBACK_QUESTIONS[0]);

    let garbage = Interviewer::new(ScriptedLlm::replying("no list today"));
    assert_eq!(garbage.generate_questions("SRE", "", "", 8).await.len(), 8);
}

#[tokio::test]
async fn greeting_falls_back_with_role() {
    let interviewer = Interviewer::new(ScriptedLlm::failing());
    let g = interviewer.generate_greeting("Data Engineer", "Candidate").await;
    assert!(g.starts_with("Hey Candidate! "));
    assert!(g.contains("the Data Engineer role"));
}

#[tokio::test]
async fn follow_up_uses_only_recent_history() {
    let llm = ScriptedLlm::replying("Oh interesting! So, what's next?");
    let interviewer = Interviewer::new(llm.clone());
    let history = vec![
        HistoryItem { question: "first-q".into(), response: "first-a".into() },
        HistoryItem { question: "second-q".into(), response: "second-a".into() },
        HistoryItem { question: "third-q".into(), response: "third-a".into() },
    ];
    let reply = interviewer
        .generate_follow_up("Why Rust?", "Speed", &history, Some("Tell me about a bug"))
        .await;
    assert_eq!(reply, "Oh interesting! So, what's next?");

    let seen = llm.seen.lock().unwrap();
    let prompt = &seen[0].0;
    assert!(!prompt.contains("first-q"));
    assert!(prompt.contains("second-q"));
    assert!(prompt.contains("third-a"));
}

#[tokio::test]
async fn follow_up_fallback_transitions_or_closes() {
    let interviewer = Interviewer::new(ScriptedLlm::failing());
    let next = interviewer
        .generate_follow_up("Q", "A", &[], Some("What motivates you?"))
        .await;
    assert!(next.ends_with("So, What motivates you?"));

    let last = interviewer.generate_follow_up("Q", "A", &[], None).await;
    assert!(last.starts_with("Thank you so much"));
}

#[tokio::test]
async fn analysis_from_transcript_end_to_end() {
    let reply = r#"```json
{
  "overallScore": 104.6,
  "categoryScores": {"communication": 81, "technicalKnowledge": 77.4, "problemSolving": 70,
                     "cultureFit": 90, "confidence": -5, "relevantExperience": 60},
  "strengths": ["Clear examples"],
  "areasForImprovement": ["Quantify impact"],
  "detailedFeedback": "Solid.",
  "questionFeedback": [{"questionNumber": 1, "rating": "needs improvement", "feedback": "Expand"}],
  "hiringRecommendation": "Strong Candidate",
  "interviewTips": ["Use STAR"]
}
```"#;
    let interviewer = Interviewer::new(ScriptedLlm::replying(reply));
    let conversation = vec![
        ConversationItem { role: "agent".into(), content: "Tell me about yourself".into() },
        ConversationItem { role: "user".into(), content: "I write Rust".into() },
    ];
    let pairs = pair_transcript(&conversation);
    let report = interviewer.generate_analysis("SRE", "", &pairs).await;

    assert_eq!(report.overall_score, 100);
    assert_eq!(report.category_scores.technical_knowledge, 77);
    assert_eq!(report.category_scores.confidence, 0);
    assert_eq!(report.question_feedback[0].rating, QuestionRating::NeedsImprovement);
    assert_eq!(report.hiring_recommendation, "Strong Candidate");
}

#[tokio::test]
async fn analysis_degrades_instead_of_failing() {
    let pairs = pair_transcript(&[
        ConversationItem { role: "ai".into(), content: "Q1".into() },
        ConversationItem { role: "user".into(), content: "A1".into() },
    ]);

    let down = Interviewer::new(ScriptedLlm::failing());
    let report = down.generate_analysis("SRE", "", &pairs).await;
    assert_eq!(report.overall_score, 72);
    assert_eq!(report.question_feedback.len(), 1);

    let malformed = Interviewer::new(ScriptedLlm::replying("{not json}"));
    assert_eq!(malformed.generate_analysis("SRE", "", &pairs).await.overall_score, 72);

    let empty = down.generate_analysis("SRE", "", &[]).await;
    assert!(empty.detailed_feedback.starts_with("We couldn't capture"));
}
