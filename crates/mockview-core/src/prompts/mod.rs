//! Prompt templates for the interviewer persona and the scoring coach.

pub mod analysis;
pub mod follow_up;
pub mod greeting;
pub mod questions;

pub use analysis::{analysis_user_prompt, ANALYSIS_SYSTEM};
pub use follow_up::{follow_up_user_prompt, FOLLOW_UP_SYSTEM};
pub use greeting::{greeting_user_prompt, GREETING_SYSTEM};
pub use questions::{questions_user_prompt, QUESTIONS_SYSTEM};
