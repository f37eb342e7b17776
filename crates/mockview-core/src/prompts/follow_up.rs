//! Follow-up turns: react to the last answer, then weave in the next question
//! (or close the session when there is none).

pub const FOLLOW_UP_SYSTEM: &str = r#"You are Sarah, a friendly AI practice interviewer having a genuine conversation.

Your style:
- React authentically to what candidates say (show genuine interest, surprise, curiosity)
- Use natural verbal habits: "Oh interesting!", "I see", "That makes sense"
- Transition smoothly between topics
- NEVER sound like you're reading from a script
- Keep responses concise (2-4 sentences max)

IMPORTANT BOUNDARIES:
- You are an AI practice interviewer, NOT a real recruiter
- If asked about "your company" or "your role", clarify you're an AI helping them practice
- Never invent company details or pretend to work somewhere"#;

const BRIEF_ANSWER_GUIDANCE: &str = "\n\nNote: The candidate gave a brief or uncertain response. Gently encourage them to elaborate or offer to rephrase the question if helpful.";

const UNCERTAIN_MARKERS: [&str; 4] = ["i don't know", "not sure", "no experience", "i haven't"];

/// Under ten words, or hedging phrases anywhere in the answer.
pub fn is_brief_or_uncertain(answer: &str) -> bool {
    let words = answer.split_whitespace().count();
    let lowered = answer.to_lowercase();
    words < 10 || UNCERTAIN_MARKERS.iter().any(|m| lowered.contains(m))
}

/// `recent_history` is already rendered as "Interviewer: ...\nCandidate: ..." blocks.
pub fn follow_up_user_prompt(
    recent_history: &str,
    question: &str,
    answer: &str,
    next_question: Option<&str>,
) -> String {
    let history = if recent_history.is_empty() {
        "Just started"
    } else {
        recent_history
    };
    let guidance = if is_brief_or_uncertain(answer) {
        BRIEF_ANSWER_GUIDANCE
    } else {
        ""
    };
    let (direction, step_two) = match next_question {
        Some(next) => (
            format!(
                "Now smoothly transition and ask this next question: \"{}\"\nDO NOT say \"Here's my next question\" or anything similar - just naturally weave it into your response.",
                next
            ),
            "Smoothly transition to the next question",
        ),
        None => (
            "This was the final question - wrap up warmly and thank them for the practice session.".to_string(),
            "Thank them warmly and let them know the practice interview is complete.",
        ),
    };

    format!(
        "Recent conversation:\n{history}\n\nYou just asked: \"{question}\"\nThey replied: \"{answer}\"{guidance}\n\n{direction}\n\n\
         Respond naturally as Sarah would:\n\
         1. React genuinely to their answer (be specific about what they said - don't be generic!)\n\
         2. {step_two}\n\n\
         Use contractions (I'm, that's, you've). Be warm but professional."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_or_hedging_answers_get_guidance() {
        assert!(is_brief_or_uncertain("Yes."));
        assert!(is_brief_or_uncertain(
            "Honestly I'm not sure how I would approach a distributed cache like that one"
        ));
        assert!(!is_brief_or_uncertain(
            "I led the migration of our billing system to event sourcing over two quarters"
        ));

        let p = follow_up_user_prompt("", "Why Rust?", "Speed.", None);
        assert!(p.contains("Just started"));
        assert!(p.contains("Gently encourage them"));
        assert!(p.contains("This was the final question"));
    }

    #[test]
    fn next_question_is_woven_in() {
        let p = follow_up_user_prompt(
            "Interviewer: Hi\nCandidate: Hello",
            "Why Rust?",
            "Because the borrow checker catches whole classes of bugs before they ship to production",
            Some("What's a hard bug you fixed?"),
        );
        assert!(p.contains("ask this next question: \"What's a hard bug you fixed?\""));
        assert!(!p.contains("Gently encourage"));
    }
}
