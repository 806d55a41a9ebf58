//! Local quote pools used when the insight service is unavailable.

use crate::session::{Message, SessionType};
use once_cell::sync::Lazy;
use rand::Rng;
use rand::seq::SliceRandom;
use regex::Regex;

/// Themes recognized in the user's messages, in matching priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Stress,
    Gratitude,
    Work,
    Rest,
    General,
}

static STRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(stress\w*|anxi\w*|overwhelm\w*|worr\w*|panic\w*)").expect("valid regex")
});
static GRATITUDE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(grateful|gratitude|thankful|thanks|appreciat\w*)").expect("valid regex")
});
static WORK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(work\w*|job|career|deadline\w*|meeting\w*|project\w*|boss)\b")
        .expect("valid regex")
});
static REST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(tired|sleep\w*|exhaust\w*|rest\w*|slept)\b").expect("valid regex")
});

impl Topic {
    /// Picks the first topic whose keywords appear in `text`.
    pub fn detect(text: &str) -> Self {
        [
            (Self::Stress, &*STRESS),
            (Self::Gratitude, &*GRATITUDE),
            (Self::Work, &*WORK),
            (Self::Rest, &*REST),
        ]
        .into_iter()
        .find(|(_, pattern)| pattern.is_match(text))
        .map(|(topic, _)| topic)
        .unwrap_or(Self::General)
    }
}

const MORNING_STRESS: &[&str] = &[
    "You don't have to carry the whole day at once. Just this breath, then the next.",
    "Worry is a visitor, not a resident. Let it pass through this morning.",
    "Begin softly. The day will meet you where you are.",
];
const MORNING_GRATITUDE: &[&str] = &[
    "Starting the day with thanks turns ordinary hours into gifts.",
    "What you appreciate this morning quietly grows all day.",
    "A grateful heart is the gentlest alarm clock.",
];
const MORNING_WORK: &[&str] = &[
    "Your worth is not measured by your to-do list.",
    "Focus on one meaningful thing; let the rest be enough.",
    "Work with intention, pause with permission.",
];
const MORNING_REST: &[&str] = &[
    "Even a tired morning can hold a small, bright moment.",
    "Move gently today. Rest is part of the work, not a reward for it.",
];
const MORNING_GENERAL: &[&str] = &[
    "Each morning is a quiet invitation to begin again.",
    "Set your intention like sunlight through leaves: soft, steady, everywhere.",
    "You are allowed to take this day one gentle step at a time.",
];

const EVENING_STRESS: &[&str] = &[
    "You made it through today. That is enough for now.",
    "Set the weight down. Tomorrow can pick up what still matters.",
    "Breathe out the day. What remains will be lighter in the morning.",
];
const EVENING_GRATITUDE: &[&str] = &[
    "Gratitude turns what we have into enough.",
    "The small good moments of today were real. Keep them close.",
    "Ending the day with thanks is a soft place to land.",
];
const EVENING_WORK: &[&str] = &[
    "The work will wait. Your evening is yours.",
    "You did what you could today, and that counts.",
    "Close the laptop, open the window, let the day go.",
];
const EVENING_REST: &[&str] = &[
    "Rest is not a reward. It is how you return to yourself.",
    "Let tonight be slow. Sleep will do the rest.",
];
const EVENING_GENERAL: &[&str] = &[
    "Every sunset is a reminder that endings can be beautiful too.",
    "Reflection is how the day becomes wisdom.",
    "Let the light fade gently. You are allowed to rest.",
];

/// Returns the curated pool for a session type and topic. Never empty.
pub fn quote_pool(session_type: SessionType, topic: Topic) -> &'static [&'static str] {
    match (session_type, topic) {
        (SessionType::Morning, Topic::Stress) => MORNING_STRESS,
        (SessionType::Morning, Topic::Gratitude) => MORNING_GRATITUDE,
        (SessionType::Morning, Topic::Work) => MORNING_WORK,
        (SessionType::Morning, Topic::Rest) => MORNING_REST,
        (SessionType::Morning, Topic::General) => MORNING_GENERAL,
        (SessionType::Evening, Topic::Stress) => EVENING_STRESS,
        (SessionType::Evening, Topic::Gratitude) => EVENING_GRATITUDE,
        (SessionType::Evening, Topic::Work) => EVENING_WORK,
        (SessionType::Evening, Topic::Rest) => EVENING_REST,
        (SessionType::Evening, Topic::General) => EVENING_GENERAL,
    }
}

/// Picks a quote matching the user's messages, uniformly within the pool.
pub fn fallback_quote<R: Rng + ?Sized>(
    messages: &[Message],
    session_type: SessionType,
    rng: &mut R,
) -> &'static str {
    let user_text = messages
        .iter()
        .filter(|m| m.is_user())
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let pool = quote_pool(session_type, Topic::detect(&user_text));
    pool.choose(rng).copied().unwrap_or(pool[0])
}
