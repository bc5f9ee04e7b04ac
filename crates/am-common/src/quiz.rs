use serde::{Deserialize, Serialize};

use crate::{PersonalityTraits, matching::round_score};

/// Points per unit of an option's value; options are valued 1..=5.
const VALUE_SCALE: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub text: String,
    #[serde(default)]
    pub subtext: String,
    /// Name of the trait this option feeds, e.g. `"empathy"`.
    #[serde(rename = "trait")]
    pub trait_name: String,
    pub value: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalityQuestion {
    pub id: i64,
    pub question: String,
    pub options: Vec<QuizOption>,
    pub emoji: Option<String>,
    pub category: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizAnswer {
    pub question_id: i64,
    /// Zero-based index into the question's options.
    pub selected_option: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOutcome {
    pub personality_type: String,
    pub personality_description: String,
    pub traits: PersonalityTraits,
}

fn selected_option<'q>(
    questions: &'q [PersonalityQuestion],
    answer: &QuizAnswer,
) -> Option<&'q QuizOption> {
    questions
        .iter()
        .find(|q| q.id == answer.question_id)
        .and_then(|q| q.options.get(answer.selected_option))
}

/// Answers that point at an existing question and one of its options.
pub fn known_answers(questions: &[PersonalityQuestion], answers: Vec<QuizAnswer>) -> Vec<QuizAnswer> {
    answers
        .into_iter()
        .filter(|answer| selected_option(questions, answer).is_some())
        .collect()
}

/// Averages the scaled option values per trait.
///
/// Answers to unknown questions, out-of-range option indexes and unknown trait
/// names are ignored. Traits nobody answered for stay `None`.
pub fn derive_traits(questions: &[PersonalityQuestion], answers: &[QuizAnswer]) -> PersonalityTraits {
    let mut sums = [(0.0_f64, 0u32); 5];

    for answer in answers {
        let Some(option) = selected_option(questions, answer) else {
            continue;
        };

        if let Some(index) = PersonalityTraits::NAMES
            .iter()
            .position(|name| *name == option.trait_name)
        {
            sums[index].0 += option.value as f64 * VALUE_SCALE;
            sums[index].1 += 1;
        }
    }

    let mut traits = PersonalityTraits::default();
    for (name, (sum, count)) in PersonalityTraits::NAMES.iter().zip(sums) {
        if count > 0 {
            if let Some(slot) = traits.get_mut(name) {
                *slot = Some(round_score(sum / count as f64));
            }
        }
    }

    traits
}

/// Picks the personality type; the first matching rule wins.
pub fn classify_personality(traits: &PersonalityTraits) -> (&'static str, &'static str) {
    let score = |value: Option<u8>| value.unwrap_or(0);
    let extroversion = score(traits.extroversion);
    let adventure = score(traits.adventure);
    let planning = score(traits.planning);
    let creativity = score(traits.creativity);
    let empathy = score(traits.empathy);

    if adventure >= 80 && extroversion >= 70 {
        (
            "The Explorer",
            "Adventurous, curious, and loves trying new experiences with others",
        )
    } else if creativity >= 80 && empathy >= 70 {
        (
            "The Creator",
            "Creative and empathetic, enjoys meaningful artistic experiences",
        )
    } else if planning >= 80 && extroversion >= 70 {
        (
            "The Organizer",
            "Structured and social, loves planning perfect group activities",
        )
    } else if empathy >= 80 && extroversion >= 70 {
        (
            "The Connector",
            "Warm and social, brings people together through shared interests",
        )
    } else if planning >= 80 && creativity >= 70 {
        (
            "The Strategist",
            "Analytical and creative, enjoys well-planned intellectual pursuits",
        )
    } else {
        (
            "The Balanced",
            "Well-rounded personality with diverse interests and social flexibility",
        )
    }
}

pub fn evaluate_quiz(questions: &[PersonalityQuestion], answers: &[QuizAnswer]) -> QuizOutcome {
    let traits = derive_traits(questions, answers);
    let (personality_type, personality_description) = classify_personality(&traits);

    QuizOutcome {
        personality_type: personality_type.to_string(),
        personality_description: personality_description.to_string(),
        traits,
    }
}
