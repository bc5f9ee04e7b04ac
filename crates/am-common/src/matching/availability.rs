use std::collections::HashSet;

use super::{NEUTRAL_SCORE, round_score};
use crate::{AvailabilitySlot, DayOfWeek, TimeSlot};

pub type SlotKey = (DayOfWeek, TimeSlot);

/// The set of weekly cells a user has marked available.
pub fn available_slots(slots: &[AvailabilitySlot]) -> HashSet<SlotKey> {
    slots
        .iter()
        .filter(|slot| slot.is_available)
        .map(AvailabilitySlot::key)
        .collect()
}

/// Jaccard overlap of the two weekly grids, scaled to 0..=100.
pub fn score_availability(a: &[AvailabilitySlot], b: &[AvailabilitySlot]) -> u8 {
    if a.is_empty() || b.is_empty() {
        return NEUTRAL_SCORE;
    }

    let first = available_slots(a);
    let second = available_slots(b);
    let union = first.union(&second).count();
    if union == 0 {
        return NEUTRAL_SCORE;
    }

    let overlap = first.intersection(&second).count();
    round_score(overlap as f64 / union as f64 * 100.0)
}
