use serde::Deserialize;

use crate::{AvailabilitySlot, DayOfWeek, Resources, TimeSlot, quiz::QuizAnswer};

fn available() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilitySlotInput {
    pub day_of_week: DayOfWeek,
    pub time_slot: TimeSlot,
    #[serde(default = "available")]
    pub is_available: bool,
}

impl AvailabilitySlotInput {
    pub fn into_slot(self, user_id: i64) -> AvailabilitySlot {
        AvailabilitySlot {
            user_id,
            day_of_week: self.day_of_week,
            time_slot: self.time_slot,
            is_available: self.is_available,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourcesRequest {
    #[serde(default)]
    pub has_vehicle: bool,
    #[serde(default)]
    pub budget_min: Option<i32>,
    #[serde(default)]
    pub budget_max: Option<i32>,
    #[serde(default)]
    pub can_host: bool,
    #[serde(default)]
    pub location: Option<String>,
}

impl ResourcesRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.budget_min.is_some_and(|v| v < 0) || self.budget_max.is_some_and(|v| v < 0) {
            return Err("budget values must not be negative");
        }
        if let (Some(min), Some(max)) = (self.budget_min, self.budget_max) {
            if min > max {
                return Err("budget_min must not exceed budget_max");
            }
        }
        Ok(())
    }

    pub fn into_resources(self, user_id: i64) -> Resources {
        Resources {
            user_id,
            has_vehicle: self.has_vehicle,
            budget_min: self.budget_min,
            budget_max: self.budget_max,
            can_host: self.can_host,
            location: self.location.filter(|l| !l.trim().is_empty()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompleteQuizRequest {
    pub user_id: i64,
    pub answers: Vec<QuizAnswer>,
}
