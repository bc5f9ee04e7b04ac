pub mod api;
pub mod db;
pub mod logging;
pub mod matching;
pub mod quiz;
pub mod run_id;
pub mod service;
pub mod store;

use serde::{Deserialize, Deserializer, Serialize, de};
use strum::{AsRefStr, EnumString};

// Commonly used data models for matching functions.

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TimeSlot {
    Morning,
    Afternoon,
    Evening,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
    #[default]
    All,
}

/// Quiz-derived trait scores, each in 0..=100. `None` means the trait is unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalityTraits {
    #[serde(default, deserialize_with = "trait_score")]
    pub extroversion: Option<u8>,
    #[serde(default, deserialize_with = "trait_score")]
    pub adventure: Option<u8>,
    #[serde(default, deserialize_with = "trait_score")]
    pub planning: Option<u8>,
    #[serde(default, deserialize_with = "trait_score")]
    pub creativity: Option<u8>,
    #[serde(default, deserialize_with = "trait_score")]
    pub empathy: Option<u8>,
}

fn trait_score<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<u8>::deserialize(deserializer)? {
        Some(value) if value > 100 => Err(de::Error::custom(format!(
            "trait score {value} is outside 0..=100"
        ))),
        other => Ok(other),
    }
}

impl PersonalityTraits {
    pub const NAMES: [&'static str; 5] =
        ["extroversion", "adventure", "planning", "creativity", "empathy"];

    pub fn new(extroversion: u8, adventure: u8, planning: u8, creativity: u8, empathy: u8) -> Self {
        Self {
            extroversion: Some(extroversion),
            adventure: Some(adventure),
            planning: Some(planning),
            creativity: Some(creativity),
            empathy: Some(empathy),
        }
    }

    /// Values in `NAMES` order.
    pub fn values(&self) -> [Option<u8>; 5] {
        [
            self.extroversion,
            self.adventure,
            self.planning,
            self.creativity,
            self.empathy,
        ]
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Option<u8>> {
        match name {
            "extroversion" => Some(&mut self.extroversion),
            "adventure" => Some(&mut self.adventure),
            "planning" => Some(&mut self.planning),
            "creativity" => Some(&mut self.creativity),
            "empathy" => Some(&mut self.empathy),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub name: String,
    pub personality_type: Option<String>,
    pub personality_description: Option<String>,
    pub personality_traits: Option<PersonalityTraits>,
    pub quiz_completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: String,
    pub category: String,
    pub skill_level: SkillLevel,
    pub max_participants: Option<i32>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub user_id: i64,
    pub day_of_week: DayOfWeek,
    pub time_slot: TimeSlot,
    pub is_available: bool,
}

impl AvailabilitySlot {
    pub fn key(&self) -> (DayOfWeek, TimeSlot) {
        (self.day_of_week, self.time_slot)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    pub user_id: i64,
    pub has_vehicle: bool,
    pub budget_min: Option<i32>,
    pub budget_max: Option<i32>,
    pub can_host: bool,
    pub location: Option<String>,
}

/// A user together with everything the matcher reads about them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user: User,
    pub activities: Vec<Activity>,
    pub availability: Vec<AvailabilitySlot>,
    pub resources: Option<Resources>,
}

impl UserProfile {
    pub fn active_activities(&self) -> impl Iterator<Item = &Activity> {
        self.activities.iter().filter(|activity| activity.is_active)
    }
}
