use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use tokio::sync::RwLock;

use super::{
    MatchRecord, MatchStatus, MatchStore, NewMatch, ProfileSource, ProfileWriter, SourceError,
};
use crate::{
    Activity, AvailabilitySlot, Resources, User,
    quiz::{PersonalityQuestion, QuizAnswer, QuizOutcome},
};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    activities: Vec<Activity>,
    availability: Vec<AvailabilitySlot>,
    resources: HashMap<i64, Resources>,
    questions: Vec<PersonalityQuestion>,
    answers: Vec<(i64, QuizAnswer)>,
    matches: Vec<MatchRecord>,
    next_match_id: i64,
}

/// Process-local store with the same semantics as the Postgres one.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.tables.get_mut().users.insert(user.id, user);
        self
    }

    pub fn with_activity(mut self, activity: Activity) -> Self {
        self.tables.get_mut().activities.push(activity);
        self
    }

    pub fn with_slot(mut self, slot: AvailabilitySlot) -> Self {
        self.tables.get_mut().availability.push(slot);
        self
    }

    pub fn with_resources(mut self, resources: Resources) -> Self {
        self.tables
            .get_mut()
            .resources
            .insert(resources.user_id, resources);
        self
    }

    pub fn with_question(mut self, question: PersonalityQuestion) -> Self {
        self.tables.get_mut().questions.push(question);
        self
    }

    /// Answers recorded for `user_id`, in submission order.
    pub async fn answers_for_user(&self, user_id: i64) -> Vec<QuizAnswer> {
        self.tables
            .read()
            .await
            .answers
            .iter()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, answer)| *answer)
            .collect()
    }
}

impl ProfileSource for InMemoryStore {
    async fn user(&self, id: i64) -> Result<Option<User>, SourceError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn all_users(&self) -> Result<Vec<User>, SourceError> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn activities_by_user(&self, user_id: i64) -> Result<Vec<Activity>, SourceError> {
        Ok(self
            .tables
            .read()
            .await
            .activities
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn availability_by_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<AvailabilitySlot>, SourceError> {
        Ok(self
            .tables
            .read()
            .await
            .availability
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn resources_by_user(&self, user_id: i64) -> Result<Option<Resources>, SourceError> {
        Ok(self.tables.read().await.resources.get(&user_id).cloned())
    }
}

impl ProfileWriter for InMemoryStore {
    async fn replace_availability(
        &self,
        user_id: i64,
        slots: Vec<AvailabilitySlot>,
    ) -> Result<Option<Vec<AvailabilitySlot>>, SourceError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user_id) {
            return Ok(None);
        }

        let slots: Vec<AvailabilitySlot> = slots
            .into_iter()
            .map(|slot| AvailabilitySlot { user_id, ..slot })
            .collect();

        tables.availability.retain(|s| s.user_id != user_id);
        tables.availability.extend(slots.iter().cloned());

        Ok(Some(slots))
    }

    async fn upsert_resources(
        &self,
        user_id: i64,
        resources: Resources,
    ) -> Result<Option<Resources>, SourceError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user_id) {
            return Ok(None);
        }

        let resources = Resources {
            user_id,
            ..resources
        };
        tables.resources.insert(user_id, resources.clone());

        Ok(Some(resources))
    }

    async fn personality_questions(&self) -> Result<Vec<PersonalityQuestion>, SourceError> {
        Ok(self.tables.read().await.questions.clone())
    }

    async fn complete_quiz(
        &self,
        user_id: i64,
        answers: Vec<QuizAnswer>,
        outcome: QuizOutcome,
    ) -> Result<Option<User>, SourceError> {
        let mut tables = self.tables.write().await;
        let Some(user) = tables.users.get_mut(&user_id) else {
            return Ok(None);
        };

        user.personality_type = Some(outcome.personality_type);
        user.personality_description = Some(outcome.personality_description);
        user.personality_traits = Some(outcome.traits);
        user.quiz_completed = true;
        let updated = user.clone();

        tables
            .answers
            .extend(answers.into_iter().map(|answer| (user_id, answer)));

        Ok(Some(updated))
    }
}

impl MatchStore for InMemoryStore {
    async fn save_matches(&self, matches: Vec<NewMatch>) -> Result<Vec<MatchRecord>, SourceError> {
        let mut tables = self.tables.write().await;
        let mut saved = Vec::with_capacity(matches.len());

        for new in matches {
            let now = Utc::now();
            let existing = tables.matches.iter().position(|m| {
                m.user_id == new.user_id
                    && m.matched_user_id == new.matched_user_id
                    && m.activity_id == new.activity_id
            });

            let record = match existing {
                Some(index) => {
                    let record = &mut tables.matches[index];
                    record.compatibility_score = new.compatibility_score;
                    record.match_reason = new.match_reason;
                    record.breakdown = new.breakdown;
                    record.run_id = new.run_id;
                    record.matched_at = now;
                    record.clone()
                }
                None => {
                    tables.next_match_id += 1;
                    let record = MatchRecord {
                        id: tables.next_match_id,
                        user_id: new.user_id,
                        matched_user_id: new.matched_user_id,
                        activity_id: new.activity_id,
                        compatibility_score: new.compatibility_score,
                        match_reason: new.match_reason,
                        breakdown: new.breakdown,
                        status: MatchStatus::Pending,
                        run_id: new.run_id,
                        matched_at: now,
                    };
                    tables.matches.push(record.clone());
                    record
                }
            };

            saved.push(record);
        }

        Ok(saved)
    }

    async fn update_match_status(
        &self,
        id: i64,
        status: MatchStatus,
    ) -> Result<Option<MatchRecord>, SourceError> {
        let mut tables = self.tables.write().await;
        Ok(tables.matches.iter_mut().find(|m| m.id == id).map(|record| {
            record.status = status;
            record.clone()
        }))
    }

    async fn matches_for_user(&self, user_id: i64) -> Result<Vec<MatchRecord>, SourceError> {
        let mut records: Vec<MatchRecord> = self
            .tables
            .read()
            .await
            .matches
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();

        records.sort_by(|a, b| b.matched_at.cmp(&a.matched_at).then(b.id.cmp(&a.id)));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DayOfWeek, PersonalityTraits, TimeSlot};

    fn new_match(activity_id: i64, score: u8, run_id: &str) -> NewMatch {
        NewMatch {
            user_id: 1,
            matched_user_id: 2,
            activity_id,
            compatibility_score: score,
            match_reason: format!("score {score}"),
            breakdown: None,
            run_id: run_id.into(),
        }
    }

    fn store() -> InMemoryStore {
        InMemoryStore::new()
            .with_user(User {
                id: 1,
                name: "Ada".into(),
                ..User::default()
            })
            .with_user(User {
                id: 2,
                name: "Grace".into(),
                ..User::default()
            })
    }

    #[tokio::test]
    async fn save_matches_upserts_on_natural_key() {
        let store = store();

        let first = store
            .save_matches(vec![new_match(20, 80, "run-a"), new_match(21, 75, "run-a")])
            .await
            .unwrap();
        assert_eq!(first.len(), 2);

        store
            .update_match_status(first[0].id, MatchStatus::Connected)
            .await
            .unwrap();

        let second = store
            .save_matches(vec![new_match(20, 90, "run-b")])
            .await
            .unwrap();

        assert_eq!(second[0].id, first[0].id);
        assert_eq!(second[0].compatibility_score, 90);
        assert_eq!(second[0].run_id, "run-b");
        assert_eq!(second[0].status, MatchStatus::Connected);
        assert_eq!(store.matches_for_user(1).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_unknown_match_returns_none() {
        let store = store();
        assert!(
            store
                .update_match_status(42, MatchStatus::Skipped)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn replace_availability_swaps_the_whole_grid() {
        let store = store().with_slot(AvailabilitySlot {
            user_id: 1,
            day_of_week: DayOfWeek::Monday,
            time_slot: TimeSlot::Morning,
            is_available: true,
        });

        let replaced = store
            .replace_availability(
                1,
                vec![AvailabilitySlot {
                    user_id: 99,
                    day_of_week: DayOfWeek::Sunday,
                    time_slot: TimeSlot::Evening,
                    is_available: true,
                }],
            )
            .await
            .unwrap()
            .expect("user exists");

        assert_eq!(replaced[0].user_id, 1);
        let slots = store.availability_by_user(1).await.unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].day_of_week, DayOfWeek::Sunday);

        assert!(store.replace_availability(7, vec![]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn complete_quiz_marks_user_and_records_answers() {
        let store = store();
        let outcome = QuizOutcome {
            personality_type: "The Balanced".into(),
            personality_description: "Well-rounded".into(),
            traits: PersonalityTraits::new(50, 50, 50, 50, 50),
        };
        let answers = vec![QuizAnswer {
            question_id: 1,
            selected_option: 0,
        }];

        let user = store
            .complete_quiz(2, answers, outcome)
            .await
            .unwrap()
            .expect("user exists");

        assert!(user.quiz_completed);
        assert_eq!(user.personality_type.as_deref(), Some("The Balanced"));
        assert_eq!(store.answers_for_user(2).await.len(), 1);
    }

    #[tokio::test]
    async fn user_with_details_aggregates_profile() {
        let store = store()
            .with_activity(Activity {
                id: 10,
                user_id: 1,
                name: "Hike".into(),
                category: "Outdoor".into(),
                is_active: true,
                ..Activity::default()
            })
            .with_resources(Resources {
                user_id: 1,
                location: Some("Austin".into()),
                ..Resources::default()
            });

        let profile = store.user_with_details(1).await.unwrap().expect("exists");
        assert_eq!(profile.activities.len(), 1);
        assert_eq!(
            profile.resources.and_then(|r| r.location).as_deref(),
            Some("Austin")
        );
        assert!(store.user_with_details(3).await.unwrap().is_none());
    }
}
