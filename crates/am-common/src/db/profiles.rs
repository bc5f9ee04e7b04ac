use deadpool_postgres::GenericClient;
use tokio_postgres::{Row, types::Json};
use tracing::instrument;

use super::{PgStore, text_enum, util::TimedClientExt};
use crate::{
    Activity, AvailabilitySlot, PersonalityTraits, Resources, User,
    quiz::{PersonalityQuestion, QuizAnswer, QuizOption, QuizOutcome},
    store::{ProfileSource, ProfileWriter, SourceError},
};

const USER_COLUMNS: &str = "id, username, email, name, personality_type, \
     personality_description, personality_traits, quiz_completed";

fn user_from_row(row: &Row) -> Result<User, SourceError> {
    let traits: Option<Json<PersonalityTraits>> = row.try_get("personality_traits")?;

    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        personality_type: row.try_get("personality_type")?,
        personality_description: row.try_get("personality_description")?,
        personality_traits: traits.map(|Json(t)| t),
        quiz_completed: row.try_get("quiz_completed")?,
    })
}

fn activity_from_row(row: &Row) -> Result<Activity, SourceError> {
    Ok(Activity {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        category: row.try_get("category")?,
        skill_level: text_enum(row, "skill_level")?,
        max_participants: row.try_get("max_participants")?,
        is_active: row.try_get("is_active")?,
    })
}

fn slot_from_row(row: &Row) -> Result<AvailabilitySlot, SourceError> {
    Ok(AvailabilitySlot {
        user_id: row.try_get("user_id")?,
        day_of_week: text_enum(row, "day_of_week")?,
        time_slot: text_enum(row, "time_slot")?,
        is_available: row.try_get("is_available")?,
    })
}

fn resources_from_row(row: &Row) -> Result<Resources, SourceError> {
    Ok(Resources {
        user_id: row.try_get("user_id")?,
        has_vehicle: row.try_get("has_vehicle")?,
        budget_min: row.try_get("budget_min")?,
        budget_max: row.try_get("budget_max")?,
        can_host: row.try_get("can_host")?,
        location: row.try_get("location")?,
    })
}

fn question_from_row(row: &Row) -> Result<PersonalityQuestion, SourceError> {
    let Json(options): Json<Vec<QuizOption>> = row.try_get("options")?;

    Ok(PersonalityQuestion {
        id: row.try_get("id")?,
        question: row.try_get("question")?,
        options,
        emoji: row.try_get("emoji")?,
        category: row.try_get("category")?,
    })
}

async fn user_exists<C: GenericClient>(client: &C, user_id: i64) -> Result<bool, SourceError> {
    let row = client
        .timed_query_one(
            "SELECT EXISTS (SELECT 1 FROM am.users WHERE id = $1)",
            &[&user_id],
            "user_exists",
        )
        .await?;
    Ok(row.try_get(0)?)
}

impl ProfileSource for PgStore {
    #[instrument(skip(self))]
    async fn user(&self, id: i64) -> Result<Option<User>, SourceError> {
        let client = self.pool().get().await?;
        let sql = format!("SELECT {USER_COLUMNS} FROM am.users WHERE id = $1");

        client
            .timed_query_opt(&sql, &[&id], "user")
            .await?
            .as_ref()
            .map(user_from_row)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn all_users(&self) -> Result<Vec<User>, SourceError> {
        let client = self.pool().get().await?;
        let sql = format!("SELECT {USER_COLUMNS} FROM am.users ORDER BY id");

        client
            .timed_query(&sql, &[], "all_users")
            .await?
            .iter()
            .map(user_from_row)
            .collect()
    }

    #[instrument(skip(self))]
    async fn activities_by_user(&self, user_id: i64) -> Result<Vec<Activity>, SourceError> {
        let client = self.pool().get().await?;

        client
            .timed_query(
                "SELECT id, user_id, name, description, category, skill_level,
                        max_participants, is_active
                 FROM am.activities
                 WHERE user_id = $1
                 ORDER BY id",
                &[&user_id],
                "activities_by_user",
            )
            .await?
            .iter()
            .map(activity_from_row)
            .collect()
    }

    #[instrument(skip(self))]
    async fn availability_by_user(&self, user_id: i64) -> Result<Vec<AvailabilitySlot>, SourceError> {
        let client = self.pool().get().await?;

        client
            .timed_query(
                "SELECT user_id, day_of_week, time_slot, is_available
                 FROM am.availability
                 WHERE user_id = $1
                 ORDER BY id",
                &[&user_id],
                "availability_by_user",
            )
            .await?
            .iter()
            .map(slot_from_row)
            .collect()
    }

    #[instrument(skip(self))]
    async fn resources_by_user(&self, user_id: i64) -> Result<Option<Resources>, SourceError> {
        let client = self.pool().get().await?;

        client
            .timed_query_opt(
                "SELECT user_id, has_vehicle, budget_min, budget_max, can_host, location
                 FROM am.resources
                 WHERE user_id = $1",
                &[&user_id],
                "resources_by_user",
            )
            .await?
            .as_ref()
            .map(resources_from_row)
            .transpose()
    }
}

impl ProfileWriter for PgStore {
    #[instrument(skip(self, slots), fields(slots = slots.len()))]
    async fn replace_availability(
        &self,
        user_id: i64,
        slots: Vec<AvailabilitySlot>,
    ) -> Result<Option<Vec<AvailabilitySlot>>, SourceError> {
        let mut client = self.pool().get().await?;
        let tx = client.transaction().await?;

        if !user_exists(&tx, user_id).await? {
            return Ok(None);
        }

        tx.timed_execute(
            "DELETE FROM am.availability WHERE user_id = $1",
            &[&user_id],
            "clear_availability",
        )
        .await?;

        let mut stored = Vec::with_capacity(slots.len());
        for slot in slots {
            let row = tx
                .timed_query_one(
                    "INSERT INTO am.availability (user_id, day_of_week, time_slot, is_available)
                     VALUES ($1, $2, $3, $4)
                     RETURNING user_id, day_of_week, time_slot, is_available",
                    &[
                        &user_id,
                        &slot.day_of_week.as_ref(),
                        &slot.time_slot.as_ref(),
                        &slot.is_available,
                    ],
                    "insert_availability",
                )
                .await?;
            stored.push(slot_from_row(&row)?);
        }

        tx.commit().await?;
        Ok(Some(stored))
    }

    #[instrument(skip(self, resources))]
    async fn upsert_resources(
        &self,
        user_id: i64,
        resources: Resources,
    ) -> Result<Option<Resources>, SourceError> {
        let client = self.pool().get().await?;
        if !user_exists(&client, user_id).await? {
            return Ok(None);
        }

        let row = client
            .timed_query_one(
                "INSERT INTO am.resources
                    (user_id, has_vehicle, budget_min, budget_max, can_host, location)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 ON CONFLICT (user_id) DO UPDATE SET
                    has_vehicle = EXCLUDED.has_vehicle,
                    budget_min = EXCLUDED.budget_min,
                    budget_max = EXCLUDED.budget_max,
                    can_host = EXCLUDED.can_host,
                    location = EXCLUDED.location
                 RETURNING user_id, has_vehicle, budget_min, budget_max, can_host, location",
                &[
                    &user_id,
                    &resources.has_vehicle,
                    &resources.budget_min,
                    &resources.budget_max,
                    &resources.can_host,
                    &resources.location,
                ],
                "upsert_resources",
            )
            .await?;

        resources_from_row(&row).map(Some)
    }

    #[instrument(skip(self))]
    async fn personality_questions(&self) -> Result<Vec<PersonalityQuestion>, SourceError> {
        let client = self.pool().get().await?;

        client
            .timed_query(
                "SELECT id, question, options, emoji, category
                 FROM am.personality_questions
                 ORDER BY id",
                &[],
                "personality_questions",
            )
            .await?
            .iter()
            .map(question_from_row)
            .collect()
    }

    #[instrument(skip(self, answers, outcome), fields(answers = answers.len()))]
    async fn complete_quiz(
        &self,
        user_id: i64,
        answers: Vec<QuizAnswer>,
        outcome: QuizOutcome,
    ) -> Result<Option<User>, SourceError> {
        let mut client = self.pool().get().await?;
        let tx = client.transaction().await?;

        let sql = format!(
            "UPDATE am.users
             SET personality_type = $2,
                 personality_description = $3,
                 personality_traits = $4,
                 quiz_completed = TRUE
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        );
        let Some(row) = tx
            .timed_query_opt(
                &sql,
                &[
                    &user_id,
                    &outcome.personality_type,
                    &outcome.personality_description,
                    &Json(&outcome.traits),
                ],
                "complete_quiz",
            )
            .await?
        else {
            return Ok(None);
        };
        let user = user_from_row(&row)?;

        for answer in &answers {
            let selected = i32::try_from(answer.selected_option).map_err(|_| {
                SourceError::Decode(format!("selected_option {} out of range", answer.selected_option))
            })?;
            tx.timed_execute(
                "INSERT INTO am.user_answers (user_id, question_id, selected_option)
                 VALUES ($1, $2, $3)",
                &[&user_id, &answer.question_id, &selected],
                "insert_user_answer",
            )
            .await?;
        }

        tx.commit().await?;
        Ok(Some(user))
    }
}
