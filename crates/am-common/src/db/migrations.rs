use deadpool_postgres::PoolError;
use thiserror::Error;
use tokio_postgres::Error as PgError;
use tracing::{debug, info, instrument};

use crate::db::PgPool;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("failed to run migration: {0}")]
    Postgres(#[from] PgError),
}

struct Migration {
    id: i32,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        id: 1,
        description: "users, activities, availability, resources",
        sql: r#"
CREATE TABLE IF NOT EXISTS am.users (
    id BIGSERIAL PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    personality_type TEXT,
    personality_description TEXT,
    personality_traits JSONB,
    quiz_completed BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS am.activities (
    id BIGSERIAL PRIMARY KEY,
    user_id BIGINT NOT NULL REFERENCES am.users(id),
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    category TEXT NOT NULL,
    skill_level TEXT NOT NULL DEFAULT 'all'
        CHECK (skill_level IN ('beginner', 'intermediate', 'advanced', 'all')),
    max_participants INTEGER,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
CREATE INDEX IF NOT EXISTS idx_activities_user ON am.activities(user_id);

CREATE TABLE IF NOT EXISTS am.availability (
    id BIGSERIAL PRIMARY KEY,
    user_id BIGINT NOT NULL REFERENCES am.users(id),
    day_of_week TEXT NOT NULL,
    time_slot TEXT NOT NULL CHECK (time_slot IN ('morning', 'afternoon', 'evening')),
    is_available BOOLEAN NOT NULL DEFAULT TRUE
);
CREATE INDEX IF NOT EXISTS idx_availability_user ON am.availability(user_id);

CREATE TABLE IF NOT EXISTS am.resources (
    id BIGSERIAL PRIMARY KEY,
    user_id BIGINT NOT NULL UNIQUE REFERENCES am.users(id),
    has_vehicle BOOLEAN NOT NULL DEFAULT FALSE,
    budget_min INTEGER,
    budget_max INTEGER,
    can_host BOOLEAN NOT NULL DEFAULT FALSE,
    location TEXT
);
"#,
    },
    Migration {
        id: 2,
        description: "personality quiz questions and answers",
        sql: r#"
CREATE TABLE IF NOT EXISTS am.personality_questions (
    id BIGSERIAL PRIMARY KEY,
    question TEXT NOT NULL,
    options JSONB NOT NULL DEFAULT '[]'::jsonb,
    emoji TEXT,
    category TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS am.user_answers (
    id BIGSERIAL PRIMARY KEY,
    user_id BIGINT NOT NULL REFERENCES am.users(id),
    question_id BIGINT NOT NULL REFERENCES am.personality_questions(id),
    selected_option INTEGER NOT NULL CHECK (selected_option >= 0),
    answered_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
"#,
    },
    Migration {
        id: 3,
        description: "matches keyed by (user, candidate, activity)",
        sql: r#"
CREATE TABLE IF NOT EXISTS am.matches (
    id BIGSERIAL PRIMARY KEY,
    user_id BIGINT NOT NULL REFERENCES am.users(id),
    matched_user_id BIGINT NOT NULL REFERENCES am.users(id),
    activity_id BIGINT NOT NULL REFERENCES am.activities(id),
    compatibility_score SMALLINT NOT NULL
        CHECK (compatibility_score BETWEEN 0 AND 100),
    match_reason TEXT NOT NULL,
    breakdown JSONB,
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'connected', 'skipped')),
    run_id TEXT NOT NULL,
    matched_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT uq_matches_natural_key UNIQUE (user_id, matched_user_id, activity_id)
);
CREATE INDEX IF NOT EXISTS idx_matches_user_recent ON am.matches(user_id, matched_at DESC);
"#,
    },
];

/// Applies pending migrations in id order, each in its own transaction.
#[instrument(skip(pool))]
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrationError> {
    let mut client = pool.get().await?;
    client
        .batch_execute(
            "CREATE SCHEMA IF NOT EXISTS am;
             CREATE TABLE IF NOT EXISTS am.schema_migrations (
                id INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
             );",
        )
        .await?;

    for migration in MIGRATIONS {
        let applied: bool = client
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM am.schema_migrations WHERE id = $1)",
                &[&migration.id],
            )
            .await?
            .get(0);

        if applied {
            debug!(id = migration.id, "migration already applied");
            continue;
        }

        let tx = client.transaction().await?;
        tx.batch_execute(migration.sql).await?;
        tx.execute(
            "INSERT INTO am.schema_migrations (id, description) VALUES ($1, $2)",
            &[&migration.id, &migration.description],
        )
        .await?;
        tx.commit().await?;

        info!(
            id = migration.id,
            description = migration.description,
            "applied migration"
        );
    }

    Ok(())
}
