use tokio_postgres::{Row, types::Json};
use tracing::{debug, instrument};

use super::{PgStore, text_enum, util::TimedClientExt};
use crate::{
    matching::ScoreBreakdown,
    store::{MatchRecord, MatchStatus, MatchStore, NewMatch, SourceError},
};

const MATCH_COLUMNS: &str = "id, user_id, matched_user_id, activity_id, compatibility_score, \
     match_reason, breakdown, status, run_id, matched_at";

fn match_from_row(row: &Row) -> Result<MatchRecord, SourceError> {
    let score: i16 = row.try_get("compatibility_score")?;
    let breakdown: Option<Json<ScoreBreakdown>> = row.try_get("breakdown")?;

    Ok(MatchRecord {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        matched_user_id: row.try_get("matched_user_id")?,
        activity_id: row.try_get("activity_id")?,
        compatibility_score: u8::try_from(score)
            .map_err(|_| SourceError::Decode(format!("compatibility_score {score} out of range")))?,
        match_reason: row.try_get("match_reason")?,
        breakdown: breakdown.map(|Json(b)| b),
        status: text_enum(row, "status")?,
        run_id: row.try_get("run_id")?,
        matched_at: row.try_get("matched_at")?,
    })
}

impl MatchStore for PgStore {
    /// One transaction for the batch; a conflict on the natural key refreshes the
    /// row and leaves `status` untouched.
    #[instrument(skip(self, matches), fields(matches = matches.len()))]
    async fn save_matches(&self, matches: Vec<NewMatch>) -> Result<Vec<MatchRecord>, SourceError> {
        let mut client = self.pool().get().await?;
        let tx = client.transaction().await?;

        let sql = format!(
            "INSERT INTO am.matches
                (user_id, matched_user_id, activity_id, compatibility_score,
                 match_reason, breakdown, run_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (user_id, matched_user_id, activity_id) DO UPDATE SET
                compatibility_score = EXCLUDED.compatibility_score,
                match_reason = EXCLUDED.match_reason,
                breakdown = EXCLUDED.breakdown,
                run_id = EXCLUDED.run_id,
                matched_at = NOW()
             RETURNING {MATCH_COLUMNS}"
        );

        let mut saved = Vec::with_capacity(matches.len());
        for new in &matches {
            let score = i16::from(new.compatibility_score);
            let breakdown = new.breakdown.as_ref().map(Json);
            let row = tx
                .timed_query_one(
                    &sql,
                    &[
                        &new.user_id,
                        &new.matched_user_id,
                        &new.activity_id,
                        &score,
                        &new.match_reason,
                        &breakdown,
                        &new.run_id,
                    ],
                    "upsert_match",
                )
                .await?;
            saved.push(match_from_row(&row)?);
        }

        tx.commit().await?;
        debug!(saved = saved.len(), "matches upserted");
        Ok(saved)
    }

    #[instrument(skip(self))]
    async fn update_match_status(
        &self,
        id: i64,
        status: MatchStatus,
    ) -> Result<Option<MatchRecord>, SourceError> {
        let client = self.pool().get().await?;
        let sql = format!("UPDATE am.matches SET status = $2 WHERE id = $1 RETURNING {MATCH_COLUMNS}");

        client
            .timed_query_opt(&sql, &[&id, &status.as_ref()], "update_match_status")
            .await?
            .as_ref()
            .map(match_from_row)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn matches_for_user(&self, user_id: i64) -> Result<Vec<MatchRecord>, SourceError> {
        let client = self.pool().get().await?;
        let sql = format!(
            "SELECT {MATCH_COLUMNS} FROM am.matches
             WHERE user_id = $1
             ORDER BY matched_at DESC, id DESC"
        );

        client
            .timed_query(&sql, &[&user_id], "matches_for_user")
            .await?
            .iter()
            .map(match_from_row)
            .collect()
    }
}
