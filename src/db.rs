use crate::api::Stance;
use crate::oraculo::{Opinion, Prediction};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{query, Executor, Row, SqlitePool};
use std::str::FromStr;

pub const DB_CONN: &str = "sqlite::memory:";

/// Document-style access to the two collections. `created_at` on both
/// document types is assigned by the store at write time; the value passed
/// in is ignored.
#[async_trait]
pub trait Store {
    async fn put_prediction(&self, prediction: &Prediction) -> Result<()>;
    async fn get_prediction(&self, id: &str) -> Result<Option<Prediction>>;
    async fn get_active_predictions(&self, category: Option<&str>) -> Result<Vec<Prediction>>;
    async fn put_opinion(&self, opinion: &Opinion) -> Result<()>;
    async fn get_opinion(&self, prediction: &str, user: &str) -> Result<Option<Opinion>>;
}

#[derive(Clone)]
pub struct SQLite {
    connection: SqlitePool,
}
impl SQLite {
    pub async fn new(conn: Option<String>) -> Result<Self> {
        // A single connection keeps every in-memory database alive and
        // serializes store access.
        let connection = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(conn.as_deref().unwrap_or(DB_CONN))
            .await
            .context("failed to open the backing database")?;
        connection
            .execute(
                "CREATE TABLE IF NOT EXISTS predictions (\
                id TEXT PRIMARY KEY,\
            question NOT NULL,\
            category NOT NULL,\
            expiry_time NOT NULL,\
            created_at NOT NULL,\
            active NOT NULL\
            )",
            )
            .await?;
        connection
            .execute(
                "CREATE TABLE IF NOT EXISTS opinions (\
            id TEXT PRIMARY KEY,\
            prediction NOT NULL,\
            user NOT NULL,\
            stance NOT NULL,\
            amount NOT NULL,\
            created_at NOT NULL,\
            UNIQUE (prediction, user)\
            )",
            )
            .await?;
        Ok(Self { connection })
    }
}

fn prediction_from_row(row: &SqliteRow) -> Result<Prediction> {
    Ok(Prediction {
        id: row.get("id"),
        question: row.get("question"),
        category: row.get("category"),
        expiry_time: Utc
            .timestamp_opt(row.get("expiry_time"), 0)
            .single()
            .context("malformed expiry timestamp")?,
        created_at: Utc.timestamp_opt(row.get("created_at"), 0).single(),
        active: row.get("active"),
    })
}
fn opinion_from_row(row: &SqliteRow) -> Result<Opinion> {
    Ok(Opinion {
        id: row.get("id"),
        prediction: row.get("prediction"),
        user: row.get("user"),
        stance: Stance::from_str(row.get("stance"))?,
        amount: Decimal::from_str(row.get("amount")).context("malformed stored amount")?,
        created_at: Utc.timestamp_opt(row.get("created_at"), 0).single(),
    })
}

#[async_trait]
impl Store for SQLite {
    async fn put_prediction(&self, prediction: &Prediction) -> Result<()> {
        self.connection
            .execute(
                query(
                    "INSERT INTO predictions (\
            id,\
            question,\
            category,\
            expiry_time,\
            created_at,\
            active)\
            VALUES (?,?,?,?,?,?)",
                )
                .bind(&prediction.id)
                .bind(&prediction.question)
                .bind(&prediction.category)
                .bind(prediction.expiry_time.timestamp())
                .bind(Utc::now().timestamp())
                .bind(prediction.active),
            )
            .await
            .with_context(|| format!("couldn't write prediction {}", prediction.id))?;
        Ok(())
    }
    async fn get_prediction(&self, id: &str) -> Result<Option<Prediction>> {
        let row = self
            .connection
            .fetch_optional(query("SELECT * FROM predictions WHERE id = ?").bind(id))
            .await
            .with_context(|| format!("couldn't read prediction {}", id))?;
        row.as_ref().map(prediction_from_row).transpose()
    }
    async fn get_active_predictions(&self, category: Option<&str>) -> Result<Vec<Prediction>> {
        let rows = match category {
            Some(category) => {
                self.connection
                    .fetch_all(
                        query(
                            "SELECT * FROM predictions \
                            WHERE active = true AND category = ?",
                        )
                        .bind(category),
                    )
                    .await
            }
            None => {
                self.connection
                    .fetch_all(query("SELECT * FROM predictions WHERE active = true"))
                    .await
            }
        }
        .context("couldn't query predictions")?;
        rows.iter().map(prediction_from_row).collect()
    }
    async fn put_opinion(&self, opinion: &Opinion) -> Result<()> {
        self.connection
            .execute(
                query(
                    "INSERT INTO opinions (\
            id,\
            prediction,\
            user,\
            stance,\
            amount,\
            created_at)\
            VALUES (?,?,?,?,?,?)",
                )
                .bind(&opinion.id)
                .bind(&opinion.prediction)
                .bind(&opinion.user)
                .bind(opinion.stance.to_string())
                .bind(opinion.amount.to_string())
                .bind(Utc::now().timestamp()),
            )
            .await
            .with_context(|| format!("couldn't write opinion {}", opinion.id))?;
        Ok(())
    }
    async fn get_opinion(&self, prediction: &str, user: &str) -> Result<Option<Opinion>> {
        let row = self
            .connection
            .fetch_optional(
                query("SELECT * FROM opinions WHERE prediction = ? AND user = ?")
                    .bind(prediction)
                    .bind(user),
            )
            .await
            .with_context(|| {
                format!("couldn't read opinion for {} on {}", user, prediction)
            })?;
        row.as_ref().map(opinion_from_row).transpose()
    }
}
