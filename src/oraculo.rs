use crate::api::{OpinionId, PredictionId, PredictionOverview, Stance, UserId};
use crate::db::Store;
use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub id: PredictionId,
    pub question: String,
    pub category: String,
    pub expiry_time: DateTime<Utc>,
    pub created_at: Option<DateTime<Utc>>,
    pub active: bool,
}
#[derive(Debug, Clone, PartialEq)]
pub struct Opinion {
    pub id: OpinionId,
    pub prediction: PredictionId,
    pub user: UserId,
    pub stance: Stance,
    pub amount: Decimal,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("Prediction not found")]
    NotFound,
    #[error("This prediction is no longer active")]
    Inactive,
    #[error("This prediction has expired")]
    Expired,
    #[error("You have already submitted an opinion for this prediction")]
    AlreadySubmitted,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub struct Oraculo {
    store: Box<dyn Store + Send + Sync>,
}
impl Oraculo {
    pub fn new(store: Box<dyn Store + Send + Sync>) -> Self {
        Self { store }
    }
    pub async fn create_prediction(
        &self,
        question: String,
        category: String,
        expiry_time: DateTime<Utc>,
    ) -> Result<PredictionId> {
        let id = Uuid::new_v4().to_string();
        self.store
            .put_prediction(&Prediction {
                id: id.clone(),
                question,
                category,
                expiry_time,
                created_at: None,
                active: true,
            })
            .await?;
        Ok(id)
    }
    pub async fn list_predictions(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<PredictionOverview>> {
        let predictions = self.store.get_active_predictions(category).await?;
        Ok(predictions
            .into_iter()
            .map(|prediction| PredictionOverview {
                id: prediction.id,
                question: prediction.question,
                category: prediction.category,
                expiry_time: prediction.expiry_time,
                created_at: prediction.created_at,
            })
            .collect())
    }
    // Checks run in order: existence, state, timing, duplication.
    pub async fn submit_opinion(
        &self,
        prediction: &str,
        user: &str,
        stance: Stance,
        amount: Decimal,
    ) -> Result<OpinionId, SubmitError> {
        let stored = self
            .store
            .get_prediction(prediction)
            .await?
            .ok_or(SubmitError::NotFound)?;
        if !stored.active {
            return Err(SubmitError::Inactive);
        }
        if stored.expiry_time < Utc::now() {
            return Err(SubmitError::Expired);
        }
        if self.store.get_opinion(prediction, user).await?.is_some() {
            return Err(SubmitError::AlreadySubmitted);
        }
        let id = Uuid::new_v4().to_string();
        self.store
            .put_opinion(&Opinion {
                id: id.clone(),
                prediction: prediction.to_string(),
                user: user.to_string(),
                stance,
                amount,
                created_at: None,
            })
            .await?;
        Ok(id)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::db::SQLite;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    async fn oraculo_with_store() -> (Oraculo, SQLite) {
        let store = SQLite::new(None).await.unwrap();
        (Oraculo::new(Box::new(store.clone())), store)
    }

    #[tokio::test]
    async fn creates_predictions_with_fresh_ids() {
        let (oraculo, store) = oraculo_with_store().await;
        let first = oraculo
            .create_prediction(
                "Will it rain?".to_string(),
                "weather".to_string(),
                Utc::now() + Duration::days(3),
            )
            .await
            .unwrap();
        let second = oraculo
            .create_prediction(
                "Will it snow?".to_string(),
                "weather".to_string(),
                Utc::now() + Duration::days(3),
            )
            .await
            .unwrap();
        assert_ne!(first, second);

        let stored = store.get_prediction(&first).await.unwrap().unwrap();
        assert!(stored.active);
        assert!(stored.created_at.is_some());
    }

    #[tokio::test]
    async fn lists_only_active_predictions() {
        let (oraculo, store) = oraculo_with_store().await;
        let id = oraculo
            .create_prediction(
                "Will it rain?".to_string(),
                "weather".to_string(),
                Utc::now() + Duration::days(3),
            )
            .await
            .unwrap();
        store
            .put_prediction(&Prediction {
                id: "settled".to_string(),
                question: "Did it rain?".to_string(),
                category: "weather".to_string(),
                expiry_time: Utc::now() + Duration::days(3),
                created_at: None,
                active: false,
            })
            .await
            .unwrap();

        let listed = oraculo.list_predictions(None).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed.first().unwrap().id, id);

        let filtered = oraculo.list_predictions(Some("sports")).await.unwrap();
        assert!(filtered.is_empty());
    }

    #[tokio::test]
    async fn records_an_opinion_and_its_amount() {
        let (oraculo, store) = oraculo_with_store().await;
        let prediction = oraculo
            .create_prediction(
                "Will it rain?".to_string(),
                "weather".to_string(),
                Utc::now() + Duration::days(3),
            )
            .await
            .unwrap();

        let id = oraculo
            .submit_opinion(&prediction, "u1", Stance::Yes, dec!(42))
            .await
            .unwrap();

        let stored = store.get_opinion(&prediction, "u1").await.unwrap().unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.stance, Stance::Yes);
        assert_eq!(stored.amount, dec!(42));
        assert!(stored.created_at.is_some());
    }

    #[tokio::test]
    async fn rejects_opinions_on_unknown_predictions() {
        let (oraculo, _) = oraculo_with_store().await;
        let err = oraculo
            .submit_opinion("missing", "u1", Stance::Yes, dec!(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::NotFound));
    }

    #[tokio::test]
    async fn rejects_opinions_on_inactive_predictions_before_expiry() {
        let (oraculo, store) = oraculo_with_store().await;
        // inactive and expired; the state check wins
        store
            .put_prediction(&Prediction {
                id: "p1".to_string(),
                question: "Did it rain?".to_string(),
                category: "weather".to_string(),
                expiry_time: Utc::now() - Duration::days(1),
                created_at: None,
                active: false,
            })
            .await
            .unwrap();
        let err = oraculo
            .submit_opinion("p1", "u1", Stance::Yes, dec!(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Inactive));
    }

    #[tokio::test]
    async fn rejects_opinions_on_expired_predictions() {
        let (oraculo, _) = oraculo_with_store().await;
        let prediction = oraculo
            .create_prediction(
                "Did it rain yesterday?".to_string(),
                "weather".to_string(),
                Utc::now() - Duration::hours(1),
            )
            .await
            .unwrap();
        let err = oraculo
            .submit_opinion(&prediction, "u1", Stance::Yes, dec!(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Expired));
    }

    #[tokio::test]
    async fn rejects_duplicate_opinions_per_user() {
        let (oraculo, _) = oraculo_with_store().await;
        let prediction = oraculo
            .create_prediction(
                "Will it rain?".to_string(),
                "weather".to_string(),
                Utc::now() + Duration::days(3),
            )
            .await
            .unwrap();

        oraculo
            .submit_opinion(&prediction, "u1", Stance::Yes, dec!(10))
            .await
            .unwrap();
        let err = oraculo
            .submit_opinion(&prediction, "u1", Stance::No, dec!(5))
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::AlreadySubmitted));

        // a different user is still free to weigh in
        oraculo
            .submit_opinion(&prediction, "u2", Stance::No, dec!(5))
            .await
            .unwrap();
    }
}
