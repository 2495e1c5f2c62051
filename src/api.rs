use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use anyhow::bail;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use log::error;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub type PredictionId = String;
pub type OpinionId = String;
pub type UserId = String;

// Requests
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewPredictionRequest {
    pub question: String,
    pub category: String,
    pub expiry_time: String,
}
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewOpinionRequest {
    pub prediction_id: PredictionId,
    pub user_id: UserId,
    pub opinion: Stance,
    pub amount: Decimal,
}

// Responses
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PredictionCreatedResponse {
    pub prediction_id: PredictionId,
    pub message: String,
}
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OpinionCreatedResponse {
    pub opinion_id: OpinionId,
    pub message: String,
}
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PredictionOverview {
    pub id: PredictionId,
    pub question: String,
    pub category: String,
    pub expiry_time: DateTime<Utc>,
    // absent until the store has stamped the document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PredictionListResponse {
    pub predictions: Vec<PredictionOverview>,
}
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
}

// helper functions
pub fn validation_rejection(errors: Vec<FieldError>) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors })))
}
pub fn storage_rejection(e: anyhow::Error, public: &str, dev: bool) -> (StatusCode, Json<Value>) {
    error!("{}: {:#}", public, e);
    let mut body = json!({ "error": public });
    if dev {
        body["message"] = json!(format!("{:#}", e));
    }
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body))
}

// Types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Stance {
    Yes,
    No,
}
impl Display for Stance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let output = match self {
            Self::Yes => "Yes",
            Self::No => "No",
        };
        write!(f, "{}", output)
    }
}
impl FromStr for Stance {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Yes" => Ok(Self::Yes),
            "No" => Ok(Self::No),
            e => bail!("Couldn't deserialize to Stance: {}", e),
        }
    }
}
