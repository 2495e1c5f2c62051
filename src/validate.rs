use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use crate::api::{FieldError, PredictionId, Stance, UserId};

pub enum Check {
    NonEmpty,
    DateTime,
    OneOf(&'static [&'static str]),
    Numeric,
}
pub struct Rule {
    pub field: &'static str,
    pub check: Check,
    pub message: &'static str,
}

pub const PREDICTION_RULES: &[Rule] = &[
    Rule {
        field: "question",
        check: Check::NonEmpty,
        message: "Question is required",
    },
    Rule {
        field: "category",
        check: Check::NonEmpty,
        message: "Category is required",
    },
    Rule {
        field: "expiryTime",
        check: Check::DateTime,
        message: "Expiry time must be a valid date",
    },
];
pub const OPINION_RULES: &[Rule] = &[
    Rule {
        field: "predictionId",
        check: Check::NonEmpty,
        message: "Prediction ID is required",
    },
    Rule {
        field: "userId",
        check: Check::NonEmpty,
        message: "User ID is required",
    },
    Rule {
        field: "opinion",
        check: Check::OneOf(&["Yes", "No"]),
        message: "Opinion must be either \"Yes\" or \"No\"",
    },
    Rule {
        field: "amount",
        check: Check::Numeric,
        message: "Amount must be a number",
    },
];

impl Check {
    fn passes(&self, value: &Value) -> bool {
        match self {
            Check::NonEmpty => value.as_str().map_or(false, |s| !s.trim().is_empty()),
            Check::DateTime => datetime(value).is_some(),
            Check::OneOf(options) => value.as_str().map_or(false, |s| options.contains(&s)),
            Check::Numeric => numeric(value).is_some(),
        }
    }
}

pub fn validate(body: &Value, rules: &[Rule]) -> Vec<FieldError> {
    let mut errors = vec![];
    for rule in rules {
        if !rule.check.passes(&body[rule.field]) {
            errors.push(FieldError {
                field: rule.field.to_string(),
                message: rule.message.to_string(),
            });
        }
    }
    errors
}

pub fn numeric(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) if !s.trim().is_empty() => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}
pub fn datetime(value: &Value) -> Option<DateTime<Utc>> {
    let s = value.as_str()?;
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
fn text(body: &Value, field: &str) -> String {
    body[field].as_str().unwrap_or_default().to_string()
}

#[derive(Debug)]
pub struct PredictionInput {
    pub question: String,
    pub category: String,
    pub expiry_time: DateTime<Utc>,
}
#[derive(Debug)]
pub struct OpinionInput {
    pub prediction: PredictionId,
    pub user: UserId,
    pub stance: Stance,
    pub amount: Decimal,
}

pub fn parse_prediction(body: &Value) -> Result<PredictionInput, Vec<FieldError>> {
    let errors = validate(body, PREDICTION_RULES);
    if !errors.is_empty() {
        return Err(errors);
    }
    let expiry_time = match datetime(&body["expiryTime"]) {
        Some(t) => t,
        None => unreachable!(),
    };
    Ok(PredictionInput {
        question: text(body, "question"),
        category: text(body, "category"),
        expiry_time,
    })
}
pub fn parse_opinion(body: &Value) -> Result<OpinionInput, Vec<FieldError>> {
    let errors = validate(body, OPINION_RULES);
    if !errors.is_empty() {
        return Err(errors);
    }
    let stance = match Stance::from_str(&text(body, "opinion")) {
        Ok(stance) => stance,
        Err(_) => unreachable!(),
    };
    let amount = match numeric(&body["amount"]) {
        Some(amount) => amount,
        None => unreachable!(),
    };
    Ok(OpinionInput {
        prediction: text(body, "predictionId"),
        user: text(body, "userId"),
        stance,
        amount,
    })
}
