use crate::api::*;
use crate::db::SQLite;
use crate::oraculo::{Oraculo, SubmitError};
use crate::validate::{parse_opinion, parse_prediction};
use anyhow::Result;
use axum::body::{Bytes, Full};
use axum::extract::{Json, Query, State};
use axum::http::{header, Response, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use axum_macros::debug_handler;
use clap::Parser;
use env_logger::{Builder, WriteStyle};
use log::{debug, error, LevelFilter};
use serde_json::{json, Value};
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;

#[allow(dead_code)]
mod api;
#[cfg(test)]
mod client;
mod db;
mod oraculo;
mod validate;

struct AppState {
    oraculo: Oraculo,
    dev: bool,
}

#[debug_handler]
async fn create_prediction(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<PredictionCreatedResponse>), (StatusCode, Json<Value>)> {
    let input = parse_prediction(&body).map_err(validation_rejection)?;
    let id = state
        .oraculo
        .create_prediction(input.question, input.category, input.expiry_time)
        .await
        .map_err(|e| storage_rejection(e, "Failed to create prediction", state.dev))?;
    debug!("Created prediction {}", id);
    Ok((
        StatusCode::CREATED,
        Json(PredictionCreatedResponse {
            prediction_id: id,
            message: "Prediction created successfully".to_string(),
        }),
    ))
}
#[debug_handler]
async fn list_predictions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<PredictionListResponse>, (StatusCode, Json<Value>)> {
    let predictions = state
        .oraculo
        .list_predictions(params.category.as_deref())
        .await
        .map_err(|e| storage_rejection(e, "Failed to retrieve predictions", state.dev))?;
    Ok(Json(PredictionListResponse { predictions }))
}
#[debug_handler]
async fn submit_opinion(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<OpinionCreatedResponse>), (StatusCode, Json<Value>)> {
    let input = parse_opinion(&body).map_err(validation_rejection)?;
    let id = state
        .oraculo
        .submit_opinion(&input.prediction, &input.user, input.stance, input.amount)
        .await
        .map_err(|e| submit_rejection(e, state.dev))?;
    debug!(
        "Recorded {} opinion by {} on prediction {}",
        input.stance, input.user, input.prediction
    );
    Ok((
        StatusCode::CREATED,
        Json(OpinionCreatedResponse {
            opinion_id: id,
            message: "Opinion submitted successfully".to_string(),
        }),
    ))
}

fn submit_rejection(e: SubmitError, dev: bool) -> (StatusCode, Json<Value>) {
    let code = match e {
        SubmitError::NotFound => StatusCode::NOT_FOUND,
        SubmitError::Inactive | SubmitError::Expired | SubmitError::AlreadySubmitted => {
            StatusCode::BAD_REQUEST
        }
        SubmitError::Storage(inner) => {
            return storage_rejection(inner, "Failed to submit opinion", dev)
        }
    };
    (code, Json(json!({ "error": e.to_string() })))
}

async fn unknown_route() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>, dev: bool) -> Response<Full<Bytes>> {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!("Unhandled failure in request path: {}", detail);
    let mut body = json!({ "error": "Something went wrong!" });
    if dev {
        body["message"] = json!(detail);
    }
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

#[derive(Parser)]
struct Args {
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,
    #[arg(short, long, env = "DATABASE_URL")]
    db: Option<String>,
    #[arg(short, long, env = "APP_ENV", default_value = "production")]
    env: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Args::parse();
    let dev = cli.env == "development";
    Builder::default()
        .filter_level(if dev {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .write_style(WriteStyle::Always)
        .init();
    let (_port, handle) = run_server(Some(cli.port), cli.db, dev).await?;
    handle.await?;
    Ok(())
}

async fn run_server(
    port: Option<u16>,
    db_conn: Option<String>,
    dev: bool,
) -> Result<(u16, JoinHandle<()>)> {
    let store = SQLite::new(db_conn).await?;
    let state = Arc::new(AppState {
        oraculo: Oraculo::new(Box::new(store)),
        dev,
    });
    let app = Router::new()
        .route("/prediction", post(create_prediction))
        .route("/predictions", get(list_predictions))
        .route("/opinion", post(submit_opinion))
        .fallback(unknown_route)
        .layer(CatchPanicLayer::custom(
            move |err: Box<dyn Any + Send + 'static>| handle_panic(err, dev),
        ))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port.unwrap_or(0)));
    let server = axum::Server::bind(&addr).serve(app.into_make_service());
    let port = server.local_addr().port();
    debug!("Listening on {}", server.local_addr());
    let handle = tokio::spawn(async move {
        if let Err(e) = server.await {
            error!("Server stopped: {:#}", e);
        }
    });
    Ok((port, handle))
}
