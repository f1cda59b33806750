use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use merai_common::VisibleSky;

use crate::error::SkyError;
use crate::module::export::to_csv_string;
use crate::module::pipeline::SkyContext;

const CSV_FILENAME: &str = "visible_objects.csv";

/// Observer position and optional instant; `at` is RFC 3339, any offset
#[derive(Debug, Deserialize)]
pub struct VisibleQuery {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub at: Option<DateTime<FixedOffset>>,
}

impl VisibleQuery {
    fn instant(&self) -> Option<DateTime<Utc>> {
        self.at.map(|at| at.with_timezone(&Utc))
    }
}

/// Failure of a request, mapped onto an HTTP status
#[derive(Debug)]
pub enum ApiError {
    Sky(SkyError),
    Export(String),
}

impl From<SkyError> for ApiError {
    fn from(e: SkyError) -> Self {
        ApiError::Sky(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Sky(e @ SkyError::DataUnavailable(_)) => {
                warn!("Run failed: {}", e);
                (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response()
            }
            ApiError::Sky(e) => {
                error!("Run failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
            }
            ApiError::Export(message) => {
                error!("CSV export failed: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
            }
        }
    }
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn visible(
    State(context): State<Arc<SkyContext>>,
    Query(query): Query<VisibleQuery>,
) -> Result<Json<VisibleSky>, ApiError> {
    let sky = context
        .visible_sky(query.lat, query.lon, query.instant())
        .await?;
    Ok(Json(sky))
}

async fn visible_csv(
    State(context): State<Arc<SkyContext>>,
    Query(query): Query<VisibleQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let sky = context
        .visible_sky(query.lat, query.lon, query.instant())
        .await?;
    let body = to_csv_string(&sky.objects).map_err(|e| ApiError::Export(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", CSV_FILENAME),
            ),
        ],
        body,
    ))
}

/// Routes served by the backend
pub fn router(context: Arc<SkyContext>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/visible", get(visible))
        .route("/visible.csv", get(visible_csv))
        .with_state(context)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
