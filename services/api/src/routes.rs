use crate::infra::AppState;
use audit_core::audits::{Audit, AuditReport, ScoringEngine};
use audit_core::error::AppError;
use audit_core::templates::wire::TemplateWire;
use audit_core::templates::{count_template_questions, save_blockers, template_total};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Serialize)]
pub(crate) struct TemplateCheckResponse {
    pub(crate) total: f64,
    pub(crate) is_valid: bool,
    pub(crate) question_count: usize,
    pub(crate) blockers: Vec<String>,
}

pub(crate) fn router() -> axum::Router {
    axum::Router::new()
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/templates/check",
            axum::routing::post(template_check_endpoint),
        )
        .route(
            "/api/v1/audits/report",
            axum::routing::post(audit_report_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Weight balance and save blockers for a template export. Always 200: an
/// unbalanced template is a report, not a request failure.
pub(crate) async fn template_check_endpoint(
    Json(wire): Json<TemplateWire>,
) -> Result<Json<TemplateCheckResponse>, AppError> {
    let template = wire.into_domain();
    let total = template_total(&template.areas);
    Ok(Json(TemplateCheckResponse {
        total: total.total,
        is_valid: total.is_valid,
        question_count: count_template_questions(&template),
        blockers: save_blockers(&template),
    }))
}

/// Score a responded audit tree into the report projection.
pub(crate) async fn audit_report_endpoint(
    Json(audit): Json<Audit>,
) -> Result<Json<AuditReport>, AppError> {
    Ok(Json(ScoringEngine::default().report(&audit)))
}
