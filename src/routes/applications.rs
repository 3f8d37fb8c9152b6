use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use serde_json::Value;

use crate::core::session::SubmissionGate;
use crate::core::AppError;
use crate::db::Storage;
use crate::models::candidate::validate_candidate;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
}

#[tracing::instrument(name = "List Applications", skip(storage))]
#[get("")]
pub async fn list_applications(
    storage: web::Data<dyn Storage>,
    query: web::Query<SearchParams>,
) -> Result<HttpResponse, AppError> {
    let search = query.search.as_deref().map(str::trim).unwrap_or_default();

    let applications = if search.is_empty() {
        storage.get_all_applications().await
    } else {
        storage.search_applications(search).await
    }
    .map_err(|e| {
        tracing::error!(error.cause = ?e.cause, "Failed to fetch applications");
        e.with_message("Failed to fetch applications")
    })?;

    Ok(HttpResponse::Ok().json(applications))
}

#[tracing::instrument(name = "Get Application", skip(storage))]
#[get("/{application_id}")]
pub async fn get_application(
    storage: web::Data<dyn Storage>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let application_id = path.into_inner();

    let application = storage
        .get_application_by_id(&application_id)
        .await
        .map_err(|e| {
            tracing::error!(error.cause = ?e.cause, "Failed to fetch application");
            e.with_message("Failed to fetch application")
        })?
        .ok_or_else(|| AppError::not_found("Application not found"))?;

    Ok(HttpResponse::Ok().json(application))
}

/// The gate runs before the body is read, so an unauthenticated caller never
/// reaches validation.
#[tracing::instrument(
    name = "Submit Application",
    skip(storage, gate, payload),
    fields(submitted_by = tracing::field::Empty)
)]
#[post("")]
pub async fn create_application(
    storage: web::Data<dyn Storage>,
    gate: SubmissionGate,
    payload: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    if let Some(session) = &gate.0 {
        tracing::Span::current().record("submitted_by", session.user.id.as_str());
    }

    let application = validate_candidate(payload.into_inner())?;

    let created = storage
        .create_application(&application)
        .await
        .map_err(|e| {
            tracing::error!(error.cause = ?e.cause, "Failed to create application");
            e.with_message("Failed to create application")
        })?;

    tracing::info!(application_id = %created.application.id, "application submitted");

    Ok(HttpResponse::Created().json(created))
}
