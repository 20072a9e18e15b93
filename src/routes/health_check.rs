use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;

use crate::configuration::ApplicationSettings;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub name: String,
    pub app_id: String,
    pub date: String,
}

/// GET /health
pub async fn health_check(settings: web::Data<ApplicationSettings>) -> HttpResponse {
    tracing::debug!("Health check endpoint called");
    HttpResponse::Ok().json(HealthResponse {
        status: "OK",
        name: settings.project_name.clone(),
        app_id: settings.application_id.clone(),
        date: Utc::now().to_rfc3339(),
    })
}
