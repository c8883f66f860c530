use crate::{models::HealthResponse, services::RecommendationService};
use actix_web::{web, HttpResponse};

/// Liveness probe reporting how many catalog books are loaded
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
#[actix_web::get("/health")]
pub async fn health_check(service: web::Data<RecommendationService>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        books_loaded: service.catalog().len(),
    })
}
