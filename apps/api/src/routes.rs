use actix_web::{web, HttpResponse};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::app::ApiDoc;
use crate::handlers::{get_book, health_check, recommendations_config};

/// Configure all routes for the API
pub fn api_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check)
        .service(get_book)
        .configure(recommendations_config);
}

/// Swagger UI under `/docs/`, backed by the generated OpenAPI document
pub fn swagger_routes() -> SwaggerUi {
    SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi())
}

/// Redirect from /docs to /docs/ to handle missing trailing slash
pub fn swagger_redirect_route() -> actix_web::Resource {
    web::resource("/docs").route(web::get().to(|| async {
        HttpResponse::Found()
            .append_header(("Location", "/docs/"))
            .finish()
    }))
}
