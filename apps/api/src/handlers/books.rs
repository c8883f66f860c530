use crate::{
    error::ApiError,
    models::{Book, ErrorResponse},
    services::RecommendationService,
};
use actix_web::{web, HttpResponse};

/// Look up a single catalog record by ISBN-13
#[utoipa::path(
    get,
    path = "/books/{isbn13}",
    tag = "Books",
    params(
        ("isbn13" = u64, Path, description = "ISBN-13 catalog key")
    ),
    responses(
        (status = 200, description = "Catalog record", body = Book),
        (status = 404, description = "No book with this key", body = ErrorResponse)
    )
)]
#[actix_web::get("/books/{isbn13}")]
pub async fn get_book(
    path: web::Path<u64>,
    service: web::Data<RecommendationService>,
) -> Result<HttpResponse, ApiError> {
    let isbn13 = path.into_inner();

    service
        .catalog()
        .get(isbn13)
        .map(|book| HttpResponse::Ok().json(book))
        .ok_or_else(|| ApiError::NotFound(format!("Book with ISBN {} not found", isbn13)))
}
