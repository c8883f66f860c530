use crate::{
    error::ApiError,
    models::{
        DescriptionResponse, ErrorResponse, RecommendationRequest, RecommendationResponse,
        SimilarBooksResponse,
    },
    services::RecommendationService,
};
use actix_web::{
    web::{self, Json},
    HttpResponse,
};
use tracing::error;

pub fn recommendations_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/recommend").route(web::post().to(recommend)))
        .service(
            web::resource("/generate-description").route(web::post().to(generate_description)),
        )
        .service(
            web::resource(["/recommendation-by-book-id", "/recommendation_on_bookid"])
                .route(web::post().to(recommendation_by_book_id)),
        );
}

fn log_failure(endpoint: &str, err: ApiError) -> ApiError {
    if !matches!(err, ApiError::InvalidInput(_)) {
        error!("{} failed: {}", endpoint, err);
    }
    err
}

/// Get book recommendations
///
/// Finds semantically similar books in the catalog and asks the language model to
/// recommend them. Returns a fixed message without calling the model when nothing matches.
#[utoipa::path(
    post,
    path = "/recommend",
    tag = "Recommendations",
    request_body = RecommendationRequest,
    responses(
        (status = 200, description = "Narrative recommendation for the retrieved books", body = RecommendationResponse),
        (status = 400, description = "Invalid input parameters", body = ErrorResponse),
        (status = 500, description = "Retrieval or generation failed", body = ErrorResponse),
        (status = 504, description = "An external service timed out", body = ErrorResponse),
    )
)]
pub async fn recommend(
    request: Json<RecommendationRequest>,
    service: web::Data<RecommendationService>,
) -> Result<HttpResponse, ApiError> {
    let response = service
        .recommend(&request.query, request.top_k)
        .await
        .map_err(|e| log_failure("Recommendation", e))?;

    Ok(HttpResponse::Ok().json(response))
}

/// Enhance a book description
///
/// `query` holds the raw description; `top_k` is ignored.
#[utoipa::path(
    post,
    path = "/generate-description",
    tag = "Recommendations",
    request_body = RecommendationRequest,
    responses(
        (status = 200, description = "Rewritten description", body = DescriptionResponse),
        (status = 400, description = "Invalid input parameters", body = ErrorResponse),
        (status = 500, description = "Generation failed", body = ErrorResponse),
        (status = 504, description = "The language model timed out", body = ErrorResponse),
    )
)]
pub async fn generate_description(
    request: Json<RecommendationRequest>,
    service: web::Data<RecommendationService>,
) -> Result<HttpResponse, ApiError> {
    let response = service
        .generate_description(&request.query)
        .await
        .map_err(|e| log_failure("Description generation", e))?;

    Ok(HttpResponse::Ok().json(response))
}

/// Get books similar to a description
///
/// The language model first condenses the description into a short search query, which
/// then drives the regular retrieval pipeline. Also served at `/recommendation_on_bookid`.
#[utoipa::path(
    post,
    path = "/recommendation-by-book-id",
    tag = "Recommendations",
    request_body = RecommendationRequest,
    responses(
        (status = 200, description = "Derived search query and numbered book list", body = SimilarBooksResponse),
        (status = 400, description = "Invalid input parameters", body = ErrorResponse),
        (status = 500, description = "Retrieval or generation failed", body = ErrorResponse),
        (status = 504, description = "An external service timed out", body = ErrorResponse),
    )
)]
pub async fn recommendation_by_book_id(
    request: Json<RecommendationRequest>,
    service: web::Data<RecommendationService>,
) -> Result<HttpResponse, ApiError> {
    let response = service
        .recommend_by_description(&request.query, request.top_k)
        .await
        .map_err(|e| log_failure("Description-based recommendation", e))?;

    Ok(HttpResponse::Ok().json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        testing::{sample_catalog, FakeIndex, FakeLanguageModel},
        PipelineOptions,
    };
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};
    use std::{sync::Arc, time::Duration};

    fn service_data(
        index: FakeIndex,
        llm: Arc<FakeLanguageModel>,
    ) -> web::Data<RecommendationService> {
        service_data_with(index, llm, PipelineOptions::default())
    }

    fn service_data_with(
        index: FakeIndex,
        llm: Arc<FakeLanguageModel>,
        options: PipelineOptions,
    ) -> web::Data<RecommendationService> {
        web::Data::new(RecommendationService::new(
            Arc::new(sample_catalog()),
            Arc::new(index),
            llm,
            options,
        ))
    }

    async fn post(
        data: web::Data<RecommendationService>,
        uri: &str,
        body: Value,
    ) -> (StatusCode, Value) {
        let app = test::init_service(
            App::new()
                .app_data(data)
                .configure(recommendations_config),
        )
        .await;

        let request = test::TestRequest::post()
            .uri(uri)
            .set_json(body)
            .to_request();
        let response = test::call_service(&app, request).await;
        let status = response.status();
        let body: Value = test::read_body_json(response).await;
        (status, body)
    }

    #[actix_web::test]
    async fn test_recommend_endpoint() {
        let llm = Arc::new(FakeLanguageModel::replying(&["**Test Book** fits."]));
        let data = service_data(FakeIndex::with_hits(&["9780000000001 some description"]), llm);

        let (status, body) =
            post(data, "/recommend", json!({ "query": "test", "top_k": 2 })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["recommendations"], "Test Book fits.");
        assert_eq!(body["original_query"], "test");
        assert_eq!(body["books"][0]["title"], "Test Book");
        assert!(body["processing_time_ms"].is_number());
    }

    #[actix_web::test]
    async fn test_recommend_without_matches() {
        let llm = Arc::new(FakeLanguageModel::replying(&[]));
        let data = service_data(FakeIndex::with_hits(&[]), llm.clone());

        let (status, body) = post(data, "/recommend", json!({ "query": "nothing" })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["recommendations"], "Sorry, I couldn't find any relevant books.");
        assert_eq!(body["original_query"], "nothing");
        assert_eq!(llm.calls(), 0);
    }

    #[actix_web::test]
    async fn test_blank_query_is_bad_request() {
        let data = service_data(
            FakeIndex::with_hits(&[]),
            Arc::new(FakeLanguageModel::replying(&[])),
        );

        let (status, body) = post(data, "/recommend", json!({ "query": "  " })).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
    }

    #[actix_web::test]
    async fn test_top_k_out_of_range_is_bad_request() {
        let data = service_data(
            FakeIndex::with_hits(&[]),
            Arc::new(FakeLanguageModel::replying(&[])),
        );

        let (status, _) = post(data, "/recommend", json!({ "query": "q", "top_k": 0 })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_collaborator_failure_is_server_error() {
        let data = service_data(
            FakeIndex::failing("vector store offline"),
            Arc::new(FakeLanguageModel::replying(&[])),
        );

        let (status, body) = post(data, "/recommend", json!({ "query": "q" })).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("vector store offline"));
    }

    #[actix_web::test]
    async fn test_generate_description_endpoint() {
        let data = service_data(
            FakeIndex::with_hits(&[]),
            Arc::new(FakeLanguageModel::replying(&["* A vivid retelling."])),
        );

        let (status, body) = post(
            data,
            "/generate-description",
            json!({ "query": "A plain description.", "top_k": 99 }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["enhanced"], "A vivid retelling.");
        assert!(body.get("enhanced_description").is_none());
    }

    #[actix_web::test]
    async fn test_recommendation_by_book_id_endpoint() {
        let data = service_data(
            FakeIndex::with_hits(&["9780000000003 mystery", "9780000000001 adventure"]),
            Arc::new(FakeLanguageModel::replying(&["village mystery"])),
        );

        let (status, body) = post(
            data,
            "/recommendation-by-book-id",
            json!({ "query": "A detective visits a quiet village." }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["search_query"], "village mystery");
        assert_eq!(body["recommendations"][0]["rank"], 1);
        assert_eq!(body["recommendations"][0]["title"], "Third Book");
        assert_eq!(body["recommendations"][0]["genres"], json!(["Mystery"]));
        assert_eq!(body["recommendations"][1]["author"], "Jane Doe");
    }

    #[actix_web::test]
    async fn test_recommendation_on_bookid_route() {
        let data = service_data(
            FakeIndex::with_hits(&["9780000000001 adventure"]),
            Arc::new(FakeLanguageModel::replying(&["island adventure"])),
        );

        let (status, body) = post(
            data,
            "/recommendation_on_bookid",
            json!({ "query": "Castaways explore an island." }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["search_query"], "island adventure");
        assert_eq!(body["recommendations"][0]["title"], "Test Book");
    }

    #[actix_web::test]
    async fn test_original_query_is_echoed_untrimmed() {
        let llm = Arc::new(FakeLanguageModel::replying(&[]));
        let data = service_data(FakeIndex::with_hits(&[]), llm);

        let (status, body) = post(data, "/recommend", json!({ "query": "  dragons " })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["original_query"], "  dragons ");
        assert_eq!(body["recommendations"], "Sorry, I couldn't find any relevant books.");
    }

    #[actix_web::test]
    async fn test_slow_language_model_is_gateway_timeout() {
        let llm = Arc::new(
            FakeLanguageModel::replying(&["too late"]).delayed(Duration::from_millis(300)),
        );
        let options = PipelineOptions {
            llm_timeout: Duration::from_millis(50),
            ..PipelineOptions::default()
        };
        let data = service_data_with(
            FakeIndex::with_hits(&["9780000000001 some description"]),
            llm,
            options,
        );

        let (status, body) = post(data, "/recommend", json!({ "query": "test" })).await;

        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body["status"], 504);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("Language model exceeded"));
    }
}
