use crate::{
    config::Config,
    error::{ApiError, Result},
    handlers,
    ml::HuggingFaceEmbedder,
    models::{
        Book, BookSummary, DescriptionResponse, ErrorResponse, HealthResponse, RankedBook,
        RecommendationRequest, RecommendationResponse, SimilarBooksResponse,
    },
    routes::{api_routes, swagger_redirect_route, swagger_routes},
    services::{Catalog, GeminiClient, PineconeClient, PineconeIndex, RecommendationService},
};
use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use log::info;
use std::{net::TcpListener, sync::Arc};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "BookNexus API",
        description = "AI-Powered Book Recommendation System",
        version = "1.0.0"
    ),
    paths(
        handlers::recommendations::recommend,
        handlers::recommendations::generate_description,
        handlers::recommendations::recommendation_by_book_id,
        handlers::books::get_book,
        handlers::health::health_check,
    ),
    components(schemas(
        RecommendationRequest,
        RecommendationResponse,
        BookSummary,
        DescriptionResponse,
        RankedBook,
        SimilarBooksResponse,
        Book,
        HealthResponse,
        ErrorResponse,
    )),
    tags(
        (name = "Recommendations", description = "Retrieval-augmented book recommendations"),
        (name = "Books", description = "Catalog lookups"),
        (name = "System", description = "Service health")
    )
)]
pub struct ApiDoc;

pub struct Application {
    port: u16,
    host: String,
    config: Config,
}

impl Application {
    /// Create a new application instance
    pub fn new(config: &Config) -> Self {
        Self {
            port: config.port,
            host: config.host.clone(),
            config: config.clone(),
        }
    }

    /// Build and run the server
    pub async fn run(&self) -> Result<()> {
        let bind_address = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&bind_address)?;
        info!("Starting server at http://{}", bind_address);

        self.run_with_listener(listener).await
    }

    /// Run the server with a specific TCP listener
    /// This is useful for testing where we want to use a random port
    pub async fn run_with_listener(&self, listener: TcpListener) -> Result<()> {
        let recommendation_service = web::Data::new(self.build_service()?);

        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header();

            // Malformed bodies get the same JSON error shape as every other failure
            let json_config = web::JsonConfig::default()
                .error_handler(|err, _req| ApiError::InvalidInput(err.to_string()).into());

            App::new()
                .wrap(cors)
                .wrap(Logger::default())
                .app_data(json_config)
                .app_data(recommendation_service.clone())
                .configure(api_routes)
                .service(swagger_routes())
                .service(swagger_redirect_route())
        })
        .listen(listener)?
        .run()
        .await?;

        Ok(())
    }

    /// Create the process-wide pipeline context: catalog, index client and LLM client
    fn build_service(&self) -> Result<RecommendationService> {
        let config = &self.config;
        let options = config.pipeline_options();
        let connect_timeout = config.connect_timeout();

        let mut catalog =
            Catalog::load(&config.catalog_path).context("Failed to load book catalog")?;
        if let Some(template) = &config.purchase_link_template {
            catalog.fill_purchase_links(template);
        }

        let embedder = HuggingFaceEmbedder::new(
            &config.huggingface_api_key,
            &config.huggingface_base_url,
            &config.huggingface_model_name,
            options.index_timeout,
            connect_timeout,
        )
        .context("Failed to initialize sentence encoder")?;
        info!("Using embedding model: {}", embedder.model_name());

        let pinecone = PineconeClient::new(
            &config.pinecone_api_key,
            &config.pinecone_index_host,
            config.pinecone_namespace.clone(),
            options.index_timeout,
            connect_timeout,
        )
        .context("Failed to initialize Pinecone client")?;

        let index = PineconeIndex::new(
            Arc::new(embedder),
            pinecone,
            config.pinecone_content_field.clone(),
        );

        let llm = GeminiClient::new(
            &config.gemini_api_key,
            &config.gemini_base_url,
            &config.gemini_model,
            options.llm_timeout,
            connect_timeout,
        )
        .context("Failed to initialize Gemini client")?;

        info!(
            "Pipeline ready: {} books, template {:?}, default top_k {}",
            catalog.len(),
            options.template,
            options.default_top_k
        );

        Ok(RecommendationService::new(
            Arc::new(catalog),
            Arc::new(index),
            Arc::new(llm),
            options,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();

        let recommend = &doc["paths"]["/recommend"]["post"];
        assert_eq!(recommend["summary"], "Get book recommendations");
        assert!(recommend["responses"].get("504").is_some());
        assert!(doc["paths"]["/books/{isbn13}"]["get"].is_object());

        let schemas = &doc["components"]["schemas"];
        assert_eq!(schemas["Book"]["properties"]["isbn13"]["example"], 9780002005883_u64);
        assert!(schemas["DescriptionResponse"]["properties"]["enhanced"].is_object());
    }
}
