use actix_cors::Cors;
use actix_web::{Responder, get, web};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{api::records, docs::ApiDoc, error::ApiError};

#[get("/")]
async fn index() -> impl Responder {
    "Hello World"
}

/// Reads are accepted from any origin.
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allow_any_method()
        .allow_any_header()
        .max_age(3600)
}

/// Malformed JSON bodies get the same `{success: false, error}` envelope as
/// every other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        tracing::debug!(error = %err, "Rejected malformed request body");
        ApiError::BadRequest(err.to_string()).into()
    })
}

/// Same envelope for urlencoded bodies posted to `/dados`.
pub fn form_config() -> web::FormConfig {
    web::FormConfig::default().error_handler(|err, _req| {
        tracing::debug!(error = %err, "Rejected malformed form body");
        ApiError::BadRequest(err.to_string()).into()
    })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(form_config())
        .service(index)
        .service(
            SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard so JS/CSS assets match
                .url("/api-doc/openapi.json", ApiDoc::openapi()),
        )
        .service(web::resource("/ultimos_registros").route(web::get().to(records::recent_records)))
        .service(web::resource("/dados").route(web::post().to(records::ingest_read)))
        .service(
            web::resource("/status_cartao/{codigo}").route(web::get().to(records::card_status)),
        );
}
