use actix_web::{Either, HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{Span, error, info, instrument};
use utoipa::ToSchema;

use crate::{
    error::ApiError,
    model::record::{CardId, CardStatus, Record, RecordKind},
    store::RecordStore,
};

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Card {
    #[schema(example = "A1")]
    pub codigo: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct IngestRequest {
    pub cartao: Card,
}

/// Form-encoded read, as posted by readers that send `cartao[codigo]=A1`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct IngestForm {
    #[serde(rename = "cartao[codigo]")]
    #[schema(example = "A1")]
    pub codigo: String,
}

/// `/dados` accepts the same read as JSON or as a urlencoded form.
pub type IngestBody = Either<web::Json<IngestRequest>, web::Form<IngestForm>>;

fn codigo_of(body: IngestBody) -> String {
    match body {
        Either::Left(json) => json.into_inner().cartao.codigo,
        Either::Right(form) => form.into_inner().codigo,
    }
}

fn parse_card_id(raw: &str) -> Result<CardId, ApiError> {
    CardId::parse(raw)
        .ok_or_else(|| ApiError::BadRequest("cartao.codigo must be a non-empty string".to_string()))
}

/// A record as listed by `/ultimos_registros`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecordView {
    #[schema(example = "A1")]
    pub codigo: String,
    #[schema(example = 1767225600000_i64)]
    pub timestamp: i64,
    pub tipo: RecordKind,
}

impl From<Record> for RecordView {
    fn from(record: Record) -> Self {
        Self {
            codigo: record.card_id,
            timestamp: record.timestamp,
            tipo: record.kind,
        }
    }
}

/// A record as returned by `/dados`.
#[derive(Debug, Serialize, ToSchema)]
pub struct IngestedView {
    pub cartao: Card,
    #[schema(example = 1767225600000_i64)]
    pub timestamp: i64,
    pub tipo: RecordKind,
}

impl From<Record> for IngestedView {
    fn from(record: Record) -> Self {
        Self {
            cartao: Card {
                codigo: record.card_id,
            },
            timestamp: record.timestamp,
            tipo: record.kind,
        }
    }
}

/// Both fields are null for a card that was never read.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusView {
    #[schema(nullable = true)]
    pub tipo: Option<RecordKind>,
    #[schema(nullable = true, example = 1767225600000_i64)]
    pub timestamp: Option<i64>,
}

impl From<CardStatus> for StatusView {
    fn from(status: CardStatus) -> Self {
        Self {
            tipo: status.last_kind(),
            timestamp: status.last_timestamp(),
        }
    }
}

fn success<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "success": true,
        "data": data
    }))
}

/// Latest records across all cards
#[utoipa::path(
    get,
    path = "/ultimos_registros",
    responses(
        (status = 200, description = "Up to 50 records, newest first", body = Object, example = json!({
            "success": true,
            "data": [{ "codigo": "A1", "timestamp": 1767225600000_i64, "tipo": "entrada" }]
        })),
        (status = 500, description = "Storage failure", body = Object, example = json!({
            "success": false,
            "error": "error returned from database: disk I/O error"
        }))
    ),
    tag = "Records"
)]
pub async fn recent_records(store: web::Data<RecordStore>) -> Result<HttpResponse, ApiError> {
    let records = store.recent().await.map_err(|e| {
        error!(error = %e, "Failed to fetch recent records");
        ApiError::from(e)
    })?;

    let data: Vec<RecordView> = records.into_iter().map(RecordView::from).collect();
    Ok(success(data))
}

/// Record a card read
///
/// The record kind toggles from the card's previous read; the timestamp is
/// assigned by the server.
#[utoipa::path(
    post,
    path = "/dados",
    request_body(
        content = IngestRequest,
        description = "JSON body; a urlencoded form with a `cartao[codigo]` field is accepted too"
    ),
    responses(
        (status = 200, description = "Read recorded", body = Object, example = json!({
            "success": true,
            "data": { "cartao": { "codigo": "A1" }, "timestamp": 1767225600000_i64, "tipo": "entrada" }
        })),
        (status = 400, description = "Missing or empty card code", body = Object, example = json!({
            "success": false,
            "error": "cartao.codigo must be a non-empty string"
        })),
        (status = 500, description = "Storage failure")
    ),
    tag = "Records"
)]
#[instrument(name = "ingest_read", skip(store, body), fields(codigo = tracing::field::Empty))]
pub async fn ingest_read(
    store: web::Data<RecordStore>,
    body: IngestBody,
) -> Result<HttpResponse, ApiError> {
    let codigo = codigo_of(body);
    Span::current().record("codigo", codigo.as_str());

    let card_id = parse_card_id(&codigo).inspect_err(|_| {
        info!("Rejected read with empty card code");
    })?;

    let record = store.ingest(&card_id).await.map_err(|e| {
        error!(error = %e, "Failed to store card read");
        ApiError::from(e)
    })?;

    info!(tipo = %record.kind, timestamp = record.timestamp, "Card read recorded");
    Ok(success(IngestedView::from(record)))
}

/// Current status of one card
#[utoipa::path(
    get,
    path = "/status_cartao/{codigo}",
    params(
        ("codigo" = String, Path, description = "Card code")
    ),
    responses(
        (status = 200, description = "Latest kind and timestamp, or nulls for an unseen card", body = Object, example = json!({
            "success": true,
            "data": { "tipo": "saida", "timestamp": 1767225600000_i64 }
        })),
        (status = 500, description = "Storage failure")
    ),
    tag = "Records"
)]
pub async fn card_status(
    store: web::Data<RecordStore>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let codigo = path.into_inner();

    // Ingest stores codes trimmed, so look them up the same way. A blank
    // code can never have been recorded.
    let status = match CardId::parse(&codigo) {
        Some(card_id) => store.card_status(&card_id).await.map_err(|e| {
            error!(error = %e, codigo = %codigo, "Failed to fetch card status");
            ApiError::from(e)
        })?,
        None => CardStatus::NeverSeen,
    };

    Ok(success(StatusView::from(status)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn views_use_wire_field_names() {
        let record = Record {
            card_id: "A1".to_string(),
            timestamp: 42,
            kind: RecordKind::Exit,
        };

        let listed = serde_json::to_value(RecordView::from(record.clone())).unwrap();
        assert_eq!(listed, json!({ "codigo": "A1", "timestamp": 42, "tipo": "saida" }));

        let ingested = serde_json::to_value(IngestedView::from(record)).unwrap();
        assert_eq!(
            ingested,
            json!({ "cartao": { "codigo": "A1" }, "timestamp": 42, "tipo": "saida" })
        );
    }

    #[test]
    fn unseen_status_serializes_nulls() {
        let view = serde_json::to_value(StatusView::from(CardStatus::NeverSeen)).unwrap();
        assert_eq!(view, json!({ "tipo": null, "timestamp": null }));
    }
}
