use crate::api::records::{Card, IngestForm, IngestRequest, IngestedView, RecordView, StatusView};
use crate::model::record::RecordKind;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ponto API",
        version = "0.1.0",
        description = r#"
## RFID attendance records

Card readers post every scan to `/dados`. The server stamps the read with its
own clock and infers the kind from the card's previous read:

- first read of a card, or a read after a `saida` → **entrada**
- read after an `entrada` → **saida**

Records are append-only. Every response is wrapped as
`{ "success": true, "data": ... }` or `{ "success": false, "error": "..." }`.
"#,
    ),
    paths(
        crate::api::records::recent_records,
        crate::api::records::ingest_read,
        crate::api::records::card_status,
    ),
    components(
        schemas(
            Card,
            IngestRequest,
            IngestForm,
            IngestedView,
            RecordView,
            StatusView,
            RecordKind
        )
    ),
    tags(
        (name = "Records", description = "Card read ingest and queries"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_record_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        assert!(paths.iter().any(|p| *p == "/ultimos_registros"));
        assert!(paths.iter().any(|p| *p == "/dados"));
        assert!(paths.iter().any(|p| *p == "/status_cartao/{codigo}"));
    }
}
