use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Whether a card read clocks the holder in or out.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    sqlx::Type,
    AsRefStr,
    Display,
    EnumString,
    ToSchema,
)]
pub enum RecordKind {
    #[serde(rename = "entrada")]
    #[sqlx(rename = "entrada")]
    #[strum(serialize = "entrada")]
    Entry,

    #[serde(rename = "saida")]
    #[sqlx(rename = "saida")]
    #[strum(serialize = "saida")]
    Exit,
}

impl RecordKind {
    /// The toggle rule: a card with no history, or whose last read was an
    /// exit, enters; a card whose last read was an entry exits.
    pub fn following(previous: Option<RecordKind>) -> Self {
        match previous {
            None | Some(RecordKind::Exit) => RecordKind::Entry,
            Some(RecordKind::Entry) => RecordKind::Exit,
        }
    }

    pub fn as_str(&self) -> &str {
        self.as_ref()
    }
}

/// Card identifier as accepted at the edge: trimmed and never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CardId(String);

impl CardId {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One row of the `leitura` table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Record {
    #[sqlx(rename = "cartao")]
    pub card_id: String,
    /// Milliseconds since the Unix epoch, assigned at ingest.
    pub timestamp: i64,
    #[sqlx(rename = "tipo")]
    pub kind: RecordKind,
}

/// Presence state of a card, derived from its most recent record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardStatus {
    NeverSeen,
    Present { since: i64 },
    Away { since: i64 },
}

impl CardStatus {
    pub fn last_kind(&self) -> Option<RecordKind> {
        match self {
            CardStatus::NeverSeen => None,
            CardStatus::Present { .. } => Some(RecordKind::Entry),
            CardStatus::Away { .. } => Some(RecordKind::Exit),
        }
    }

    pub fn last_timestamp(&self) -> Option<i64> {
        match self {
            CardStatus::NeverSeen => None,
            CardStatus::Present { since } | CardStatus::Away { since } => Some(*since),
        }
    }

    /// Kind the next read of this card will be recorded as.
    pub fn next_kind(&self) -> RecordKind {
        RecordKind::following(self.last_kind())
    }
}

impl From<Option<&Record>> for CardStatus {
    fn from(last: Option<&Record>) -> Self {
        match last {
            None => CardStatus::NeverSeen,
            Some(record) => match record.kind {
                RecordKind::Entry => CardStatus::Present {
                    since: record.timestamp,
                },
                RecordKind::Exit => CardStatus::Away {
                    since: record.timestamp,
                },
            },
        }
    }
}
