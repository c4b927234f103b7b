//! Row normalization
//!
//! Turns enriched records into positional rows following a schema's
//! column roles.

use serde_json::Value;

use super::{ColumnRole, ColumnSchema};
use crate::data::PunishmentRecord;

/// Display data for one person shown in a row
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfileView {
    /// Profile link, empty when unknown
    pub url: String,
    pub avatar: String,
    pub name: String,
}

/// A record with its resolved subject and administrator views
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub record: PunishmentRecord,
    pub subject: ProfileView,
    pub admin: ProfileView,
}

/// Build one row per record, one cell per schema column
pub fn normalize(schema: &ColumnSchema, records: &[EnrichedRecord]) -> Vec<Vec<Value>> {
    records
        .iter()
        .map(|enriched| {
            schema
                .columns()
                .iter()
                .map(|column| cell(column.role, enriched))
                .collect()
        })
        .collect()
}

fn cell(role: ColumnRole, enriched: &EnrichedRecord) -> Value {
    let record = &enriched.record;
    match role {
        ColumnRole::Kind => Value::from(record.kind.as_str()),
        ColumnRole::SubjectUrl => Value::from(enriched.subject.url.as_str()),
        ColumnRole::SubjectAvatar => Value::from(enriched.subject.avatar.as_str()),
        ColumnRole::SubjectName => escaped(&enriched.subject.name),
        ColumnRole::AdminUrl => Value::from(enriched.admin.url.as_str()),
        ColumnRole::AdminAvatar => Value::from(enriched.admin.avatar.as_str()),
        ColumnRole::AdminName => escaped(&enriched.admin.name),
        ColumnRole::SubjectProfile | ColumnRole::AdminProfile | ColumnRole::Remaining => {
            Value::from("")
        }
        ColumnRole::Created => timestamp(&record.created_at),
        ColumnRole::Reason => escaped(record.reason.as_deref().unwrap_or_default()),
        ColumnRole::Expires => record.expires_at.as_ref().map_or(Value::Null, timestamp),
        ColumnRole::Duration => Value::from(record.duration),
    }
}

fn escaped(text: &str) -> Value {
    Value::from(html_escape::encode_text(text).into_owned())
}

fn timestamp(value: &crate::data::Timestamp) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
