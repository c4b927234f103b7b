//! Table column schemas
//!
//! A `ColumnSchema` describes the ordered columns one backend exposes for
//! one listing. The same schema drives both the description served to the
//! table UI and the normalizer that builds rows, so a row always has
//! exactly one cell per declared column.

mod format;
mod normalize;

pub use format::{ChipState, RemainingTime, format_duration, format_timestamp, remaining_time};
pub use normalize::{EnrichedRecord, ProfileView, normalize};

use serde::Serialize;

use crate::data::{ColumnRequest, DurationUnit};

/// Logical meaning of one column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Kind,
    SubjectUrl,
    SubjectAvatar,
    SubjectName,
    /// Presentation group combining avatar, name and link
    SubjectProfile,
    Created,
    Reason,
    AdminUrl,
    AdminAvatar,
    AdminName,
    AdminProfile,
    Expires,
    Duration,
    /// Remaining-time chip derived client-side from expiry and duration
    Remaining,
}

/// How a timestamp column is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeEncoding {
    EpochSeconds,
    DateTime,
}

/// Client-side cell formatter attached to a column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "formatter", rename_all = "snake_case")]
pub enum CellFormatter {
    /// Icon for the punishment kind
    KindIcon,
    /// Avatar + name + link rendered from three hidden columns
    #[serde(rename_all = "camelCase")]
    Profile {
        avatar_column: usize,
        name_column: usize,
        url_column: usize,
    },
    Timestamp { encoding: TimeEncoding },
    /// Permanent / expired / active chip
    #[serde(rename_all = "camelCase")]
    RemainingTime {
        unit: DurationUnit,
        duration_column: usize,
        expires_column: usize,
    },
}

/// One declared column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDef {
    pub field_key: &'static str,
    /// Translation key, empty for unlabeled columns
    pub display_label: &'static str,
    pub visible: bool,
    pub searchable: bool,
    pub orderable: bool,
    pub default_order: bool,
    pub cell_formatter: Option<CellFormatter>,
    #[serde(skip)]
    pub role: ColumnRole,
}

impl ColumnDef {
    fn new(field_key: &'static str, display_label: &'static str, role: ColumnRole) -> Self {
        Self {
            field_key,
            display_label,
            visible: true,
            searchable: true,
            orderable: true,
            default_order: false,
            cell_formatter: None,
            role,
        }
    }

    fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    fn inert(mut self) -> Self {
        self.searchable = false;
        self.orderable = false;
        self
    }
}

/// Search/order flags for a data column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnFlags {
    pub searchable: bool,
    pub orderable: bool,
}

impl ColumnFlags {
    pub const ALL: Self = Self {
        searchable: true,
        orderable: true,
    };
    pub const NONE: Self = Self {
        searchable: false,
        orderable: false,
    };
}

/// Ordered column list for one backend listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ColumnSchema {
    columns: Vec<ColumnDef>,
}

impl ColumnSchema {
    pub fn builder() -> ColumnSchemaBuilder {
        ColumnSchemaBuilder::default()
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ColumnDef> {
        self.columns.get(index)
    }

    /// Index of the column declared as the default sort key
    pub fn default_order(&self) -> Option<usize> {
        self.columns.iter().position(|column| column.default_order)
    }

    /// Column list a table UI would echo back for this schema
    pub fn request_columns(&self) -> Vec<ColumnRequest> {
        self.columns
            .iter()
            .map(|column| ColumnRequest {
                name: column.field_key.to_string(),
                searchable: column.searchable,
                orderable: column.orderable,
                search: None,
            })
            .collect()
    }
}

/// Builds a `ColumnSchema` in the fixed row order
#[derive(Debug, Default)]
pub struct ColumnSchemaBuilder {
    columns: Vec<ColumnDef>,
    duration: Option<(usize, DurationUnit)>,
    expires: Option<usize>,
}

impl ColumnSchemaBuilder {
    fn push(&mut self, column: ColumnDef) -> usize {
        self.columns.push(column);
        self.columns.len() - 1
    }

    /// Punishment kind icon (combined listings only)
    pub fn kind(mut self, field_key: &'static str) -> Self {
        let mut column = ColumnDef::new(field_key, "banscomms.table.type", ColumnRole::Kind);
        column.cell_formatter = Some(CellFormatter::KindIcon);
        self.push(column);
        self
    }

    /// Player url, avatar and name followed by the visible profile group
    pub fn subject(mut self, name_key: &'static str) -> Self {
        let url = self.push(ColumnDef::new("user_url", "", ColumnRole::SubjectUrl).hidden().inert());
        let avatar =
            self.push(ColumnDef::new("avatar", "", ColumnRole::SubjectAvatar).hidden().inert());
        let name = self.push(ColumnDef::new(name_key, "", ColumnRole::SubjectName).hidden());
        let mut group = ColumnDef::new("", "banscomms.table.loh", ColumnRole::SubjectProfile).inert();
        group.cell_formatter = Some(CellFormatter::Profile {
            avatar_column: avatar,
            name_column: name,
            url_column: url,
        });
        self.push(group);
        self
    }

    /// Creation time, the default sort key
    pub fn created(mut self, field_key: &'static str, encoding: TimeEncoding) -> Self {
        let mut column = ColumnDef::new(field_key, "banscomms.table.created", ColumnRole::Created);
        column.default_order = true;
        column.cell_formatter = Some(CellFormatter::Timestamp { encoding });
        self.push(column);
        self
    }

    pub fn reason(mut self, field_key: &'static str, flags: ColumnFlags) -> Self {
        let mut column = ColumnDef::new(field_key, "banscomms.table.reason", ColumnRole::Reason);
        column.searchable = flags.searchable;
        column.orderable = flags.orderable;
        self.push(column);
        self
    }

    /// Administrator url, avatar and name followed by the profile group
    pub fn admin(mut self, name_key: &'static str) -> Self {
        let url = self.push(ColumnDef::new("admin_url", "", ColumnRole::AdminUrl).hidden().inert());
        let avatar = self.push(
            ColumnDef::new("admin_avatar", "", ColumnRole::AdminAvatar)
                .hidden()
                .inert(),
        );
        let name = self.push(ColumnDef::new(name_key, "", ColumnRole::AdminName).hidden());
        let mut group = ColumnDef::new("", "banscomms.table.admin", ColumnRole::AdminProfile).inert();
        group.cell_formatter = Some(CellFormatter::Profile {
            avatar_column: avatar,
            name_column: name,
            url_column: url,
        });
        self.push(group);
        self
    }

    pub fn expires(
        mut self,
        field_key: &'static str,
        encoding: TimeEncoding,
        flags: ColumnFlags,
    ) -> Self {
        let mut column = ColumnDef::new(field_key, "banscomms.table.end_date", ColumnRole::Expires);
        column.searchable = flags.searchable;
        column.orderable = flags.orderable;
        column.cell_formatter = Some(CellFormatter::Timestamp { encoding });
        self.expires = Some(self.push(column));
        self
    }

    /// Raw duration, hidden; feeds the remaining-time chip
    pub fn duration(mut self, field_key: &'static str, unit: DurationUnit) -> Self {
        let mut column = ColumnDef::new(field_key, "", ColumnRole::Duration).hidden();
        column.searchable = false;
        self.duration = Some((self.push(column), unit));
        self
    }

    /// Remaining-time chip; must follow `expires` and `duration`
    pub fn remaining(mut self) -> Self {
        let (duration_column, unit) = self.duration.unwrap_or((0, DurationUnit::Seconds));
        let mut column =
            ColumnDef::new("", "banscomms.table.length", ColumnRole::Remaining).inert();
        column.cell_formatter = Some(CellFormatter::RemainingTime {
            unit,
            duration_column,
            expires_column: self.expires.unwrap_or(0),
        });
        self.push(column);
        self
    }

    pub fn build(self) -> ColumnSchema {
        ColumnSchema {
            columns: self.columns,
        }
    }
}
