//! Static per-resource metadata: table, key column, and the field allow-list.
//!
//! Every identifier that reaches generated SQL comes from here, never from a
//! request payload.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown resource: {0}")]
    UnknownResource(String),
}

/// Postgres column type a field binds to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Integer,
    Numeric,
    Date,
    Timestamp,
}

impl ColumnType {
    pub fn to_sql(&self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Integer => "integer",
            ColumnType::Numeric => "numeric",
            ColumnType::Date => "date",
            ColumnType::Timestamp => "timestamp",
        }
    }

    /// Whether a non-null scalar can be cast to this column type
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Array(_) | Value::Object(_)) => false,
            (ColumnType::Text, _) => true,
            (ColumnType::Integer, Value::Number(n)) => n.as_i64().is_some_and(|i| i32::try_from(i).is_ok()),
            (ColumnType::Integer, Value::String(s)) => s.trim().parse::<i32>().is_ok(),
            (ColumnType::Numeric, Value::Number(_)) => true,
            (ColumnType::Numeric, Value::String(s)) => s.trim().parse::<f64>().is_ok_and(f64::is_finite),
            (ColumnType::Date, Value::String(s)) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).is_ok(),
            (ColumnType::Timestamp, Value::String(s)) => is_timestamp(s.trim()),
            _ => false,
        }
    }

    /// What a client must send, for validation messages
    pub fn expected(&self) -> &'static str {
        match self {
            ColumnType::Text => "a scalar value",
            ColumnType::Integer => "an integer",
            ColumnType::Numeric => "a number",
            ColumnType::Date => "a date (YYYY-MM-DD)",
            ColumnType::Timestamp => "a timestamp (YYYY-MM-DD HH:MM:SS)",
        }
    }
}

fn is_timestamp(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok()
        || TIMESTAMP_FORMATS
            .iter()
            .any(|format| NaiveDateTime::parse_from_str(s, format).is_ok())
        || NaiveDate::parse_from_str(s, DATE_FORMAT).is_ok()
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldDef {
    pub name: &'static str,
    pub column_type: ColumnType,
    /// Must be present and non-empty on create
    pub required: bool,
    /// May be changed by a partial update
    pub mutable: bool,
    /// Hashed with bcrypt before it is bound to any statement
    pub secret: bool,
}

impl FieldDef {
    const fn text(name: &'static str) -> Self {
        Self::new(name, ColumnType::Text)
    }

    const fn new(name: &'static str, column_type: ColumnType) -> Self {
        Self {
            name,
            column_type,
            required: true,
            mutable: true,
            secret: false,
        }
    }

    const fn secret(mut self) -> Self {
        self.secret = true;
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ResourceDef {
    /// URL segment, e.g. `permission_levels`
    pub name: &'static str,
    pub table: &'static str,
    pub key: &'static str,
    /// Human label used in response messages
    pub label: &'static str,
    pub fields: &'static [FieldDef],
}

impl ResourceDef {
    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.required)
    }

    pub fn mutable_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.mutable)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .or_else(|| self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(name)))
    }
}

static RESOURCES: &[ResourceDef] = &[
    ResourceDef {
        name: "countries",
        table: "Countries",
        key: "Country_ID",
        label: "Country",
        fields: &[FieldDef::text("Country_Name"), FieldDef::text("Country_Code")],
    },
    ResourceDef {
        name: "roles",
        table: "Roles",
        key: "Role_ID",
        label: "Role",
        fields: &[FieldDef::text("Role_Code"), FieldDef::text("Role_Description")],
    },
    ResourceDef {
        name: "permission_levels",
        table: "Permission_Levels",
        key: "Permission_Level_ID",
        label: "Permission level",
        fields: &[
            FieldDef::text("Permission_Level_Code"),
            FieldDef::text("Permission_Level_Description"),
        ],
    },
    ResourceDef {
        name: "people",
        table: "People",
        key: "Person_ID",
        label: "Person",
        fields: &[
            FieldDef::text("Permission_Level_Code"),
            FieldDef::text("Login_Name"),
            FieldDef::text("Password").secret(),
            FieldDef::text("Personal_Details"),
            FieldDef::text("Other_Details"),
            FieldDef::text("Country_Name"),
            FieldDef::text("Role_Description"),
        ],
    },
    ResourceDef {
        name: "internal_messages",
        table: "Internal_Messages",
        key: "Message_ID",
        label: "Internal message",
        fields: &[
            FieldDef::new("msg_from_person_id", ColumnType::Integer),
            FieldDef::new("msg_to_person_id", ColumnType::Integer),
            FieldDef::new("date_message_sent", ColumnType::Timestamp),
            FieldDef::text("message_subject"),
            FieldDef::text("message_text"),
        ],
    },
    ResourceDef {
        name: "payments",
        table: "Payments",
        key: "Payment_ID",
        label: "Payment",
        fields: &[
            FieldDef::new("amount", ColumnType::Numeric),
            FieldDef::new("payment_date", ColumnType::Date),
            FieldDef::text("payment_method"),
        ],
    },
    ResourceDef {
        name: "monthly_reports",
        table: "Monthly_Reports",
        key: "Report_ID",
        label: "Monthly report",
        fields: &[
            FieldDef::new("Person_ID", ColumnType::Integer),
            FieldDef::new("Date_Report_Sent", ColumnType::Timestamp),
            FieldDef::text("Report_Text"),
        ],
    },
];

pub struct Registry;

impl Registry {
    pub fn lookup(name: &str) -> Result<&'static ResourceDef, RegistryError> {
        RESOURCES
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| RegistryError::UnknownResource(name.to_string()))
    }

    pub fn all() -> &'static [ResourceDef] {
        RESOURCES
    }
}
