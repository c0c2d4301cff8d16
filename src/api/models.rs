//! Module records as exchanged with the `/modules` collection
//!
//! The wire format is camelCase JSON. The survey document travels under the
//! canonical `surveyJson` key and the legacy `form_data` key; both are read
//! and both are written so older consumers keep working.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Name used for grouping and display when a module has none
pub const UNNAMED: &str = "Unnamed";

/// Name given to drafts whose document has no title
pub const UNTITLED_SURVEY: &str = "Untitled Survey";

/// Publication status of a module
///
/// Unknown values coming from the backend are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ModuleStatus {
    Active,
    #[default]
    Draft,
    Inactive,
    Archived,
    Other(String),
}

impl ModuleStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ModuleStatus::Active => "Active",
            ModuleStatus::Draft => "Draft",
            ModuleStatus::Inactive => "Inactive",
            ModuleStatus::Archived => "Archived",
            ModuleStatus::Other(value) => value,
        }
    }
}

impl From<String> for ModuleStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Active" => ModuleStatus::Active,
            "Draft" => ModuleStatus::Draft,
            "Inactive" => ModuleStatus::Inactive,
            "Archived" => ModuleStatus::Archived,
            _ => ModuleStatus::Other(value),
        }
    }
}

impl From<ModuleStatus> for String {
    fn from(status: ModuleStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted survey definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ModuleRecord", into = "ModuleRecord")]
pub struct Module {
    /// Server-assigned identifier, absent until the first create succeeds
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: String,
    pub status: ModuleStatus,
    /// Opaque survey document
    pub survey_json: Value,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Module {
    /// Name used for display and duplicate grouping
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNNAMED)
    }

    /// Most recent known modification time
    pub fn last_touched(&self) -> Option<DateTime<Utc>> {
        self.updated_at.or(self.created_at)
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

/// Wire representation of a module
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModuleRecord {
    #[serde(default, deserialize_with = "deserialize_id", skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: Option<ModuleStatus>,
    #[serde(default)]
    survey_json: Option<Value>,
    #[serde(default, rename = "form_data")]
    form_data: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_timestamp", skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_timestamp", skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

impl From<ModuleRecord> for Module {
    fn from(record: ModuleRecord) -> Self {
        let survey_json = record
            .survey_json
            .filter(|value| !value.is_null())
            .or(record.form_data)
            .unwrap_or(Value::Null);

        Self {
            id: record.id,
            name: record.name,
            description: record.description.unwrap_or_default(),
            status: record.status.unwrap_or_default(),
            survey_json,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl From<Module> for ModuleRecord {
    fn from(module: Module) -> Self {
        Self {
            id: module.id,
            name: module.name,
            description: Some(module.description),
            status: Some(module.status),
            form_data: Some(module.survey_json.clone()),
            survey_json: Some(module.survey_json),
            created_at: module.created_at,
            updated_at: module.updated_at,
        }
    }
}

/// Ids arrive as strings or numbers depending on the backend
fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(id)) if !id.is_empty() => Some(id),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    })
}

/// Unparseable timestamps become `None` instead of failing the record
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(raw)) => DateTime::parse_from_rfc3339(&raw)
            .ok()
            .map(|ts| ts.with_timezone(&Utc)),
        Some(Value::Number(millis)) => millis.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    })
}

/// Payload for create and update requests
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDraft {
    pub name: String,
    pub description: String,
    pub status: ModuleStatus,
    pub survey_json: Value,
    /// Creation time of the record this draft replaces; updates are full
    /// replacements, so it has to travel with every PUT
    pub created_at: Option<DateTime<Utc>>,
}

impl ModuleDraft {
    pub fn new(name: impl Into<String>, survey_json: Value) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            status: ModuleStatus::Draft,
            survey_json,
            created_at: None,
        }
    }

    /// Build a draft from a designer document, taking name and description
    /// from the document's `title` and `description`
    pub fn from_document(document: &Value) -> Self {
        let title = document
            .get("title")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .unwrap_or(UNTITLED_SURVEY);
        let description = document
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default();

        Self {
            name: title.to_string(),
            description: description.to_string(),
            status: ModuleStatus::Draft,
            survey_json: document.clone(),
            created_at: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_status(mut self, status: ModuleStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_created_at(mut self, created_at: Option<DateTime<Utc>>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Materialize the draft as a module record
    pub fn into_module(
        self,
        id: Option<String>,
        created_at: Option<DateTime<Utc>>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Module {
        Module {
            id,
            name: Some(self.name),
            description: self.description,
            status: self.status,
            survey_json: self.survey_json,
            created_at,
            updated_at,
        }
    }
}

impl From<&Module> for ModuleDraft {
    fn from(module: &Module) -> Self {
        Self {
            name: module.display_name().to_string(),
            description: module.description.clone(),
            status: module.status.clone(),
            survey_json: module.survey_json.clone(),
            created_at: module.created_at,
        }
    }
}

/// Whether a survey document carries no content at all
pub fn is_empty_document(document: &Value) -> bool {
    match document {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    }
}
