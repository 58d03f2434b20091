//! The record model — a tagged union over the four remote collections.
//!
//! Every record carries a client-generated id, its owning family, and a
//! creation timestamp. Field schemas are explicit; validation runs at the
//! write boundary before a record reaches the offline queue or the gateway.

use crate::error::ValidationError;
use crate::ids::RecordId;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four remote collections served by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Families,
    FamilyMembers,
    Tasks,
    Events,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Families => "families",
            Collection::FamilyMembers => "family_members",
            Collection::Tasks => "tasks",
            Collection::Events => "events",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-family preference settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilySettings {
    pub timezone: String,
    pub language: String,
    pub notifications_enabled: bool,
}

impl Default for FamilySettings {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            language: "en".to_string(),
            notifications_enabled: true,
        }
    }
}

/// A family account. The owning-family identifier of a family is itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Family {
    pub id: RecordId,
    /// Auth-backend user id of the family owner.
    pub owner_id: String,
    pub name: String,
    #[serde(default)]
    pub settings: FamilySettings,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Family {
    pub fn new(owner_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: RecordId::new(),
            owner_id: owner_id.into(),
            name: name.into(),
            settings: FamilySettings::default(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }
}

/// A member profile within a family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyMember {
    pub id: RecordId,
    pub family_id: RecordId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Display color used by the calendar UI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl FamilyMember {
    pub fn new(family_id: RecordId, name: impl Into<String>) -> Self {
        Self {
            id: RecordId::new(),
            family_id,
            name: name.into(),
            role: None,
            color: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }
}

/// Completion state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Completed,
}

/// Task priority, used for ordering in the day view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// A scheduled task, optionally assigned to a family member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: RecordId,
    pub family_id: RecordId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<NaiveTime>,
    pub status: TaskStatus,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<RecordId>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(family_id: RecordId, title: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: RecordId::new(),
            family_id,
            title: title.into(),
            description: None,
            date,
            time: None,
            status: TaskStatus::Pending,
            priority: Priority::Medium,
            assignee_id: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }
}

/// A calendar event spanning a start and end instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: RecordId,
    pub family_id: RecordId,
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CalendarEvent {
    pub fn new(
        family_id: RecordId,
        title: impl Into<String>,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RecordId::new(),
            family_id,
            title: title.into(),
            start_date,
            end_date,
            created_at: Utc::now(),
            updated_at: None,
        }
    }
}

/// A record of any of the four collection kinds.
///
/// Serialized with a `collection` tag matching the remote collection name,
/// so the wire form and the cache form are the same JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "collection")]
pub enum RecordPayload {
    #[serde(rename = "families")]
    Family(Family),
    #[serde(rename = "family_members")]
    FamilyMember(FamilyMember),
    #[serde(rename = "tasks")]
    Task(Task),
    #[serde(rename = "events")]
    Event(CalendarEvent),
}

/// Fields that are generated at creation and can never appear in a patch.
const IMMUTABLE_FIELDS: [&str; 3] = ["id", "collection", "created_at"];

impl RecordPayload {
    pub fn collection(&self) -> Collection {
        match self {
            RecordPayload::Family(_) => Collection::Families,
            RecordPayload::FamilyMember(_) => Collection::FamilyMembers,
            RecordPayload::Task(_) => Collection::Tasks,
            RecordPayload::Event(_) => Collection::Events,
        }
    }

    pub fn id(&self) -> RecordId {
        match self {
            RecordPayload::Family(f) => f.id,
            RecordPayload::FamilyMember(m) => m.id,
            RecordPayload::Task(t) => t.id,
            RecordPayload::Event(e) => e.id,
        }
    }

    /// Owning-family identifier. For a family record this is its own id.
    pub fn family_id(&self) -> RecordId {
        match self {
            RecordPayload::Family(f) => f.id,
            RecordPayload::FamilyMember(m) => m.family_id,
            RecordPayload::Task(t) => t.family_id,
            RecordPayload::Event(e) => e.family_id,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            RecordPayload::Family(f) => f.created_at,
            RecordPayload::FamilyMember(m) => m.created_at,
            RecordPayload::Task(t) => t.created_at,
            RecordPayload::Event(e) => e.created_at,
        }
    }

    /// Validates field schema constraints before the record reaches the
    /// queue or the gateway.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            RecordPayload::Family(f) => {
                if f.name.trim().is_empty() {
                    return Err(ValidationError::EmptyField("name"));
                }
            }
            RecordPayload::FamilyMember(m) => {
                if m.name.trim().is_empty() {
                    return Err(ValidationError::EmptyField("name"));
                }
            }
            RecordPayload::Task(t) => {
                if t.title.trim().is_empty() {
                    return Err(ValidationError::EmptyField("title"));
                }
            }
            RecordPayload::Event(e) => {
                if e.title.trim().is_empty() {
                    return Err(ValidationError::EmptyField("title"));
                }
                if e.end_date < e.start_date {
                    return Err(ValidationError::InvalidDateRange);
                }
            }
        }
        Ok(())
    }

    /// Applies a partial JSON object diff over this record, returning the
    /// merged record. The merge is shallow; immutable fields are rejected
    /// and the result is re-validated.
    pub fn apply_patch(&self, patch: &serde_json::Value) -> Result<RecordPayload, ValidationError> {
        let collection = self.collection();
        validate_patch(collection, patch)?;
        let Some(fields) = patch.as_object() else {
            return Err(ValidationError::InvalidPatch { collection });
        };

        let mut base = serde_json::to_value(self).map_err(|e| ValidationError::SchemaMismatch {
            collection,
            reason: e.to_string(),
        })?;
        let map = base.as_object_mut().ok_or(ValidationError::SchemaMismatch {
            collection,
            reason: "record did not serialize to an object".to_string(),
        })?;
        for (key, value) in fields {
            map.insert(key.clone(), value.clone());
        }

        let merged: RecordPayload =
            serde_json::from_value(base).map_err(|e| ValidationError::SchemaMismatch {
                collection,
                reason: e.to_string(),
            })?;
        merged.validate()?;
        Ok(merged)
    }
}

/// Checks a partial diff before it reaches the queue or gateway: it must be
/// a non-empty JSON object and must not touch immutable fields.
pub fn validate_patch(
    collection: Collection,
    patch: &serde_json::Value,
) -> Result<(), ValidationError> {
    let fields = patch
        .as_object()
        .filter(|m| !m.is_empty())
        .ok_or(ValidationError::InvalidPatch { collection })?;
    for key in fields.keys() {
        if IMMUTABLE_FIELDS.contains(&key.as_str()) {
            return Err(ValidationError::ImmutableField(key.clone()));
        }
    }
    Ok(())
}
