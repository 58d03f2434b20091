use chrono::{Duration, NaiveDate, Utc};
use planner_types::{
    CalendarEvent, Collection, Family, FamilyMember, Priority, RecordId, RecordPayload, Task,
    TaskStatus, ValidationError, task_statistics, validate_patch,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn family_id() -> RecordId {
    RecordId::new()
}

fn make_task(title: &str) -> Task {
    Task::new(
        family_id(),
        title,
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
    )
}

// --- Validation ---

#[test]
fn valid_task_passes() {
    let record = RecordPayload::Task(make_task("Pack lunches"));
    assert!(record.validate().is_ok());
}

#[test]
fn blank_task_title_rejected() {
    let record = RecordPayload::Task(make_task("   "));
    assert_eq!(record.validate(), Err(ValidationError::EmptyField("title")));
}

#[test]
fn blank_family_name_rejected() {
    let record = RecordPayload::Family(Family::new("user-1", ""));
    assert_eq!(record.validate(), Err(ValidationError::EmptyField("name")));
}

#[test]
fn blank_member_name_rejected() {
    let record = RecordPayload::FamilyMember(FamilyMember::new(family_id(), " "));
    assert_eq!(record.validate(), Err(ValidationError::EmptyField("name")));
}

#[test]
fn event_end_before_start_rejected() {
    let start = Utc::now();
    let event = CalendarEvent::new(family_id(), "Dentist", start, start - Duration::hours(1));
    let record = RecordPayload::Event(event);
    assert_eq!(record.validate(), Err(ValidationError::InvalidDateRange));
}

#[test]
fn event_zero_length_is_valid() {
    let start = Utc::now();
    let event = CalendarEvent::new(family_id(), "Reminder", start, start);
    assert!(RecordPayload::Event(event).validate().is_ok());
}

// --- Accessors ---

#[test]
fn family_owns_itself() {
    let family = Family::new("user-1", "Rossi");
    let record = RecordPayload::Family(family.clone());
    assert_eq!(record.family_id(), family.id);
    assert_eq!(record.id(), family.id);
    assert_eq!(record.collection(), Collection::Families);
}

#[test]
fn task_reports_owning_family() {
    let task = make_task("Laundry");
    let record = RecordPayload::Task(task.clone());
    assert_eq!(record.family_id(), task.family_id);
    assert_eq!(record.collection(), Collection::Tasks);
}

// --- Wire form ---

#[test]
fn payload_serializes_with_collection_tag() {
    let record = RecordPayload::Task(make_task("Groceries"));
    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["collection"], "tasks");
    assert_eq!(value["title"], "Groceries");
    assert_eq!(value["status"], "pending");
    assert_eq!(value["priority"], "medium");
}

#[test]
fn payload_round_trips_through_json() {
    let record = RecordPayload::FamilyMember(FamilyMember::new(family_id(), "Luca"));
    let text = serde_json::to_string(&record).unwrap();
    let back: RecordPayload = serde_json::from_str(&text).unwrap();
    assert_eq!(back, record);
}

#[test]
fn unknown_collection_tag_fails_to_parse() {
    let result: Result<RecordPayload, _> = serde_json::from_value(json!({
        "collection": "grocery_lists",
        "id": RecordId::new(),
        "name": "weekly"
    }));
    assert!(result.is_err());
}

// --- Patches ---

#[test]
fn patch_merges_shallowly() {
    let task = make_task("Homework");
    let record = RecordPayload::Task(task.clone());
    let merged = record
        .apply_patch(&json!({"title": "Math homework", "priority": "high"}))
        .unwrap();
    match merged {
        RecordPayload::Task(t) => {
            assert_eq!(t.title, "Math homework");
            assert_eq!(t.priority, Priority::High);
            assert_eq!(t.id, task.id);
            assert_eq!(t.status, TaskStatus::Pending);
        }
        other => panic!("patched task became {other:?}"),
    }
}

#[test]
fn patch_cannot_touch_immutable_fields() {
    let record = RecordPayload::Task(make_task("Dishes"));
    let err = record
        .apply_patch(&json!({"id": "11111111-1111-1111-1111-111111111111"}))
        .unwrap_err();
    assert_eq!(err, ValidationError::ImmutableField("id".to_string()));
}

#[test]
fn empty_patch_rejected() {
    let err = validate_patch(Collection::Tasks, &json!({})).unwrap_err();
    assert_eq!(
        err,
        ValidationError::InvalidPatch {
            collection: Collection::Tasks
        }
    );
}

#[test]
fn non_object_patch_rejected() {
    let err = validate_patch(Collection::Events, &json!("completed")).unwrap_err();
    assert_eq!(
        err,
        ValidationError::InvalidPatch {
            collection: Collection::Events
        }
    );
}

#[test]
fn patch_result_is_revalidated() {
    let record = RecordPayload::Task(make_task("Trash"));
    let err = record.apply_patch(&json!({"title": ""})).unwrap_err();
    assert_eq!(err, ValidationError::EmptyField("title"));
}

#[test]
fn patch_with_wrong_field_type_rejected() {
    let record = RecordPayload::Task(make_task("Vacuum"));
    let err = record.apply_patch(&json!({"status": "paused"})).unwrap_err();
    assert!(matches!(err, ValidationError::SchemaMismatch { .. }));
}

// --- Statistics ---

#[test]
fn statistics_over_empty_list() {
    let stats = task_statistics(&[]);
    assert_eq!(stats.total, 0);
    assert_eq!(stats.completed, 0);
    assert_eq!(stats.pending, 0);
    assert_eq!(stats.completion_rate, 0);
}

#[test]
fn statistics_counts_and_rate() {
    let mut tasks = vec![make_task("a"), make_task("b"), make_task("c")];
    tasks[0].status = TaskStatus::Completed;
    tasks[1].status = TaskStatus::Completed;
    let stats = task_statistics(&tasks);
    assert_eq!(stats.total, 3);
    assert_eq!(stats.completed, 2);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.completion_rate, 67);
}
