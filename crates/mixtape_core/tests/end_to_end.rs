use mixtape_core::store::{read_document_value, write_document_value};
use mixtape_core::{
    apply_changes, apply_changes_with, ModelError, SequentialIdGenerator, StoreError,
    MIXTAPE_PARAMETER,
};
use serde_json::{json, Value};

fn scenario_inputs() -> (Value, Value) {
    let mixtape = json!({
        "users": [{"user_id": "u1"}],
        "items": [{"id": "s1"}, {"id": "s2"}],
        "collections": [
            {"collection": {"id": "c1", "name": "Old", "owner_id": "u1", "items": ["s1"]}}
        ]
    });
    let changes = json!({
        "deletions": {"collections": ["c1"]},
        "additions": {
            "existing_collections_to_update": [],
            "new_collections": [{"owner_id": "u1", "name": "New", "items": ["s1", "s2"]}]
        }
    });
    (mixtape, changes)
}

#[test]
fn scenario_replaces_old_collection_with_new_one() {
    let (mixtape, changes) = scenario_inputs();

    let (result, report) = apply_changes(mixtape, changes).unwrap();

    let collections = result["collections"].as_array().unwrap();
    assert_eq!(collections.len(), 1);
    let created = &collections[0]["collection"];
    assert_ne!(created["id"], "c1");
    assert!(uuid::Uuid::parse_str(created["id"].as_str().unwrap()).is_ok());
    assert_eq!(created["name"], "New");
    assert_eq!(created["owner_id"], "u1");
    assert_eq!(created["items"], json!(["s1", "s2"]));

    assert_eq!(report.applied_count(), 2);
    assert_eq!(result["users"], json!([{"user_id": "u1"}]));
    assert_eq!(result["items"], json!([{"id": "s1"}, {"id": "s2"}]));
}

#[test]
fn apply_changes_checks_mixtape_before_changes() {
    let err = apply_changes(json!("hello"), json!("there")).unwrap_err();
    assert_eq!(err.parameter(), Some(MIXTAPE_PARAMETER));

    let err = apply_changes(json!({}), json!("there")).unwrap_err();
    assert!(matches!(err, ModelError::InvalidArgument { parameter: "changes", .. }));

    let err = apply_changes(Value::Null, json!({})).unwrap_err();
    assert!(matches!(err, ModelError::InvalidArgument { parameter: "mixtape", found: "null" }));
}

#[test]
fn non_object_changes_reported_before_malformed_mixtape() {
    let malformed_mixtape = json!({"users": [{"name": "no id"}]});

    let err = apply_changes(malformed_mixtape.clone(), json!("there")).unwrap_err();
    assert_eq!(
        err,
        ModelError::InvalidArgument {
            parameter: "changes",
            found: "string",
        }
    );

    let err = apply_changes(malformed_mixtape, json!({})).unwrap_err();
    assert!(matches!(err, ModelError::Malformed { parameter: "mixtape", .. }));
}

#[test]
fn empty_change_request_returns_document_unchanged() {
    let (mixtape, _) = scenario_inputs();

    let (result, report) = apply_changes(mixtape.clone(), json!({})).unwrap();

    assert_eq!(result, mixtape);
    assert!(report.is_empty());
}

#[test]
fn files_round_trip_through_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let mixtape_path = dir.path().join("mixtape.json");
    let changes_path = dir.path().join("changes.json");
    let output_path = dir.path().join("output.json");

    let (mixtape, changes) = scenario_inputs();
    std::fs::write(&mixtape_path, mixtape.to_string()).unwrap();
    std::fs::write(&changes_path, changes.to_string()).unwrap();

    let mixtape = read_document_value(&mixtape_path, "mixtape").unwrap();
    let changes = read_document_value(&changes_path, "changes").unwrap();
    let (result, _) =
        apply_changes_with(mixtape, changes, SequentialIdGenerator::new("pl-")).unwrap();
    write_document_value(&output_path, &result).unwrap();

    let written = std::fs::read_to_string(&output_path).unwrap();
    assert!(written.ends_with("}\n"));
    assert!(written.contains("\n    \"users\""));

    let reloaded: Value = serde_json::from_str(&written).unwrap();
    assert_eq!(reloaded["collections"][0]["collection"]["id"], "pl-1");
    assert_eq!(reloaded, result);
}

#[test]
fn missing_input_file_is_reported_with_parameter_name() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.json");

    let err = read_document_value(&missing, "changes").unwrap_err();

    assert!(matches!(err, StoreError::MissingInput { parameter: "changes", .. }));
    assert!(err.to_string().contains("changes.json"), "unexpected message: {err}");
}

#[test]
fn invalid_json_is_reported_as_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = read_document_value(&path, "mixtape").unwrap_err();

    assert!(matches!(err, StoreError::Json { .. }));
}
