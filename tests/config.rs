use rowdoc::*;
use std::collections::HashMap;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn options_load_from_prefixed_variables() -> anyhow::Result<()> {
    let lookup = env(&[
        ("ROWDOC_QUERY", "SELECT * FROM t"),
        ("ROWDOC_COLLECTION", "exports"),
        ("ROWDOC_RUN_ID", "run-1"),
    ]);
    let options = ExportOptions::from_lookup("ROWDOC", lookup)?;
    assert_eq!(options.query, "SELECT * FROM t");
    assert_eq!(options.collection, "exports");
    assert_eq!(options.run_id, "run-1");
    assert_eq!(options.database_id, DEFAULT_DATABASE_ID);
    assert_eq!(options.project_id, None);
    Ok(())
}

#[test]
fn missing_required_variable_is_named() {
    let lookup = env(&[("X_QUERY", "q"), ("X_RUN_ID", "r")]);
    assert_eq!(
        ExportOptions::from_lookup("X", lookup),
        Err(ConfigError::Missing("X_COLLECTION".into()))
    );
}

#[test]
fn validate_rejects_unusable_options() {
    let ok = ExportOptions::new("q", "c", "r");
    assert!(ok.validate().is_ok());

    assert_eq!(
        ExportOptions::new(" ", "c", "r").validate(),
        Err(ConfigError::Missing("query".into()))
    );
    assert_eq!(
        ExportOptions::new("q", "c", "a/b").validate(),
        Err(ConfigError::InvalidRunId("a/b".into()))
    );
    assert_eq!(
        ExportOptions::new("q", "c", "r").with_database_id("").validate(),
        Err(ConfigError::Missing("database id".into()))
    );
}

#[test]
fn explicit_project_wins_over_environment() -> anyhow::Result<()> {
    let options = ExportOptions::new("q", "c", "r").with_project_id("explicit");
    let project = options.resolve_project_id(env(&[("GOOGLE_CLOUD_PROJECT", "ambient")]))?;
    assert_eq!(project, "explicit");
    Ok(())
}

#[test]
fn project_falls_back_through_environment_variables() -> anyhow::Result<()> {
    let options = ExportOptions::new("q", "c", "r");
    assert_eq!(
        options.resolve_project_id(env(&[
            ("GOOGLE_CLOUD_PROJECT", "first"),
            ("GCLOUD_PROJECT", "second")
        ]))?,
        "first"
    );
    assert_eq!(
        options.resolve_project_id(env(&[("GOOGLE_CLOUD_PROJECT", ""), ("GCLOUD_PROJECT", "second")]))?,
        "second"
    );
    Ok(())
}

#[test]
fn unresolved_project_is_a_configuration_error() {
    let options = ExportOptions::new("q", "c", "r");
    assert!(matches!(
        options.document_target_with(env(&[])),
        Err(ConfigError::ProjectUnresolved { .. })
    ));
}

#[test]
fn document_target_carries_every_component() -> anyhow::Result<()> {
    let target = ExportOptions::new("q", "exports", "run-42")
        .with_database_id("analytics")
        .document_target_with(env(&[("GCLOUD_PROJECT", "proj")]))?;
    assert_eq!(target, DocumentTarget::new("proj", "analytics", "exports", "run-42"));
    Ok(())
}

#[test]
fn even_depth_collection_is_a_target_error() {
    let result = ExportOptions::new("q", "a/b", "r")
        .with_project_id("p")
        .document_target_with(env(&[]));
    assert!(matches!(
        result,
        Err(ConfigError::Target(AssembleError::CollectionDepth { depth: 2, .. }))
    ));
}

#[test]
fn options_deserialize_from_camel_case_json() -> anyhow::Result<()> {
    let options: ExportOptions = serde_json::from_str(
        r#"{"query": "SELECT 1", "collection": "c", "runId": "r", "projectId": "p"}"#,
    )?;
    assert_eq!(options.run_id, "r");
    assert_eq!(options.project_id.as_deref(), Some("p"));
    assert_eq!(options.database_id, DEFAULT_DATABASE_ID);
    Ok(())
}
