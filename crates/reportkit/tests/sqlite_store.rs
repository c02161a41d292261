mod common;

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use reportkit::models::SavedQuery;
use reportkit::service::SavedQueryStore;
use reportkit::sqlite::{SAVED_QUERIES_FILE_NAME, SqliteSavedQueryStore};

use common::{DATABASE, crosstab_query, raw_query};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("{prefix}-{}-{nanos}", std::process::id()))
}

fn unsaved(name: &str, shared: bool) -> SavedQuery {
    SavedQuery {
        id: None,
        name: name.to_string(),
        description: format!("{name} description"),
        is_shared: shared,
        user_is_owner: true,
        query: raw_query(),
    }
}

#[test]
fn saved_query_round_trips_through_sqlite() {
    let store = SqliteSavedQueryStore::in_memory("marge").expect("store should open");
    let mut original = unsaved("Over thirty", false);
    original.query = crosstab_query();
    original.query.is_bound_to_ui = true;

    let created = store.create(&original).expect("create should succeed");
    let id = created.id.clone().expect("created query should have an id");
    let loaded = store
        .get(&id)
        .expect("get should succeed")
        .expect("query should be visible to its owner");

    assert_eq!(loaded.name, "Over thirty");
    assert_eq!(loaded.description, "Over thirty description");
    assert!(loaded.user_is_owner);
    assert!(!loaded.query.is_bound_to_ui);
    assert!(loaded.query.is_equivalent(&original.query));
    assert_eq!(loaded.query.crosstab_row_var, "State");
}

#[test]
fn listing_includes_shared_queries_of_other_users() {
    let dir = unique_temp_dir("reportkit-sqlite-sharing");
    let path = dir.join(SAVED_QUERIES_FILE_NAME);

    let homer = SqliteSavedQueryStore::open(&path, "homer").expect("homer store should open");
    homer
        .create(&unsaved("Homer shared", true))
        .expect("shared create should succeed");
    let private = homer
        .create(&unsaved("Homer private", false))
        .expect("private create should succeed");

    let marge = SqliteSavedQueryStore::open(&path, "marge").expect("marge store should open");
    marge
        .create(&unsaved("marge own", false))
        .expect("own create should succeed");

    let visible = marge.list(DATABASE).expect("list should succeed");
    let summary: Vec<(String, bool)> = visible
        .iter()
        .map(|saved| (saved.name.clone(), saved.user_is_owner))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Homer shared".to_string(), false),
            ("marge own".to_string(), true),
        ]
    );

    let hidden = private.id.expect("private query should have an id");
    assert_eq!(marge.get(&hidden).expect("get should succeed"), None);
    assert!(marge.list("payroll").expect("list should succeed").is_empty());

    std::fs::remove_dir_all(&dir).expect("temp dir cleanup should succeed");
}

#[test]
fn only_owners_may_update_or_delete() {
    let dir = unique_temp_dir("reportkit-sqlite-ownership");
    let path = dir.join(SAVED_QUERIES_FILE_NAME);

    let homer = SqliteSavedQueryStore::open(&path, "homer").expect("homer store should open");
    let shared = homer
        .create(&unsaved("Homer shared", true))
        .expect("create should succeed");
    let id = shared.id.clone().expect("created query should have an id");

    let marge = SqliteSavedQueryStore::open(&path, "marge").expect("marge store should open");
    let error = marge.delete(&id).expect_err("non-owner delete should fail");
    assert!(
        error.message().contains("belongs to another user"),
        "unexpected error: {error}"
    );

    let mut renamed = shared.clone();
    renamed.name = "Hijacked".to_string();
    assert!(marge.update(&renamed).is_err());

    homer.delete(&id).expect("owner delete should succeed");
    assert_eq!(homer.get(&id).expect("get should succeed"), None);

    std::fs::remove_dir_all(&dir).expect("temp dir cleanup should succeed");
}

#[test]
fn updates_replace_the_stored_row() {
    let store = SqliteSavedQueryStore::in_memory("lisa").expect("store should open");
    let created = store
        .create(&unsaved("Draft", false))
        .expect("create should succeed");

    let mut edited = created.clone();
    edited.name = "Final".to_string();
    edited.is_shared = true;
    edited.query.output_columns = vec!["Salary".to_string()];
    store.update(&edited).expect("update should succeed");

    let listed = store.list(DATABASE).expect("list should succeed");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, created.id);
    assert_eq!(listed[0].name, "Final");
    assert!(listed[0].is_shared);
    assert_eq!(listed[0].query.output_columns, vec!["Salary"]);
}

#[test]
fn unknown_and_malformed_ids_are_errors_or_absent() {
    let store = SqliteSavedQueryStore::in_memory("bart").expect("store should open");

    assert_eq!(store.get("999").expect("get should succeed"), None);
    assert!(store.delete("999").is_err());
    assert!(store.get("not-a-number").is_err());
}

#[test]
fn listing_is_sorted_by_name_without_case() {
    let store = SqliteSavedQueryStore::in_memory("maggie").expect("store should open");
    for name in ["beta", "Alpha", "gamma"] {
        store
            .create(&unsaved(name, false))
            .expect("create should succeed");
    }

    let names: Vec<String> = store
        .list(DATABASE)
        .expect("list should succeed")
        .into_iter()
        .map(|saved| saved.name)
        .collect();
    assert_eq!(names, vec!["Alpha", "beta", "gamma"]);
}
