mod support;

use canvas_history::document::Element;
use canvas_history::{
    Document, EditorConfig, EditorError, InMemoryInviteService, InMemoryKeyValueStore,
    InviteError, Mutation, SaveState, TransformKind,
};

use support::{add_rect, open, project_keys};

// ============================================================================
// Autosave
// ============================================================================

#[tokio::test]
async fn edits_are_autosaved() {
    let store = InMemoryKeyValueStore::new();
    let (_, session) = open(&store, EditorConfig::default());
    assert_eq!(session.save_state().unwrap(), SaveState::Clean);

    let task = add_rect(&session, "a").expect("autosave should run");
    task.wait().await;

    assert!(matches!(session.save_state().unwrap(), SaveState::Saved { .. }));
    assert!(session.last_saved().unwrap().is_some());
    assert!(!session.has_unsaved_changes().unwrap());

    let projects = session.list_projects().unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].name, "Untitled Project");
    assert_eq!(projects[0].snapshot, session.capture().unwrap());
}

#[tokio::test]
async fn selection_is_not_recorded() {
    let store = InMemoryKeyValueStore::new();
    let (_, session) = open(&store, EditorConfig::default());
    add_rect(&session, "a").unwrap().wait().await;

    let task = session.apply(Mutation::Select(Some("a".into()))).unwrap();
    assert!(task.is_none());
    assert_eq!(session.history().unwrap().len(), 2);
    assert_eq!(project_keys(&store).len(), 1);
}

#[tokio::test]
async fn quota_failure_disables_autosave() {
    let store = InMemoryKeyValueStore::with_quota(200);
    let (_, session) = open(&store, EditorConfig::default());

    add_rect(&session, "a").unwrap().wait().await;

    assert!(matches!(session.save_state().unwrap(), SaveState::Failed(_)));
    assert!(!session.autosave_enabled().unwrap());
    assert!(add_rect(&session, "b").is_none());
    assert!(session.has_unsaved_changes().unwrap());
    assert!(project_keys(&store).is_empty());

    // the disabled flag made it to the store
    let (_, reopened) = open(&store, EditorConfig::default());
    assert!(!reopened.autosave_enabled().unwrap());
}

#[tokio::test]
async fn manual_save_quota_error_is_returned() {
    let store = InMemoryKeyValueStore::with_quota(200);
    let (_, session) = open(&store, EditorConfig::default().with_autosave(false));
    add_rect(&session, "a");
    session.set_autosave(true).unwrap();

    let err = session.save().unwrap_err();
    assert!(err.is_quota_exceeded());
    assert!(matches!(session.save_state().unwrap(), SaveState::Failed(_)));
    // only autosave failures switch autosave off
    assert!(session.autosave_enabled().unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_autosaves_respect_retention() {
    let store = InMemoryKeyValueStore::new();
    let (_, session) = open(&store, EditorConfig::default().with_retention_limit(2));

    let tasks: Vec<_> = (0..20)
        .filter_map(|n| add_rect(&session, &format!("r{}", n)))
        .collect();
    assert_eq!(tasks.len(), 20);
    for task in tasks {
        task.wait().await;
    }

    assert_eq!(project_keys(&store).len(), 2);
}

#[test]
fn autosave_runs_inline_without_runtime() {
    let store = InMemoryKeyValueStore::new();
    let (_, session) = open(&store, EditorConfig::default());
    let task = add_rect(&session, "a").unwrap();
    assert!(task.is_finished());
    assert_eq!(project_keys(&store).len(), 1);
}

// ============================================================================
// Saving and opening projects
// ============================================================================

#[tokio::test]
async fn save_then_open_restores_document() {
    let store = InMemoryKeyValueStore::new();
    let config = EditorConfig::default()
        .with_autosave(false)
        .with_transform(TransformKind::Lz4);
    let (document, session) = open(&store, config.clone());
    session.set_project_name("Poster").unwrap();
    add_rect(&session, "a");
    add_rect(&session, "b");
    let saved = session.save().unwrap().record.unwrap();

    let (other_document, other) = open(&store, config);
    assert_eq!(other.project_name().unwrap(), "Poster");
    assert_eq!(other_document.scene().unwrap().element_count(), 0);

    let record = other.open_project(&saved.id).await.unwrap();
    assert_eq!(record.name, "Poster");
    assert_eq!(other_document.scene().unwrap(), document.scene().unwrap());
    assert_eq!(other.history().unwrap().len(), 1);
    assert!(!other.can_undo().unwrap());
    assert_eq!(other.save_state().unwrap(), SaveState::Clean);
}

#[tokio::test]
async fn delete_project_removes_it() {
    let store = InMemoryKeyValueStore::new();
    let (_, session) = open(&store, EditorConfig::default().with_autosave(false));
    let id = session.save().unwrap().record.unwrap().id;

    assert!(session.delete_project(&id).unwrap());
    assert!(!session.delete_project(&id).unwrap());
    assert!(session.list_projects().unwrap().is_empty());
}

#[tokio::test]
async fn only_latest_save_settles_state() {
    let store = InMemoryKeyValueStore::new();
    let (_, session) = open(&store, EditorConfig::default());

    let first = add_rect(&session, "a").unwrap();
    let second = add_rect(&session, "b").unwrap();
    first.wait().await;
    second.wait().await;

    // whichever finished last, only the newest edit can settle the state
    assert!(matches!(session.save_state().unwrap(), SaveState::Saved { .. }));
    assert_eq!(session.list_projects().unwrap().len(), 2);
}

#[tokio::test]
async fn undo_marks_document_unsaved() {
    let store = InMemoryKeyValueStore::new();
    let (_, session) = open(&store, EditorConfig::default().with_autosave(false));
    add_rect(&session, "a");
    session.save().unwrap();
    assert!(!session.has_unsaved_changes().unwrap());

    assert!(session.undo().await.unwrap());
    assert!(session.has_unsaved_changes().unwrap());
}

#[tokio::test]
async fn invalid_element_is_rejected_before_touching_history() {
    let store = InMemoryKeyValueStore::new();
    let (_, session) = open(&store, EditorConfig::default().with_autosave(false));
    let err = session
        .apply(Mutation::Remove { id: "ghost".into() })
        .unwrap_err();
    assert!(matches!(err, EditorError::Document(_)));
    assert_eq!(session.history().unwrap().len(), 1);
}

// ============================================================================
// Preferences and collaboration
// ============================================================================

#[test]
fn preferences_survive_reopen() {
    let store = InMemoryKeyValueStore::new();
    {
        let (_, session) = open(&store, EditorConfig::default().with_autosave(false));
        session.set_project_name("  Holiday card ").unwrap();
        assert!(session.toggle_autosave().unwrap());
        assert!(session.add_collaborator("ann@example.com").unwrap());
        assert!(!session.add_collaborator("ann@example.com").unwrap());
    }

    let (_, session) = open(&store, EditorConfig::default().with_autosave(false));
    assert_eq!(session.project_name().unwrap(), "Holiday card");
    assert!(session.autosave_enabled().unwrap());
    assert_eq!(session.collaborators().unwrap(), vec!["ann@example.com"]);

    assert!(session.remove_collaborator("ann@example.com").unwrap());
    session.set_project_name("").unwrap();
    assert_eq!(session.project_name().unwrap(), "Untitled Project");
}

#[test]
fn metadata_allow_list_filters_snapshots() {
    let store = InMemoryKeyValueStore::new();
    let config = EditorConfig::default()
        .with_autosave(false)
        .with_metadata_fields(["filters"]);
    let (_, session) = open(&store, config);
    session
        .apply(Mutation::Add(
            Element::rect("a", 1.0, 1.0)
                .with_metadata("filters", "sepia")
                .with_metadata("scratch", 3),
        ))
        .unwrap();

    let scene = session.codec().deserialize(&session.capture().unwrap()).unwrap();
    let element = scene.find("a").unwrap();
    assert!(element.metadata.contains_key("filters"));
    assert!(!element.metadata.contains_key("scratch"));
}

#[tokio::test]
async fn invite_adds_collaborator() {
    let store = InMemoryKeyValueStore::new();
    let (_, session) = open(&store, EditorConfig::default().with_autosave(false));
    session.set_project_name("Poster").unwrap();
    let service = InMemoryInviteService::new();

    session
        .invite(&service, "me@example.com", "bo@example.com")
        .await
        .unwrap();

    let sent = service.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].project_id, "Poster");
    assert_eq!(session.collaborators().unwrap(), vec!["bo@example.com"]);
}

#[tokio::test]
async fn rejected_invite_changes_nothing() {
    let store = InMemoryKeyValueStore::new();
    let (_, session) = open(&store, EditorConfig::default().with_autosave(false));
    let service = InMemoryInviteService::new();
    service.fail_with(Some(InviteError::Unavailable("offline".into())));

    let err = session
        .invite(&service, "me@example.com", "bo@example.com")
        .await
        .unwrap_err();
    assert_eq!(err, EditorError::Invite(InviteError::Unavailable("offline".into())));
    assert!(session.collaborators().unwrap().is_empty());
}
