use std::future::Future;

use canvas_history::document::{Element, ReconstructionMode};
use canvas_history::{
    EditorConfig, EditorSession, InMemoryDocument, InMemoryKeyValueStore, Mutation, Scene,
};

pub type Session = EditorSession<InMemoryDocument, InMemoryKeyValueStore>;

/// A session whose document rebuilds only when the test says so.
pub fn deferred_session(capacity: usize) -> (InMemoryDocument, Session) {
    let document = InMemoryDocument::with_mode(Scene::new(800.0, 600.0), ReconstructionMode::Deferred);
    let config = EditorConfig::default()
        .with_history_capacity(capacity)
        .with_autosave(false);
    let session =
        EditorSession::open(document.clone(), InMemoryKeyValueStore::new(), config).unwrap();
    (document, session)
}

pub fn add_rect(session: &Session, id: &str) {
    let task = session
        .apply(Mutation::Add(Element::rect(id, 10.0, 10.0)))
        .unwrap();
    assert!(task.is_none());
}

pub fn ids(document: &InMemoryDocument) -> Vec<String> {
    use canvas_history::Document;
    document
        .scene()
        .unwrap()
        .elements
        .iter()
        .map(|e| e.id.clone())
        .collect()
}

/// Drive `op` while completing the reconstruction it starts.
pub async fn completing<F: Future>(document: &InMemoryDocument, op: F) -> F::Output {
    let (output, _) = tokio::join!(op, async {
        tokio::task::yield_now().await;
        document.complete_next().unwrap()
    });
    output
}
