use canvas_history::document::Element;
use canvas_history::{
    AutosaveTask, EditorConfig, EditorSession, InMemoryDocument, InMemoryKeyValueStore, Mutation,
    Scene,
};

pub type Session = EditorSession<InMemoryDocument, InMemoryKeyValueStore>;

pub fn document() -> InMemoryDocument {
    InMemoryDocument::new(Scene::new(800.0, 600.0))
}

pub fn open(store: &InMemoryKeyValueStore, config: EditorConfig) -> (InMemoryDocument, Session) {
    let document = document();
    let session = EditorSession::open(document.clone(), store.clone(), config).unwrap();
    (document, session)
}

pub fn add_rect(session: &Session, id: &str) -> Option<AutosaveTask> {
    session
        .apply(Mutation::Add(Element::rect(id, 10.0, 10.0)))
        .unwrap()
}

pub fn project_keys(store: &InMemoryKeyValueStore) -> Vec<String> {
    use canvas_history::KeyValueStore;
    store.keys_with_prefix("project_").unwrap()
}
