// tests/store_test.rs — Integration test: JSON session store round-trip

use serde_json::json;

use brandloop::infra::errors::BrandloopError;
use brandloop::infra::session::{AgentMessage, MessageType, SessionStore, SharedStore};

fn open(dir: &tempfile::TempDir) -> SessionStore {
    SessionStore::open(dir.path().join("sessions")).unwrap()
}

#[test]
fn test_fresh_store_sees_persisted_session() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut store = open(&dir);
        store.create_session(Some("s1")).unwrap();
        store.save("brand_analysis", &json!({"brand_name": "Kettle Co"})).unwrap();
        store.set_workflow_state("generating_content").unwrap();
        store
            .append_message(AgentMessage::new(
                "orchestrator",
                "creative_engine",
                MessageType::TaskRequest,
                json!({"stage": "content_generation"}),
            ))
            .unwrap();
    }

    let mut fresh = open(&dir);
    assert_eq!(fresh.session_id(), None);
    assert!(fresh.load_session("s1").unwrap());
    assert_eq!(fresh.workflow_state(), "generating_content");
    assert_eq!(
        fresh.get("brand_analysis"),
        Some(&json!({"brand_name": "Kettle Co"}))
    );

    let to_creative = fresh.messages(None, Some("creative_engine"));
    assert_eq!(to_creative.len(), 1);
    assert_eq!(to_creative[0].message_type, MessageType::TaskRequest);
    assert!(fresh.messages(Some("campaign_manager"), None).is_empty());
}

#[test]
fn test_list_export_delete() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open(&dir);
    store.create_session(Some("b")).unwrap();
    store.create_session(Some("a")).unwrap();

    assert_eq!(store.list_sessions().unwrap(), vec!["a", "b"]);

    // Export of a non-active session reads its file
    let exported = store.export_session(Some("b")).unwrap();
    assert_eq!(exported["session_id"], "b");
    assert_eq!(exported["slots"]["workflow_state"], "pending");

    assert!(store.delete_session("a").unwrap());
    assert_eq!(store.session_id(), None);
    assert!(!store.delete_session("a").unwrap());
    assert!(matches!(
        store.export_session(Some("a")),
        Err(BrandloopError::SessionNotFound { .. })
    ));
    assert!(!store.load_session("a").unwrap());
}

#[test]
fn test_path_like_ids_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open(&dir);
    for bad in ["../escape", "a/b", "", ".hidden"] {
        assert!(
            matches!(store.create_session(Some(bad)), Err(BrandloopError::InvalidInput(_))),
            "{bad}"
        );
    }
}

#[test]
fn test_shared_handle_sees_same_session() {
    let dir = tempfile::tempdir().unwrap();
    let shared = SharedStore::open(dir.path()).unwrap();
    let other = shared.clone();

    let id = shared.with(|s| s.create_session(None)).unwrap();
    other.save("campaign_result", &json!({"roi": 1.2})).unwrap();

    assert_eq!(other.session_id().as_deref(), Some(id.as_str()));
    let roi = shared
        .with(|s| Ok(s.get("campaign_result").cloned()))
        .unwrap()
        .unwrap();
    assert_eq!(roi["roi"], 1.2);
}
