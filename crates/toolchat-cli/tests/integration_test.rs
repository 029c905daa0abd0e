use std::fs;
use toolchat_cli::{commands, config::Config, identity, render};
use toolchat_client::{BackendConfig, BackendKind, ClientFactory};
use toolchat_core::{DateLabeler, SessionManager};

#[test]
fn test_config_loading_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("toolchat.toml");
    fs::write(
        &path,
        r#"
        [backend]
        kind = "memory"

        [display]
        utc_offset_minutes = 60

        [identity]
        state_dir = "/tmp/toolchat-test"
        "#,
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.backend.kind, BackendKind::Memory);
    assert_eq!(config.backend.timeout_ms, 120_000);
    assert_eq!(config.display.utc_offset_minutes, 60);
    assert_eq!(config.logging.format, "pretty");
    assert!(config.identity.state_dir.is_some());
}

#[tokio::test]
async fn test_memory_session_renders_conversation() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.backend = BackendConfig::memory();
    config.identity.state_dir = Some(dir.path().to_path_buf());

    let user = identity::resolve_identity(&config.identity).unwrap();
    let backend = ClientFactory::create_backend(&config.backend).unwrap();
    let mut session = SessionManager::with_labeler(
        backend,
        user,
        DateLabeler::new(config.display.utc_offset_minutes),
    );

    let commands::Command::Send(query) = commands::parse("which app for flashcards?").unwrap() else {
        panic!("Expected a query");
    };
    session.send(&query).await.unwrap();

    let text = render::render_blocks(&session.timeline().rendered());
    assert_eq!(text.matches("------------").count(), 2);
    assert!(text.contains("which app for flashcards?"));
    assert!(text.contains("assistant: You said: which app for flashcards?"));

    session.refresh_conversations().await.unwrap();
    let listed = render::render_conversations(
        &session.conversations().iter().collect::<Vec<_>>(),
        session.active_id(),
        session.labeler(),
    );
    assert!(listed.starts_with("* "));
    assert!(listed.contains("which app for flashcards?"));
}
