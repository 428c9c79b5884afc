use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use persona_chat::{
    ChatSession, CompletionClient, CompletionRequest, KeyValueStore, Message, Persona, Sender,
    SqliteStore, FALLBACK_REPLY,
};

struct ScriptedClient(Option<&'static str>);

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, _request: CompletionRequest) -> Result<String> {
        self.0
            .map(str::to_string)
            .ok_or_else(|| anyhow!("error sending request: connection reset"))
    }
}

fn texts(messages: &[Message]) -> Vec<(String, Sender)> {
    messages.iter().map(|m| (m.text.clone(), m.sender)).collect()
}

#[tokio::test]
async fn fresh_install_grandpa_conversation_is_stored() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn KeyValueStore> =
        Arc::new(SqliteStore::open(&dir.path().join("history.db")).unwrap());
    let mut session = ChatSession::open(Persona::Grandpa.route(), "llama3-8b-8192", Arc::clone(&store));
    assert!(session.messages().is_empty());

    session.set_input("hi");
    let request = session.submit().expect("non-blank input is sent");
    assert_eq!(texts(session.messages()), vec![("hi".to_string(), Sender::User)]);

    let reply = ScriptedClient(Some("Hello, kiddo.")).complete(request).await;
    session.receive(reply);

    let expected = vec![
        ("hi".to_string(), Sender::User),
        ("Hello, kiddo.".to_string(), Sender::Bot),
    ];
    assert_eq!(texts(session.messages()), expected);

    let stored = store.get("chatHistory_AI Grandpa").unwrap().expect("record written");
    let stored: Vec<Message> = serde_json::from_str(&stored).unwrap();
    assert_eq!(stored.as_slice(), session.messages());
}

#[tokio::test]
async fn network_error_ends_with_fallback_reply() {
    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::in_memory().unwrap());
    let mut session = ChatSession::open(Persona::Psychologist.route(), "m", store);

    session.set_input("why is this so hard?");
    session.exchange(Arc::new(ScriptedClient(None)), Duration::ZERO).await;

    let last = session.messages().last().unwrap();
    assert_eq!(last.sender, Sender::Bot);
    assert_eq!(last.text, "Sorry, I couldn't process your request.");
    assert_eq!(last.text, FALLBACK_REPLY);
}

#[tokio::test]
async fn relaunch_restores_best_friend_history_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.db");

    let before = {
        let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::open(&path).unwrap());
        let mut session = ChatSession::open(Persona::BestFriend.route(), "m", store);
        session.set_input("day three without smoking");
        session
            .exchange(Arc::new(ScriptedClient(Some("That's huge, proud of you!"))), Duration::ZERO)
            .await;
        session.messages().to_vec()
    };
    assert_eq!(before.len(), 2);

    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::open(&path).unwrap());
    let restored = ChatSession::open(Persona::BestFriend.route(), "m", Arc::clone(&store));
    assert_eq!(restored.messages(), before.as_slice());

    // Other personas see nothing of it
    let grandpa = ChatSession::open(Persona::Grandpa.route(), "m", store);
    assert!(grandpa.messages().is_empty());
}
