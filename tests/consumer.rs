use bytes::Bytes;
use exam_chat::api::models::{Mode, Role};
use exam_chat::chat::{consume_stream, ChatSession, ClientError, Phase, RelayClient};
use futures_util::stream;
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn scripted(chunks: &[&'static str]) -> impl futures_util::Stream<Item = Result<Bytes, std::io::Error>> {
    let items: Vec<Result<Bytes, std::io::Error>> = chunks
        .iter()
        .map(|c| Ok(Bytes::from_static(c.as_bytes())))
        .collect();
    stream::iter(items)
}

fn assistant_messages(session: &ChatSession) -> Vec<&str> {
    session
        .messages()
        .iter()
        .filter(|m| m.role == Role::Assistant && m.id != "welcome")
        .map(|m| m.content.as_str())
        .collect()
}

#[tokio::test]
async fn deltas_accumulate_into_one_message() {
    let mut session = ChatSession::default();
    let turn = session.begin_turn("привет").unwrap();
    let mut updates = Vec::new();

    consume_stream(
        scripted(&[
            "data: {\"content\":\"Hel\"}\n\n",
            "data: {\"content\":\"lo\"}\n\n",
            "data: [DONE]\n\n",
        ]),
        &mut session,
        &turn.assistant_id,
        |s, delta| updates.push((delta.to_string(), s.message(&turn.assistant_id).unwrap().content.clone())),
    )
    .await
    .unwrap();
    session.finish();

    assert_eq!(assistant_messages(&session), vec!["Hello"]);
    assert_eq!(
        updates,
        vec![
            ("Hel".to_string(), "Hel".to_string()),
            ("lo".to_string(), "Hello".to_string())
        ]
    );
    assert_eq!(session.phase(), Phase::Idle);
}

#[tokio::test]
async fn non_json_payload_is_plain_text() {
    let mut session = ChatSession::default();
    let turn = session.begin_turn("q").unwrap();

    consume_stream(
        scripted(&["data: Hi there\n\n", "data: [DONE]\n\n"]),
        &mut session,
        &turn.assistant_id,
        |_, _| {},
    )
    .await
    .unwrap();
    session.finish();

    assert_eq!(assistant_messages(&session), vec!["Hi there"]);
    assert!(session.error().is_none());
}

#[tokio::test]
async fn frames_split_across_chunks_are_reassembled() {
    let mut session = ChatSession::default();
    let turn = session.begin_turn("q").unwrap();

    consume_stream(
        scripted(&["data: {\"con", "tent\":\"при", "вет\"}\n", "\ndata: [DO", "NE]\n\n"]),
        &mut session,
        &turn.assistant_id,
        |_, _| {},
    )
    .await
    .unwrap();

    assert_eq!(assistant_messages(&session), vec!["привет"]);
}

#[tokio::test]
async fn nothing_after_sentinel_is_applied() {
    let mut session = ChatSession::default();
    let turn = session.begin_turn("q").unwrap();

    consume_stream(
        scripted(&["data: {\"content\":\"a\"}\n\ndata: [DONE]\n\ndata: {\"content\":\"b\"}\n\n"]),
        &mut session,
        &turn.assistant_id,
        |_, _| {},
    )
    .await
    .unwrap();

    assert_eq!(assistant_messages(&session), vec!["a"]);
}

#[tokio::test]
async fn error_frame_keeps_received_text() {
    let mut session = ChatSession::default();
    let turn = session.begin_turn("q").unwrap();

    consume_stream(
        scripted(&[
            "data: {\"content\":\"part\"}\n\n",
            "data: {\"error\":\"API Error: 500\"}\n\n",
            "data: [DONE]\n\n",
        ]),
        &mut session,
        &turn.assistant_id,
        |_, _| {},
    )
    .await
    .unwrap();
    session.finish();

    assert_eq!(assistant_messages(&session), vec!["part"]);
    assert_eq!(session.error(), Some("API Error: 500"));
    assert_eq!(session.phase(), Phase::ErrorDisplayed);
}

#[tokio::test]
async fn read_error_is_returned() {
    let mut session = ChatSession::default();
    let turn = session.begin_turn("q").unwrap();
    let items: Vec<Result<Bytes, std::io::Error>> = vec![
        Ok(Bytes::from_static(b"data: {\"content\":\"so far\"}\n\n")),
        Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
    ];

    let result = consume_stream(stream::iter(items), &mut session, &turn.assistant_id, |_, _| {}).await;

    assert!(result.is_err());
    assert_eq!(assistant_messages(&session), vec!["so far"]);
}

#[tokio::test]
async fn client_submits_turn_and_streams_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/ai-chat"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "data: {\"content\":\"Hel\"}\n\ndata: {\"content\":\"lo\"}\n\ndata: [DONE]\n\n",
            "text/event-stream",
        ))
        .mount(&server)
        .await;

    let client = RelayClient::new(format!("{}/api/ai-chat", server.uri()));
    let mut session = ChatSession::new(Mode::CodeAnalysis);
    let mut deltas = 0;

    client
        .submit(&mut session, "fn main() {}", |_, _| deltas += 1)
        .await
        .unwrap();

    assert_eq!(deltas, 2);
    assert_eq!(assistant_messages(&session), vec!["Hello"]);
    assert!(!session.is_busy());

    let requests = server.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(sent["body"]["mode"], "code-analysis");
    let messages = sent["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["id"], "welcome");
    assert_eq!(messages[1]["role"], "user");
    assert_eq!(messages[1]["content"], "fn main() {}");
}

#[tokio::test]
async fn client_records_relay_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(405).set_body_string("{\"error\":\"Method not allowed\"}"))
        .mount(&server)
        .await;

    let client = RelayClient::new(server.uri());
    let mut session = ChatSession::default();

    let err = client.submit(&mut session, "q", |_, _| {}).await.unwrap_err();

    assert!(matches!(err, ClientError::Status { status: 405, .. }));
    assert_eq!(session.phase(), Phase::ErrorDisplayed);
    assert!(session.error().unwrap().contains("Method not allowed"));
    // Placeholder stays in the transcript, nothing is rolled back.
    assert_eq!(session.messages().len(), 3);
}

#[tokio::test]
async fn busy_session_rejects_submit() {
    let client = RelayClient::new("http://127.0.0.1:9/api/ai-chat");
    let mut session = ChatSession::default();
    session.begin_turn("first").unwrap();

    let err = client.submit(&mut session, "second", |_, _| {}).await.unwrap_err();
    assert!(matches!(err, ClientError::Rejected));
    assert_eq!(session.messages().len(), 3);
}
