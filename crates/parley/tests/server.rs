//! End-to-end tests: a real server on an OS-assigned port, driven by raw
//! TCP clients speaking newline-framed JSON.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parley::prelude::*;
use parley_protocol::{Credentials, PostGlobal};
use parley_session::Registry;
use parley_transport::{FrameReader, FrameWriter};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio_util::sync::CancellationToken;

// =========================================================================
// Helpers
// =========================================================================

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

struct TestServer {
    addr: String,
    shutdown: CancellationToken,
    registry: Arc<Registry>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn start_server() -> TestServer {
    start_server_with(ServerConfig::default()).await
}

async fn start_server_with(config: ServerConfig) -> TestServer {
    let server = ParleyServer::builder()
        .config(config)
        .bind("127.0.0.1:0")
        .build(MemoryStore::new())
        .await
        .expect("server should build");

    let addr = server.local_addr().expect("should have local addr").to_string();
    let shutdown = server.shutdown_token();
    let registry = Arc::clone(server.registry());

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    TestServer {
        addr,
        shutdown,
        registry,
    }
}

struct Client {
    reader: FrameReader<OwnedReadHalf>,
    writer: FrameWriter<OwnedWriteHalf>,
}

impl Client {
    async fn connect(addr: &str) -> Self {
        let stream = TcpStream::connect(addr).await.expect("should connect");
        let (read, write) = stream.into_split();
        Self {
            reader: FrameReader::new(read),
            writer: FrameWriter::new(write),
        }
    }

    /// Connects, authenticates, and returns the client with its user id.
    async fn login(addr: &str, username: &str) -> (Self, UserId) {
        let mut client = Self::connect(addr).await;
        client
            .send(Request::Auth(Credentials {
                username: username.into(),
                password: "pw".into(),
            }))
            .await;
        match client.recv().await {
            Some(Event::AuthResponse(resp)) if resp.success => {
                let id = resp.user_id.expect("accepted response carries user id");
                (client, id)
            }
            other => panic!("expected successful auth_response, got {other:?}"),
        }
    }

    async fn send(&mut self, request: Request) {
        let bytes = JsonCodec.encode(&request.to_envelope().unwrap()).unwrap();
        self.send_raw(&bytes).await;
    }

    async fn send_raw(&mut self, line: &[u8]) {
        self.writer.send(line).await.expect("send should succeed");
    }

    /// Next event, or `None` once the server has closed the connection.
    async fn recv(&mut self) -> Option<Event> {
        let frame = tokio::time::timeout(RECV_TIMEOUT, self.reader.recv())
            .await
            .expect("server should answer or close in time");
        let frame = frame.ok()??;
        let envelope: Envelope = JsonCodec.decode(&frame).expect("server sends valid envelopes");
        Some(Event::from_envelope(envelope).expect("server sends known events"))
    }

    /// Reads until an event matches, skipping everything else.
    async fn expect(&mut self, what: &str, matches: impl Fn(&Event) -> bool) -> Event {
        loop {
            match self.recv().await {
                Some(event) if matches(&event) => return event,
                Some(_) => continue,
                None => panic!("connection closed while waiting for {what}"),
            }
        }
    }

    /// Reads until the server closes the connection.
    async fn expect_closed(&mut self) {
        while self.recv().await.is_some() {}
    }
}

async fn wait_until_registered(registry: &Registry, expected: usize) {
    for _ in 0..100 {
        if registry.len().await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!(
        "registry should hold {expected} sessions, has {}",
        registry.len().await
    );
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock after epoch")
        .as_secs() as i64
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_global_message_reaches_other_client() {
    let server = start_server().await;
    let (mut bob, _) = Client::login(&server.addr, "bob").await;
    let (mut alice, alice_id) = Client::login(&server.addr, "alice").await;
    wait_until_registered(&server.registry, 2).await;

    let before = unix_now();
    alice
        .send(Request::GlobalMessage(PostGlobal {
            content: "hi".into(),
        }))
        .await;

    let event = bob
        .expect("global_message", |e| matches!(e, Event::GlobalMessage(_)))
        .await;
    let after = unix_now();
    let Event::GlobalMessage(msg) = event else {
        unreachable!()
    };
    assert_eq!(msg.content, "hi");
    assert_eq!(msg.sender_id, alice_id);
    assert!(
        (before..=after).contains(&msg.sent_at),
        "sent_at {} outside {before}..={after}",
        msg.sent_at
    );

    // The sender gets their own copy through the broadcast too.
    alice
        .expect("own global_message", |e| matches!(e, Event::GlobalMessage(m) if m.content == "hi"))
        .await;
}

#[tokio::test]
async fn test_zero_intervals_fall_back_to_defaults() {
    let mut config = ServerConfig::default();
    config.session.ping_interval = Duration::ZERO;
    config.session.mailbox_capacity = 0;
    config.notification_prune_interval = Duration::ZERO;
    config.broadcast_capacity = 0;
    let server = start_server_with(config).await;
    let (mut bob, _) = Client::login(&server.addr, "bob").await;
    let (mut alice, _) = Client::login(&server.addr, "alice").await;
    wait_until_registered(&server.registry, 2).await;

    alice
        .send(Request::GlobalMessage(PostGlobal {
            content: "still here".into(),
        }))
        .await;

    bob.expect("global_message", |e| {
        matches!(e, Event::GlobalMessage(m) if m.content == "still here")
    })
    .await;
}

#[tokio::test]
async fn test_login_pushes_history_then_friend_list() {
    let server = start_server().await;
    let (mut early, _) = Client::login(&server.addr, "early").await;
    early
        .send(Request::GlobalMessage(PostGlobal {
            content: "before you came".into(),
        }))
        .await;
    early
        .expect("echo", |e| matches!(e, Event::GlobalMessage(_)))
        .await;

    let (mut late, _) = Client::login(&server.addr, "late").await;

    match late.recv().await {
        Some(Event::MessageHistory(history)) => {
            assert!(history.messages.iter().any(|m| m.content == "before you came"));
        }
        other => panic!("expected message_history first, got {other:?}"),
    }
    match late.recv().await {
        Some(Event::FriendList(list)) => assert!(list.friends.is_empty()),
        other => panic!("expected friend_list second, got {other:?}"),
    }
}

#[tokio::test]
async fn test_auth_timeout_closes_connection() {
    let config = ServerConfig {
        auth_read_timeout: Duration::from_millis(200),
        ..ServerConfig::default()
    };
    let server = start_server_with(config).await;
    let mut silent = Client::connect(&server.addr).await;

    silent.expect_closed().await;

    assert!(server.registry.is_empty().await);
}

#[tokio::test]
async fn test_wrong_password_is_rejected_and_closed() {
    let server = start_server().await;
    let (_alice, _) = Client::login(&server.addr, "alice").await;

    let mut impostor = Client::connect(&server.addr).await;
    impostor
        .send(Request::Auth(Credentials {
            username: "alice".into(),
            password: "wrong".into(),
        }))
        .await;

    match impostor.recv().await {
        Some(Event::AuthResponse(resp)) => {
            assert!(!resp.success);
            assert!(resp.error.is_some());
        }
        other => panic!("expected failed auth_response, got {other:?}"),
    }
    impostor.expect_closed().await;
    wait_until_registered(&server.registry, 1).await;
}

#[tokio::test]
async fn test_message_before_auth_is_rejected_and_closed() {
    let server = start_server().await;
    let mut client = Client::connect(&server.addr).await;

    client.send(Request::Ping).await;

    match client.recv().await {
        Some(Event::Error(payload)) => assert_eq!(payload.code, ErrorCode::NotAuthenticated.code()),
        other => panic!("expected error, got {other:?}"),
    }
    client.expect_closed().await;
}

#[tokio::test]
async fn test_second_login_replaces_first_session() {
    let server = start_server().await;
    let (mut first, id) = Client::login(&server.addr, "alice").await;
    let (mut second, second_id) = Client::login(&server.addr, "alice").await;
    assert_eq!(id, second_id);

    first.expect_closed().await;
    wait_until_registered(&server.registry, 1).await;

    second.send(Request::Ping).await;
    second.expect("pong", |e| matches!(e, Event::Pong)).await;
}

#[tokio::test]
async fn test_unknown_type_gets_error_and_connection_survives() {
    let server = start_server().await;
    let (mut alice, _) = Client::login(&server.addr, "alice").await;

    alice.send_raw(br#"{"type":"typing","payload":{}}"#).await;
    let event = alice.expect("error", |e| matches!(e, Event::Error(_))).await;
    let Event::Error(payload) = event else {
        unreachable!()
    };
    assert_eq!(payload.code, ErrorCode::InvalidMessage.code());

    alice.send(Request::Ping).await;
    alice.expect("pong", |e| matches!(e, Event::Pong)).await;
}

#[tokio::test]
async fn test_malformed_frame_closes_connection() {
    let server = start_server().await;
    let (mut alice, _) = Client::login(&server.addr, "alice").await;

    alice.send_raw(b"this is not json").await;

    alice.expect_closed().await;
    wait_until_registered(&server.registry, 0).await;
}

#[tokio::test]
async fn test_disconnect_broadcasts_offline_status() {
    let server = start_server().await;
    let (mut bob, _) = Client::login(&server.addr, "bob").await;
    let (alice, alice_id) = Client::login(&server.addr, "alice").await;

    bob.expect("alice online", |e| {
        matches!(e, Event::StatusUpdate(u) if u.user_id == alice_id && u.status == UserStatus::Online)
    })
    .await;

    drop(alice);

    bob.expect("alice offline", |e| {
        matches!(e, Event::StatusUpdate(u) if u.user_id == alice_id && u.status == UserStatus::Offline)
    })
    .await;
    wait_until_registered(&server.registry, 1).await;
}

#[tokio::test]
async fn test_shutdown_closes_every_session() {
    let server = start_server().await;
    let (mut alice, _) = Client::login(&server.addr, "alice").await;
    let (mut bob, _) = Client::login(&server.addr, "bob").await;

    server.shutdown.cancel();

    alice.expect_closed().await;
    bob.expect_closed().await;
}
