use std::net::{TcpListener, TcpStream};
use std::time::Duration;

use rustc_hash::FxHashSet;
use tokio::sync::mpsc;
use tungstenite::protocol::Message;

use super::WsActor;
use super::client_io::apply_client_message;
use super::delivery::still_connected;
use crate::actor::messages::{BuildMsg, WsMsg};
use crate::reload::HotReloadMessage;

#[test]
fn test_keys_message_updates_without_redirect() {
    let mut keys = FxHashSet::default();
    let event = apply_client_message(&mut keys, r#"{"type":"keys","keys":["a_1","b_2"]}"#);
    assert!(event.is_none());
    assert_eq!(keys.len(), 2);
    assert!(keys.contains("a_1"));
}

#[test]
fn test_redirect_message_forwards_event() {
    let mut keys = FxHashSet::default();
    let event = apply_client_message(
        &mut keys,
        r#"{"type":"redirect","keys":["a_1","c_3"],"previous":["a_1","b_2"]}"#,
    )
    .unwrap();
    assert_eq!(event.changes(), ["b_2", "c_3"]);
    assert_eq!(keys.len(), 2);
    assert!(keys.contains("c_3"));
}

#[test]
fn test_noop_redirect_and_garbage() {
    let mut keys = FxHashSet::default();
    keys.insert("kept_1".to_string());

    assert!(apply_client_message(&mut keys, "{not json").is_none());
    assert!(keys.contains("kept_1"));

    let event = apply_client_message(
        &mut keys,
        r#"{"type":"redirect","keys":["a_1"],"previous":["a_1"]}"#,
    );
    assert!(event.is_none());
    assert!(keys.contains("a_1"));
}

#[test]
fn test_would_block_keeps_client() {
    let would_block = std::io::Error::from(std::io::ErrorKind::WouldBlock);
    let reset = std::io::Error::from(std::io::ErrorKind::ConnectionReset);

    assert!(still_connected(Ok(())));
    assert!(still_connected(Err(tungstenite::Error::Io(would_block))));
    assert!(!still_connected(Err(tungstenite::Error::Io(reset))));
    assert!(!still_connected(Err(tungstenite::Error::ConnectionClosed)));
}

type ClientSocket = tungstenite::WebSocket<tungstenite::stream::MaybeTlsStream<TcpStream>>;

fn read_text(ws: &mut ClientSocket) -> String {
    loop {
        match ws.read().unwrap() {
            Message::Text(text) => return text.to_string(),
            _ => continue,
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_client_round_trip() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let (ws_tx, ws_rx) = mpsc::channel(8);
    let (build_tx, mut build_rx) = mpsc::channel(8);
    let actor = tokio::spawn(WsActor::new(ws_rx, build_tx).run());

    let client = std::thread::spawn(move || {
        let (mut ws, _) = tungstenite::connect(format!("ws://127.0.0.1:{port}")).unwrap();
        let first = read_text(&mut ws);
        ws.send(Message::Text(
            r#"{"type":"redirect","keys":["home_1"],"previous":["home_0"]}"#.into(),
        ))
        .unwrap();
        let second = read_text(&mut ws);
        (first, second)
    });

    let (stream, _) = listener.accept().unwrap();
    ws_tx.send(WsMsg::AddClient(stream)).await.unwrap();

    let msg = tokio::time::timeout(Duration::from_secs(5), build_rx.recv())
        .await
        .unwrap()
        .unwrap();
    let BuildMsg::Redirected(event) = msg else {
        panic!("expected redirect");
    };
    assert_eq!(event.changes(), ["home_0", "home_1"]);

    ws_tx
        .send(WsMsg::Reload {
            keys: vec!["home_1".into()],
        })
        .await
        .unwrap();

    let (first, second) = tokio::task::spawn_blocking(move || client.join().unwrap())
        .await
        .unwrap();
    assert!(first.contains(r#""type":"connected""#));
    assert_eq!(second, HotReloadMessage::reload(vec!["home_1".into()]).to_json());

    ws_tx.send(WsMsg::Shutdown).await.unwrap();
    actor.await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_redirect_on_connect_waits_for_full_queue() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let (ws_tx, ws_rx) = mpsc::channel(8);
    let (build_tx, mut build_rx) = mpsc::channel(1);
    let mut held = FxHashSet::default();
    let filler = apply_client_message(
        &mut held,
        r#"{"type":"redirect","keys":["about_1"],"previous":["about_0"]}"#,
    )
    .unwrap();
    build_tx.send(BuildMsg::Redirected(filler)).await.unwrap();
    let actor = tokio::spawn(WsActor::new(ws_rx, build_tx).run());

    let client = std::thread::spawn(move || {
        let (mut ws, _) = tungstenite::connect(format!("ws://127.0.0.1:{port}")).unwrap();
        read_text(&mut ws);
        ws.send(Message::Text(
            r#"{"type":"redirect","keys":["home_1"],"previous":["home_0"]}"#.into(),
        ))
        .unwrap();
        ws
    });

    let (stream, _) = listener.accept().unwrap();
    ws_tx.send(WsMsg::AddClient(stream)).await.unwrap();

    let mut changes = Vec::new();
    for _ in 0..2 {
        let msg = tokio::time::timeout(Duration::from_secs(5), build_rx.recv())
            .await
            .unwrap()
            .unwrap();
        let BuildMsg::Redirected(event) = msg else {
            panic!("expected redirect");
        };
        changes.push(event.changes());
    }
    assert_eq!(changes[0], ["about_0", "about_1"]);
    assert_eq!(changes[1], ["home_0", "home_1"]);

    let _ws = tokio::task::spawn_blocking(move || client.join().unwrap())
        .await
        .unwrap();
    ws_tx.send(WsMsg::Shutdown).await.unwrap();
    actor.await.unwrap();
}
