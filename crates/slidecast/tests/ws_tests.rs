//! WebSocket end-to-end tests over a real listener.

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

mod common;
use common::{TestApp, create_poll, create_presentation, send, test_app};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn serve(app: &TestApp) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Next JSON text frame, skipping control frames.
async fn next_event(socket: &mut Socket) -> Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for frame")
            .expect("socket closed")
            .unwrap();
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn wait_for_rooms(app: &TestApp, expected: usize) {
    for _ in 0..100 {
        if app.hub.room_count().await.unwrap() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("hub never reached {expected} rooms");
}

#[tokio::test]
async fn test_vote_reaches_connected_viewer() {
    let app = test_app().await;
    let id = create_presentation(&app, "Live deck").await;
    let slide = create_poll(&app, id, &["Tabs", "Spaces"]).await;
    let content_id = slide["content"]["id"].as_i64().unwrap();
    let spaces = slide["content"]["options"][1]["id"].as_i64().unwrap();

    let addr = serve(&app).await;
    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws?roomId={id}"))
        .await
        .unwrap();

    let connected = next_event(&mut socket).await;
    assert_eq!(connected["type"], "connected");
    assert_eq!(connected["room_id"], id.to_string());

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/presentation/{id}/vote/{content_id}/submit?option_id={spaces}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let event = next_event(&mut socket).await;
    assert_eq!(event["type"], "tally_updated");
    assert_eq!(event["content_id"], content_id);
    assert_eq!(event["options"][1]["total_votes"], 1);

    // Viewers are receive-only; inbound text is ignored.
    socket.send(Message::text("hello?")).await.unwrap();
    assert_eq!(app.hub.members(&id.to_string()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_other_rooms_do_not_receive_votes() {
    let app = test_app().await;
    let id = create_presentation(&app, "Voting").await;
    let quiet = create_presentation(&app, "Quiet").await;
    let slide = create_poll(&app, id, &["Only"]).await;
    let content_id = slide["content"]["id"].as_i64().unwrap();
    let option_id = slide["content"]["options"][0]["id"].as_i64().unwrap();

    let addr = serve(&app).await;
    let (mut bystander, _) =
        tokio_tungstenite::connect_async(format!("ws://{addr}/ws?roomId={quiet}"))
            .await
            .unwrap();
    assert_eq!(next_event(&mut bystander).await["type"], "connected");

    send(
        &app,
        Method::POST,
        &format!("/presentation/{id}/vote/{content_id}/submit?option_id={option_id}"),
        None,
    )
    .await;

    let nothing = tokio::time::timeout(Duration::from_millis(200), bystander.next()).await;
    assert!(nothing.is_err(), "bystander received {nothing:?}");
}

#[tokio::test]
async fn test_closing_socket_leaves_room() {
    let app = test_app().await;
    let addr = serve(&app).await;

    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws?roomId=77"))
        .await
        .unwrap();
    next_event(&mut socket).await;
    wait_for_rooms(&app, 1).await;

    socket.close(None).await.unwrap();
    wait_for_rooms(&app, 0).await;
}

#[tokio::test]
async fn test_missing_room_id_is_rejected() {
    let app = test_app().await;
    let addr = serve(&app).await;

    for uri in [format!("ws://{addr}/ws"), format!("ws://{addr}/ws?roomId=")] {
        match tokio_tungstenite::connect_async(uri).await {
            Err(tungstenite::Error::Http(response)) => {
                assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            }
            Err(e) => panic!("expected HTTP 400, got {e}"),
            Ok(_) => panic!("expected HTTP 400, upgrade succeeded"),
        }
    }
    assert_eq!(app.hub.room_count().await.unwrap(), 0);
}
