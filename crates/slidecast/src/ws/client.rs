//! A connected viewer and the task that writes to its socket.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::Message;
use futures::{Sink, SinkExt};
use log::debug;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use uuid::Uuid;

/// Identity of one socket inside the hub.
pub type ClientId = Uuid;

/// Pre-encoded text frame, shared by every member a broadcast reaches.
pub type Frame = Arc<str>;

/// The hub's end of a viewer connection.
///
/// The hub owns the only sender of the client's queue, so dropping the
/// `Client` closes the queue and ends its writer.
#[derive(Debug)]
pub struct Client {
    pub id: ClientId,
    pub room_id: String,
    queue: mpsc::Sender<Frame>,
}

impl Client {
    /// Create a client with a bounded outbound queue of `capacity` frames.
    pub fn new(room_id: impl Into<String>, capacity: usize) -> (Self, mpsc::Receiver<Frame>) {
        let (queue, outbox) = mpsc::channel(capacity.max(1));
        let client = Self {
            id: Uuid::new_v4(),
            room_id: room_id.into(),
            queue,
        };
        (client, outbox)
    }

    /// Queue a frame without waiting.
    pub fn try_push(&self, frame: Frame) -> Result<(), mpsc::error::TrySendError<Frame>> {
        self.queue.try_send(frame)
    }
}

/// Why a writer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterExit {
    /// The hub dropped the queue (eviction, shutdown or unregister).
    QueueClosed,
    /// The socket refused a frame.
    SinkFailed,
}

/// Drain `outbox` into `sink`, interleaving keepalive pings.
///
/// The first ping goes out one full `ping_interval` after start. When the
/// queue closes, a close frame is sent before returning.
pub async fn run_writer<S>(
    mut outbox: mpsc::Receiver<Frame>,
    mut sink: S,
    ping_interval: Duration,
) -> WriterExit
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    let mut ping = tokio::time::interval_at(Instant::now() + ping_interval, ping_interval);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            frame = outbox.recv() => {
                let Some(frame) = frame else {
                    let _ = sink.send(Message::Close(None)).await;
                    return WriterExit::QueueClosed;
                };
                if let Err(e) = sink.send(Message::Text(frame.as_ref().into())).await {
                    debug!("Failed to write frame: {}", e);
                    return WriterExit::SinkFailed;
                }
            }
            _ = ping.tick() => {
                if let Err(e) = sink.send(Message::Ping(Bytes::new())).await {
                    debug!("Failed to write ping: {}", e);
                    return WriterExit::SinkFailed;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_writer_preserves_order_and_closes() {
        let (client, outbox) = Client::new("room", 8);
        let (sink, mut written) = futures::channel::mpsc::unbounded::<Message>();

        client.try_push(Frame::from("one")).unwrap();
        client.try_push(Frame::from("two")).unwrap();
        drop(client);

        let exit = run_writer(outbox, sink, Duration::from_secs(60)).await;
        assert_eq!(exit, WriterExit::QueueClosed);

        let mut texts = Vec::new();
        while let Some(message) = written.next().await {
            match message {
                Message::Text(text) => texts.push(text.as_str().to_string()),
                Message::Close(_) => texts.push("<close>".to_string()),
                other => panic!("unexpected message {other:?}"),
            }
        }
        assert_eq!(texts, vec!["one", "two", "<close>"]);
    }

    #[tokio::test]
    async fn test_writer_sends_pings() {
        let (client, outbox) = Client::new("room", 8);
        let (sink, mut written) = futures::channel::mpsc::unbounded::<Message>();
        let writer = tokio::spawn(run_writer(outbox, sink, Duration::from_millis(20)));

        let first = tokio::time::timeout(Duration::from_secs(2), written.next())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(first, Message::Ping(_)));

        drop(client);
        assert_eq!(writer.await.unwrap(), WriterExit::QueueClosed);
    }

    #[tokio::test]
    async fn test_writer_stops_when_sink_fails() {
        let (client, outbox) = Client::new("room", 8);
        let (sink, written) = futures::channel::mpsc::unbounded::<Message>();
        drop(written);

        client.try_push(Frame::from("lost")).unwrap();
        let exit = run_writer(outbox, sink, Duration::from_secs(60)).await;
        assert_eq!(exit, WriterExit::SinkFailed);
    }

    #[test]
    fn test_queue_is_bounded() {
        let (client, _outbox) = Client::new("room", 1);
        client.try_push(Frame::from("a")).unwrap();
        assert!(matches!(
            client.try_push(Frame::from("b")),
            Err(mpsc::error::TrySendError::Full(_))
        ));
    }
}
