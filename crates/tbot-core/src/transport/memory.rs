//! In-process transport backed by a tokio channel.
//!
//! Useful for tests and for embedding the dispatcher behind some other event
//! source. Updates are pushed through a [`MemoryHandle`]; everything the bot
//! sends is recorded and can be inspected or awaited.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::{Notify, mpsc};
use tracing::trace;

use super::{Transport, UpdateStream};
use crate::error::{ApiError, ApiResult, TransportError, TransportResult};
use crate::event::Update;
use crate::message::OutboundMessage;

/// Something the bot sent through a [`MemoryTransport`].
#[derive(Debug, Clone, PartialEq)]
pub enum SentItem {
    /// A message passed to `send`.
    Message(OutboundMessage),
    /// A request passed to `send_raw`.
    Raw {
        endpoint: String,
        params: HashMap<String, String>,
    },
}

impl SentItem {
    /// Returns the message text for text-bearing messages.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Message(msg) => msg.as_text(),
            Self::Raw { .. } => None,
        }
    }
}

#[derive(Default)]
struct Outbox {
    items: Mutex<Vec<SentItem>>,
    notify: Notify,
    fail_sends: AtomicBool,
}

impl Outbox {
    fn record(&self, item: SentItem) {
        self.items.lock().push(item);
        self.notify.notify_waiters();
    }
}

/// Channel-backed transport.
pub struct MemoryTransport {
    receiver: Mutex<Option<UpdateStream>>,
    outbox: Arc<Outbox>,
}

/// The producing side of a [`MemoryTransport`].
#[derive(Clone)]
pub struct MemoryHandle {
    sender: Arc<Mutex<Option<mpsc::Sender<Update>>>>,
    outbox: Arc<Outbox>,
}

impl MemoryTransport {
    /// Creates a transport with the given channel capacity.
    pub fn new(buffer: usize) -> (Self, MemoryHandle) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let outbox = Arc::new(Outbox::default());
        let transport = Self {
            receiver: Mutex::new(Some(rx)),
            outbox: Arc::clone(&outbox),
        };
        let handle = MemoryHandle {
            sender: Arc::new(Mutex::new(Some(tx))),
            outbox,
        };
        (transport, handle)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    fn name(&self) -> &str {
        "memory"
    }

    async fn updates(&self) -> TransportResult<UpdateStream> {
        self.receiver.lock().take().ok_or(TransportError::StreamTaken)
    }

    async fn send(&self, message: OutboundMessage) -> ApiResult<()> {
        if self.outbox.fail_sends.load(Ordering::SeqCst) {
            return Err(ApiError::NotConnected);
        }
        trace!(chat_id = message.chat_id, "memory transport send");
        self.outbox.record(SentItem::Message(message));
        Ok(())
    }

    async fn send_raw(&self, endpoint: &str, params: HashMap<String, String>) -> ApiResult<Value> {
        if self.outbox.fail_sends.load(Ordering::SeqCst) {
            return Err(ApiError::NotConnected);
        }
        self.outbox.record(SentItem::Raw {
            endpoint: endpoint.to_string(),
            params,
        });
        Ok(json!({ "ok": true }))
    }
}

impl MemoryHandle {
    /// Pushes an update into the stream.
    ///
    /// Fails if the stream was closed.
    pub async fn push(&self, update: Update) -> TransportResult<()> {
        let sender = self
            .sender
            .lock()
            .clone()
            .ok_or_else(|| TransportError::ConnectionClosed {
                reason: "memory transport closed".into(),
            })?;
        sender
            .send(update)
            .await
            .map_err(|_| TransportError::ConnectionClosed {
                reason: "update stream dropped".into(),
            })
    }

    /// Closes the update stream. Already queued updates are still delivered.
    pub fn close(&self) {
        self.sender.lock().take();
    }

    /// Makes every subsequent send fail with [`ApiError::NotConnected`].
    pub fn fail_sends(&self, fail: bool) {
        self.outbox.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Returns everything sent so far.
    pub fn sent(&self) -> Vec<SentItem> {
        self.outbox.items.lock().clone()
    }

    /// Returns the text of every text-bearing message sent so far.
    pub fn sent_texts(&self) -> Vec<String> {
        self.outbox
            .items
            .lock()
            .iter()
            .filter_map(|item| item.text().map(str::to_string))
            .collect()
    }

    /// Waits until at least `count` items have been sent.
    pub async fn wait_for_sent(&self, count: usize) -> Vec<SentItem> {
        loop {
            let notified = self.outbox.notify.notified();
            {
                let items = self.outbox.items.lock();
                if items.len() >= count {
                    return items.clone();
                }
            }
            notified.await;
        }
    }
}
