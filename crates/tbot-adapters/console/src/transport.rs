//! The console transport.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tbot_core::{
    ApiResult, MessageKind, OutboundMessage, Transport, TransportError, TransportResult,
    UpdateStream,
};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::config::ConsoleConfig;
use crate::parse::parse_line;

type Input = Box<dyn AsyncRead + Send + Unpin>;
type Output = Box<dyn AsyncWrite + Send + Unpin>;

/// Reads updates from lines of input and writes outbound messages as lines.
///
/// The update stream ends at end of input, which stops the server.
pub struct ConsoleTransport {
    config: ConsoleConfig,
    input: Mutex<Option<Input>>,
    output: Arc<tokio::sync::Mutex<Output>>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl ConsoleTransport {
    /// Reads stdin and writes stdout with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ConsoleConfig::default())
    }

    /// Reads stdin and writes stdout.
    pub fn with_config(config: ConsoleConfig) -> Self {
        Self::from_io(config, tokio::io::stdin(), tokio::io::stdout())
    }

    /// Uses arbitrary streams instead of stdin and stdout.
    pub fn from_io<R, W>(config: ConsoleConfig, input: R, output: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            config,
            input: Mutex::new(Some(Box::new(input))),
            output: Arc::new(tokio::sync::Mutex::new(Box::new(output))),
            reader: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    async fn write_line(&self, line: &str) -> TransportResult<()> {
        let mut output = self.output.lock().await;
        output.write_all(line.as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await?;
        Ok(())
    }
}

impl Default for ConsoleTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders an outbound message as one console line.
pub fn render_message(message: &OutboundMessage) -> String {
    let header = match message.reply_to {
        Some(id) => format!("[chat {} re:{id}]", message.chat_id),
        None => format!("[chat {}]", message.chat_id),
    };
    match &message.kind {
        MessageKind::Text(text) | MessageKind::Markdown(text) => format!("{header} {text}"),
        MessageKind::Photo { file, caption } => {
            render_attachment(&header, "photo", file, caption.as_deref())
        }
        MessageKind::Document { file, caption } => {
            render_attachment(&header, "document", file, caption.as_deref())
        }
    }
}

fn render_attachment(header: &str, kind: &str, file: &str, caption: Option<&str>) -> String {
    match caption {
        Some(caption) => format!("{header} <{kind} {file}> {caption}"),
        None => format!("{header} <{kind} {file}>"),
    }
}

#[async_trait]
impl Transport for ConsoleTransport {
    fn name(&self) -> &str {
        "console"
    }

    async fn updates(&self) -> TransportResult<UpdateStream> {
        let input = self.input.lock().take().ok_or(TransportError::StreamTaken)?;
        let (tx, rx) = mpsc::channel(self.config.buffer.max(1));
        let config = self.config.clone();

        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(input).lines();
            let mut message_id = 0;
            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        info!("End of console input");
                        break;
                    }
                    Err(err) => {
                        warn!(error = %err, "Failed to read console input");
                        break;
                    }
                };
                message_id += 1;
                let Some(update) = parse_line(&line, &config, message_id) else {
                    continue;
                };
                trace!(chat_id = update.chat_id, message_id, "Console update");
                if tx.send(update).await.is_err() {
                    debug!("Update stream dropped, stopping console reader");
                    break;
                }
            }
        });
        *self.reader.lock() = Some(reader);

        Ok(rx)
    }

    async fn send(&self, message: OutboundMessage) -> ApiResult<()> {
        self.write_line(&render_message(&message)).await?;
        Ok(())
    }

    async fn send_raw(&self, endpoint: &str, params: HashMap<String, String>) -> ApiResult<Value> {
        let params: BTreeMap<_, _> = params.into_iter().collect();
        let rendered = params
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(" ");
        self.write_line(&format!("[raw {endpoint}] {rendered}").trim_end())
            .await?;
        Ok(json!({ "ok": true, "endpoint": endpoint, "params": params }))
    }

    async fn shutdown(&self) {
        if let Some(reader) = self.reader.lock().take() {
            reader.abort();
        }
        if let Err(err) = self.output.lock().await.flush().await {
            warn!(error = %err, "Failed to flush console output");
        }
    }
}
