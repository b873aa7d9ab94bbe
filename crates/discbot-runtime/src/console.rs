//! Console gateway: JSON lines over stdin and stdout.
//!
//! Each input line is either a JSON [`MessageEvent`]:
//!
//! ```text
//! {"id":"1","author":{"id":"42"},"channel_id":"general","guild_id":"g","content":"!ops"}
//! ```
//!
//! or plain text, which is treated as a direct message from the
//! [`CONSOLE_USER`] in the [`CONSOLE_CHANNEL`]. Blank lines are ignored.
//!
//! Every outbound gateway call is written as one JSON object tagged by `op`:
//!
//! ```text
//! {"op":"send","id":"out-1","channel_id":"general","content":"1 user added to operators."}
//! {"op":"delete","channel_id":"general","message_id":"7"}
//! {"op":"close"}
//! ```
//!
//! Users and channels become resolvable once they appear in an inbound
//! event or in [`ConsoleConfig`].

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use discbot_core::{
    Channel, Connector, Gateway, GatewayError, GatewayResult, GatewaySession, MessageEvent, User,
};

use crate::config::ConsoleConfig;

/// Author of plain-text input lines.
pub const CONSOLE_USER: &str = "console";

/// Channel of plain-text input lines.
pub const CONSOLE_CHANNEL: &str = "console";

type Reader = Box<dyn AsyncBufRead + Send + Unpin>;
type Writer = Box<dyn AsyncWrite + Send + Unpin>;

#[derive(Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Outbound<'a> {
    Send {
        id: &'a str,
        channel_id: &'a str,
        content: &'a str,
    },
    Delete {
        channel_id: &'a str,
        message_id: &'a str,
    },
    Close,
}

/// Connector producing a [`ConsoleGateway`] session.
pub struct ConsoleConnector {
    config: ConsoleConfig,
    io: Mutex<Option<(Reader, Writer)>>,
}

impl ConsoleConnector {
    /// Creates a connector over the process's stdin and stdout.
    pub fn stdio(config: ConsoleConfig) -> Self {
        Self::with_io(
            config,
            BufReader::new(tokio::io::stdin()),
            tokio::io::stdout(),
        )
    }

    /// Creates a connector over arbitrary streams.
    pub fn with_io<R, W>(config: ConsoleConfig, reader: R, writer: W) -> Self
    where
        R: AsyncBufRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            config,
            io: Mutex::new(Some((Box::new(reader), Box::new(writer)))),
        }
    }
}

#[async_trait]
impl Connector for ConsoleConnector {
    async fn connect(&self, token: &str) -> GatewayResult<GatewaySession> {
        if token.trim().is_empty() {
            return Err(GatewayError::Auth("empty token".to_string()));
        }
        let (reader, writer) = self.io.lock().take().ok_or(GatewayError::Closed)?;

        let gateway = Arc::new(ConsoleGateway::new(&self.config, writer));
        let (tx, rx) = mpsc::channel(self.config.queue_capacity.max(1));
        tokio::spawn(read_loop(reader, Arc::clone(&gateway), tx));

        info!(bot_id = %self.config.bot_id, "Console session opened");
        Ok(GatewaySession {
            gateway,
            events: rx,
        })
    }
}

/// Gateway writing JSON lines to an output stream.
pub struct ConsoleGateway {
    bot_id: String,
    users: RwLock<HashSet<String>>,
    channels: RwLock<HashSet<String>>,
    writer: tokio::sync::Mutex<Writer>,
    next_id: AtomicU64,
    closed: AtomicBool,
    cancel: CancellationToken,
}

impl ConsoleGateway {
    fn new(config: &ConsoleConfig, writer: Writer) -> Self {
        let mut users: HashSet<String> = config.users.iter().cloned().collect();
        users.insert(config.bot_id.clone());
        let mut channels: HashSet<String> = config.channels.iter().cloned().collect();
        channels.insert(CONSOLE_CHANNEL.to_string());

        Self {
            bot_id: config.bot_id.clone(),
            users: RwLock::new(users),
            channels: RwLock::new(channels),
            writer: tokio::sync::Mutex::new(writer),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
            cancel: CancellationToken::new(),
        }
    }

    /// Records the author, mentions and channel of an inbound event.
    fn learn(&self, event: &MessageEvent) {
        let mut users = self.users.write();
        users.insert(event.author.id.clone());
        users.extend(event.mentions.iter().map(|u| u.id.clone()));
        drop(users);
        self.channels.write().insert(event.channel_id.clone());
    }

    async fn write(&self, frame: &Outbound<'_>) -> GatewayResult<()> {
        let mut line =
            serde_json::to_string(frame).map_err(|e| GatewayError::SendFailed(e.to_string()))?;
        line.push('\n');
        let mut writer = self.writer.lock().await;
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }

    fn ensure_open(&self) -> GatewayResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            Err(GatewayError::Closed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Gateway for ConsoleGateway {
    fn current_user_id(&self) -> &str {
        &self.bot_id
    }

    async fn send(&self, channel_id: &str, text: &str) -> GatewayResult<String> {
        self.ensure_open()?;
        let id = format!("out-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        self.write(&Outbound::Send {
            id: &id,
            channel_id,
            content: text,
        })
        .await?;
        Ok(id)
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> GatewayResult<()> {
        self.ensure_open()?;
        if !self.channels.read().contains(channel_id) {
            return Err(GatewayError::channel_not_found(channel_id));
        }
        self.write(&Outbound::Delete {
            channel_id,
            message_id,
        })
        .await
    }

    async fn resolve_user(&self, user_id: &str) -> GatewayResult<User> {
        if self.users.read().contains(user_id) {
            Ok(User::new(user_id))
        } else {
            Err(GatewayError::user_not_found(user_id))
        }
    }

    async fn resolve_channel(&self, channel_id: &str) -> GatewayResult<Channel> {
        if self.channels.read().contains(channel_id) {
            Ok(Channel::new(channel_id))
        } else {
            Err(GatewayError::channel_not_found(channel_id))
        }
    }

    async fn open_direct_channel(&self, user_id: &str) -> GatewayResult<String> {
        self.ensure_open()?;
        if !self.users.read().contains(user_id) {
            return Err(GatewayError::user_not_found(user_id));
        }
        let channel = format!("@{user_id}");
        self.channels.write().insert(channel.clone());
        Ok(channel)
    }

    async fn close(&self) -> GatewayResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.cancel.cancel();
        self.write(&Outbound::Close).await
    }
}

/// Parses one input line. `None` for blank or malformed lines.
fn parse_line(line: &str, seq: u64) -> Option<MessageEvent> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return None;
    }
    if line.trim_start().starts_with('{') {
        return match serde_json::from_str::<MessageEvent>(line) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(error = %e, "Ignoring malformed input line");
                None
            }
        };
    }
    Some(MessageEvent::direct(
        format!("in-{seq}"),
        User::new(CONSOLE_USER),
        CONSOLE_CHANNEL,
        line,
    ))
}

async fn read_loop(mut reader: Reader, gateway: Arc<ConsoleGateway>, tx: mpsc::Sender<MessageEvent>) {
    let mut seq = 0u64;
    let mut line = String::new();
    loop {
        line.clear();
        let read = tokio::select! {
            _ = gateway.cancel.cancelled() => break,
            read = reader.read_line(&mut line) => read,
        };
        match read {
            Ok(0) => {
                info!("Console input closed");
                break;
            }
            Ok(_) => {
                seq += 1;
                let Some(event) = parse_line(&line, seq) else {
                    continue;
                };
                gateway.learn(&event);
                if tx.send(event).await.is_err() {
                    debug!("Event receiver dropped, stopping console reader");
                    break;
                }
            }
            Err(e) => {
                warn!(error = %e, "Console read failed");
                break;
            }
        }
    }
}
