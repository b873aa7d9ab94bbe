//! Built-in command interpreter.
//!
//! The interpreter looks at the first token of every message and runs one of
//! a fixed set of privileged commands. Everything else is ignored here (it has
//! already been through the handler chain).
//!
//! | Command | Effect |
//! |---|---|
//! | `!op <id...>` | grant operator to listed ids and mentioned users |
//! | `!deop <id...>` | revoke operator from listed ids and mentioned users |
//! | `!delmsg <channel> <message>` | delete a message |
//! | `!ops` | list operators in a private channel |
//! | `!quit` | close the session (direct messages only) |
//!
//! All commands require the caller to be an operator.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::context::MessageContext;
use crate::operators::{DenialPolicy, OpAction, OperatorRegistry};
use discbot_core::{Gateway, User, parse_user_mention, user_id_to_mention};

/// The fixed set of built-in commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinCommand {
    Op,
    Deop,
    DelMsg,
    Ops,
    Quit,
}

impl BuiltinCommand {
    /// Recognises a command word. Matching is exact and case-sensitive.
    pub fn parse(word: &str) -> Option<Self> {
        match word {
            "!op" => Some(Self::Op),
            "!deop" => Some(Self::Deop),
            "!delmsg" => Some(Self::DelMsg),
            "!ops" => Some(Self::Ops),
            "!quit" => Some(Self::Quit),
            _ => None,
        }
    }

    /// The command word as typed by users.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Op => "!op",
            Self::Deop => "!deop",
            Self::DelMsg => "!delmsg",
            Self::Ops => "!ops",
            Self::Quit => "!quit",
        }
    }
}

/// Formats the `!op`/`!deop` confirmation, e.g. `"1 user added to operators."`.
pub fn op_reply(count: usize, action: OpAction) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    let verb = match action {
        OpAction::Grant => "added to",
        OpAction::Revoke => "removed from",
    };
    format!("{count} user{suffix} {verb} operators.")
}

/// Executes built-in commands against the operator registry and gateway.
pub struct CommandInterpreter {
    operators: Arc<OperatorRegistry>,
    denial: DenialPolicy,
    shutdown: CancellationToken,
    quitting: AtomicBool,
}

impl CommandInterpreter {
    /// Creates an interpreter. `shutdown` is cancelled by `!quit`.
    pub fn new(
        operators: Arc<OperatorRegistry>,
        denial: DenialPolicy,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            operators,
            denial,
            shutdown,
            quitting: AtomicBool::new(false),
        }
    }

    /// Runs the command in `ctx`, if any. Returns the recognised command.
    pub async fn execute(&self, ctx: &MessageContext) -> Option<BuiltinCommand> {
        let command = BuiltinCommand::parse(ctx.command())?;
        debug!(command = command.as_str(), author = %ctx.event().author.id, "Built-in command");

        match command {
            BuiltinCommand::Op => self.change_operators(ctx, OpAction::Grant).await,
            BuiltinCommand::Deop => self.change_operators(ctx, OpAction::Revoke).await,
            BuiltinCommand::DelMsg => self.delete_message(ctx).await,
            BuiltinCommand::Ops => self.show_operators(ctx).await,
            BuiltinCommand::Quit => self.quit(ctx).await,
        }
        Some(command)
    }

    async fn authorize(&self, ctx: &MessageContext) -> bool {
        self.operators
            .check_authorized_or_deny(ctx.gateway().as_ref(), &ctx.event().author.id, self.denial)
            .await
    }

    async fn change_operators(&self, ctx: &MessageContext, action: OpAction) {
        if !self.authorize(ctx).await {
            return;
        }

        let listed = resolve_users(ctx.gateway().as_ref(), &ctx.args()[1..]).await;
        let count = self.operators.bulk_apply(&listed, action)
            + self.operators.bulk_apply(&ctx.event().mentions, action);

        if let Err(e) = ctx.reply(&op_reply(count, action)).await {
            warn!(error = %e, "Failed to send operator change reply");
        }
    }

    async fn delete_message(&self, ctx: &MessageContext) {
        if !self.authorize(ctx).await {
            return;
        }
        let [_, channel_id, message_id, ..] = ctx.args() else {
            return;
        };
        if let Err(e) = ctx.gateway().delete_message(channel_id, message_id).await {
            warn!(channel_id = %channel_id, message_id = %message_id, error = %e, "Failed to delete message");
        }
    }

    async fn show_operators(&self, ctx: &MessageContext) {
        if !self.authorize(ctx).await {
            return;
        }
        let gateway = ctx.gateway().as_ref();
        let Ok(dm) = gateway.open_direct_channel(&ctx.event().author.id).await else {
            debug!("Could not open a private channel for the operator list");
            return;
        };

        let mut text = String::from("operators:");
        for id in self.operators.operators() {
            text.push(' ');
            text.push_str(&user_id_to_mention(gateway, &id).await);
        }
        if let Err(e) = gateway.send(&dm, &text).await {
            warn!(error = %e, "Failed to send operator list");
        }
    }

    async fn quit(&self, ctx: &MessageContext) {
        if !ctx.event().is_direct() {
            debug!(author = %ctx.event().author.id, "Ignoring !quit outside a direct message");
            return;
        }
        if !self.authorize(ctx).await {
            return;
        }
        if self.quitting.swap(true, Ordering::SeqCst) {
            return;
        }

        info!(author = %ctx.event().author.id, "Quitting.");
        if let Err(e) = ctx.gateway().close().await {
            warn!(error = %e, "Error while closing gateway session");
        }
        self.shutdown.cancel();
    }
}

/// Resolves command arguments into users, skipping anything that does not
/// resolve. Arguments may be raw ids, comma-separated ids or user mentions.
async fn resolve_users(gateway: &dyn Gateway, args: &[String]) -> Vec<User> {
    let mut users = Vec::new();
    for id in args
        .iter()
        .flat_map(|arg| arg.split(','))
        .map(|tok| parse_user_mention(tok).unwrap_or(tok))
        .filter(|id| !id.is_empty())
    {
        match gateway.resolve_user(id).await {
            Ok(user) => users.push(user),
            Err(e) => debug!(id = %id, error = %e, "Skipping unresolvable user"),
        }
    }
    users
}
