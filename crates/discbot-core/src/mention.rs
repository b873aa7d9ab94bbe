//! Identifier and mention formatting helpers.

use tracing::trace;

use crate::error::GatewayResult;
use crate::gateway::Gateway;

/// Renders a user id as a mention, falling back to the raw id when the
/// user cannot be resolved.
pub async fn user_id_to_mention(gateway: &dyn Gateway, user_id: &str) -> String {
    match gateway.resolve_user(user_id).await {
        Ok(user) => user.mention(),
        Err(e) => {
            trace!(user_id = %user_id, error = %e, "Could not resolve user for mention");
            user_id.to_string()
        }
    }
}

/// Renders a channel id as a mention, falling back to `"channel: <id>"`.
pub async fn chan_id_to_mention(gateway: &dyn Gateway, channel_id: &str) -> String {
    match gateway.resolve_channel(channel_id).await {
        Ok(channel) => channel.mention(),
        Err(_) => format!("channel: {channel_id}"),
    }
}

/// Converts a channel mention (`<#id>`) or a raw id into a validated channel id.
///
/// One `<`, one `>` and one `#` are stripped before the id is checked
/// against the gateway, so a valid raw id comes back unchanged.
pub async fn chan_mention_to_id(gateway: &dyn Gateway, mention: &str) -> GatewayResult<String> {
    let id = mention
        .replacen('<', "", 1)
        .replacen('>', "", 1)
        .replacen('#', "", 1);
    gateway.resolve_channel(&id).await?;
    Ok(id)
}

/// Extracts the id from a user mention (`<@id>` or `<@!id>`), or `None` when
/// the token is not a user mention.
pub fn parse_user_mention(token: &str) -> Option<&str> {
    let inner = token.strip_prefix("<@")?.strip_suffix('>')?;
    let inner = inner.strip_prefix('!').unwrap_or(inner);
    (!inner.is_empty()).then_some(inner)
}
