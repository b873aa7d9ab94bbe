//! Operator registry and the authorization gate.
//!
//! Membership in the registry is the only authorization signal: there are no
//! roles and no expiry. The set lives in memory for the lifetime of the host.

use std::collections::HashSet;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use discbot_core::{Gateway, User};

/// Notice sent to a user who invokes a privileged command without rights.
pub const DENIAL_NOTICE: &str = "You are not an operator of this bot.";

/// What happens when a non-operator invokes a privileged command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialPolicy {
    /// Send a best-effort private notice to the caller.
    #[default]
    Notify,
    /// Ignore the command without telling anyone.
    Silent,
}

/// Direction of a bulk membership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpAction {
    Grant,
    Revoke,
}

/// In-memory set of operator user ids.
///
/// Reads take a shared lock; each grant or revoke is individually atomic.
#[derive(Debug, Default)]
pub struct OperatorRegistry {
    ops: RwLock<HashSet<String>>,
}

impl OperatorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry seeded with `ids`. Blank entries are skipped.
    pub fn with_operators<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ops = ids
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Self {
            ops: RwLock::new(ops),
        }
    }

    /// Pure membership test.
    pub fn is_operator(&self, user_id: &str) -> bool {
        self.ops.read().contains(user_id)
    }

    /// Adds an operator. Returns `true` if the user was not one already.
    pub fn grant(&self, user_id: &str) -> bool {
        let added = self.ops.write().insert(user_id.to_string());
        if added {
            info!(user_id = %user_id, "Operator granted");
        }
        added
    }

    /// Removes an operator. Revoking a non-member is a no-op returning `false`.
    pub fn revoke(&self, user_id: &str) -> bool {
        let removed = self.ops.write().remove(user_id);
        if removed {
            info!(user_id = %user_id, "Operator revoked");
        }
        removed
    }

    /// Applies `action` to every user and counts actual membership changes.
    ///
    /// A repeated grant (or revoke) of the same user is not counted twice.
    pub fn bulk_apply<'a, I>(&self, users: I, action: OpAction) -> usize
    where
        I: IntoIterator<Item = &'a User>,
    {
        users
            .into_iter()
            .filter(|u| match action {
                OpAction::Grant => self.grant(&u.id),
                OpAction::Revoke => self.revoke(&u.id),
            })
            .count()
    }

    /// Sorted snapshot of all operators.
    pub fn operators(&self) -> Vec<String> {
        let mut ops: Vec<String> = self.ops.read().iter().cloned().collect();
        ops.sort();
        ops
    }

    /// Number of operators.
    pub fn len(&self) -> usize {
        self.ops.read().len()
    }

    /// Returns `true` when there are no operators.
    pub fn is_empty(&self) -> bool {
        self.ops.read().is_empty()
    }

    /// Checks `user_id` and, when the check fails under
    /// [`DenialPolicy::Notify`], tells the user privately.
    ///
    /// Notification failures are logged and otherwise ignored.
    pub async fn check_authorized_or_deny(
        &self,
        gateway: &dyn Gateway,
        user_id: &str,
        policy: DenialPolicy,
    ) -> bool {
        if self.is_operator(user_id) {
            return true;
        }
        debug!(user_id = %user_id, ?policy, "Privileged command denied");

        if policy == DenialPolicy::Notify {
            let notified = match gateway.open_direct_channel(user_id).await {
                Ok(dm) => gateway.send(&dm, DENIAL_NOTICE).await.map(|_| ()),
                Err(e) => Err(e),
            };
            if let Err(e) = notified {
                warn!(user_id = %user_id, error = %e, "Failed to deliver denial notice");
            }
        }
        false
    }
}
