use std::collections::BTreeMap;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{TrackerError, TrackerResult};
use crate::kv::KeyValueStore;
use crate::models::Identity;
use crate::notify::Notifier;

pub const CURRENT_USER_KEY: &str = "currentUser";
pub const KNOWN_USERS_KEY: &str = "knownUsers";

/// Holds at most one logged-in identity. There is no credential check:
/// the email is the identity.
pub struct IdentityContext<'a> {
    kv: &'a dyn KeyValueStore,
    clock: &'a dyn Clock,
    notifier: &'a dyn Notifier,
    user: Option<Identity>,
    loading: bool,
}

impl<'a> IdentityContext<'a> {
    pub fn new(kv: &'a dyn KeyValueStore, clock: &'a dyn Clock, notifier: &'a dyn Notifier) -> Self {
        Self {
            kv,
            clock,
            notifier,
            user: None,
            loading: true,
        }
    }

    /// Restores the persisted identity. A value that fails to parse is
    /// removed and treated as logged out.
    pub fn init(&mut self) -> TrackerResult<()> {
        self.user = match self.kv.get(CURRENT_USER_KEY)? {
            Some(raw) => match serde_json::from_str::<Identity>(&raw) {
                Ok(user) => {
                    debug!(user_id = %user.id, "restored identity");
                    Some(user)
                }
                Err(e) => {
                    warn!(error = %e, "discarding malformed persisted identity");
                    self.kv.remove(CURRENT_USER_KEY)?;
                    None
                }
            },
            None => None,
        };
        self.loading = false;
        Ok(())
    }

    /// Drops the in-memory identity; persistence is left as is.
    pub fn teardown(&mut self) {
        self.user = None;
        self.loading = true;
    }

    pub fn login(&mut self, email: &str) -> TrackerResult<Identity> {
        let email = email.trim();
        if email.is_empty() {
            self.notifier.failure("Email is required");
            return Err(TrackerError::Validation("email is required".to_string()));
        }

        let mut known = self.known_users()?;
        let user = match known.get(email).cloned() {
            Some(existing) => existing,
            None => {
                let user = Identity {
                    id: Uuid::new_v4().to_string(),
                    email: email.to_string(),
                    created_at: self.clock.now(),
                };
                known.insert(email.to_string(), user.clone());
                self.kv.set(KNOWN_USERS_KEY, &to_json(&known)?)?;
                user
            }
        };

        self.kv.set(CURRENT_USER_KEY, &to_json(&user)?)?;
        info!(user_id = %user.id, "logged in");
        self.user = Some(user.clone());
        self.loading = false;
        self.notifier.success("Successfully logged in!");
        Ok(user)
    }

    pub fn logout(&mut self) -> TrackerResult<()> {
        self.kv.remove(CURRENT_USER_KEY)?;
        if let Some(user) = self.user.take() {
            info!(user_id = %user.id, "logged out");
        }
        self.loading = false;
        self.notifier.success("Successfully logged out");
        Ok(())
    }

    pub fn current_identity(&self) -> Option<&Identity> {
        self.user.as_ref()
    }

    /// True until `init` has run; lets callers tell "not loaded yet"
    /// apart from "logged out".
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    fn known_users(&self) -> TrackerResult<BTreeMap<String, Identity>> {
        let Some(raw) = self.kv.get(KNOWN_USERS_KEY)? else {
            return Ok(BTreeMap::new());
        };
        match serde_json::from_str(&raw) {
            Ok(known) => Ok(known),
            Err(e) => {
                warn!(error = %e, "discarding malformed identity directory");
                self.kv.remove(KNOWN_USERS_KEY)?;
                Ok(BTreeMap::new())
            }
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> TrackerResult<String> {
    serde_json::to_string(value).map_err(|e| TrackerError::Storage(e.into()))
}
