use crate::auth::IdentityContext;
use crate::clock::Clock;
use crate::error::TrackerResult;
use crate::kv::KeyValueStore;
use crate::models::Identity;
use crate::notify::Notifier;
use crate::store::RecordStore;

/// Keeps the record store pointed at whichever identity is current.
pub struct Tracker<'a> {
    pub identity: IdentityContext<'a>,
    pub jobs: RecordStore<'a>,
}

impl<'a> Tracker<'a> {
    pub fn new(kv: &'a dyn KeyValueStore, clock: &'a dyn Clock, notifier: &'a dyn Notifier) -> Self {
        Self {
            identity: IdentityContext::new(kv, clock, notifier),
            jobs: RecordStore::new(kv, clock, notifier),
        }
    }

    pub fn init(&mut self) -> TrackerResult<()> {
        self.identity.init()?;
        self.jobs.set_identity(self.identity.current_identity())
    }

    #[allow(dead_code)]
    pub fn teardown(&mut self) -> TrackerResult<()> {
        self.identity.teardown();
        self.jobs.set_identity(None)
    }

    pub fn login(&mut self, email: &str) -> TrackerResult<Identity> {
        let user = self.identity.login(email)?;
        self.jobs.set_identity(Some(&user))?;
        Ok(user)
    }

    pub fn logout(&mut self) -> TrackerResult<()> {
        self.identity.logout()?;
        self.jobs.set_identity(None)
    }
}
