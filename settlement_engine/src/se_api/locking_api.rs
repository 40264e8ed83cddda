use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    se_api::{errors::SettlementError, report_objects::LockingResult},
    traits::TicketManagement,
};

/// Closes tickets to further sales once their first match has kicked off.
pub struct TicketLockingApi<B> {
    db: B,
}

impl<B> Debug for TicketLockingApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TicketLockingApi")
    }
}

impl<B> TicketLockingApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> TicketLockingApi<B>
where B: TicketManagement
{
    /// Locks every open, non-deleted ticket whose earliest match starts at or before `now`.
    ///
    /// Running this twice is harmless. Tickets that are already locked are not touched again.
    pub async fn lock_started_tickets(&self, now: DateTime<Utc>) -> Result<LockingResult, SettlementError> {
        let locked = self.db.lock_started_tickets(now).await?;
        if locked.is_empty() {
            trace!("🔒️ No tickets to lock");
        } else {
            info!("🔒️ Locked {} tickets: {locked:?}", locked.len());
        }
        Ok(LockingResult { locked })
    }
}
