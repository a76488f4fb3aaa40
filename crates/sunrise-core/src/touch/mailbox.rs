//! Latest-wins hand-off for hosts that poll the touch controller on a
//! separate thread.
//!
//! The poller posts every reading; the loop picks up at most one per cycle
//! and older unconsumed readings are overwritten.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use super::RawTouchSample;
use crate::drivers::{DriverError, TouchDriver};

/// Single-slot mailbox. `None` readings record a release.
pub struct TouchMailbox {
    slot: Signal<CriticalSectionRawMutex, Option<RawTouchSample>>,
}

impl Default for TouchMailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl TouchMailbox {
    pub const fn new() -> Self {
        Self {
            slot: Signal::new(),
        }
    }

    /// Replace whatever reading is pending.
    pub fn post(&self, reading: Option<RawTouchSample>) {
        self.slot.signal(reading);
    }

    /// Take the pending reading, if one was posted since the last take.
    pub fn take(&self) -> Option<Option<RawTouchSample>> {
        self.slot.try_take()
    }

    /// Touch driver view of this mailbox, for the loop side.
    pub fn receiver(&self) -> MailboxTouch<'_> {
        MailboxTouch {
            mailbox: self,
            contact: None,
        }
    }
}

/// Loop-side [`TouchDriver`] over a [`TouchMailbox`].
///
/// Remembers the last contact state so that a cycle with nothing posted
/// reports the finger as still down rather than released.
pub struct MailboxTouch<'a> {
    mailbox: &'a TouchMailbox,
    contact: Option<RawTouchSample>,
}

impl TouchDriver for MailboxTouch<'_> {
    fn poll(&mut self) -> Result<Option<RawTouchSample>, DriverError> {
        if let Some(reading) = self.mailbox.take() {
            self.contact = reading;
        }
        Ok(self.contact)
    }
}
