//! The activity ledger.
//!
//! Routine events (uploads, downloads, views, deletes) go through
//! [`ActivityLedger::append`], which never fails the caller: a failed write
//! is reported on the `docshare::ledger` tracing target and dropped.
//! [`ActivityLedger::append_strict`] fails the caller instead. Access-control
//! mutations take their entry from [`ActivityLedger::prepare`] and store it
//! together with the change.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use tracing::{debug, warn};

use docshare_core::error::{AppError, ErrorKind};
use docshare_core::result::AppResult;
use docshare_database::ActivityStore;
use docshare_entity::activity::{ActivityCursor, ActivityFilter, ActivityLogEntry, NewActivity};

/// Append-only audit trail over an [`ActivityStore`].
pub struct ActivityLedger {
    store: Arc<dyn ActivityStore>,
    page_size: u32,
    write_timeout: Duration,
    last_stamp: Mutex<Option<DateTime<Utc>>>,
}

impl ActivityLedger {
    /// Creates a ledger that fetches `page_size` entries per round trip on
    /// lazy queries and gives each write `write_timeout` to complete.
    pub fn new(store: Arc<dyn ActivityStore>, page_size: u32, write_timeout: Duration) -> Self {
        Self {
            store,
            page_size: page_size.max(1),
            write_timeout,
            last_stamp: Mutex::new(None),
        }
    }

    /// Best-effort append. Returns the stored entry, or `None` if the write
    /// failed and was only reported.
    pub async fn append(&self, event: NewActivity) -> Option<ActivityLogEntry> {
        let action = event.action;
        let user_id = event.user_id;
        match self.append_strict(event).await {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(
                    target: "docshare::ledger",
                    action = %action,
                    actor_id = %user_id,
                    error = %e,
                    "Dropping activity entry"
                );
                None
            }
        }
    }

    /// Append that fails with `LedgerWrite` if the entry is not stored, or
    /// `Validation` if its details are malformed.
    pub async fn append_strict(&self, event: NewActivity) -> AppResult<ActivityLogEntry> {
        let entry = self.prepare(event)?;
        match tokio::time::timeout(self.write_timeout, self.store.append(&entry)).await {
            Ok(Ok(())) => {
                debug!(
                    entry_id = %entry.id,
                    action = %entry.action,
                    actor_id = %entry.user_id,
                    "Activity recorded"
                );
                Ok(entry)
            }
            Ok(Err(e)) => Err(AppError::with_source(
                ErrorKind::LedgerWrite,
                format!("Failed to write {} entry", entry.action),
                e,
            )),
            Err(_) => Err(AppError::ledger_write(format!(
                "Timed out writing {} entry",
                entry.action
            ))),
        }
    }

    /// Validate `event` and stamp it without storing it, for writers that
    /// persist the entry together with the change it records.
    pub fn prepare(&self, event: NewActivity) -> AppResult<ActivityLogEntry> {
        event.details.validate_for(event.action)?;
        Ok(event.into_entry(self.next_stamp()))
    }

    /// Lazily stream every entry matching `filter` in `(timestamp, id)`
    /// order, fetching one page at a time.
    pub fn query(&self, filter: ActivityFilter) -> BoxStream<'static, AppResult<ActivityLogEntry>> {
        self.query_after(filter, None)
    }

    /// Like [`Self::query`], resuming strictly after `after`.
    ///
    /// The stream ends after the first error.
    pub fn query_after(
        &self,
        filter: ActivityFilter,
        after: Option<ActivityCursor>,
    ) -> BoxStream<'static, AppResult<ActivityLogEntry>> {
        let state = QueryState {
            store: Arc::clone(&self.store),
            filter,
            after,
            page_size: self.page_size,
            buffer: VecDeque::new(),
            exhausted: false,
        };

        stream::unfold(state, |mut st| async move {
            loop {
                if let Some(entry) = st.buffer.pop_front() {
                    st.after = Some(ActivityCursor::of(&entry));
                    return Some((Ok(entry), st));
                }
                if st.exhausted {
                    return None;
                }
                match st.store.page(&st.filter, st.after, st.page_size).await {
                    Ok(page) => {
                        st.exhausted = page.len() < st.page_size as usize;
                        st.buffer.extend(page);
                    }
                    Err(e) => {
                        st.exhausted = true;
                        return Some((Err(e), st));
                    }
                }
            }
        })
        .boxed()
    }

    /// One page of matching entries strictly after `after`.
    pub async fn page(
        &self,
        filter: &ActivityFilter,
        after: Option<ActivityCursor>,
        limit: u32,
    ) -> AppResult<Vec<ActivityLogEntry>> {
        self.store.page(filter, after, limit).await
    }

    /// Strictly increasing microsecond timestamps for this writer.
    fn next_stamp(&self) -> DateTime<Utc> {
        let now = Utc::now().trunc_subsecs(6);
        let mut last = self
            .last_stamp
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let stamp = match *last {
            Some(prev) if prev >= now => prev + TimeDelta::microseconds(1),
            _ => now,
        };
        *last = Some(stamp);
        stamp
    }
}

struct QueryState {
    store: Arc<dyn ActivityStore>,
    filter: ActivityFilter,
    after: Option<ActivityCursor>,
    page_size: u32,
    buffer: VecDeque<ActivityLogEntry>,
    exhausted: bool,
}
