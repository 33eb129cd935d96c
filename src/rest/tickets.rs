/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::rest::client::{ApiCall, Client};
use crate::rest::errors::FlickrError;
use futures::future::BoxFuture;
use log::warn;
use num_enum::TryFromPrimitive;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::oneshot;

/// How often pending tickets are checked.
pub const CHECK_PERIOD: Duration = Duration::from_millis(2000);

/// Server-side job state carried in a ticket's `complete` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum TicketCompletion {
    InProgress = 0,
    Done = 1,
    Failed = 2,
}

/// One ticket's status as reported by a batched check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketStatus {
    pub id: String,
    /// Absent when the server reported an unrecognized code; such tickets
    /// stay pending.
    pub complete: Option<TicketCompletion>,
    pub invalid: bool,
}

/// Batched status lookup for upload tickets.
///
/// [`Client`] implements this over `flickr.photos.upload.checkTickets`; tests
/// substitute their own source.
pub trait TicketStatusSource: Send + Sync {
    fn check_tickets<'a>(
        &'a self,
        ids: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<TicketStatus>, FlickrError>>;
}

impl TicketStatusSource for Client {
    fn check_tickets<'a>(
        &'a self,
        ids: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<TicketStatus>, FlickrError>> {
        Box::pin(async move {
            let resp = self
                .call(
                    ApiCall::new("flickr.photos.upload.checkTickets")
                        .arg("tickets", ids.join(",").as_str()),
                )
                .await?;
            let tickets = &resp["uploader"]["ticket"];
            let statuses = match tickets {
                Value::Array(items) => items.iter().filter_map(status_from_value).collect(),
                Value::Object(_) => status_from_value(tickets).into_iter().collect(),
                _ => return Err(FlickrError::ResponseMissing()),
            };
            Ok(statuses)
        })
    }
}

// The wire format is loose here: ids and codes arrive as numbers or strings
// depending on the endpoint revision.
fn status_from_value(v: &Value) -> Option<TicketStatus> {
    let id = match &v["id"] {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let complete = loose_u64(&v["complete"])
        .and_then(|code| u8::try_from(code).ok())
        .and_then(|code| TicketCompletion::try_from(code).ok());
    let invalid = loose_u64(&v["invalid"]) == Some(1);
    Some(TicketStatus {
        id,
        complete,
        invalid,
    })
}

fn loose_u64(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

type Outcome = Result<(), FlickrError>;

#[derive(Default)]
struct TrackerState {
    pending: HashMap<String, oneshot::Sender<Outcome>>,
    polling: bool,
}

struct TrackerInner {
    source: Arc<dyn TicketStatusSource>,
    period: Duration,
    state: Mutex<TrackerState>,
}

/// Tracks asynchronous upload tickets until the server resolves them.
///
/// The tracker polls `flickr.photos.upload.checkTickets` on a fixed period
/// while tickets are pending and goes idle the moment the table drains. Each
/// submitted ticket resolves exactly once: success, "processing failed", or
/// "ticket not found".
#[derive(Clone)]
pub struct TicketTracker {
    inner: Arc<TrackerInner>,
}

impl TicketTracker {
    pub fn new(source: Arc<dyn TicketStatusSource>) -> Self {
        Self::with_period(source, CHECK_PERIOD)
    }

    pub fn with_period(source: Arc<dyn TicketStatusSource>, period: Duration) -> Self {
        Self {
            inner: Arc::new(TrackerInner {
                source,
                period,
                state: Mutex::new(TrackerState::default()),
            }),
        }
    }

    /// Registers a ticket and returns its pending outcome.
    ///
    /// Starts the periodic poller when the pending table was empty. Must be
    /// called within a tokio runtime.
    pub fn submit(&self, ticket: &str) -> PendingTicket {
        let (tx, rx) = oneshot::channel();
        let mut state = self.inner.state.lock().expect("tracker lock poisoned");
        state.pending.insert(ticket.to_string(), tx);
        if !state.polling {
            state.polling = true;
            tokio::spawn(poll_loop(self.inner.clone()));
        }
        PendingTicket {
            ticket: ticket.to_string(),
            rx,
        }
    }

    pub fn pending_tickets(&self) -> usize {
        self.inner
            .state
            .lock()
            .expect("tracker lock poisoned")
            .pending
            .len()
    }

    pub fn is_polling(&self) -> bool {
        self.inner
            .state
            .lock()
            .expect("tracker lock poisoned")
            .polling
    }
}

impl std::fmt::Debug for TicketTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketTracker")
            .field("period", &self.inner.period)
            .field("pending", &self.pending_tickets())
            .field("polling", &self.is_polling())
            .finish()
    }
}

async fn poll_loop(inner: Arc<TrackerInner>) {
    let mut interval = tokio::time::interval(inner.period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tokio interval tick completes immediately; the first check
    // belongs one period after submission.
    interval.tick().await;
    loop {
        interval.tick().await;

        let ids: Vec<String> = {
            let mut state = inner.state.lock().expect("tracker lock poisoned");
            if state.pending.is_empty() {
                state.polling = false;
                return;
            }
            state.pending.keys().cloned().collect()
        };

        // A failed batch check is fatal for the cycle, not for the tickets:
        // the cadence is unchanged and the next tick retries.
        let statuses = match inner.source.check_tickets(&ids).await {
            Ok(statuses) => statuses,
            Err(err) => {
                warn!("Checking upload tickets {ids:?} failed: {err}");
                continue;
            }
        };

        let mut state = inner.state.lock().expect("tracker lock poisoned");
        for status in statuses {
            let outcome = match status {
                TicketStatus {
                    complete: Some(TicketCompletion::Done),
                    ..
                } => Ok(()),
                TicketStatus {
                    ref id,
                    complete: Some(TicketCompletion::Failed),
                    ..
                } => Err(FlickrError::UploadTicket(
                    id.clone(),
                    "processing failed".into(),
                )),
                TicketStatus {
                    ref id,
                    invalid: true,
                    ..
                } => Err(FlickrError::UploadTicket(
                    id.clone(),
                    "ticket not found".into(),
                )),
                _ => continue,
            };
            if let Some(sender) = state.pending.remove(&status.id) {
                // The receiver may have been dropped; resolution is still
                // complete for this ticket.
                let _ = sender.send(outcome);
            }
        }
        if state.pending.is_empty() {
            state.polling = false;
            return;
        }
    }
}

/// Outcome handle for a submitted ticket. Completes exactly once.
pub struct PendingTicket {
    ticket: String,
    rx: oneshot::Receiver<Outcome>,
}

impl PendingTicket {
    pub fn ticket_id(&self) -> &str {
        &self.ticket
    }
}

impl Future for PendingTicket {
    type Output = Result<(), FlickrError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_)) => Poll::Ready(Err(FlickrError::UploadTicket(
                this.ticket.clone(),
                "tracker dropped before resolution".into(),
            ))),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_numeric_and_string_status_fields() {
        let st = status_from_value(&json!({"id": "363", "complete": 1})).unwrap();
        assert_eq!(st.complete, Some(TicketCompletion::Done));
        assert!(!st.invalid);

        let st = status_from_value(&json!({"id": 363, "complete": "2"})).unwrap();
        assert_eq!(st.id, "363");
        assert_eq!(st.complete, Some(TicketCompletion::Failed));

        let st = status_from_value(&json!({"id": "x", "invalid": "1"})).unwrap();
        assert_eq!(st.complete, None);
        assert!(st.invalid);
    }

    #[test]
    fn unknown_completion_codes_stay_pending() {
        let st = status_from_value(&json!({"id": "t", "complete": 9})).unwrap();
        assert_eq!(st.complete, None);
    }

    #[test]
    fn entries_without_an_id_are_dropped() {
        assert!(status_from_value(&json!({"complete": 1})).is_none());
    }
}
