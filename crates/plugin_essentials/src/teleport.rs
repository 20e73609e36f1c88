//! # Teleport request coordination
//!
//! Arbitrates `/tpa` handshakes. A request is keyed by its target, so each
//! player has at most one request waiting for their answer.
//!
//! ## Lifecycle
//!
//! ```text
//! Absent --request(a -> b)--> Pending(b <- a)
//! Pending --accept | deny | dismiss | respond--> Absent
//! Pending --cancel_for_disconnect(a or b)------> Absent
//! Pending --expire_stale (only with a timeout)--> Absent
//! ```
//!
//! Every terminal path removes the entry with a single map operation, so
//! when two paths race (a UI answer arriving while the requester
//! disconnects) exactly one of them gets the request and the other sees
//! `None`.
//!
//! The coordinator holds no persistent state and never blocks on the host.

use crate::error::{EssentialsError, Result};
use crate::host::{Notice, PlayerHost};
use crate::types::PlayerId;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info};

/// A request waiting for the target's answer.
///
/// Also serves as the ticket handed to UI callbacks: [`RequestCoordinator::respond`]
/// only acts on the request with the same `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub id: u64,
    pub requester: PlayerId,
    pub target: PlayerId,
    pub created_at: DateTime<Utc>,
}

/// Answer given by the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Accept,
    Deny,
    /// The form was closed without an answer.
    Dismiss,
}

/// How a resolved request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Teleported,
    TeleportFailed,
    /// The target had no location the requester could be moved to.
    LocationUnavailable,
    RequesterOffline,
    TargetOffline,
    Denied,
    Dismissed,
    /// Answered after the configured timeout had passed.
    Expired,
}

pub struct RequestCoordinator {
    pending: DashMap<PlayerId, PendingRequest>,
    next_id: AtomicU64,
    timeout: Option<chrono::Duration>,
}

impl RequestCoordinator {
    /// Coordinator whose requests stay pending until answered or cancelled.
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
            next_id: AtomicU64::new(1),
            timeout: None,
        }
    }

    /// Coordinator whose requests expire `timeout` after creation.
    ///
    /// A timeout beyond what `chrono` can represent saturates to the
    /// largest one it can; expiry stays enabled.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(chrono::Duration::from_std(timeout).unwrap_or(chrono::Duration::MAX)),
            ..Self::new()
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.and_then(|timeout| timeout.to_std().ok())
    }

    /// Registers a request from `requester` to teleport to `target`.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` when a player targets themselves
    /// - `Conflict` when the target already has a pending request
    pub fn request(&self, requester: PlayerId, target: PlayerId) -> Result<PendingRequest> {
        if requester == target {
            return Err(EssentialsError::InvalidInput(
                "you cannot teleport to yourself".to_string(),
            ));
        }

        let now = Utc::now();
        let request = PendingRequest {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            requester,
            target,
            created_at: now,
        };

        match self.pending.entry(target) {
            Entry::Occupied(mut occupied) => {
                if !self.is_expired(occupied.get(), now) {
                    return Err(EssentialsError::Conflict(format!(
                        "a teleport request for {target} is already pending"
                    )));
                }
                let stale = occupied.insert(request.clone());
                debug!(
                    "Replaced expired request {} from {} to {}",
                    stale.id, stale.requester, target
                );
            }
            Entry::Vacant(vacant) => {
                vacant.insert(request.clone());
            }
        }

        info!("Teleport request {} from {} to {}", request.id, requester, target);
        Ok(request)
    }

    /// The request waiting for `target`'s answer, if it has not expired.
    pub fn pending_for(&self, target: PlayerId) -> Option<PendingRequest> {
        let request = self.pending.get(&target)?.value().clone();
        (!self.is_expired(&request, Utc::now())).then_some(request)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Accepts the request waiting for `target`; `None` when there is none.
    pub fn accept<H>(&self, target: PlayerId, host: &H) -> Option<Resolution>
    where
        H: PlayerHost + ?Sized,
    {
        let (_, request) = self.pending.remove(&target)?;
        Some(self.resolve(request, Response::Accept, host))
    }

    /// Denies the request waiting for `target`; `None` when there is none.
    pub fn deny<H>(&self, target: PlayerId, host: &H) -> Option<Resolution>
    where
        H: PlayerHost + ?Sized,
    {
        let (_, request) = self.pending.remove(&target)?;
        Some(self.resolve(request, Response::Deny, host))
    }

    /// Drops the request waiting for `target` without telling anyone.
    pub fn dismiss(&self, target: PlayerId) -> Option<PendingRequest> {
        let (_, request) = self.pending.remove(&target)?;
        debug!("Teleport request {} to {} dismissed", request.id, target);
        Some(request)
    }

    /// Applies `response` to exactly the request `ticket` refers to.
    ///
    /// `None` when that request is no longer pending, even if a newer
    /// request for the same target is.
    pub fn respond<H>(&self, ticket: &PendingRequest, response: Response, host: &H) -> Option<Resolution>
    where
        H: PlayerHost + ?Sized,
    {
        let (_, request) = self
            .pending
            .remove_if(&ticket.target, |_, pending| pending.id == ticket.id)?;
        Some(self.resolve(request, response, host))
    }

    /// Removes every request `player` takes part in, as target or requester.
    pub fn cancel_for_disconnect(&self, player: PlayerId) -> Vec<PendingRequest> {
        let mut cancelled = Vec::new();
        if let Some((_, request)) = self.pending.remove(&player) {
            cancelled.push(request);
        }
        self.pending.retain(|_, request| {
            if request.requester == player {
                cancelled.push(request.clone());
                false
            } else {
                true
            }
        });

        if !cancelled.is_empty() {
            info!("Cancelled {} teleport request(s) of {}", cancelled.len(), player);
        }
        cancelled
    }

    /// Removes requests older than the timeout. Nothing expires without one.
    pub fn expire_stale(&self, now: DateTime<Utc>) -> Vec<PendingRequest> {
        if self.timeout.is_none() {
            return Vec::new();
        }

        let mut expired = Vec::new();
        self.pending.retain(|_, request| {
            if self.is_expired(request, now) {
                expired.push(request.clone());
                false
            } else {
                true
            }
        });

        if !expired.is_empty() {
            debug!("Expired {} teleport request(s)", expired.len());
        }
        expired
    }

    fn is_expired(&self, request: &PendingRequest, now: DateTime<Utc>) -> bool {
        self.timeout
            .is_some_and(|timeout| now.signed_duration_since(request.created_at) >= timeout)
    }

    fn resolve<H>(&self, request: PendingRequest, response: Response, host: &H) -> Resolution
    where
        H: PlayerHost + ?Sized,
    {
        let resolution = if response != Response::Dismiss && self.is_expired(&request, Utc::now()) {
            if host.is_online(request.requester) {
                host.notify(
                    request.requester,
                    Notice::RequestExpired {
                        target: display_name(host, request.target),
                    },
                );
            }
            Resolution::Expired
        } else {
            match response {
                Response::Accept => complete_accept(&request, host),
                Response::Deny => complete_deny(&request, host),
                Response::Dismiss => Resolution::Dismissed,
            }
        };

        info!(
            "Teleport request {} from {} to {} resolved: {:?}",
            request.id, request.requester, request.target, resolution
        );
        resolution
    }
}

impl Default for RequestCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

fn display_name<H: PlayerHost + ?Sized>(host: &H, player: PlayerId) -> String {
    host.display_name(player).unwrap_or_else(|| player.to_string())
}

/// `Some` when either side of an answered request has left; the one still
/// online is told.
fn offline_party<H: PlayerHost + ?Sized>(request: &PendingRequest, host: &H) -> Option<Resolution> {
    let PendingRequest { requester, target, .. } = *request;

    if !host.is_online(requester) {
        if host.is_online(target) {
            host.notify(target, Notice::RequesterOffline);
        }
        return Some(Resolution::RequesterOffline);
    }
    if !host.is_online(target) {
        host.notify(requester, Notice::TargetOffline);
        return Some(Resolution::TargetOffline);
    }
    None
}

fn complete_accept<H: PlayerHost + ?Sized>(request: &PendingRequest, host: &H) -> Resolution {
    let PendingRequest { requester, target, .. } = *request;

    if let Some(resolution) = offline_party(request, host) {
        return resolution;
    }

    let Some(destination) = host
        .location_of(target)
        .and_then(|location| location.resolve(host).ok())
    else {
        host.notify(requester, Notice::LocationUnavailable);
        host.notify(target, Notice::LocationUnavailable);
        return Resolution::LocationUnavailable;
    };

    if host.teleport(requester, &destination) {
        host.notify(
            requester,
            Notice::TeleportingTo {
                target: display_name(host, target),
            },
        );
        host.notify(
            target,
            Notice::TeleportedToYou {
                requester: display_name(host, requester),
            },
        );
        Resolution::Teleported
    } else {
        host.notify(requester, Notice::TeleportFailed);
        host.notify(target, Notice::TeleportFailed);
        Resolution::TeleportFailed
    }
}

fn complete_deny<H: PlayerHost + ?Sized>(request: &PendingRequest, host: &H) -> Resolution {
    if let Some(resolution) = offline_party(request, host) {
        return resolution;
    }

    host.notify(request.requester, Notice::RequestDenied);
    host.notify(
        request.target,
        Notice::YouDenied {
            requester: display_name(host, request.requester),
        },
    );
    Resolution::Denied
}
