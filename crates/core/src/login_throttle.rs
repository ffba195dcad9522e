//! Per-client-IP admin login throttling.
//!
//! The caller owns the clock: every method takes `now`, so the server
//! passes `Instant::now()` and tests pass synthetic instants.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use crate::error::CoreError;

/// Default failures allowed inside one window.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default window and lockout length in minutes.
pub const DEFAULT_LOCKOUT_MINUTES: u64 = 15;

#[derive(Debug, Clone, Copy)]
struct AttemptWindow {
    failures: u32,
    window_start: Instant,
    locked_until: Option<Instant>,
}

/// Outcome of recording a failed login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedAttempt {
    /// Still allowed to try this many more times.
    Remaining(u32),
    /// Locked out for this long.
    LockedOut(Duration),
}

impl FailedAttempt {
    pub fn message(&self) -> String {
        match self {
            Self::Remaining(n) => format!("Invalid password. {n} attempt(s) remaining."),
            Self::LockedOut(d) => lockout_message(*d),
        }
    }
}

fn lockout_message(remaining: Duration) -> String {
    let minutes = remaining.as_secs().div_ceil(60).max(1);
    format!("Too many failed attempts. Try again in {minutes} minute(s).")
}

#[derive(Debug)]
pub struct LoginThrottle {
    max_attempts: u32,
    lockout: Duration,
    entries: HashMap<String, AttemptWindow>,
}

impl Default for LoginThrottle {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_ATTEMPTS,
            Duration::from_secs(DEFAULT_LOCKOUT_MINUTES * 60),
        )
    }
}

impl LoginThrottle {
    pub fn new(max_attempts: u32, lockout: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            lockout,
            entries: HashMap::new(),
        }
    }

    /// Reject the attempt up front when the client is locked out.
    pub fn check(&mut self, client: &str, now: Instant) -> Result<(), CoreError> {
        self.sweep(now);
        match self.entries.get(client).and_then(|e| e.locked_until) {
            Some(until) => Err(CoreError::TooManyRequests(lockout_message(
                until.saturating_duration_since(now),
            ))),
            None => Ok(()),
        }
    }

    pub fn record_failure(&mut self, client: &str, now: Instant) -> FailedAttempt {
        self.sweep(now);
        let entry = self
            .entries
            .entry(client.to_string())
            .or_insert(AttemptWindow {
                failures: 0,
                window_start: now,
                locked_until: None,
            });
        entry.failures += 1;

        if entry.failures >= self.max_attempts {
            entry.locked_until = Some(now + self.lockout);
            FailedAttempt::LockedOut(self.lockout)
        } else {
            FailedAttempt::Remaining(self.max_attempts - entry.failures)
        }
    }

    pub fn record_success(&mut self, client: &str) {
        self.entries.remove(client);
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.entries.len()
    }

    /// Drop every entry whose window or lockout has elapsed.
    fn sweep(&mut self, now: Instant) {
        let lockout = self.lockout;
        self.entries.retain(|_, e| match e.locked_until {
            Some(until) => now < until,
            None => now.saturating_duration_since(e.window_start) < lockout,
        });
    }
}

/// Client IP for throttling: first `x-forwarded-for` entry, then
/// `x-real-ip`, then the socket peer, else `"unknown"`.
pub fn client_ip(
    forwarded_for: Option<&str>,
    real_ip: Option<&str>,
    peer: Option<IpAddr>,
) -> String {
    let header = forwarded_for
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| real_ip.map(str::trim).filter(|v| !v.is_empty()));
    match (header, peer) {
        (Some(ip), _) => ip.to_string(),
        (None, Some(peer)) => peer.to_string(),
        (None, None) => "unknown".to_string(),
    }
}
