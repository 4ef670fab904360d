//! Retry policies for the storage pipeline.
//!
//! A policy looks at the outcome of the last attempt and either returns how
//! long to wait before the next one or `None` to give up. Policies may also
//! move the request to the other location of a geo-redundant account.

use crate::{
    constants::{MAX_BACKOFF_SECS, SECONDARY_SUFFIX},
    location::LocationMode,
    request::StorageRequest,
};
use rand::Rng;
use std::{fmt, time::Duration};

/// State of one logical operation as seen by a retry policy.
#[derive(Debug, Clone)]
pub struct RetryContext {
    pub request: StorageRequest,
    /// Status of the last response; `None` when the attempt produced no response.
    pub status: Option<u16>,
    /// Message of the last error, for logging and callbacks.
    pub last_error: Option<String>,
    /// Retries performed so far.
    pub count: u32,
    pub location_mode: LocationMode,
    pub is_emulated: bool,
}

impl RetryContext {
    pub fn new(request: StorageRequest, location_mode: LocationMode, is_emulated: bool) -> Self {
        RetryContext {
            request,
            status: None,
            last_error: None,
            count: 0,
            location_mode,
            is_emulated,
        }
    }
}

pub trait RetryPolicy: Send + Sync + fmt::Debug {
    /// Decide whether to retry; `Some(delay)` means sleep then send again.
    fn retry(&self, context: &mut RetryContext) -> Option<Duration>;
}

/// Decision rules shared by the backoff policies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub retry_to_secondary: bool,
}

impl RetrySettings {
    pub fn should_retry(&self, context: &RetryContext) -> bool {
        if context.count >= self.max_attempts {
            return false;
        }
        match context.status {
            // no response at all, e.g. a connection reset
            None => true,
            // the response arrived but its body could not be read or parsed
            Some(200..=299) => true,
            Some(404) => context.location_mode == LocationMode::Secondary,
            Some(408) => true,
            Some(300..=499) => false,
            Some(501) | Some(505) => false,
            Some(_) => true,
        }
    }

    /// Run the shared decision, then compute the backoff and advance the context.
    pub fn retry_with(
        &self,
        context: &mut RetryContext,
        backoff: impl FnOnce(&RetryContext) -> Duration,
    ) -> Option<Duration> {
        if !self.should_retry(context) {
            return None;
        }
        let interval = backoff(context);
        context.count += 1;
        if self.retry_to_secondary {
            set_next_host_location(context);
        }
        Some(interval)
    }
}

/// Move the request to the other location, if it has one.
pub fn set_next_host_location(context: &mut RetryContext) {
    if context.request.host_locations.len() < 2 {
        return;
    }
    let next = context.location_mode.other();
    context.location_mode = next;

    if context.is_emulated {
        // the emulator addresses the secondary by account name in the path
        let path = &context.request.path;
        context.request.path = match next {
            LocationMode::Secondary => {
                let account = path.split('/').nth(1).unwrap_or_default().to_string();
                path.replacen(&account, &format!("{account}{SECONDARY_SUFFIX}"), 1)
            }
            LocationMode::Primary => path.replacen(SECONDARY_SUFFIX, "", 1),
        };
    } else if let Some(host) = context.request.host_locations.get(next) {
        context.request.host = host.to_string();
    }
}

/// Uniform draw in `[max(backoff - jitter, 0), backoff + jitter]` seconds.
///
/// Both inputs are clamped to `[0, MAX_BACKOFF_SECS]` first.
fn jittered(backoff: f64, jitter: f64) -> Duration {
    let backoff = backoff.min(MAX_BACKOFF_SECS).max(0.0);
    let jitter = jitter.min(MAX_BACKOFF_SECS).max(0.0);
    let start = if backoff > jitter { backoff - jitter } else { 0.0 };
    let end = backoff + jitter;
    let secs = if end > start {
        rand::thread_rng().gen_range(start..=end)
    } else {
        start
    };
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

/// Backoff of `initial + base^count` seconds (no exponent on the first retry).
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialRetry {
    pub initial_backoff: f64,
    pub increment_base: f64,
    pub random_jitter_range: f64,
    pub settings: RetrySettings,
}

impl Default for ExponentialRetry {
    fn default() -> Self {
        ExponentialRetry {
            initial_backoff: 15.0,
            increment_base: 3.0,
            random_jitter_range: 3.0,
            settings: RetrySettings {
                max_attempts: 3,
                retry_to_secondary: false,
            },
        }
    }
}

impl ExponentialRetry {
    pub fn backoff_seconds(&self, count: u32) -> f64 {
        if count == 0 {
            self.initial_backoff
        } else {
            self.initial_backoff + self.increment_base.powi(count as i32)
        }
    }
}

impl RetryPolicy for ExponentialRetry {
    fn retry(&self, context: &mut RetryContext) -> Option<Duration> {
        self.settings.retry_with(context, |ctx| {
            jittered(self.backoff_seconds(ctx.count), self.random_jitter_range)
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearRetry {
    pub backoff: f64,
    pub random_jitter_range: f64,
    pub settings: RetrySettings,
}

impl Default for LinearRetry {
    fn default() -> Self {
        LinearRetry {
            backoff: 15.0,
            random_jitter_range: 3.0,
            settings: RetrySettings {
                max_attempts: 3,
                retry_to_secondary: false,
            },
        }
    }
}

impl RetryPolicy for LinearRetry {
    fn retry(&self, context: &mut RetryContext) -> Option<Duration> {
        self.settings
            .retry_with(context, |_| jittered(self.backoff, self.random_jitter_range))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetry;

impl RetryPolicy for NoRetry {
    fn retry(&self, _context: &mut RetryContext) -> Option<Duration> {
        None
    }
}
