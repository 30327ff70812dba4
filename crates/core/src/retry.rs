// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use rollcall_domain::MonthId;

/// Configured limit on delivery attempts per failed message.
///
/// The limit comes from deployment configuration, not from the registry
/// itself. A message at the limit is skipped by retry passes and surfaced
/// as exhausted; it is never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum delivery attempts per message, or `None` for no limit.
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// Creates a policy with the given attempt limit.
    #[must_use]
    pub const fn new(max_attempts: Option<u32>) -> Self {
        Self { max_attempts }
    }

    /// Whether one more delivery attempt is allowed after `attempts` so far.
    #[must_use]
    pub const fn should_attempt(&self, attempts: u32) -> bool {
        match self.max_attempts {
            None => true,
            Some(max) => attempts < max,
        }
    }

    /// Whether a message with `attempts` recorded attempts is out of retries.
    #[must_use]
    pub const fn is_exhausted(&self, attempts: u32) -> bool {
        !self.should_attempt(attempts)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Summary of one retry pass over the failed message registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrySummary {
    /// The month whose registry entries were considered.
    pub month: MonthId,
    /// Number of messages the pass tried to deliver again.
    pub attempted: usize,
    /// Number of messages delivered this pass and marked resolved.
    pub resolved: usize,
    /// Number of messages that failed again and stay in the registry.
    pub still_failing: usize,
    /// Number of messages skipped because their attempts reached the limit.
    pub exhausted: usize,
}
