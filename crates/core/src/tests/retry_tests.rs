// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tests for the retry attempt limit.

use crate::RetryPolicy;

#[test]
fn test_unlimited_policy_always_allows_attempts() {
    let policy: RetryPolicy = RetryPolicy::new(None);

    assert!(policy.should_attempt(0));
    assert!(policy.should_attempt(1_000));
    assert!(!policy.is_exhausted(1_000));
}

#[test]
fn test_below_limit_allows_attempt() {
    let policy: RetryPolicy = RetryPolicy::new(Some(3));

    assert!(policy.should_attempt(0));
    assert!(policy.should_attempt(2));
    assert!(!policy.is_exhausted(2));
}

#[test]
fn test_at_limit_is_exhausted() {
    let policy: RetryPolicy = RetryPolicy::new(Some(3));

    assert!(!policy.should_attempt(3));
    assert!(policy.is_exhausted(3));
}

#[test]
fn test_above_limit_is_exhausted() {
    let policy: RetryPolicy = RetryPolicy::new(Some(3));

    assert!(!policy.should_attempt(4));
    assert!(policy.is_exhausted(4));
}

#[test]
fn test_default_policy_has_no_limit() {
    let policy: RetryPolicy = RetryPolicy::default();

    assert_eq!(policy.max_attempts, None);
}
