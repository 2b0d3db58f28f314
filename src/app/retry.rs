use std::cell::Cell;
use std::rc::Rc;

/// Shared cancellation flag; cancelling is idempotent.
#[derive(Clone, Debug, Default)]
pub(in crate::app) struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub(in crate::app) fn cancel(&self) {
        self.0.set(true);
    }

    pub(in crate::app) fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

#[derive(Debug, PartialEq)]
pub(in crate::app) enum RetryPoll<T> {
    Ready(T),
    Waiting,
    Exhausted,
    Cancelled,
}

/// Polls an attempt at a fixed interval until it yields a value, the budget
/// of attempts runs out, or the token is cancelled. The first attempt is due
/// immediately.
#[derive(Debug)]
pub(in crate::app) struct BoundedRetry {
    max_attempts: u32,
    interval: f64,
    attempts: u32,
    next_due: f64,
    token: CancelToken,
}

impl BoundedRetry {
    pub(in crate::app) fn new(max_attempts: u32, interval: f64, now: f64) -> Self {
        Self {
            max_attempts,
            interval,
            attempts: 0,
            next_due: now,
            token: CancelToken::default(),
        }
    }

    /// Handle that cancels this retry from outside its owner.
    pub(in crate::app) fn token(&self) -> CancelToken {
        self.token.clone()
    }

    pub(in crate::app) fn cancel(&self) {
        self.token.cancel();
    }

    pub(in crate::app) fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub(in crate::app) fn attempts(&self) -> u32 {
        self.attempts
    }

    pub(in crate::app) fn poll<T>(
        &mut self,
        now: f64,
        attempt: impl FnOnce() -> Option<T>,
    ) -> RetryPoll<T> {
        if self.token.is_cancelled() {
            return RetryPoll::Cancelled;
        }
        if self.attempts >= self.max_attempts {
            return RetryPoll::Exhausted;
        }
        if now < self.next_due {
            return RetryPoll::Waiting;
        }

        self.attempts += 1;
        if let Some(value) = attempt() {
            return RetryPoll::Ready(value);
        }

        self.next_due = now + self.interval;
        if self.attempts >= self.max_attempts {
            RetryPoll::Exhausted
        } else {
            RetryPoll::Waiting
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn succeeds_on_the_kth_attempt() {
        let mut retry = BoundedRetry::new(10, 0.2, 0.0);
        let mut calls = 0;
        let mut now = 0.0;
        let result = loop {
            match retry.poll(now, || {
                calls += 1;
                (calls == 3).then_some("placed")
            }) {
                RetryPoll::Waiting => now += 0.05,
                other => break other,
            }
        };

        assert_eq!(result, RetryPoll::Ready("placed"));
        assert_eq!(retry.attempts(), 3);
        assert!(now >= 0.4 - 1e-9);
    }

    #[test]
    fn never_converging_attempt_exhausts_the_budget() {
        let mut retry = BoundedRetry::new(4, 0.25, 1.0);
        let mut now = 1.0;
        let mut polls = 0;
        loop {
            match retry.poll::<()>(now, || None) {
                RetryPoll::Waiting => now += 0.25,
                RetryPoll::Exhausted => break,
                other => panic!("unexpected {other:?}"),
            }
            polls += 1;
            assert!(polls < 100);
        }

        assert_eq!(retry.attempts(), 4);
        assert_eq!(retry.poll::<()>(now + 10.0, || Some(())), RetryPoll::Exhausted);
    }

    #[test]
    fn waits_for_the_interval_between_attempts() {
        let mut retry = BoundedRetry::new(3, 0.2, 0.0);

        assert_eq!(retry.poll::<()>(0.0, || None), RetryPoll::Waiting);
        assert_eq!(retry.poll(0.1, || Some(1)), RetryPoll::Waiting);
        assert_eq!(retry.attempts(), 1);
        assert_eq!(retry.poll(0.2, || Some(1)), RetryPoll::Ready(1));
    }

    #[test]
    fn cancellation_is_idempotent_and_stops_attempts() {
        let mut retry = BoundedRetry::new(3, 0.2, 0.0);
        let token = retry.token();

        token.cancel();
        token.cancel();
        retry.cancel();

        assert!(retry.is_cancelled());
        assert_eq!(retry.poll(0.0, || Some(1)), RetryPoll::Cancelled);
        assert_eq!(retry.attempts(), 0);
    }
}
