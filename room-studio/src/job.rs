use std::task::{Context, Poll, Waker};

use futures::future::BoxFuture;

/// A background computation polled once per frame from the UI thread.
///
/// Work runs on plain threads that resolve a oneshot channel; polling with a
/// no-op waker is sufficient because the next frame polls again (the app
/// schedules a repaint while jobs are in flight).
pub enum Job<T> {
    Running(BoxFuture<'static, T>),
    Taken,
}

impl<T> Job<T> {
    pub fn new(fut: BoxFuture<'static, T>) -> Self {
        Self::Running(fut)
    }

    /// Returns the result exactly once when the future has resolved, `None`
    /// while still pending or after the result was taken.
    pub fn poll_take(&mut self) -> Option<T> {
        let Job::Running(fut) = self else {
            return None;
        };
        let mut cx = Context::from_waker(Waker::noop());
        match fut.as_mut().poll(&mut cx) {
            Poll::Ready(value) => {
                *self = Job::Taken;
                Some(value)
            }
            Poll::Pending => None,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Job::Running(_))
    }
}

/// Like [`Job`], but keeps the result around for repeated borrowing (e.g. an
/// error that stays visible until the next attempt replaces it).
pub enum JobSlot<T> {
    Pending(BoxFuture<'static, T>),
    Done(T),
}

impl<T> JobSlot<T> {
    pub fn new(fut: BoxFuture<'static, T>) -> Self {
        Self::Pending(fut)
    }

    pub fn ready(value: T) -> Self {
        Self::Done(value)
    }

    pub fn get(&mut self) -> Option<&mut T> {
        match self {
            JobSlot::Pending(fut) => {
                let mut cx = Context::from_waker(Waker::noop());
                match fut.as_mut().poll(&mut cx) {
                    Poll::Ready(value) => {
                        *self = JobSlot::Done(value);
                        let JobSlot::Done(value) = self else {
                            unreachable!()
                        };
                        Some(value)
                    }
                    Poll::Pending => None,
                }
            }
            JobSlot::Done(value) => Some(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::FutureExt;

    use super::*;

    #[test]
    fn job_yields_result_once() {
        let mut job = Job::new(std::future::ready(7).boxed());
        assert!(job.is_running());
        assert_eq!(job.poll_take(), Some(7));
        assert!(!job.is_running());
        assert_eq!(job.poll_take(), None);
    }

    #[test]
    fn job_stays_pending_until_resolved() {
        let (tx, rx) = futures::channel::oneshot::channel();
        let mut job = Job::new(async move { rx.await.unwrap_or(0) }.boxed());
        assert_eq!(job.poll_take(), None);
        assert!(job.is_running());
        tx.send(42).unwrap();
        assert_eq!(job.poll_take(), Some(42));
    }

    #[test]
    fn slot_keeps_result_borrowable() {
        let mut slot = JobSlot::new(std::future::ready(String::from("done")).boxed());
        assert_eq!(slot.get().map(|s| s.as_str()), Some("done"));
        assert_eq!(slot.get().map(|s| s.as_str()), Some("done"));
    }

    #[test]
    fn ready_slot_is_immediately_available() {
        let mut slot = JobSlot::ready(3usize);
        assert_eq!(slot.get(), Some(&mut 3));
    }
}
