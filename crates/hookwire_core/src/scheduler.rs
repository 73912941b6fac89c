// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cooperative runner for deferred call results.
//!
//! Tasks are polled once per [`Scheduler::tick`], in spawn order, with a no-op
//! waker. A task spawned during a tick (or between ticks) is first polled on
//! the following tick, never synchronously by the code that spawned it.

use futures::future::LocalBoxFuture;
use futures::task::noop_waker_ref;
use futures::FutureExt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Identifier of a spawned task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

struct Task {
    id: TaskId,
    future: LocalBoxFuture<'static, ()>,
}

/// Single-threaded task runner driven by the host's tick
#[derive(Default)]
pub struct Scheduler {
    tasks: Vec<Task>,
    next_id: u64,
    ticks: u64,
}

impl Scheduler {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a task; it is first polled on the next tick
    pub fn spawn(&mut self, future: LocalBoxFuture<'static, ()>) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(Task { id, future });
        tracing::trace!(task = id.0, "spawned deferred task");
        id
    }

    /// Poll every task once and drop the finished ones. Returns how many finished.
    pub fn tick(&mut self) -> usize {
        self.ticks += 1;
        let mut cx = Context::from_waker(noop_waker_ref());
        let before = self.tasks.len();
        self.tasks.retain_mut(|task| match task.future.poll_unpin(&mut cx) {
            Poll::Ready(()) => {
                tracing::trace!(task = task.id.0, "deferred task finished");
                false
            }
            Poll::Pending => true,
        });
        before - self.tasks.len()
    }

    /// Number of unfinished tasks
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no task is waiting
    pub fn is_idle(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Whether a task is still running
    pub fn is_running(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }

    /// Drop every task without finishing it
    pub fn clear(&mut self) {
        if !self.tasks.is_empty() {
            tracing::debug!(dropped = self.tasks.len(), "cleared deferred tasks");
        }
        self.tasks.clear();
    }

    /// Number of ticks run so far
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.tasks.len())
            .field("ticks", &self.ticks)
            .finish()
    }
}

/// Future that yields to the scheduler for exactly one tick
#[derive(Debug, Default)]
pub struct NextTick {
    yielded: bool,
}

impl Future for NextTick {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            Poll::Ready(())
        } else {
            self.yielded = true;
            Poll::Pending
        }
    }
}

/// Wait until the next scheduler tick
pub fn next_tick() -> NextTick {
    NextTick::default()
}
