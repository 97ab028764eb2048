//! # Tasks — Cooperative Per-Frame Work
//!
//! A [`Task`] is polled once per frame until it reports [`TaskStatus::Done`],
//! then it is dropped in the same tick. Nothing is preemptible; a task that
//! never finishes runs until someone calls [`TaskScheduler::stop`] with its
//! handle.
//!
//! ```text
//! frame N:   tick → poll A (Pending)   poll B (Done → dropped)
//! frame N+1: tick → poll A (Done → dropped)
//! ```
//!
//! Building blocks:
//!
//! - [`WaitSeconds`]: finishes once the given time has passed since its first
//!   poll.
//! - [`from_fn`]: any closure of the frame clock.
//! - [`Sequence`]: runs steps one after another. When a step finishes, the
//!   next one is polled in the same tick.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use crate::time::Time;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Done,
}

pub trait Task {
    fn poll(&mut self, time: &Time) -> TaskStatus;
}

/// Identifies a running task. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

#[derive(Default)]
pub struct TaskScheduler {
    tasks: BTreeMap<TaskHandle, Box<dyn Task>>,
    last: u64,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, task: impl Task + 'static) -> TaskHandle {
        self.last += 1;
        let handle = TaskHandle(self.last);
        self.tasks.insert(handle, Box::new(task));
        handle
    }

    /// Drop a task before it finishes. Returns `false` if it already finished
    /// or was stopped.
    pub fn stop(&mut self, handle: TaskHandle) -> bool {
        self.tasks.remove(&handle).is_some()
    }

    pub fn is_running(&self, handle: TaskHandle) -> bool {
        self.tasks.contains_key(&handle)
    }

    /// Poll every task once, in start order.
    pub fn tick(&mut self, time: &Time) {
        self.tasks
            .retain(|_, task| task.poll(time) == TaskStatus::Pending);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}

// ── Building blocks ─────────────────────────────────────────────────────

/// Finishes once `duration` has elapsed since the first poll.
#[derive(Debug, Clone)]
pub struct WaitSeconds {
    duration: Duration,
    started: Option<Duration>,
}

impl WaitSeconds {
    pub fn new(seconds: f32) -> Self {
        Self {
            duration: Duration::from_secs_f32(seconds.max(0.0)),
            started: None,
        }
    }

    pub fn from_duration(duration: Duration) -> Self {
        Self {
            duration,
            started: None,
        }
    }
}

impl Task for WaitSeconds {
    fn poll(&mut self, time: &Time) -> TaskStatus {
        let started = *self.started.get_or_insert(time.elapsed());
        if time.elapsed().saturating_sub(started) >= self.duration {
            TaskStatus::Done
        } else {
            TaskStatus::Pending
        }
    }
}

pub struct FnTask<F>(F);

impl<F: FnMut(&Time) -> TaskStatus> Task for FnTask<F> {
    fn poll(&mut self, time: &Time) -> TaskStatus {
        (self.0)(time)
    }
}

/// A task driven by a closure.
pub fn from_fn<F: FnMut(&Time) -> TaskStatus>(f: F) -> FnTask<F> {
    FnTask(f)
}

/// Steps that run one after another.
#[derive(Default)]
pub struct Sequence {
    steps: VecDeque<Box<dyn Task>>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, step: impl Task + 'static) -> Self {
        self.steps.push_back(Box::new(step));
        self
    }

    /// Builder: run `f` once, then continue with the next step.
    pub fn then_do(self, mut f: impl FnMut() + 'static) -> Self {
        self.then(from_fn(move |_| {
            f();
            TaskStatus::Done
        }))
    }

    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

impl Task for Sequence {
    fn poll(&mut self, time: &Time) -> TaskStatus {
        while let Some(step) = self.steps.front_mut() {
            if step.poll(time) == TaskStatus::Pending {
                return TaskStatus::Pending;
            }
            self.steps.pop_front();
        }
        TaskStatus::Done
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    fn step(time: &mut Time, scheduler: &mut TaskScheduler, ms: u64) {
        time.advance(Duration::from_millis(ms));
        scheduler.tick(time);
    }

    #[test]
    fn wait_is_dropped_on_the_frame_it_completes() {
        let mut time = Time::new();
        let mut scheduler = TaskScheduler::new();
        let handle = scheduler.start(WaitSeconds::new(1.0));

        step(&mut time, &mut scheduler, 500);
        step(&mut time, &mut scheduler, 500);
        assert!(scheduler.is_running(handle));

        step(&mut time, &mut scheduler, 500);
        assert!(!scheduler.is_running(handle));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn stop_by_handle() {
        let mut scheduler = TaskScheduler::new();
        let a = scheduler.start(WaitSeconds::new(10.0));
        let b = scheduler.start(WaitSeconds::new(10.0));
        assert_ne!(a, b);

        assert!(scheduler.stop(a));
        assert!(!scheduler.stop(a));
        assert!(scheduler.is_running(b));
    }

    #[test]
    fn sequence_continues_in_the_same_tick() {
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let mut time = Time::new();
        let mut scheduler = TaskScheduler::new();
        scheduler.start(
            Sequence::new()
                .then_do(move || counter.set(counter.get() + 1))
                .then(WaitSeconds::new(0.25))
                .then_do({
                    let hits = hits.clone();
                    move || hits.set(hits.get() + 10)
                }),
        );

        step(&mut time, &mut scheduler, 125);
        assert_eq!(hits.get(), 1);

        step(&mut time, &mut scheduler, 125);
        assert_eq!(hits.get(), 1);

        step(&mut time, &mut scheduler, 125);
        assert_eq!(hits.get(), 11);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn closure_tasks_see_the_clock() {
        let mut time = Time::new();
        let mut scheduler = TaskScheduler::new();
        let handle = scheduler.start(from_fn(|t: &Time| {
            if t.frame_count() >= 3 {
                TaskStatus::Done
            } else {
                TaskStatus::Pending
            }
        }));

        step(&mut time, &mut scheduler, 16);
        step(&mut time, &mut scheduler, 16);
        assert!(scheduler.is_running(handle));
        step(&mut time, &mut scheduler, 16);
        assert!(!scheduler.is_running(handle));
    }
}
