//! Cooperative main-thread task queue
//!
//! The finder never re-enters a scoping run by direct recursion; a timed-out
//! pass posts a zero-delay continuation here and the embedder drains the
//! queue between other main-thread work. Handles allow canceling a queued
//! continuation when a new search starts or a frame is torn down.

use std::collections::VecDeque;

use crate::frame::FrameId;

/// A unit of deferred main-thread work
#[derive(Debug, Clone)]
pub enum Task {
    /// Continue a scoping run in one frame; the frame's finder holds the
    /// query and the resume cursor
    ScopeStringMatches {
        /// Frame to continue scoping in
        frame: FrameId,
    },
}

impl Task {
    /// Frame this task operates on
    pub fn frame(&self) -> FrameId {
        match self {
            Task::ScopeStringMatches { frame, .. } => *frame,
        }
    }
}

/// Handle for canceling a queued task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

/// FIFO queue of pending tasks
#[derive(Debug, Default)]
pub struct TaskQueue {
    next_id: u64,
    tasks: VecDeque<(TaskHandle, Task)>,
}

impl TaskQueue {
    /// An empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a task, returning its cancellation handle
    pub fn post(&mut self, task: Task) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id += 1;
        self.tasks.push_back((handle, task));
        handle
    }

    /// Remove a queued task; returns it if it had not yet run
    pub fn cancel(&mut self, handle: TaskHandle) -> Option<Task> {
        let index = self.tasks.iter().position(|(h, _)| *h == handle)?;
        self.tasks.remove(index).map(|(_, task)| task)
    }

    /// Remove every queued task targeting one frame
    pub fn cancel_for_frame(&mut self, frame: FrameId) -> Vec<Task> {
        let mut canceled = Vec::new();
        self.tasks.retain(|(_, task)| {
            if task.frame() == frame {
                canceled.push(task.clone());
                false
            } else {
                true
            }
        });
        canceled
    }

    /// Pop the oldest queued task
    pub fn take_next(&mut self) -> Option<Task> {
        self.tasks.pop_front().map(|(_, task)| task)
    }

    /// Number of queued tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// True when nothing is queued
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
