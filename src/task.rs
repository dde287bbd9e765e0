//! process descriptors and lifecycle state

use nix::unistd::Pid;
use std::sync::Arc;

use crate::workload::Workload;

/// Lifecycle of the OS process behind a task.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TaskState {
    /// never spawned
    Ready,
    /// owns the virtual processor right now
    Running,
    /// stopped, waiting to be resumed
    Stopped,
    /// underlying process exited
    Exited,
}

/// One simulated task: a workload plus its scheduling bookkeeping.
///
/// A scheduling run operates on an independent clone of the original set,
/// so policy runs never see each other's bookkeeping.
pub struct Task {
    pub name: String,
    pub workload: Arc<dyn Workload>,
    /// simulated arrival time, caller-supplied
    pub arrival_ms: f64,
    /// measured service requirement, set once by the profiler
    pub burst_ms: f64,
    /// decremented by Round Robin only
    pub remaining_ms: f64,
    /// set exactly once, when the underlying process exit is observed
    pub completion_ms: f64,
    pub pid: Option<Pid>,
    pub state: TaskState,
}

impl Clone for Task {
    fn clone(&self) -> Self {
        Task {
            name: self.name.clone(),
            workload: Arc::clone(&self.workload),
            arrival_ms: self.arrival_ms,
            burst_ms: self.burst_ms,
            remaining_ms: self.remaining_ms,
            completion_ms: self.completion_ms,
            pid: self.pid,
            state: self.state,
        }
    }
}

impl Task {
    pub fn new(name: String, workload: Arc<dyn Workload>, arrival_ms: f64) -> Self {
        Task {
            name,
            workload,
            arrival_ms,
            burst_ms: 0.0,
            remaining_ms: 0.0,
            completion_ms: 0.0,
            pid: None,
            state: TaskState::Ready,
        }
    }

    /// record the measured burst; the full amount is still outstanding
    pub fn set_burst(&mut self, burst_ms: f64) {
        self.burst_ms = burst_ms;
        self.remaining_ms = burst_ms;
    }

    pub fn is_exited(&self) -> bool {
        self.state == TaskState::Exited
    }

    pub fn arrived_by(&self, clock_ms: f64) -> bool {
        self.arrival_ms <= clock_ms
    }

    pub fn turnaround_ms(&self) -> f64 {
        self.completion_ms - self.arrival_ms
    }

    /// clamped for reporting: measurement jitter can push it slightly negative
    pub fn waiting_ms(&self) -> f64 {
        (self.turnaround_ms() - self.burst_ms).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workload;

    fn task(arrival: f64, burst: f64) -> Task {
        let mut t = Task::new(
            "P1".to_string(),
            workload::from_name("compute").unwrap(),
            arrival,
        );
        t.set_burst(burst);
        t
    }

    #[test]
    fn turnaround_is_completion_minus_arrival() {
        let mut t = task(5.0, 10.0);
        t.completion_ms = 25.0;
        assert_eq!(t.turnaround_ms(), 20.0);
        assert_eq!(t.waiting_ms(), 10.0);
    }

    #[test]
    fn waiting_time_clamps_to_zero() {
        let mut t = task(0.0, 10.0);
        // jitter: completed marginally before arrival + burst
        t.completion_ms = 9.5;
        assert_eq!(t.waiting_ms(), 0.0);
    }

    #[test]
    fn set_burst_fills_remaining() {
        let t = task(0.0, 42.0);
        assert_eq!(t.burst_ms, 42.0);
        assert_eq!(t.remaining_ms, 42.0);
        assert_eq!(t.state, TaskState::Ready);
        assert!(t.pid.is_none());
    }

    #[test]
    fn clones_are_independent() {
        let mut a = task(0.0, 10.0);
        let mut b = a.clone();
        b.remaining_ms = 3.0;
        b.state = TaskState::Exited;
        a.completion_ms = 7.0;
        assert_eq!(a.remaining_ms, 10.0);
        assert_eq!(a.state, TaskState::Ready);
        assert_eq!(b.completion_ms, 0.0);
    }
}
