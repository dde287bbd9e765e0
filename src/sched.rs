//! `Scheduler` trait and shared clock helpers

use log::info;
use std::io::{Error, ErrorKind, Result};

use crate::events::EventLog;
use crate::orchestrator::{DispatchOutcome, Execute};
use crate::task::{Task, TaskState};

/// A scheduling policy driving a task set to completion on the single
/// virtual processor.
pub trait Scheduler {
    fn name(&self) -> &'static str;

    /// Dispatch every task until all have terminated, mutating the
    /// descriptors in place and appending timeline segments to `log`.
    fn run(&mut self, tasks: &mut [Task], exec: &mut dyn Execute, log: &mut EventLog)
        -> Result<()>;
}

/// stable sort by arrival time; ties keep their original order
pub(crate) fn sort_by_arrival(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        a.arrival_ms
            .partial_cmp(&b.arrival_ms)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// earliest arrival strictly after `clock_ms` among unfinished tasks
pub(crate) fn next_arrival_ms(tasks: &[Task], clock_ms: f64) -> Option<f64> {
    tasks
        .iter()
        .filter(|t| !t.is_exited() && t.arrival_ms > clock_ms)
        .map(|t| t.arrival_ms)
        .fold(None, |acc, a| match acc {
            Some(best) if best <= a => Some(best),
            _ => Some(a),
        })
}

/// Non-preemptive dispatch shared by FCFS and SJF: the full measured burst
/// as the budget, one timeline segment spanning the whole run.
pub(crate) fn run_to_completion(
    task: &mut Task,
    clock_ms: &mut f64,
    exec: &mut dyn Execute,
    log: &mut EventLog,
) -> Result<()> {
    info!("starting {} at {:.2} ms", task.name, *clock_ms);
    let start = *clock_ms;
    let res = exec.dispatch(task, task.burst_ms, false)?;
    if res.outcome == DispatchOutcome::Stopped {
        // an external stop (e.g. a terminal signal) is not a completion;
        // reap the child rather than leave it stopped forever
        exec.terminate(task);
        return Err(Error::new(
            ErrorKind::Other,
            format!("{} stopped during a non-preemptive dispatch", task.name),
        ));
    }

    *clock_ms += res.elapsed_ms;
    task.remaining_ms = 0.0;
    task.completion_ms = *clock_ms;
    log.record(task.workload.kind(), &task.name, start, *clock_ms);
    info!("completed {} at {:.2} ms", task.name, *clock_ms);
    Ok(())
}

/// Reap every task whose process is still alive. Called when a run aborts:
/// a `SIGSTOP`ped child cannot observe the cleared run flag, so it would
/// outlive the failed run otherwise.
pub(crate) fn reap_survivors(tasks: &mut [Task], exec: &mut dyn Execute) {
    for task in tasks.iter_mut() {
        if task.state == TaskState::Stopped || task.state == TaskState::Running {
            exec.terminate(task);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::task;
    use super::*;

    #[test]
    fn sort_by_arrival_is_stable_on_ties() {
        let mut tasks = vec![task("P1", 5.0, 1.0), task("P2", 0.0, 1.0), task("P3", 0.0, 1.0)];
        sort_by_arrival(&mut tasks);
        let names: Vec<&str> = tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["P2", "P3", "P1"]);
    }

    #[test]
    fn external_stop_of_a_non_preemptive_dispatch_fails_the_run() {
        let mut t = task("P1", 0.0, 4.0);
        let mut exec = testing::FakeExec::default();
        exec.stop_task = Some("P1".to_string());
        let mut log = EventLog::new();
        let mut clock_ms = 0.0;

        let res = run_to_completion(&mut t, &mut clock_ms, &mut exec, &mut log);
        assert!(res.is_err());
        // the stopped child was reaped, nothing was recorded as completed
        assert_eq!(exec.terminated, vec!["P1".to_string()]);
        assert_eq!(t.completion_ms, 0.0);
        assert!(log.is_empty());
    }

    #[test]
    fn next_arrival_skips_exited_and_past() {
        let mut tasks = vec![task("P1", 0.0, 1.0), task("P2", 4.0, 1.0), task("P3", 9.0, 1.0)];
        tasks[1].state = crate::task::TaskState::Exited;
        assert_eq!(next_arrival_ms(&tasks, 2.0), Some(9.0));
        assert_eq!(next_arrival_ms(&tasks, 9.0), None);
    }
}
