//! first-come-first-served scheduling

use log::info;
use std::io::Result;

use crate::events::EventLog;
use crate::orchestrator::Execute;
use crate::sched::{reap_survivors, run_to_completion, sort_by_arrival, Scheduler};
use crate::task::Task;

/// Dispatches tasks in arrival order, each for its full measured burst.
/// The scheduler idles in real time while waiting on a future arrival so
/// simulated and wall time stay aligned.
pub struct Fcfs;

impl Scheduler for Fcfs {
    fn name(&self) -> &'static str {
        "FCFS"
    }

    fn run(
        &mut self,
        tasks: &mut [Task],
        exec: &mut dyn Execute,
        log: &mut EventLog,
    ) -> Result<()> {
        sort_by_arrival(tasks);

        let mut clock_ms = 0.0;
        for i in 0..tasks.len() {
            if clock_ms < tasks[i].arrival_ms {
                let gap = tasks[i].arrival_ms - clock_ms;
                info!("idling {:.2} ms until {} arrives", gap, tasks[i].name);
                exec.idle(gap);
                clock_ms = tasks[i].arrival_ms;
            }
            if let Err(err) = run_to_completion(&mut tasks[i], &mut clock_ms, exec, log) {
                reap_survivors(tasks, exec);
                return Err(err);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sched::testing::{completion_of, segment_names, task, FakeExec};

    #[test]
    fn dispatches_in_arrival_order_without_preemption() {
        let mut tasks = vec![task("P2", 5.0, 5.0), task("P1", 0.0, 10.0)];
        let mut exec = FakeExec::default();
        let mut log = EventLog::new();

        Fcfs.run(&mut tasks, &mut exec, &mut log).unwrap();

        // P1 runs 0-10; P2 arrived at 5 but waits until 10, completes at 15
        assert_eq!(segment_names(&log), vec!["P1", "P2"]);
        assert_eq!(completion_of(&tasks, "P1"), 10.0);
        assert_eq!(completion_of(&tasks, "P2"), 15.0);
        let p2 = tasks.iter().find(|t| t.name == "P2").unwrap();
        assert_eq!(p2.turnaround_ms(), 10.0);
        assert_eq!(p2.waiting_ms(), 5.0);
        // no idling happened: P2 had already arrived when P1 finished
        assert!(exec.idled_ms.is_empty());
    }

    #[test]
    fn stopped_non_preemptive_dispatch_aborts_the_run() {
        let mut tasks = vec![task("P1", 0.0, 4.0), task("P2", 0.0, 2.0)];
        let mut exec = FakeExec::default();
        exec.stop_task = Some("P1".to_string());
        let mut log = EventLog::new();

        let res = Fcfs.run(&mut tasks, &mut exec, &mut log);
        assert!(res.is_err());
        // nothing after the failed dispatch runs, and the stopped child
        // was reaped exactly once
        assert_eq!(exec.dispatched, vec!["P1".to_string()]);
        assert_eq!(exec.terminated, vec!["P1".to_string()]);
        assert!(log.is_empty());
    }

    #[test]
    fn idles_until_a_late_arrival() {
        let mut tasks = vec![task("P1", 0.0, 4.0), task("P2", 10.0, 2.0)];
        let mut exec = FakeExec::default();
        let mut log = EventLog::new();

        Fcfs.run(&mut tasks, &mut exec, &mut log).unwrap();

        // the scheduler slept the 6 ms gap in real time
        assert_eq!(exec.idled_ms, vec![6.0]);
        assert_eq!(completion_of(&tasks, "P2"), 12.0);
        let p2 = tasks.iter().find(|t| t.name == "P2").unwrap();
        assert_eq!(p2.waiting_ms(), 0.0);
        // no segment starts before its task's arrival
        for (event, t) in log.events().iter().zip(tasks.iter()) {
            assert!(event.start_ms >= t.arrival_ms);
        }
    }
}
