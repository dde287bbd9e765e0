//! preemptive round-robin scheduling

use log::{debug, info};
use std::io::Result;

use crate::events::EventLog;
use crate::orchestrator::{DispatchOutcome, Execute};
use crate::sched::{next_arrival_ms, reap_survivors, sort_by_arrival, Scheduler};
use crate::task::Task;

/// Preemptive scheduling with one fixed quantum for every task.
///
/// Tasks are scanned in arrival order; each eligible one gets a slice of
/// `min(remaining, quantum)` per pass. Arrival eligibility is judged
/// against the clock at the start of the pass. When a whole pass finds
/// nothing eligible the simulated clock jumps to the next arrival without
/// idling in real time, unlike FCFS/SJF.
pub struct RoundRobin {
    pub quantum_ms: u64,
}

impl RoundRobin {
    pub fn new(quantum_ms: u64) -> Self {
        RoundRobin { quantum_ms }
    }
}

impl Scheduler for RoundRobin {
    fn name(&self) -> &'static str {
        "RR"
    }

    fn run(
        &mut self,
        tasks: &mut [Task],
        exec: &mut dyn Execute,
        log: &mut EventLog,
    ) -> Result<()> {
        sort_by_arrival(tasks);
        let quantum = self.quantum_ms as f64;

        let mut clock_ms = 0.0;
        while !tasks.iter().all(Task::is_exited) {
            let pass_clock = clock_ms;
            let mut progressed = false;

            for i in 0..tasks.len() {
                if tasks[i].is_exited() || !tasks[i].arrived_by(pass_clock) {
                    continue;
                }
                if tasks[i].remaining_ms <= 0.0 {
                    // bookkeeping exhausted but the exit was never observed;
                    // reap the straggler instead of dispatching a zero slice
                    exec.terminate(&mut tasks[i]);
                    tasks[i].remaining_ms = 0.0;
                    tasks[i].completion_ms = clock_ms;
                    continue;
                }

                progressed = true;
                let slice = tasks[i].remaining_ms.min(quantum);
                debug!(
                    "dispatching {} for {:.2} ms at {:.2} ({:.2} ms left)",
                    tasks[i].name, slice, clock_ms, tasks[i].remaining_ms
                );

                let start = clock_ms;
                let res = match exec.dispatch(&mut tasks[i], slice, true) {
                    Ok(res) => res,
                    Err(err) => {
                        // stopped children must not outlive a failed run
                        reap_survivors(tasks, exec);
                        return Err(err);
                    }
                };
                let used = res.elapsed_ms.min(slice);
                clock_ms += used;
                tasks[i].remaining_ms -= used;
                log.record(tasks[i].workload.kind(), &tasks[i].name, start, clock_ms);

                if res.outcome == DispatchOutcome::Exited {
                    tasks[i].remaining_ms = 0.0;
                    tasks[i].completion_ms = clock_ms;
                    info!("completed {} at {:.2} ms", tasks[i].name, clock_ms);
                }
            }

            if !progressed {
                match next_arrival_ms(tasks, clock_ms) {
                    // jump straight to the next arrival, no real-time idle
                    Some(next) => clock_ms = next,
                    None => break,
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sched::testing::{completion_of, task, FakeExec};

    #[test]
    fn interleaves_slices_and_completes_in_expected_order() {
        // P1 arrival 0 burst 5, P2 arrival 0 burst 3, P3 arrival 2 burst 3,
        // quantum 2
        let mut tasks = vec![task("P1", 0.0, 5.0), task("P2", 0.0, 3.0), task("P3", 2.0, 3.0)];
        let mut exec = FakeExec::default();
        let mut log = EventLog::new();

        RoundRobin::new(2).run(&mut tasks, &mut exec, &mut log).unwrap();

        let segments: Vec<(String, f64, f64)> = log
            .events()
            .iter()
            .map(|e| (e.name.clone(), e.start_ms, e.end_ms))
            .collect();
        assert_eq!(
            segments,
            vec![
                ("P1".to_string(), 0.0, 2.0),
                ("P2".to_string(), 2.0, 4.0),
                ("P1".to_string(), 4.0, 6.0),
                ("P2".to_string(), 6.0, 7.0),
                ("P3".to_string(), 7.0, 9.0),
                ("P1".to_string(), 9.0, 10.0),
                ("P3".to_string(), 10.0, 11.0),
            ]
        );
        assert_eq!(completion_of(&tasks, "P2"), 7.0);
        assert_eq!(completion_of(&tasks, "P1"), 10.0);
        assert_eq!(completion_of(&tasks, "P3"), 11.0);
    }

    #[test]
    fn no_segment_exceeds_the_quantum() {
        let mut tasks = vec![task("P1", 0.0, 7.0), task("P2", 0.0, 4.0)];
        let mut exec = FakeExec::default();
        let mut log = EventLog::new();

        RoundRobin::new(3).run(&mut tasks, &mut exec, &mut log).unwrap();

        for event in log.events() {
            assert!(event.end_ms - event.start_ms <= 3.0 + 1e-9);
        }
    }

    #[test]
    fn slice_durations_sum_to_each_burst() {
        let mut tasks = vec![task("P1", 0.0, 5.0), task("P2", 1.0, 6.0), task("P3", 2.0, 2.0)];
        let mut exec = FakeExec::default();
        let mut log = EventLog::new();

        RoundRobin::new(2).run(&mut tasks, &mut exec, &mut log).unwrap();

        for t in tasks.iter() {
            let total: f64 = log
                .events()
                .iter()
                .filter(|e| e.name == t.name)
                .map(|e| e.end_ms - e.start_ms)
                .sum();
            assert!((total - t.burst_ms).abs() < 1e-9, "{}: {} != {}", t.name, total, t.burst_ms);
            assert_eq!(t.remaining_ms, 0.0);
            assert!(t.is_exited());
        }
    }

    #[test]
    fn jumps_clock_to_next_arrival_without_idling() {
        let mut tasks = vec![task("P1", 0.0, 2.0), task("P2", 10.0, 2.0)];
        let mut exec = FakeExec::default();
        let mut log = EventLog::new();

        RoundRobin::new(4).run(&mut tasks, &mut exec, &mut log).unwrap();

        // the gap between 2 and 10 is skipped, not slept
        assert!(exec.idled_ms.is_empty());
        assert_eq!(completion_of(&tasks, "P2"), 12.0);
        assert_eq!(log.events()[1].start_ms, 10.0);
    }

    #[test]
    fn dispatch_failure_reaps_stopped_children() {
        let mut tasks = vec![task("P1", 0.0, 6.0), task("P2", 0.0, 4.0)];
        let mut exec = FakeExec::default();
        exec.fail_task = Some("P2".to_string());
        let mut log = EventLog::new();

        let res = RoundRobin::new(2).run(&mut tasks, &mut exec, &mut log);
        assert!(res.is_err());
        // P1 was left stopped after its first slice and must not outlive
        // the failed run; P2 never spawned, so there is nothing to reap
        assert_eq!(exec.terminated, vec!["P1".to_string()]);
    }

    #[test]
    fn remaining_time_never_goes_negative() {
        let mut tasks = vec![task("P1", 0.0, 5.0)];
        let mut exec = FakeExec::default();
        let mut log = EventLog::new();

        RoundRobin::new(2).run(&mut tasks, &mut exec, &mut log).unwrap();
        assert_eq!(tasks[0].remaining_ms, 0.0);
        assert_eq!(tasks[0].completion_ms, 5.0);
    }
}
