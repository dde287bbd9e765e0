//! shortest-job-first scheduling, non-preemptive

use log::info;
use std::io::Result;

use crate::events::EventLog;
use crate::orchestrator::Execute;
use crate::sched::{next_arrival_ms, reap_survivors, run_to_completion, sort_by_arrival, Scheduler};
use crate::task::Task;

/// Among arrived, unfinished tasks always picks the one with the smallest
/// measured burst (lowest index on ties) and runs it to completion. A task
/// arriving later with a shorter burst never preempts a running one.
pub struct Sjf;

impl Sjf {
    fn shortest_eligible(tasks: &[Task], clock_ms: f64) -> Option<usize> {
        let mut shortest: Option<usize> = None;
        for (i, task) in tasks.iter().enumerate() {
            if task.is_exited() || !task.arrived_by(clock_ms) {
                continue;
            }
            // strict less-than keeps the first-scanned task on ties
            match shortest {
                Some(j) if tasks[j].burst_ms <= task.burst_ms => {}
                _ => shortest = Some(i),
            }
        }
        shortest
    }
}

impl Scheduler for Sjf {
    fn name(&self) -> &'static str {
        "SJF"
    }

    fn run(
        &mut self,
        tasks: &mut [Task],
        exec: &mut dyn Execute,
        log: &mut EventLog,
    ) -> Result<()> {
        sort_by_arrival(tasks);

        let mut clock_ms = 0.0;
        let mut completed = 0;
        while completed < tasks.len() {
            match Self::shortest_eligible(tasks, clock_ms) {
                Some(i) => {
                    if let Err(err) = run_to_completion(&mut tasks[i], &mut clock_ms, exec, log) {
                        reap_survivors(tasks, exec);
                        return Err(err);
                    }
                    completed += 1;
                }
                None => match next_arrival_ms(tasks, clock_ms) {
                    Some(next) => {
                        let gap = next - clock_ms;
                        info!("no eligible task, idling {:.2} ms", gap);
                        exec.idle(gap);
                        clock_ms = next;
                    }
                    None => break,
                },
            }
        }
        Ok(())
    }
}
