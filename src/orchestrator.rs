//! spawns workload processes and drives the suspend/resume protocol

use log::{debug, trace, warn};
use nix::sys::signal::{self, Signal};
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};
use std::io::{Error, ErrorKind, Result};
use std::thread;
use std::time::{Duration, Instant};

use crate::consts;
use crate::control::{ControlBlock, ControlRegion};
use crate::task::{Task, TaskState};
use crate::util::{elapsed_ms, from_nix_error};

/// How a dispatch resolved.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// the workload checkpointed and stopped, waiting for resume
    Stopped,
    /// the underlying process exited
    Exited,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DispatchResult {
    pub outcome: DispatchOutcome,
    /// observed wall time, capped at the requested budget
    pub elapsed_ms: f64,
}

/// Seam between scheduling policies and real process control.
///
/// The production implementation is [`Orchestrator`]; tests substitute a
/// deterministic fake so policy logic can be checked without forking.
pub trait Execute {
    /// Run `task` for at most `budget_ms`. A non-preemptive dispatch blocks
    /// until the process exits (the workload self-terminates at quantum
    /// expiry per its contract); a preemptive one is additionally guarded
    /// by a watchdog `SIGSTOP` at the budget deadline.
    fn dispatch(&mut self, task: &mut Task, budget_ms: f64, preemptive: bool)
        -> Result<DispatchResult>;

    /// idle the scheduler in real time, keeping simulated and wall clocks aligned
    fn idle(&mut self, ms: f64);

    /// Force-stop a task whose bookkeeping exhausted before its real exit
    /// was observed, so a run never leaks stopped children.
    fn terminate(&mut self, task: &mut Task);
}

/// Owns the shared control region for one scheduling run and issues exactly
/// one dispatch at a time: the single-virtual-CPU model.
pub struct Orchestrator {
    region: ControlRegion,
}

impl Orchestrator {
    pub fn new() -> Result<Orchestrator> {
        // allocation failure here is fatal to the whole run
        let region = ControlRegion::new()?;
        region.block().set_run(true);
        Ok(Orchestrator { region })
    }

    pub fn control(&self) -> &ControlBlock {
        self.region.block()
    }

    /// first dispatch of a task forks its workload body
    fn spawn(&self, task: &mut Task) -> Result<()> {
        let ctl = self.region.block();
        // a fresh process starts from offset zero; never touched again
        // while the child is alive
        ctl.set_progress(0);

        match unistd::fork().map_err(from_nix_error)? {
            ForkResult::Child => {
                task.workload.run(ctl);
                std::process::exit(0);
            }
            ForkResult::Parent { child } => {
                trace!("spawned {} as pid {}", task.name, child);
                task.pid = Some(child);
                task.state = TaskState::Running;
                Ok(())
            }
        }
    }

    fn resume(&self, task: &mut Task) -> Result<()> {
        let pid = task_pid(task)?;
        signal::kill(pid, Signal::SIGCONT).map_err(from_nix_error)?;
        task.state = TaskState::Running;
        Ok(())
    }

    /// Poll until the child stops or exits. The watchdog enforces the
    /// budget on preemptive dispatches in case the workload misses its
    /// own checkpoint; there is no overall deadline beyond that.
    fn await_stop_or_exit(
        &self,
        task: &mut Task,
        pid: Pid,
        budget_ms: f64,
        preemptive: bool,
    ) -> Result<DispatchOutcome> {
        let started = Instant::now();
        let mut watchdog_fired = false;

        loop {
            if preemptive && !watchdog_fired && elapsed_ms(started) >= budget_ms {
                debug!("watchdog stopping {} (pid {})", task.name, pid);
                signal::kill(pid, Signal::SIGSTOP).map_err(from_nix_error)?;
                watchdog_fired = true;
            }

            let flags = WaitPidFlag::WNOHANG | WaitPidFlag::WUNTRACED;
            match wait::waitpid(pid, Some(flags)).map_err(from_nix_error)? {
                WaitStatus::StillAlive => {
                    thread::sleep(Duration::from_millis(consts::POLL_INTERVAL_MS));
                }
                WaitStatus::Stopped(_, _) => {
                    task.state = TaskState::Stopped;
                    return Ok(DispatchOutcome::Stopped);
                }
                WaitStatus::Exited(_, _) | WaitStatus::Signaled(_, _, _) => {
                    task.state = TaskState::Exited;
                    return Ok(DispatchOutcome::Exited);
                }
                status => {
                    trace!("ignoring wait status {:?} for {}", status, task.name);
                    thread::sleep(Duration::from_millis(consts::POLL_INTERVAL_MS));
                }
            }
        }
    }
}

impl Execute for Orchestrator {
    fn dispatch(
        &mut self,
        task: &mut Task,
        budget_ms: f64,
        preemptive: bool,
    ) -> Result<DispatchResult> {
        let ctl = self.region.block();
        ctl.set_run(true);
        ctl.set_preemptive(preemptive);
        ctl.set_quantum_ms(budget_ms.ceil() as u64);

        match task.state {
            TaskState::Ready => self.spawn(task)?,
            TaskState::Stopped => self.resume(task)?,
            TaskState::Running | TaskState::Exited => {
                return Err(Error::new(
                    ErrorKind::Other,
                    format!("{} is not dispatchable in state {:?}", task.name, task.state),
                ));
            }
        }

        let pid = task_pid(task)?;
        let started = Instant::now();
        let outcome = self.await_stop_or_exit(task, pid, budget_ms, preemptive)?;
        // OS scheduling jitter can push the observation past the budget;
        // accounting must never overshoot the requested quantum
        let elapsed = elapsed_ms(started).min(budget_ms);

        Ok(DispatchResult {
            outcome,
            elapsed_ms: elapsed,
        })
    }

    fn idle(&mut self, ms: f64) {
        if ms > 0.0 {
            thread::sleep(Duration::from_micros((ms * 1000.0) as u64));
        }
    }

    fn terminate(&mut self, task: &mut Task) {
        if task.state == TaskState::Exited {
            return;
        }
        if let Some(pid) = task.pid {
            warn!("terminating {} (pid {}) past its bookkeeping", task.name, pid);
            let _ = signal::kill(pid, Signal::SIGKILL);
            let _ = wait::waitpid(pid, None);
        }
        task.state = TaskState::Exited;
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.region.block().set_run(false);
    }
}

fn task_pid(task: &Task) -> Result<Pid> {
    task.pid
        .ok_or_else(|| Error::new(ErrorKind::Other, format!("{} has no pid", task.name)))
}
