//! workload bodies and the cooperative preemption contract

use log::{debug, info};
use nix::sys::signal;
use nix::unistd;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::consts;
use crate::control::ControlBlock;
use crate::util::elapsed_ms;

/// A schedulable workload body, executed inside a forked process.
///
/// Implementations must follow the checkpoint contract: at bounded
/// intervals compare elapsed time against the shared quantum, and when it
/// expires write the resume offset back and give the processor up, either
/// by exiting (non-preemptive) or by stopping itself until the scheduler
/// sends `SIGCONT` (preemptive). [`Checkpoint`] implements that dance.
pub trait Workload {
    /// short label used in the timeline and statistics
    fn kind(&self) -> &'static str;
    /// body executed inside the spawned process
    fn run(&self, ctl: &ControlBlock);
}

/// Workload-side view of the quantum budget.
///
/// Owns the start-of-slice timestamp; resets it after every resume so a
/// fresh slice gets the full quantum.
pub struct Checkpoint<'a> {
    ctl: &'a ControlBlock,
    started: Instant,
}

impl<'a> Checkpoint<'a> {
    pub fn new(ctl: &'a ControlBlock) -> Self {
        Checkpoint {
            ctl,
            started: Instant::now(),
        }
    }

    /// offset to continue from, 0 when starting fresh
    pub fn resume_offset(&self) -> u64 {
        self.ctl.progress()
    }

    fn expired(&self) -> bool {
        if self.ctl.quantum_is_unbounded() {
            return false;
        }
        elapsed_ms(self.started) >= self.ctl.quantum_ms() as f64
    }

    /// Checkpoints at `offset` and yields the processor if the quantum ran
    /// out. The unit of work at `offset` must not have been performed yet,
    /// so nothing is lost or repeated across the suspend boundary.
    pub fn yield_if_expired(&mut self, offset: u64) {
        if !self.expired() {
            return;
        }
        self.ctl.set_progress(offset);
        if !self.ctl.is_preemptive() {
            std::process::exit(0);
        }
        // stops here until the scheduler delivers SIGCONT
        let _ = signal::raise(signal::Signal::SIGSTOP);
        self.started = Instant::now();
    }

    /// all work done; a reused process slot must restart cleanly
    pub fn finish(self) {
        self.ctl.set_progress(0);
    }
}

/// appends paced lines to an output file
pub struct FileWrite;

impl Workload for FileWrite {
    fn kind(&self) -> &'static str {
        "file_write"
    }

    fn run(&self, ctl: &ControlBlock) {
        let mut file = match OpenOptions::new()
            .create(true)
            .append(true)
            .open(consts::FILE_WRITE_PATH)
        {
            Ok(f) => f,
            // workload-internal failure: give up this body silently,
            // the scheduler still observes a normal exit
            Err(_) => return,
        };

        let mut cp = Checkpoint::new(ctl);
        let mut line = cp.resume_offset();
        while line < consts::FILE_WRITE_LINES {
            if !ctl.should_run() {
                return;
            }
            cp.yield_if_expired(line);
            if writeln!(file, "process {} writing line {}", unistd::getpid(), line).is_err() {
                return;
            }
            let _ = file.flush();
            thread::sleep(Duration::from_millis(1));
            line += 1;
        }
        cp.finish();
    }
}

/// prints paced lines to the console
pub struct ConsoleEcho;

impl Workload for ConsoleEcho {
    fn kind(&self) -> &'static str {
        "console_echo"
    }

    fn run(&self, ctl: &ControlBlock) {
        let mut cp = Checkpoint::new(ctl);
        let mut line = cp.resume_offset();
        while line < consts::CONSOLE_ECHO_LINES {
            if !ctl.should_run() {
                return;
            }
            cp.yield_if_expired(line);
            println!("process {} echoing line {}", unistd::getpid(), line);
            thread::sleep(Duration::from_millis(10));
            line += 1;
        }
        cp.finish();
    }
}

/// CPU-bound summation, checking the quantum every few thousand iterations
pub struct Compute;

impl Workload for Compute {
    fn kind(&self) -> &'static str {
        "compute"
    }

    fn run(&self, ctl: &ControlBlock) {
        let mut cp = Checkpoint::new(ctl);
        let mut i = cp.resume_offset();

        // rebuild the partial sum for the iterations already credited
        let mut sum: u64 = (0..i).sum();

        while i < consts::COMPUTE_ITERATIONS {
            if i % consts::COMPUTE_CHECK_EVERY == 0 {
                if !ctl.should_run() {
                    return;
                }
                cp.yield_if_expired(i);
            }
            sum = sum.wrapping_add(i);
            if i > 0 && i % 10_000_000 == 0 {
                debug!(
                    "process {} computed sum up to {}: {}",
                    unistd::getpid(),
                    i,
                    sum
                );
            }
            i += 1;
        }

        info!(
            "process {} completed computation, final sum: {}",
            unistd::getpid(),
            sum
        );
        cp.finish();
    }
}

/// appends paced records to a flat record store
pub struct StoreWrite;

impl Workload for StoreWrite {
    fn kind(&self) -> &'static str {
        "store_write"
    }

    fn run(&self, ctl: &ControlBlock) {
        let mut store = match OpenOptions::new()
            .create(true)
            .append(true)
            .open(consts::STORE_WRITE_PATH)
        {
            Ok(f) => f,
            Err(_) => return,
        };

        let pid = unistd::getpid();
        let mut cp = Checkpoint::new(ctl);
        let mut record = cp.resume_offset();
        while record < consts::STORE_WRITE_RECORDS {
            if !ctl.should_run() {
                return;
            }
            cp.yield_if_expired(record);
            let age = 10 + (record * 7 + pid.as_raw() as u64) % 11;
            if writeln!(store, "{},name_{},{}", record, pid, age).is_err() {
                return;
            }
            let _ = store.flush();
            thread::sleep(Duration::from_millis(10));
            record += 1;
        }
        cp.finish();
    }
}

/// look up a workload body by its CLI name
pub fn from_name(name: &str) -> Option<Arc<dyn Workload>> {
    match name {
        "file" | "file_write" => Some(Arc::new(FileWrite)),
        "echo" | "console_echo" => Some(Arc::new(ConsoleEcho)),
        "compute" => Some(Arc::new(Compute)),
        "store" | "store_write" => Some(Arc::new(StoreWrite)),
        _ => None,
    }
}
