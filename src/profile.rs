//! burst-time measurement

use log::{info, warn};
use nix::sys::wait::{self, WaitStatus};
use nix::unistd::{self, ForkResult};
use std::io::Result;
use std::time::Instant;

use crate::control::ControlRegion;
use crate::util::elapsed_ms;
use crate::workload::Workload;

/// Runs `workload` once, uninterrupted, in its own process and returns the
/// observed wall-clock duration in milliseconds. The result becomes the
/// task's declared service requirement; the schedulers treat it as ground
/// truth. Yields 0 when the process cannot be created.
pub fn measure(workload: &dyn Workload) -> Result<f64> {
    let region = ControlRegion::new()?;
    let ctl = region.block();
    ctl.set_run(true);
    ctl.set_preemptive(false);
    ctl.set_progress(0);
    ctl.set_quantum_unbounded();

    let started = Instant::now();
    let child = match unistd::fork() {
        Ok(ForkResult::Child) => {
            workload.run(ctl);
            std::process::exit(0);
        }
        Ok(ForkResult::Parent { child }) => child,
        Err(err) => {
            // degenerate case for the caller to handle, no retry
            warn!("burst measurement fork failed: {}", err);
            return Ok(0.0);
        }
    };

    loop {
        match wait::waitpid(child, None) {
            Ok(WaitStatus::Exited(_, _)) | Ok(WaitStatus::Signaled(_, _, _)) => break,
            Ok(_) => continue,
            Err(err) => {
                warn!("burst measurement wait failed: {}", err);
                break;
            }
        }
    }

    let burst = elapsed_ms(started);
    info!("measured burst {:.2} ms for {}", burst, workload.kind());
    Ok(burst)
}
