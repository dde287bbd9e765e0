//! shared control block mapped between the scheduler and workload processes

use nix::sys::mman::{mmap, munmap, MapFlags, ProtFlags};
use std::io::Result;
use std::mem;
use std::ptr;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::consts;
use crate::util::from_nix_error;

/// Control state shared between the scheduler and every spawned workload.
///
/// Lives in an anonymous `MAP_SHARED` mapping so that a forked workload
/// process and the scheduler observe the same words. The dispatch protocol
/// guarantees at most one workload process runs at any instant; the atomics
/// make the single-writer discipline explicit instead of timing-dependent.
#[repr(C)]
pub struct ControlBlock {
    run: AtomicBool,
    preemptive: AtomicBool,
    progress: AtomicU64,
    quantum_ms: AtomicU64,
}

impl ControlBlock {
    pub(crate) fn new() -> Self {
        ControlBlock {
            run: AtomicBool::new(false),
            preemptive: AtomicBool::new(false),
            progress: AtomicU64::new(0),
            quantum_ms: AtomicU64::new(consts::QUANTUM_UNBOUNDED),
        }
    }

    pub fn set_run(&self, on: bool) {
        self.run.store(on, Ordering::SeqCst);
    }

    /// false once the scheduler has torn the run down; workloads exit early
    pub fn should_run(&self) -> bool {
        self.run.load(Ordering::SeqCst)
    }

    pub fn set_preemptive(&self, on: bool) {
        self.preemptive.store(on, Ordering::SeqCst);
    }

    pub fn is_preemptive(&self) -> bool {
        self.preemptive.load(Ordering::SeqCst)
    }

    /// resume offset of the workload owning the current dispatch
    pub fn progress(&self) -> u64 {
        self.progress.load(Ordering::SeqCst)
    }

    pub fn set_progress(&self, offset: u64) {
        self.progress.store(offset, Ordering::SeqCst);
    }

    pub fn quantum_ms(&self) -> u64 {
        self.quantum_ms.load(Ordering::SeqCst)
    }

    pub fn set_quantum_ms(&self, ms: u64) {
        self.quantum_ms.store(ms, Ordering::SeqCst);
    }

    pub fn set_quantum_unbounded(&self) {
        self.quantum_ms
            .store(consts::QUANTUM_UNBOUNDED, Ordering::SeqCst);
    }

    pub fn quantum_is_unbounded(&self) -> bool {
        self.quantum_ms() == consts::QUANTUM_UNBOUNDED
    }
}

/// Owner of the shared mapping backing a [`ControlBlock`].
///
/// Created once per scheduling run, inherited by forked workloads, unmapped
/// on drop.
pub struct ControlRegion {
    ptr: NonNull<ControlBlock>,
}

impl ControlRegion {
    pub fn new() -> Result<ControlRegion> {
        let size = mem::size_of::<ControlBlock>();
        let raw = unsafe {
            mmap(
                ptr::null_mut(),
                size,
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                MapFlags::MAP_SHARED | MapFlags::MAP_ANONYMOUS,
                -1,
                0,
            )
            .map_err(from_nix_error)?
        };
        let block = raw as *mut ControlBlock;
        unsafe { ptr::write(block, ControlBlock::new()) };
        Ok(ControlRegion {
            ptr: NonNull::new(block).expect("mmap returned null"),
        })
    }

    pub fn block(&self) -> &ControlBlock {
        unsafe { self.ptr.as_ref() }
    }
}

impl Drop for ControlRegion {
    fn drop(&mut self) {
        let size = mem::size_of::<ControlBlock>();
        let _ = unsafe { munmap(self.ptr.as_ptr() as *mut _, size) };
    }
}
