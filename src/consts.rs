//! constants shared across the simulator

/// interval between `waitpid` polls while a dispatch is in flight
pub const POLL_INTERVAL_MS: u64 = 1;

/// quantum sentinel meaning "run to completion, never checkpoint"
pub const QUANTUM_UNBOUNDED: u64 = u64::MAX;

/// lines appended by the file-write workload
pub const FILE_WRITE_LINES: u64 = 1000;
/// output file of the file-write workload
pub const FILE_WRITE_PATH: &str = "output.txt";

/// lines printed by the console-echo workload
pub const CONSOLE_ECHO_LINES: u64 = 100;

/// iterations of the compute workload
pub const COMPUTE_ITERATIONS: u64 = 50_000_000;
/// the compute workload checks its quantum once per this many iterations
pub const COMPUTE_CHECK_EVERY: u64 = 1000;

/// records appended by the store-write workload
pub const STORE_WRITE_RECORDS: u64 = 90;
/// backing file of the store-write workload
pub const STORE_WRITE_PATH: &str = "records.db";
