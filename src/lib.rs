pub mod consts;
pub mod control;
pub mod events;
pub mod fcfs;
pub mod orchestrator;
pub mod profile;
pub mod round_robin;
pub mod sched;
pub mod sjf;
pub mod stats;
pub mod task;
pub mod util;
pub mod workload;
