//! command-line driver for the scheduling simulator

use std::io::{self, Error, ErrorKind};
use std::str::FromStr;
use structopt::StructOpt;

use schedsim::events::EventLog;
use schedsim::fcfs::Fcfs;
use schedsim::orchestrator::Orchestrator;
use schedsim::profile;
use schedsim::round_robin::RoundRobin;
use schedsim::sched::Scheduler;
use schedsim::sjf::Sjf;
use schedsim::stats;
use schedsim::task::Task;
use schedsim::util;
use schedsim::workload;

#[derive(Debug, Copy, Clone)]
enum Policy {
    Fcfs,
    Sjf,
    Rr,
}

impl FromStr for Policy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fcfs" => Ok(Policy::Fcfs),
            "sjf" => Ok(Policy::Sjf),
            "rr" => Ok(Policy::Rr),
            other => Err(format!("unknown policy: {}", other)),
        }
    }
}

#[derive(Debug, StructOpt)]
#[structopt(about)]
struct Arguments {
    /// Set debug level [0...5].
    #[structopt(long = "debug", value_name = "DEBUG_LEVEL", default_value = "0")]
    log_level: u32,

    /// Configures how to do logging.
    #[structopt(long = "with-log", value_name = "OUTPUT")]
    log_output: Option<String>,

    /// Scheduling policy: fcfs, sjf or rr.
    #[structopt(long, value_name = "POLICY")]
    policy: Policy,

    /// Time quantum in milliseconds, round robin only.
    #[structopt(long, value_name = "MS")]
    quantum: Option<u64>,

    /// Workload plus arrival time, e.g. compute@0. Can be used multiple
    /// times; kinds are file, echo, compute and store.
    #[structopt(
        long = "task",
        short = "t",
        value_name = "KIND@ARRIVAL_MS",
        parse(try_from_str = util::parse_task_spec),
        number_of_values = 1
    )]
    tasks: Vec<(String, f64)>,
}

fn build_tasks(specs: &[(String, f64)]) -> io::Result<Vec<Task>> {
    if specs.is_empty() {
        return Err(Error::new(ErrorKind::InvalidInput, "no tasks given"));
    }

    let mut tasks = Vec::with_capacity(specs.len());
    for (i, (kind, arrival_ms)) in specs.iter().enumerate() {
        let body = workload::from_name(kind).ok_or_else(|| {
            Error::new(ErrorKind::InvalidInput, format!("unknown workload: {}", kind))
        })?;
        tasks.push(Task::new(format!("P{}", i + 1), body, *arrival_ms));
    }
    Ok(tasks)
}

fn make_scheduler(argv: &Arguments) -> io::Result<Box<dyn Scheduler>> {
    match argv.policy {
        Policy::Fcfs => Ok(Box::new(Fcfs)),
        Policy::Sjf => Ok(Box::new(Sjf)),
        Policy::Rr => match argv.quantum {
            Some(q) if q > 0 => Ok(Box::new(RoundRobin::new(q))),
            _ => Err(Error::new(
                ErrorKind::InvalidInput,
                "round robin needs a positive --quantum",
            )),
        },
    }
}

fn run_app(argv: &Arguments) -> io::Result<()> {
    let mut scheduler = make_scheduler(argv)?;
    let mut tasks = build_tasks(&argv.tasks)?;

    println!("Measuring burst times...");
    for task in tasks.iter_mut() {
        let burst = profile::measure(task.workload.as_ref())?;
        task.set_burst(burst);
        println!(
            "{}: {} arriving at {:.0} ms, measured burst {:.2} ms",
            task.name,
            task.workload.kind(),
            task.arrival_ms,
            burst
        );
    }

    // each policy run gets its own duplicate of the measured set
    let mut run_set: Vec<Task> = tasks.to_vec();
    let mut orchestrator = Orchestrator::new()?;
    let mut log = EventLog::new();

    log::info!("executing {} scheduling", scheduler.name());
    scheduler.run(&mut run_set, &mut orchestrator, &mut log)?;

    stats::print_report(scheduler.name(), &run_set, &log);
    Ok(())
}

fn fern_with_output(output: Option<&str>) -> io::Result<fern::Dispatch> {
    match output {
        None => Ok(fern::Dispatch::new().chain(std::io::stdout())),
        Some(s) => match s {
            "stdout" => Ok(fern::Dispatch::new().chain(std::io::stdout())),
            "stderr" => Ok(fern::Dispatch::new().chain(std::io::stderr())),
            output => {
                let f = std::fs::OpenOptions::new()
                    .write(true)
                    .truncate(true)
                    .create(true)
                    .open(output)?;
                Ok(fern::Dispatch::new().chain(f))
            }
        },
    }
}

fn setup_logger(level: u32, output: Option<&str>) -> io::Result<()> {
    let log_level = match level {
        0 => log::LevelFilter::Off,
        1 => log::LevelFilter::Error,
        2 => log::LevelFilter::Warn,
        3 => log::LevelFilter::Info,
        4 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    fern_with_output(output)?
        .level(log_level)
        .format(|out, message, _record| out.finish(format_args!("{}", message)))
        .apply()
        .map_err(|e| Error::new(ErrorKind::Other, e))
}

#[paw::main]
fn main(args: Arguments) {
    setup_logger(args.log_level, args.log_output.as_ref().map(|s| s.as_ref()))
        .expect("set log level");

    if let Err(err) = run_app(&args) {
        log::error!("{} run failed: {}", env!("CARGO_PKG_NAME"), err);
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}
