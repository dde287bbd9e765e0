//! small helpers shared by the simulator

use std::io::{Error, ErrorKind};
use std::time::Instant;

pub fn from_nix_error(err: nix::Error) -> Error {
    Error::new(ErrorKind::Other, err)
}

/// wall-clock milliseconds elapsed since `since`
pub fn elapsed_ms(since: Instant) -> f64 {
    let d = since.elapsed();
    d.as_secs() as f64 * 1000.0 + f64::from(d.subsec_nanos()) / 1_000_000.0
}

/// Parses a `KIND@ARRIVAL_MS` workload command-line argument.
pub fn parse_task_spec(s: &str) -> Result<(String, f64), Box<dyn std::error::Error>> {
    let mut iter = s.splitn(2, '@');

    let kind = iter.next().ok_or("invalid KIND@ARRIVAL_MS: string is empty")?;
    let arrival: f64 = iter
        .next()
        .ok_or("invalid KIND@ARRIVAL_MS: missing arrival time")?
        .parse()?;

    if arrival < 0.0 {
        return Err("arrival time must be non-negative".into());
    }

    Ok((kind.to_string(), arrival))
}
