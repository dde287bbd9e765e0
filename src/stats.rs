//! statistics table and timeline rendering

use std::fmt::Write;

use crate::events::EventLog;
use crate::task::Task;

/// average (turnaround, waiting) over a finalized task set
pub fn averages(tasks: &[Task]) -> (f64, f64) {
    if tasks.is_empty() {
        return (0.0, 0.0);
    }
    let n = tasks.len() as f64;
    let turnaround: f64 = tasks.iter().map(Task::turnaround_ms).sum();
    let waiting: f64 = tasks.iter().map(Task::waiting_ms).sum();
    (turnaround / n, waiting / n)
}

/// per-task metrics table plus averages
pub fn render_table(tasks: &[Task]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\nProcess Statistics:");
    let _ = writeln!(
        out,
        "{:<8} {:<8} {:<14} {:<12} {:<12} {:<12} {:<12} {:<12}",
        "Process", "PID", "Task", "Arrival", "Burst", "Completion", "Turnaround", "Waiting"
    );
    let _ = writeln!(out, "{}", "-".repeat(92));

    for task in tasks {
        let pid = task.pid.map(|p| p.as_raw()).unwrap_or(0);
        let _ = writeln!(
            out,
            "{:<8} {:<8} {:<14} {:<12.2} {:<12.2} {:<12.2} {:<12.2} {:<12.2}",
            task.name,
            pid,
            task.workload.kind(),
            task.arrival_ms,
            task.burst_ms,
            task.completion_ms,
            task.turnaround_ms(),
            task.waiting_ms()
        );
    }

    let (turnaround, waiting) = averages(tasks);
    let _ = writeln!(out, "\nAverage Metrics:");
    let _ = writeln!(out, "Turnaround Time: {:.2} ms", turnaround);
    let _ = writeln!(out, "Waiting Time: {:.2} ms", waiting);
    out
}

/// Block timeline of the run: one cell per execution segment, label
/// centered, end times along a ruler starting at 0.
pub fn render_timeline(log: &EventLog) -> String {
    if log.is_empty() {
        return String::new();
    }

    let widths: Vec<usize> = log
        .events()
        .iter()
        .map(|e| {
            let digits = format!("{:.0}", e.end_ms).len();
            e.name.len().max(digits) + 4
        })
        .collect();

    let mut border = String::from(" ");
    for w in &widths {
        border.push_str(&"-".repeat(*w));
        border.push(' ');
    }

    let mut cells = String::from("|");
    for (event, w) in log.events().iter().zip(widths.iter()) {
        let pad = (w - event.name.len()) / 2;
        let extra = (w - event.name.len()) % 2;
        cells.push_str(&" ".repeat(pad));
        cells.push_str(&event.name);
        cells.push_str(&" ".repeat(pad + extra));
        cells.push('|');
    }

    let mut ruler = String::from("0");
    for (event, w) in log.events().iter().zip(widths.iter()) {
        let time = format!("{:.0}", event.end_ms);
        let spaces = w + 1 - time.len();
        ruler.push_str(&" ".repeat(spaces));
        ruler.push_str(&time);
    }

    format!("\nGantt Chart:\n\n{}\n{}\n{}\n{}\n", border, cells, border, ruler)
}

/// full report for one finished scheduling run
pub fn print_report(policy: &str, tasks: &[Task], log: &EventLog) {
    println!("\n=== {} ===", policy);
    print!("{}", render_table(tasks));
    print!("{}", render_timeline(log));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sched::testing::task;

    fn finished_set() -> Vec<Task> {
        let mut p1 = task("P1", 0.0, 10.0);
        p1.completion_ms = 10.0;
        let mut p2 = task("P2", 5.0, 5.0);
        p2.completion_ms = 15.0;
        vec![p1, p2]
    }

    #[test]
    fn averages_match_hand_computation() {
        let tasks = finished_set();
        let (turnaround, waiting) = averages(&tasks);
        // turnarounds 10 and 10; waitings 0 and 5
        assert_eq!(turnaround, 10.0);
        assert_eq!(waiting, 2.5);
    }

    #[test]
    fn reporting_is_idempotent() {
        let tasks = finished_set();
        let first = averages(&tasks);
        let second = averages(&tasks);
        assert_eq!(first, second);
        assert_eq!(render_table(&tasks), render_table(&tasks));
    }

    #[test]
    fn averages_of_empty_set_are_zero() {
        assert_eq!(averages(&[]), (0.0, 0.0));
    }

    #[test]
    fn timeline_renders_one_cell_per_segment() {
        let mut log = EventLog::new();
        log.record("compute", "P1", 0.0, 2.0);
        log.record("compute", "P2", 2.0, 4.0);
        log.record("compute", "P1", 4.0, 6.0);

        let chart = render_timeline(&log);
        assert_eq!(chart.matches("P1").count(), 2);
        assert_eq!(chart.matches("P2").count(), 1);
        // ruler carries the segment end times
        let ruler = chart.lines().last().unwrap();
        assert!(ruler.starts_with('0'));
        assert!(ruler.contains('2') && ruler.contains('4') && ruler.contains('6'));
    }

    #[test]
    fn empty_timeline_renders_nothing() {
        assert_eq!(render_timeline(&EventLog::new()), "");
    }
}
