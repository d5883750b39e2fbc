use dispatch_core::Error;
use tokio::fs;

/// Reads the aggregate CPU utilization for CPU0 from `/proc/stat`'s first
/// line, returning a value in `[0, 1]` where `1.0` means fully busy.
///
/// Mirrors the original `calc_cpu_util()`: the first line of `/proc/stat` is
/// ten whitespace-separated counters (user, nice, system, idle, iowait,
/// irq, softirq, steal, guest, guest_nice); idle time is the fourth field.
pub async fn read_utilization() -> Result<f64, Error> {
    let contents = fs::read_to_string("/proc/stat")
        .await
        .map_err(Error::Transport)?;
    parse_stat_line(contents.lines().next().unwrap_or(""))
}

fn parse_stat_line(line: &str) -> Result<f64, Error> {
    let counters: Vec<u64> = line
        .split_whitespace()
        .skip(1) // leading "cpu" label
        .map(|field| field.parse::<u64>())
        .collect::<Result<_, _>>()
        .map_err(|_| Error::Subprocess(format!("malformed /proc/stat line: {:?}", line)))?;

    if counters.len() < 4 {
        return Err(Error::Subprocess(format!(
            "expected at least 4 cpu counters, got {}",
            counters.len()
        )));
    }

    let sum: u64 = counters.iter().sum();
    let idle = counters[3];
    if sum == 0 {
        return Ok(0.0);
    }
    Ok(1.0 - (idle as f64 / sum as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_representative_stat_line() {
        let util = parse_stat_line("cpu  100 0 50 850 0 0 0 0 0 0").unwrap();
        assert!((util - 0.15).abs() < 1e-9);
    }

    #[test]
    fn all_idle_is_zero_utilization() {
        let util = parse_stat_line("cpu  0 0 0 1000 0 0 0 0 0 0").unwrap();
        assert_eq!(util, 0.0);
    }

    #[test]
    fn rejects_malformed_line() {
        assert!(parse_stat_line("not a stat line").is_err());
    }
}
