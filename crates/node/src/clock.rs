//! The shared cycle clock.
//!
//! Every role paces itself against the chain's `interval + period` schedule,
//! inferred from the cycle boundary `last` without any clock sync beyond NTP.
//! Provers fire inside the prove window; challengers wait out the whole cycle
//! and run one `cycleLen` behind, after the window they are judging has
//! closed.

use std::time::Duration;

/// Wall-clock schedule of one node role.
#[derive(Clone, Copy, Debug)]
pub struct CycleClock {
    interval: i64,
    period: i64,
    /// Start of the cycle this role is currently aligned to, unix seconds.
    pub last: i64,
}

impl CycleClock {
    /// New clock; `last` stays zero until the role bootstraps it from chain.
    pub fn new(interval: Duration, period: Duration) -> Self {
        Self {
            interval: interval.as_secs() as i64,
            period: period.as_secs() as i64,
            last: 0,
        }
    }

    /// Full cycle length in seconds.
    pub fn cycle_len(&self) -> i64 {
        self.interval + self.period
    }

    /// Wait until the prove window opens. Re-aligns `last` to the current
    /// cycle start and returns the wait together with the next cycle start.
    pub fn prover_wait(&mut self, now: i64) -> (Duration, i64) {
        let cycle = self.cycle_len();
        let over = (now - self.last).rem_euclid(cycle);
        let wait = if over < self.interval {
            self.interval - over
        } else {
            0
        };

        self.last = now - over;
        (Duration::from_secs(wait as u64), self.last + cycle)
    }

    /// Wait until the current cycle closes. Advances `last` one full cycle so
    /// the challenger always judges the window that just ended.
    pub fn challenger_wait(&mut self, now: i64) -> Duration {
        let cycle = self.cycle_len();
        let over = (now - self.last).rem_euclid(cycle);

        self.last = now - over + cycle;
        Duration::from_secs((cycle - over) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: u64 = 60;
    const PERIOD: u64 = 40;

    fn clock(last: i64) -> CycleClock {
        let mut c = CycleClock::new(
            Duration::from_secs(INTERVAL),
            Duration::from_secs(PERIOD),
        );
        c.last = last;
        c
    }

    #[test]
    fn prover_waits_out_the_interval_window() {
        let mut c = clock(1_000);

        // 10s into the window: wait the remaining 50s.
        let (wait, next) = c.prover_wait(1_010);
        assert_eq!(wait, Duration::from_secs(50));
        assert_eq!(c.last, 1_000);
        assert_eq!(next, 1_100);

        // past the window: fire immediately.
        let (wait, _) = c.prover_wait(1_070);
        assert_eq!(wait, Duration::ZERO);
    }

    #[test]
    fn prover_alignment_is_stable_over_many_firings() {
        let start = 123_456;
        let mut c = clock(start);
        let cycle = c.cycle_len();

        let mut now = start + 17;
        for _ in 0..50 {
            let (wait, next) = c.prover_wait(now);
            assert_eq!((c.last - start).rem_euclid(cycle), 0);
            assert!((c.last - now).abs() < cycle);
            now += wait.as_secs() as i64 + cycle;
            let _ = next;
        }
    }

    #[test]
    fn challenger_runs_one_cycle_behind() {
        let mut c = clock(1_000);

        let wait = c.challenger_wait(1_030);
        assert_eq!(wait, Duration::from_secs(70));
        // aligned to the cycle boundary after the window being judged
        assert_eq!(c.last, 1_100);

        let wait = c.challenger_wait(1_100);
        assert_eq!(wait, Duration::from_secs(100));
        assert_eq!(c.last, 1_200);
    }

    #[test]
    fn roles_started_at_different_times_converge() {
        let mut a = clock(500);
        let mut b = clock(500);

        a.prover_wait(700);
        a.prover_wait(950);
        b.prover_wait(950);
        assert_eq!(a.last, b.last);
    }
}
