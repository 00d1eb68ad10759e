// SPDX-License-Identifier: GPL-3.0-only

//! Countdown timer and controller
//!
//! [`CountDownTimer`] is a polled count-down timer: the first tick fires on
//! start with the full duration remaining, later ticks follow the interval
//! grid from the start instant, and the run finishes once the stop instant
//! is reached. [`Countdown`] turns those ticks into label text and the
//! single capture trigger.
//!
//! The capture fires on the tick that sees at most one interval remaining,
//! one tick before the timer actually expires.

use crate::config::CountdownSettings;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Event produced by polling a [`CountDownTimer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Tick { millis_until_finished: u64 },
    Finish,
}

#[derive(Debug, Clone)]
pub struct CountDownTimer {
    interval: Duration,
    stop_at: Instant,
    next_due: Instant,
    finished: bool,
}

impl CountDownTimer {
    /// Start a timer; the first tick is due immediately
    pub fn start(total: Duration, interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            stop_at: now + total,
            next_due: now,
            finished: false,
        }
    }

    /// Deliver at most one event that is due at `now`
    ///
    /// Ticks missed by a late poll collapse into a single tick.
    pub fn poll(&mut self, now: Instant) -> Option<TimerEvent> {
        if self.finished || now < self.next_due {
            return None;
        }

        let remaining = self.stop_at.saturating_duration_since(now);
        if remaining.is_zero() {
            self.finished = true;
            return Some(TimerEvent::Finish);
        }

        self.next_due = if remaining < self.interval {
            self.stop_at
        } else {
            let mut next = self.next_due + self.interval;
            while next <= now {
                next += self.interval;
            }
            next.min(self.stop_at)
        };

        Some(TimerEvent::Tick {
            millis_until_finished: remaining.as_millis() as u64,
        })
    }

    /// When the next event is due, if any
    pub fn next_due(&self) -> Option<Instant> {
        (!self.finished).then_some(self.next_due)
    }
}

/// Re-entry guard state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountdownState {
    #[default]
    Idle,
    Running,
}

/// What a poll of the countdown changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountdownStep {
    /// Label updated to a remaining-seconds value
    Tick(String),
    /// Label set to the done symbol and a capture must be issued now
    Capture(String),
    /// Label cleared, back to idle
    Finished,
}

/// Seconds label for a tick: `round(remaining / 1000) - 1`
pub fn tick_label(millis_until_finished: u64) -> String {
    let seconds = (millis_until_finished as f64 / 1000.0).round() as i64;
    (seconds - 1).to_string()
}

#[derive(Debug, Clone)]
pub struct Countdown {
    settings: CountdownSettings,
    timer: Option<CountDownTimer>,
    label: String,
    capture_issued: bool,
}

impl Countdown {
    pub fn new(settings: CountdownSettings) -> Self {
        Self {
            settings,
            timer: None,
            label: String::new(),
            capture_issued: false,
        }
    }

    pub fn state(&self) -> CountdownState {
        if self.timer.is_some() {
            CountdownState::Running
        } else {
            CountdownState::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == CountdownState::Running
    }

    /// Visible label text
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Start a run; returns false (and changes nothing) while one is running
    pub fn start(&mut self, now: Instant) -> bool {
        if self.is_running() {
            debug!("Countdown already running, ignoring tap");
            return false;
        }
        info!(total_ms = self.settings.total_ms, "Starting countdown");
        self.timer = Some(CountDownTimer::start(
            self.settings.total(),
            self.settings.tick(),
            now,
        ));
        self.capture_issued = false;
        true
    }

    /// Advance the run to `now`
    pub fn poll(&mut self, now: Instant) -> Option<CountdownStep> {
        let event = self.timer.as_mut()?.poll(now)?;

        match event {
            TimerEvent::Tick {
                millis_until_finished,
            } if millis_until_finished <= self.settings.tick_ms => {
                self.label = self.settings.done_label.clone();
                if self.capture_issued {
                    return Some(CountdownStep::Tick(self.label.clone()));
                }
                self.capture_issued = true;
                info!(millis_until_finished, "Countdown reached capture tick");
                Some(CountdownStep::Capture(self.label.clone()))
            }
            TimerEvent::Tick {
                millis_until_finished,
            } => {
                self.label = tick_label(millis_until_finished);
                debug!(label = %self.label, millis_until_finished, "Countdown tick");
                Some(CountdownStep::Tick(self.label.clone()))
            }
            TimerEvent::Finish => {
                self.label.clear();
                self.timer = None;
                info!("Countdown finished");
                Some(CountdownStep::Finished)
            }
        }
    }

    /// When the running timer next needs a poll
    pub fn next_due(&self) -> Option<Instant> {
        self.timer.as_ref().and_then(CountDownTimer::next_due)
    }

    /// Abandon a run without capturing
    pub fn cancel(&mut self) {
        if self.timer.take().is_some() {
            self.label.clear();
            info!("Countdown cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    /// Poll at every whole second from `start` through `seconds`
    fn run(countdown: &mut Countdown, start: Instant, seconds: u64) -> Vec<(u64, CountdownStep)> {
        (0..=seconds)
            .filter_map(|s| countdown.poll(start + ms(s * 1000)).map(|step| (s, step)))
            .collect()
    }

    #[test]
    fn test_timer_ticks_on_the_interval_grid() {
        let t0 = Instant::now();
        let mut timer = CountDownTimer::start(ms(6000), ms(1000), t0);

        assert_eq!(
            timer.poll(t0),
            Some(TimerEvent::Tick {
                millis_until_finished: 6000
            })
        );
        assert_eq!(timer.poll(t0 + ms(500)), None);
        assert_eq!(
            timer.poll(t0 + ms(1000)),
            Some(TimerEvent::Tick {
                millis_until_finished: 5000
            })
        );
        assert_eq!(timer.next_due(), Some(t0 + ms(2000)));
    }

    #[test]
    fn test_timer_collapses_missed_ticks() {
        let t0 = Instant::now();
        let mut timer = CountDownTimer::start(ms(6000), ms(1000), t0);
        timer.poll(t0);

        assert_eq!(
            timer.poll(t0 + ms(3200)),
            Some(TimerEvent::Tick {
                millis_until_finished: 2800
            })
        );
        assert_eq!(timer.next_due(), Some(t0 + ms(4000)));
    }

    #[test]
    fn test_timer_short_remainder_waits_for_stop() {
        let t0 = Instant::now();
        let mut timer = CountDownTimer::start(ms(6000), ms(1000), t0);
        timer.poll(t0);

        assert_eq!(
            timer.poll(t0 + ms(5500)),
            Some(TimerEvent::Tick {
                millis_until_finished: 500
            })
        );
        assert_eq!(timer.next_due(), Some(t0 + ms(6000)));
        assert_eq!(timer.poll(t0 + ms(6000)), Some(TimerEvent::Finish));
        assert_eq!(timer.next_due(), None);
        assert_eq!(timer.poll(t0 + ms(7000)), None);
    }

    #[test]
    fn test_full_run_label_sequence() {
        let t0 = Instant::now();
        let mut countdown = Countdown::new(CountdownSettings::default());
        assert!(countdown.start(t0));

        let steps: Vec<CountdownStep> = run(&mut countdown, t0, 6)
            .into_iter()
            .map(|(_, step)| step)
            .collect();

        assert_eq!(
            steps,
            vec![
                CountdownStep::Tick("5".to_string()),
                CountdownStep::Tick("4".to_string()),
                CountdownStep::Tick("3".to_string()),
                CountdownStep::Tick("2".to_string()),
                CountdownStep::Tick("1".to_string()),
                CountdownStep::Capture(":)".to_string()),
                CountdownStep::Finished,
            ]
        );
        assert_eq!(countdown.label(), "");
        assert_eq!(countdown.state(), CountdownState::Idle);
    }

    #[test]
    fn test_capture_fires_once_five_seconds_after_start() {
        let t0 = Instant::now();
        let mut countdown = Countdown::new(CountdownSettings::default());
        countdown.start(t0);

        // Poll on a 16 ms cadence like the UI loop does
        let mut captures = Vec::new();
        let mut elapsed = 0;
        while elapsed <= 7000 {
            if let Some(CountdownStep::Capture(_)) = countdown.poll(t0 + ms(elapsed)) {
                captures.push(elapsed);
            }
            elapsed += 16;
        }

        assert_eq!(captures.len(), 1);
        assert!((5000..5016).contains(&captures[0]));
    }

    #[test]
    fn test_tap_while_running_is_ignored() {
        let t0 = Instant::now();
        let mut countdown = Countdown::new(CountdownSettings::default());
        assert!(countdown.start(t0));
        countdown.poll(t0);
        countdown.poll(t0 + ms(1000));

        assert!(!countdown.start(t0 + ms(1500)));
        assert_eq!(countdown.state(), CountdownState::Running);
        // The original schedule continues
        assert_eq!(
            countdown.poll(t0 + ms(2000)),
            Some(CountdownStep::Tick("3".to_string()))
        );
    }

    #[test]
    fn test_restart_after_finish() {
        let t0 = Instant::now();
        let mut countdown = Countdown::new(CountdownSettings::default());
        countdown.start(t0);
        run(&mut countdown, t0, 6);
        assert!(!countdown.is_running());

        let t1 = t0 + ms(10_000);
        assert!(countdown.start(t1));
        assert_eq!(countdown.poll(t1), Some(CountdownStep::Tick("5".to_string())));
        let captures = run(&mut countdown, t1, 6)
            .into_iter()
            .filter(|(_, step)| matches!(step, CountdownStep::Capture(_)))
            .count();
        assert_eq!(captures, 1);
    }

    #[test]
    fn test_next_due_follows_running_timer() {
        let t0 = Instant::now();
        let mut countdown = Countdown::new(CountdownSettings::default());
        assert_eq!(countdown.next_due(), None);

        countdown.start(t0);
        assert_eq!(countdown.next_due(), Some(t0));
        countdown.poll(t0);
        assert_eq!(countdown.next_due(), Some(t0 + ms(1000)));

        countdown.cancel();
        assert_eq!(countdown.next_due(), None);
    }

    #[test]
    fn test_tick_label_rounding() {
        assert_eq!(tick_label(6000), "5");
        assert_eq!(tick_label(5999), "5");
        assert_eq!(tick_label(4500), "4");
        assert_eq!(tick_label(4499), "3");
        assert_eq!(tick_label(1001), "0");
    }

    #[test]
    fn test_cancel_clears_label() {
        let t0 = Instant::now();
        let mut countdown = Countdown::new(CountdownSettings::default());
        countdown.start(t0);
        countdown.poll(t0);
        assert_eq!(countdown.label(), "5");

        countdown.cancel();
        assert_eq!(countdown.label(), "");
        assert!(!countdown.is_running());
        assert_eq!(countdown.poll(t0 + ms(5000)), None);
    }
}
