use crate::facts::Progress;
use core::fmt::{Debug, Formatter};
use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

/// Refresh rate of the spinner (10 Hz).
const REFRESH_INTERVAL_MS: u64 = 100;

const DETERMINATE_TEMPLATE: &str = "{prefix:>14.bold.cyan} [{bar:25}] {pos}/{len} {msg}";
const DETERMINATE_TEMPLATE_NO_COLOR: &str = "{prefix:>14} [{bar:25}] {pos}/{len} {msg}";
const INDETERMINATE_TEMPLATE: &str = "{prefix:>14.bold.cyan} [{spinner}] {msg}";
const INDETERMINATE_TEMPLATE_NO_COLOR: &str = "{prefix:>14} [{spinner}] {msg}";

const SPINNER_TICKS: &[&str] = &[
    ">                        ",
    "=>                       ",
    "==>                      ",
    " ==>                     ",
    "   ==>                   ",
    "     ==>                 ",
    "       ==>               ",
    "         ==>             ",
    "           ==>           ",
    "             ==>         ",
    "               ==>       ",
    "                 ==>     ",
    "                   ==>   ",
    "                     ==> ",
    "                       ==",
    "                        <",
    "                       <=",
    "                     <== ",
    "                   <==   ",
    "                 <==     ",
    "               <==       ",
    "             <==         ",
    "           <==           ",
    "         <==             ",
    "       <==               ",
    "     <==                 ",
    "   <==                   ",
    " <==                     ",
    "==                       ",
    "                         ",
];

/// A progress bar that stays hidden until the run has lasted longer than a threshold.
pub struct ProgressReporter {
    bar: ProgressBar,
    visible_after: Instant,
    visible: AtomicBool,
    indeterminate: AtomicBool,
    phase_start_time: Mutex<Instant>,
    use_colors: bool,
}

impl ProgressReporter {
    /// Create a new progress reporter.
    ///
    /// The bar only draws once an update arrives after `delay` has elapsed. When
    /// `use_colors` is false, the bar chrome is rendered without ANSI styling.
    #[must_use]
    pub fn new(delay: Duration, use_colors: bool) -> Self {
        let now = Instant::now();
        Self {
            bar: ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden()),
            visible_after: now + delay,
            visible: AtomicBool::new(false),
            indeterminate: AtomicBool::new(false),
            phase_start_time: Mutex::new(now),
            use_colors,
        }
    }

    fn reveal_if_due(&self) {
        if !self.visible.load(Ordering::Relaxed) && Instant::now() >= self.visible_after {
            self.visible.store(true, Ordering::Relaxed);
            self.bar.set_draw_target(ProgressDrawTarget::stderr_with_hz(10));
        }
    }

    fn phase_elapsed_secs(&self) -> u64 {
        self.phase_start_time
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
            .as_secs()
    }

    fn style(&self, indeterminate: bool) -> ProgressStyle {
        let template = match (indeterminate, self.use_colors) {
            (false, true) => DETERMINATE_TEMPLATE,
            (false, false) => DETERMINATE_TEMPLATE_NO_COLOR,
            (true, true) => INDETERMINATE_TEMPLATE,
            (true, false) => INDETERMINATE_TEMPLATE_NO_COLOR,
        };

        if indeterminate {
            ProgressStyle::with_template(template)
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(SPINNER_TICKS)
        } else {
            ProgressStyle::with_template(template)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> ")
        }
    }
}

impl Progress for ProgressReporter {
    fn set_phase(&self, phase: &str) {
        self.bar.set_prefix(phase.to_string());
        *self.phase_start_time.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
        self.reveal_if_due();
    }

    fn set_determinate(&self, total: u64, current: u64, message: &str) {
        if self.indeterminate.swap(false, Ordering::Relaxed) || self.bar.length().is_none() {
            self.bar.disable_steady_tick();
            self.bar.set_style(self.style(false));
        }

        self.bar.set_length(total);
        self.bar.set_position(current);
        self.bar.set_message(message.to_string());
        self.reveal_if_due();
    }

    fn set_indeterminate(&self, message: &str) {
        if !self.indeterminate.swap(true, Ordering::Relaxed) {
            self.bar.set_style(self.style(true));
            self.bar.enable_steady_tick(Duration::from_millis(REFRESH_INTERVAL_MS));
        }

        self.bar.set_message(format!("{}s: {message}", self.phase_elapsed_secs()));
        self.reveal_if_due();
    }

    /// Print a message line without disrupting the progress indicator.
    fn println(&self, msg: &str) {
        self.bar.suspend(|| eprintln!("{msg}"));
    }

    /// Finish and clear the progress indicator.
    fn done(&self) {
        self.bar.disable_steady_tick();
        if self.visible.load(Ordering::Relaxed) {
            self.bar.finish_and_clear();
        }
    }
}

impl Debug for ProgressReporter {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("bar", &self.bar)
            .field("visible_after", &self.visible_after)
            .field("visible", &self.visible)
            .field("indeterminate", &self.indeterminate)
            .field("use_colors", &self.use_colors)
            .finish_non_exhaustive()
    }
}
