// src/system/io.rs

use std::cell::{Cell, RefCell};
use std::io::{self, IsTerminal, Write};
use std::rc::Rc;

use log::LevelFilter;

use crate::constants::{ANSI_FLAG, NO_ANSI_FLAG, NO_COLOR_ENV, NO_INTERACTION_FLAG, QUIET_FLAG};
use crate::core::context::Context;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Switches {
    quiet: bool,
    decorated: bool,
    interactive: bool,
}

/// Writers of an application plus the quiet, decorated and interactive
/// switches the global flags drive. The flags only change the switches for
/// one run; [`Output::reset`] goes back to the ones set at construction.
pub struct Output {
    stdout: RefCell<Box<dyn Write>>,
    stderr: RefCell<Box<dyn Write>>,
    baseline: Switches,
    switches: Cell<Switches>,
}

impl Output {
    pub fn new(stdout: Box<dyn Write>, stderr: Box<dyn Write>) -> Self {
        Self::with_switches(stdout, stderr, Switches::default())
    }

    fn with_switches(stdout: Box<dyn Write>, stderr: Box<dyn Write>, baseline: Switches) -> Self {
        Self {
            stdout: RefCell::new(stdout),
            stderr: RefCell::new(stderr),
            baseline,
            switches: Cell::new(baseline),
        }
    }

    /// Process standard output and error.
    pub fn stdio() -> Self {
        let baseline = Switches {
            quiet: false,
            decorated: io::stdout().is_terminal(),
            interactive: io::stdin().is_terminal(),
        };
        Self::with_switches(Box::new(io::stdout()), Box::new(io::stderr()), baseline)
    }

    /// Drops whatever the previous run configured.
    pub fn reset(&self) {
        self.switches.set(self.baseline);
    }

    fn update(&self, f: impl FnOnce(&mut Switches)) {
        let mut switches = self.switches.get();
        f(&mut switches);
        self.switches.set(switches);
    }

    /// Runs `f` against standard output, or against a sink when quiet.
    pub fn with_stdout<R>(&self, f: impl FnOnce(&mut dyn Write) -> R) -> R {
        if self.is_quiet() {
            return f(&mut io::sink());
        }
        let mut writer = self.stdout.borrow_mut();
        f(writer.as_mut())
    }

    /// Runs `f` against standard error, or against a sink when quiet.
    pub fn with_stderr<R>(&self, f: impl FnOnce(&mut dyn Write) -> R) -> R {
        if self.is_quiet() {
            return f(&mut io::sink());
        }
        let mut writer = self.stderr.borrow_mut();
        f(writer.as_mut())
    }

    pub fn write_out(&self, text: &str) -> io::Result<()> {
        self.with_stdout(|w| w.write_all(text.as_bytes()))
    }

    pub fn write_err(&self, text: &str) -> io::Result<()> {
        self.with_stderr(|w| w.write_all(text.as_bytes()))
    }

    pub fn is_quiet(&self) -> bool {
        self.switches.get().quiet
    }

    pub fn set_quiet(&self, quiet: bool) {
        self.update(|s| s.quiet = quiet);
    }

    pub fn is_decorated(&self) -> bool {
        self.switches.get().decorated
    }

    pub fn set_decorated(&self, decorated: bool) {
        self.update(|s| s.decorated = decorated);
    }

    pub fn is_interactive(&self) -> bool {
        self.switches.get().interactive
    }

    pub fn set_interactive(&self, interactive: bool) {
        self.update(|s| s.interactive = interactive);
    }
}

/// In-memory writer; clones share the same buffer.
#[derive(Clone, Default)]
pub struct Capture(Rc<RefCell<Vec<u8>>>);

impl Capture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Applies `--quiet`, `--ansi`, `--no-ansi` and `--no-interaction` to the
/// application output. `NO_COLOR` disables decoration unless a flag says
/// otherwise.
pub fn configure_io(ctx: &Context<'_>) {
    let app = ctx.app();
    let output = app.output();
    output.reset();

    if ctx.is_set(ANSI_FLAG) {
        output.set_decorated(ctx.bool(ANSI_FLAG));
    } else if ctx.is_set(NO_ANSI_FLAG) {
        output.set_decorated(!ctx.bool(NO_ANSI_FLAG));
    } else if app.env_var(NO_COLOR_ENV).is_some() {
        output.set_decorated(false);
    }

    if ctx.is_set(NO_INTERACTION_FLAG) {
        output.set_interactive(!ctx.bool(NO_INTERACTION_FLAG));
    }

    if ctx.is_set(QUIET_FLAG) {
        let quiet = ctx.bool(QUIET_FLAG);
        output.set_quiet(quiet);
        if quiet {
            output.set_interactive(false);
        }
    }

    log::debug!(
        "Output configured: quiet={} decorated={} interactive={}",
        output.is_quiet(),
        output.is_decorated(),
        output.is_interactive()
    );
}

/// Maps a verbosity level onto the `log` facade.
pub fn log_level_filter(level: u8) -> LevelFilter {
    match level {
        0 => LevelFilter::Off,
        1 => LevelFilter::Error,
        2 => LevelFilter::Warn,
        3 => LevelFilter::Info,
        4 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
