/// Run observers that turn events into terminal output.
///
/// - [`TerminalRenderer`]: localized status lines above an `indicatif` bar.
/// - [`JsonRenderer`]: one JSON object per event, for machine hosts.
use crate::strings::{render_status, Language};
use heicjpeg_core::runner::progress::{RunEvent, RunObserver, StatusEvent};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use tracing::warn;

const BAR_TEMPLATE: &str = "{bar:40.cyan/blue} {pos:>3}%";

/// Human-facing output.
pub struct TerminalRenderer {
    bar: ProgressBar,
    language: Language,
}

impl TerminalRenderer {
    pub fn new(language: Language) -> Self {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        bar.set_style(style);
        Self { bar, language }
    }

    /// A renderer that draws nothing; used when stderr is not a terminal
    /// and in tests.
    pub fn hidden(language: Language) -> Self {
        Self {
            bar: ProgressBar::hidden(),
            language,
        }
    }
}

impl RunObserver for TerminalRenderer {
    fn on_progress(&mut self, percent: u8) {
        self.bar.set_position(u64::from(percent));
    }

    fn on_status(&mut self, status: &StatusEvent) {
        let line = render_status(self.language, status);
        if self.bar.is_hidden() {
            println!("{line}");
        } else {
            self.bar.println(line);
        }
    }

    fn on_finished(&mut self) {
        self.bar.finish_and_clear();
    }
}

/// Writes each event as a JSON line to `out`.
///
/// Observer callbacks cannot fail, so the first write error is kept and
/// reported by [`JsonRenderer::finish`].
pub struct JsonRenderer<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, error: None }
    }

    fn emit(&mut self, event: &RunEvent) {
        if self.error.is_some() {
            return;
        }
        let written = serde_json::to_writer(&mut self.out, event)
            .map_err(io::Error::from)
            .and_then(|()| self.out.write_all(b"\n"))
            .and_then(|()| self.out.flush());
        if let Err(err) = written {
            warn!("Failed to write event: {err}");
            self.error = Some(err);
        }
    }

    /// Surface the first write error, if any, and hand back the writer.
    pub fn finish(self) -> io::Result<W> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.out),
        }
    }
}

impl<W: Write> RunObserver for JsonRenderer<W> {
    fn on_progress(&mut self, percent: u8) {
        self.emit(&RunEvent::Progress { percent });
    }

    fn on_status(&mut self, status: &StatusEvent) {
        self.emit(&RunEvent::Status(status.clone()));
    }

    fn on_finished(&mut self) {
        self.emit(&RunEvent::Finished);
    }
}
