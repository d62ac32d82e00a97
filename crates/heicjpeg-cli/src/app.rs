/// Terminal frontend: select the input, start the run, pump events into a
/// renderer until the runner reports it has finished.
use crate::cli::Cli;
use crate::render::{JsonRenderer, TerminalRenderer};
use crate::state::HostState;
use anyhow::{bail, Context};
use heicjpeg_core::runner::progress::RunObserver;
use heicjpeg_core::runner::state::RunState;
use heicjpeg_core::ConversionRunner;
use std::io::{self, IsTerminal};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{info, warn};

/// How long the pump sleeps when the channel is empty.
const TICK: Duration = Duration::from_millis(16);

/// Run one conversion described by `cli` to completion.
///
/// Scoped item failures are reported but do not fail the process; an
/// invalid selection or a fatal run error does. A fatal run error has
/// already been rendered, so it only maps to a failing exit code.
pub fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut state = HostState::new(ConversionRunner::default(), cli.lang);

    if !state.select(cli.input.clone(), cli.mode.map(Into::into)) {
        bail!("{}", state.status_text());
    }
    info!("{}", state.status_text());

    if cli.json {
        let mut renderer = JsonRenderer::new(io::stdout().lock());
        pump(&mut state, &mut renderer)?;
        let _stdout = renderer.finish().context("failed to write events")?;
    } else {
        let mut renderer = if io::stderr().is_terminal() {
            TerminalRenderer::new(state.language)
        } else {
            TerminalRenderer::hidden(state.language)
        };
        pump(&mut state, &mut renderer)?;
    }

    if run_failed(state.run_state()) {
        return Ok(ExitCode::FAILURE);
    }
    if state.item_error_count > 0 {
        warn!("{} item(s) could not be processed", state.item_error_count);
    }
    Ok(ExitCode::SUCCESS)
}

/// Whether a finished run should fail the process. Cancellation and
/// per-item errors do not.
fn run_failed(run: RunState) -> bool {
    matches!(run, RunState::Failed | RunState::Rejected)
}

fn pump<O: RunObserver>(state: &mut HostState, renderer: &mut O) -> anyhow::Result<()> {
    if !state.start_conversion() {
        bail!("{}", state.status_text());
    }
    while state.is_converting() {
        if !state.process_run_messages(renderer) {
            std::thread::sleep(TICK);
        }
    }
    Ok(())
}
