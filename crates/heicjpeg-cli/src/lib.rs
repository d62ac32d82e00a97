/// heicjpeg CLI: the terminal host for the conversion pipeline.
///
/// Owns everything the core deliberately leaves out: input selection and
/// validation, localized status text, progress display and argument
/// parsing.
pub mod app;
pub mod cli;
pub mod render;
pub mod state;
pub mod strings;

pub use cli::Cli;
pub use state::HostState;
