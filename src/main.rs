//! Pixelgrid - command-line tool for rendering pixel art from character-grid specs

use std::process::ExitCode;

use pixelgrid::cli;

fn main() -> ExitCode {
    cli::run()
}
