//! pxg - Command-line front end for pixelgrid projects

use std::process::ExitCode;

use pixelgrid::cli;

fn main() -> ExitCode {
    cli::run()
}
