//! vgl - a friendlier command-line front end for git

use std::process::ExitCode;

use vgl::cli;
use vgl::ui::output;

fn main() -> ExitCode {
    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<clap::Error>() {
                Some(usage) => {
                    let _ = usage.print();
                }
                None => output::error(format!("{err:#}")),
            }
            ExitCode::from(cli::exit_code(&err))
        }
    }
}
