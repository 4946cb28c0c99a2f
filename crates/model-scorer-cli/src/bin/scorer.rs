use std::process::ExitCode;

use model_scorer_cli::cli::cli_main;
use model_scorer_cli::logging::init_logger;
use model_scorer_cli::print_err;

fn main() -> ExitCode {
    init_logger();

    match cli_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_err!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
