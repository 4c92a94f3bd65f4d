use std::process::ExitCode;

fn main() -> ExitCode {
    paverly_cli::run()
}
