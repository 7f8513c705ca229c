use std::process::ExitCode;

fn main() -> ExitCode {
    encore_cli::run()
}
