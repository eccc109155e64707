use std::process::ExitCode;

fn main() -> ExitCode {
    telcobot_cli::run()
}
