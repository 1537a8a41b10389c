use std::process::ExitCode;

fn main() -> ExitCode {
    match anamnesa_lib::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Startup failed: {e}");
            eprintln!("anamnesa: {e}");
            ExitCode::FAILURE
        }
    }
}
