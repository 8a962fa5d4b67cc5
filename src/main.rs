use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match dental_clinic_lib::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("dental-clinic: {e}");
            ExitCode::FAILURE
        }
    }
}
