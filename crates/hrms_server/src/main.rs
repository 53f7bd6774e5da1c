use hrms_server::ServerConfig;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("hrms_server: {err}");
            return ExitCode::FAILURE;
        }
    };

    match hrms_server::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("hrms_server: {err}");
            ExitCode::FAILURE
        }
    }
}
