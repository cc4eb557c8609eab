use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    deployer::start(std::env::args()).await
}
