pub mod arguments;
pub mod chain;
pub mod deploy;
pub mod record;

use {
    crate::{
        arguments::Arguments,
        chain::Node,
        deploy::Deployment,
    },
    anyhow::Result,
    clap::Parser,
    contracts::Artifacts,
    std::process::ExitCode,
};

/// Parses the command line and environment, deploys the contract and maps
/// the outcome to the process exit code.
pub async fn start(args: impl IntoIterator<Item = String>) -> ExitCode {
    let dotenv = dotenvy::dotenv();
    let args = match Arguments::try_parse_from(args) {
        Ok(args) => args,
        Err(err) => {
            // Help and version go to stdout, usage errors to stderr. If even
            // that write fails the exit code is all that is left.
            err.print().ok();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    observe::tracing::initialize(&args.logging.log_filter);
    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded environment file"),
        Err(err) if err.not_found() => (),
        Err(err) => {
            tracing::error!(?err, "could not load environment file");
            return ExitCode::FAILURE;
        }
    }
    tracing::info!("running deployer with validated arguments:\n{}", args);

    match run(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(?err, "deployment failed");
            ExitCode::FAILURE
        }
    }
}

pub async fn run(args: Arguments) -> Result<Deployment> {
    let config = args.config()?;
    let credentials = args.credentials();
    if credentials.is_empty() {
        tracing::info!("no private key or mnemonic configured, using accounts of the node");
    }
    let chain = Node::new(&args.node_url, &credentials)?;
    let artifacts = Artifacts::new(args.artifacts_path.clone());

    let deployment = deploy::deploy(&chain, &artifacts, &config, &mut std::io::stdout()).await?;
    if let Some(dir) = &args.deployments_path {
        let path = record::write(dir, &deployment)?;
        tracing::info!(path = %path.display(), "deployment record written");
    }
    Ok(deployment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_parameters_fail_before_connecting() {
        let args = Arguments::try_parse_from([
            "deployer",
            "--node-url",
            "http://127.0.0.1:1",
            "--spin-cost",
            "0.0000000000000000001",
        ])
        .unwrap();
        let err = run(args).await.unwrap_err();
        assert!(err.to_string().contains("invalid spin cost"));
    }

    #[tokio::test]
    async fn unreachable_node_is_an_error() {
        let args = Arguments::try_parse_from(["deployer", "--node-url", "http://127.0.0.1:1"])
            .unwrap();
        assert!(run(args).await.is_err());
    }

    #[tokio::test]
    async fn invalid_private_key_is_an_error() {
        let args = Arguments::try_parse_from(["deployer", "--private-key", "0x1234"]).unwrap();
        let err = run(args).await.unwrap_err();
        assert!(format!("{err:?}").contains("could not load signers"));
    }
}
