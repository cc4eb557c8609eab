use {
    crate::deploy::{Config, DeployParameters},
    anyhow::Result,
    ethrpc::Credentials,
    std::{
        fmt::{self, Display, Formatter},
        path::PathBuf,
        time::Duration,
    },
    url::Url,
};

#[derive(clap::Parser)]
pub struct LoggingArguments {
    #[clap(
        long,
        env,
        default_value = "warn,deployer=debug,contracts=debug,ethrpc=debug"
    )]
    pub log_filter: String,
}

impl Display for LoggingArguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self { log_filter } = self;

        writeln!(f, "log_filter: {log_filter}")
    }
}

#[derive(clap::Parser)]
#[clap(version, about = "Deploys the FortuneWheel contract")]
pub struct Arguments {
    #[clap(flatten)]
    pub logging: LoggingArguments,

    /// The Ethereum node URL to connect to.
    #[clap(long, env, default_value = "http://localhost:8545")]
    pub node_url: Url,

    /// Private keys of the accounts to deploy with, comma separated. The first
    /// one sends the deployment.
    #[clap(long, env, hide_env_values = true, value_delimiter = ',')]
    pub private_key: Vec<String>,

    /// BIP-39 mnemonic to derive deployer accounts from. Used after the
    /// private keys.
    #[clap(long, env, hide_env_values = true)]
    pub mnemonic: Option<String>,

    /// How many accounts to derive from the mnemonic.
    #[clap(long, env, default_value = "1")]
    pub mnemonic_accounts: u32,

    /// Directory with the Hardhat or Foundry build artifacts.
    #[clap(long, env, default_value = "artifacts")]
    pub artifacts_path: PathBuf,

    /// Name of the contract to deploy, optionally fully qualified as
    /// `<source file>:<contract>`.
    #[clap(long, env, default_value = "FortuneWheel")]
    pub contract_name: String,

    /// Price of a single spin in ether.
    #[clap(long, env, default_value = "0.001")]
    pub spin_cost: String,

    /// Share of every spin kept by the house, in percent.
    #[clap(long, env, default_value = "5")]
    pub house_fee_percent: u8,

    /// Number of confirmations to wait for, the block containing the
    /// deployment counts as the first one.
    #[clap(
        long,
        env,
        default_value = "1",
        value_parser = clap::value_parser!(u64).range(1..),
    )]
    pub confirmations: u64,

    /// How long to wait for the deployment to be confirmed.
    #[clap(
        long,
        env,
        default_value = "5m",
        value_parser = humantime::parse_duration,
    )]
    pub confirmation_timeout: Duration,

    /// If set, a JSON record of the deployment is written to
    /// `<path>/<chain id>/<contract name>.json`.
    #[clap(long, env)]
    pub deployments_path: Option<PathBuf>,
}

impl Arguments {
    pub fn credentials(&self) -> Credentials {
        Credentials {
            private_keys: self
                .private_key
                .iter()
                .filter(|key| !key.trim().is_empty())
                .cloned()
                .collect(),
            mnemonic: self.mnemonic.clone().filter(|m| !m.trim().is_empty()),
            mnemonic_accounts: self.mnemonic_accounts,
        }
    }

    pub fn config(&self) -> Result<Config> {
        Ok(Config {
            contract_name: self.contract_name.clone(),
            parameters: DeployParameters::new(&self.spin_cost, self.house_fee_percent)?,
            confirmations: self.confirmations,
            confirmation_timeout: self.confirmation_timeout,
        })
    }
}

impl Display for Arguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            logging,
            node_url,
            private_key,
            mnemonic,
            mnemonic_accounts,
            artifacts_path,
            contract_name,
            spin_cost,
            house_fee_percent,
            confirmations,
            confirmation_timeout,
            deployments_path,
        } = self;

        write!(f, "{logging}")?;
        writeln!(f, "node_url: {node_url}")?;
        writeln!(f, "private_key: {} SECRET", private_key.len())?;
        display_secret_option(f, "mnemonic", mnemonic)?;
        writeln!(f, "mnemonic_accounts: {mnemonic_accounts}")?;
        writeln!(f, "artifacts_path: {}", artifacts_path.display())?;
        writeln!(f, "contract_name: {contract_name}")?;
        writeln!(f, "spin_cost: {spin_cost}")?;
        writeln!(f, "house_fee_percent: {house_fee_percent}")?;
        writeln!(f, "confirmations: {confirmations}")?;
        writeln!(f, "confirmation_timeout: {confirmation_timeout:?}")?;
        writeln!(
            f,
            "deployments_path: {:?}",
            deployments_path.as_ref().map(|path| path.display())
        )?;
        Ok(())
    }
}

fn display_secret_option<T>(f: &mut Formatter<'_>, name: &str, option: &Option<T>) -> fmt::Result {
    writeln!(
        f,
        "{name}: {}",
        if option.is_some() { "SECRET" } else { "None" }
    )
}

#[cfg(test)]
mod tests {
    use {super::*, clap::Parser};

    #[test]
    fn defaults() {
        let args = Arguments::try_parse_from(["deployer"]).unwrap();
        assert_eq!(args.node_url.as_str(), "http://localhost:8545/");
        assert_eq!(args.contract_name, "FortuneWheel");
        assert_eq!(args.confirmation_timeout, Duration::from_secs(300));
        assert!(args.deployments_path.is_none());

        let config = args.config().unwrap();
        assert_eq!(
            config.parameters,
            DeployParameters::new("0.001", 5).unwrap()
        );
        assert_eq!(config.confirmations, 1);
    }

    #[test]
    fn collects_credentials() {
        let args = Arguments::try_parse_from([
            "deployer",
            "--private-key",
            "0x01,,0x02",
            "--mnemonic",
            "test test test test test test test test test test test junk",
            "--mnemonic-accounts",
            "3",
        ])
        .unwrap();

        let credentials = args.credentials();
        assert_eq!(credentials.private_keys, vec!["0x01", "0x02"]);
        assert!(credentials.mnemonic.is_some());
        assert_eq!(credentials.mnemonic_accounts, 3);
    }

    #[test]
    fn display_redacts_secrets() {
        let args = Arguments::try_parse_from([
            "deployer",
            "--private-key",
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
            "--mnemonic",
            "test test test test test test test test test test test junk",
            "--confirmation-timeout",
            "30s",
        ])
        .unwrap();

        let display = args.to_string();
        assert!(!display.contains("ac0974"));
        assert!(!display.contains("junk"));
        assert!(display.contains("private_key: 1 SECRET"));
        assert!(display.contains("mnemonic: SECRET"));
        assert!(display.contains("confirmation_timeout: 30s"));
    }

    #[test]
    fn rejects_invalid_parameters() {
        let args = Arguments::try_parse_from(["deployer", "--house-fee-percent", "101"]).unwrap();
        assert!(args.config().is_err());

        let args = Arguments::try_parse_from(["deployer", "--spin-cost", "0"]).unwrap();
        assert!(args.config().is_err());

        assert!(Arguments::try_parse_from(["deployer", "--house-fee-percent", "256"]).is_err());
        assert!(Arguments::try_parse_from(["deployer", "--confirmations", "0"]).is_err());

        let args = Arguments::try_parse_from(["deployer", "--confirmations", "3"]).unwrap();
        assert_eq!(args.config().unwrap().confirmations, 3);
    }
}
