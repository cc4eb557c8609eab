use {
    crate::chain::Chain,
    alloy::{
        dyn_abi::DynSolValue,
        primitives::{Address, B256, U256, utils::format_ether},
    },
    anyhow::{Context, Result, bail, ensure},
    contracts::ArtifactSource,
    serde::Serialize,
    serde_with::{DisplayFromStr, serde_as},
    std::{io::Write, time::Duration},
};

/// Highest house fee the contract can sensibly be configured with.
pub const MAX_HOUSE_FEE_PERCENT: u8 = 100;

/// Constructor arguments of the FortuneWheel contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeployParameters {
    /// Price of a single spin in wei.
    pub spin_cost: U256,
    pub house_fee_percent: u8,
}

impl DeployParameters {
    /// Validates the human readable parameters. `spin_cost` is a decimal
    /// amount of ether.
    pub fn new(spin_cost: &str, house_fee_percent: u8) -> Result<Self> {
        let spin_cost = number::parse_ether(spin_cost).context("invalid spin cost")?;
        ensure!(!spin_cost.is_zero(), "spin cost must be positive");
        ensure!(
            house_fee_percent <= MAX_HOUSE_FEE_PERCENT,
            "house fee of {house_fee_percent}% exceeds {MAX_HOUSE_FEE_PERCENT}%"
        );
        Ok(Self {
            spin_cost,
            house_fee_percent,
        })
    }

    pub fn constructor_args(&self) -> Vec<DynSolValue> {
        vec![
            DynSolValue::Uint(self.spin_cost, 256),
            DynSolValue::Uint(U256::from(self.house_fee_percent), 256),
        ]
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub contract_name: String,
    pub parameters: DeployParameters,
    pub confirmations: u64,
    pub confirmation_timeout: Duration,
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub contract_name: String,
    pub address: Address,
    pub deployer: Address,
    pub transaction_hash: B256,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    pub chain_id: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub spin_cost: U256,
    pub house_fee_percent: u8,
}

/// Deploys the configured contract with the first available signer.
///
/// The two report lines (signer and deployed address) are written to `out`.
/// Exactly one deployment transaction is submitted; nothing is retried.
pub async fn deploy(
    chain: &dyn Chain,
    artifacts: &dyn ArtifactSource,
    config: &Config,
    out: &mut impl Write,
) -> Result<Deployment> {
    let chain_id = chain.chain_id().await?;
    tracing::info!(
        chain_id,
        network = contracts::networks::name(chain_id).unwrap_or("unknown"),
        "connected to node"
    );

    let signers = chain.signers().await.context("could not resolve signers")?;
    let Some(&deployer) = signers.first() else {
        bail!(
            "no signer available, configure a private key or mnemonic or use a node that manages \
             accounts"
        );
    };
    writeln!(out, "Deploying with: {deployer}")?;

    let balance = chain.balance(deployer).await?;
    tracing::debug!(%deployer, balance = %format_ether(balance), "deployer balance");
    if balance.is_zero() {
        tracing::warn!(%deployer, "deployer has no funds, deployment will fail unless gas is free");
    }

    let factory = artifacts
        .factory(&config.contract_name)
        .with_context(|| format!("could not load contract {}", config.contract_name))?;
    let init_code = factory
        .deploy_code(&config.parameters.constructor_args())
        .context("invalid constructor arguments")?;
    tracing::debug!(
        contract = factory.name(),
        spin_cost = %format_ether(config.parameters.spin_cost),
        house_fee_percent = config.parameters.house_fee_percent,
        bytecode_len = factory.bytecode().len(),
        init_code_len = init_code.len(),
        "submitting deployment"
    );

    let tx_hash = chain.submit_deployment(deployer, init_code).await?;
    tracing::info!(?tx_hash, "deployment submitted, waiting for confirmation");

    let receipt = chain
        .wait_for_confirmation(tx_hash, config.confirmations, config.confirmation_timeout)
        .await?;
    ensure!(
        receipt.success,
        "deployment transaction {tx_hash} reverted in block {:?}",
        receipt.block_number
    );
    let address = receipt
        .contract_address
        .with_context(|| format!("receipt of {tx_hash} does not contain a contract address"))?;
    tracing::info!(
        %address,
        block = ?receipt.block_number,
        gas_used = receipt.gas_used,
        "deployment confirmed"
    );
    writeln!(out, "{} deployed to: {address}", factory.name())?;

    Ok(Deployment {
        contract_name: factory.name().to_string(),
        address,
        deployer,
        transaction_hash: receipt.transaction_hash,
        block_number: receipt.block_number,
        gas_used: receipt.gas_used,
        chain_id,
        spin_cost: config.parameters.spin_cost,
        house_fee_percent: config.parameters.house_fee_percent,
    })
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::chain::{MockChain, Receipt},
        alloy::{
            json_abi::JsonAbi,
            primitives::{Bytes, address},
        },
        contracts::{ArtifactError, ContractFactory, MockArtifactSource},
        mockall::predicate::eq,
        std::path::PathBuf,
    };

    const SIGNER: Address = address!("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
    const DEPLOYED: Address = address!("0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");
    const BYTECODE: [u8; 5] = [0x60, 0x80, 0x60, 0x40, 0x52];

    fn tx_hash() -> B256 {
        B256::repeat_byte(0x11)
    }

    fn fortune_wheel() -> ContractFactory {
        let abi: JsonAbi = serde_json::from_str(
            r#"[{
                "type": "constructor",
                "stateMutability": "nonpayable",
                "inputs": [
                    { "name": "_spinCost", "type": "uint256", "internalType": "uint256" },
                    { "name": "_houseFeePercent", "type": "uint256", "internalType": "uint256" }
                ]
            }]"#,
        )
        .unwrap();
        ContractFactory::new("FortuneWheel", abi, Bytes::from_static(&BYTECODE))
    }

    fn artifacts() -> MockArtifactSource {
        let mut artifacts = MockArtifactSource::new();
        artifacts
            .expect_factory()
            .with(eq("FortuneWheel"))
            .returning(|_| Ok(fortune_wheel()));
        artifacts
    }

    fn config() -> Config {
        Config {
            contract_name: "FortuneWheel".into(),
            parameters: DeployParameters::new("0.001", 5).unwrap(),
            confirmations: 1,
            confirmation_timeout: Duration::from_secs(60),
        }
    }

    fn receipt() -> Receipt {
        Receipt {
            transaction_hash: tx_hash(),
            block_number: Some(7),
            gas_used: 420_000,
            success: true,
            contract_address: Some(DEPLOYED),
        }
    }

    /// Chain where reading state succeeds; submission and confirmation are
    /// left to the individual tests.
    fn chain(signers: Vec<Address>) -> MockChain {
        let mut chain = MockChain::new();
        chain.expect_chain_id().returning(|| Ok(31337));
        chain
            .expect_signers()
            .return_once(move || Ok(signers));
        chain
            .expect_balance()
            .returning(|_| Ok(U256::from(10).pow(U256::from(18))));
        chain
    }

    #[tokio::test]
    async fn deploys_and_reports_addresses() {
        let mut chain = chain(vec![SIGNER]);
        chain
            .expect_submit_deployment()
            .times(1)
            .withf(|from, init_code| {
                let spin_cost = U256::from(1_000_000_000_000_000u64);
                *from == SIGNER
                    && init_code.len() == BYTECODE.len() + 2 * 32
                    && init_code[..5] == BYTECODE
                    && init_code[5..37] == spin_cost.to_be_bytes::<32>()
                    && init_code[37..] == U256::from(5).to_be_bytes::<32>()
            })
            .returning(|_, _| Ok(tx_hash()));
        chain
            .expect_wait_for_confirmation()
            .times(1)
            .with(eq(tx_hash()), eq(1), eq(Duration::from_secs(60)))
            .returning(|_, _, _| Ok(receipt()));

        let mut out = Vec::new();
        let deployment = deploy(&chain, &artifacts(), &config(), &mut out)
            .await
            .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("Deploying with: {SIGNER}\nFortuneWheel deployed to: {DEPLOYED}\n")
        );
        assert_eq!(
            deployment,
            Deployment {
                contract_name: "FortuneWheel".into(),
                address: DEPLOYED,
                deployer: SIGNER,
                transaction_hash: tx_hash(),
                block_number: Some(7),
                gas_used: 420_000,
                chain_id: 31337,
                spin_cost: U256::from(1_000_000_000_000_000u64),
                house_fee_percent: 5,
            }
        );
    }

    #[tokio::test]
    async fn uses_first_signer() {
        let other = Address::repeat_byte(0xcc);
        let mut chain = chain(vec![SIGNER, other]);
        chain
            .expect_submit_deployment()
            .times(1)
            .withf(|from, _| *from == SIGNER)
            .returning(|_, _| Ok(tx_hash()));
        chain
            .expect_wait_for_confirmation()
            .returning(|_, _, _| Ok(receipt()));

        let deployment = deploy(&chain, &artifacts(), &config(), &mut Vec::new())
            .await
            .unwrap();
        assert_eq!(deployment.deployer, SIGNER);
    }

    #[tokio::test]
    async fn fails_without_signers() {
        let mut chain = chain(Vec::new());
        chain.expect_submit_deployment().never();

        let mut out = Vec::new();
        let err = deploy(&chain, &MockArtifactSource::new(), &config(), &mut out)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no signer available"));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn propagates_provider_failure() {
        let mut chain = MockChain::new();
        chain.expect_chain_id().returning(|| Ok(1));
        chain
            .expect_signers()
            .returning(|| Err(anyhow::anyhow!("connection refused")));
        chain.expect_submit_deployment().never();

        let err = deploy(&chain, &MockArtifactSource::new(), &config(), &mut Vec::new())
            .await
            .unwrap_err();
        assert!(format!("{err:?}").contains("connection refused"));
    }

    #[tokio::test]
    async fn fails_for_missing_artifact() {
        let mut chain = chain(vec![SIGNER]);
        chain.expect_submit_deployment().never();
        let mut artifacts = MockArtifactSource::new();
        artifacts.expect_factory().returning(|name| {
            Err(ArtifactError::NotFound {
                name: name.to_string(),
                root: PathBuf::from("artifacts"),
            })
        });

        let err = deploy(&chain, &artifacts, &config(), &mut Vec::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("could not load contract FortuneWheel"));
    }

    #[tokio::test]
    async fn fails_for_mismatching_constructor() {
        let mut chain = chain(vec![SIGNER]);
        chain.expect_submit_deployment().never();
        let mut artifacts = MockArtifactSource::new();
        artifacts.expect_factory().returning(|_| {
            Ok(ContractFactory::new(
                "FortuneWheel",
                JsonAbi::default(),
                Bytes::from_static(&BYTECODE),
            ))
        });

        let err = deploy(&chain, &artifacts, &config(), &mut Vec::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid constructor arguments"));
    }

    #[tokio::test]
    async fn fails_when_constructor_reverts() {
        let mut chain = chain(vec![SIGNER]);
        chain
            .expect_submit_deployment()
            .times(1)
            .returning(|_, _| Ok(tx_hash()));
        chain.expect_wait_for_confirmation().times(1).returning(|_, _, _| {
            Ok(Receipt {
                success: false,
                contract_address: None,
                ..receipt()
            })
        });

        let mut out = Vec::new();
        let err = deploy(&chain, &artifacts(), &config(), &mut out)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("reverted"));
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("Deploying with: {SIGNER}\n")
        );
    }

    #[tokio::test]
    async fn fails_without_contract_address() {
        let mut chain = chain(vec![SIGNER]);
        chain
            .expect_submit_deployment()
            .returning(|_, _| Ok(tx_hash()));
        chain.expect_wait_for_confirmation().returning(|_, _, _| {
            Ok(Receipt {
                contract_address: None,
                ..receipt()
            })
        });

        let err = deploy(&chain, &artifacts(), &config(), &mut Vec::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("does not contain a contract address"));
    }

    #[tokio::test]
    async fn confirmation_timeout_is_an_error() {
        let mut chain = chain(vec![SIGNER]);
        chain
            .expect_submit_deployment()
            .times(1)
            .returning(|_, _| Ok(tx_hash()));
        chain
            .expect_wait_for_confirmation()
            .times(1)
            .returning(|_, _, _| Err(anyhow::anyhow!("timed out")));

        assert!(
            deploy(&chain, &artifacts(), &config(), &mut Vec::new())
                .await
                .is_err()
        );
    }

    #[test]
    fn spin_cost_is_converted_to_wei() {
        let parameters = DeployParameters::new("0.001", 5).unwrap();
        assert_eq!(
            parameters.spin_cost * U256::from(1000),
            U256::from(10).pow(U256::from(18))
        );
        assert_eq!(
            parameters.constructor_args(),
            vec![
                DynSolValue::Uint(U256::from(1_000_000_000_000_000u64), 256),
                DynSolValue::Uint(U256::from(5), 256),
            ]
        );
    }

    #[test]
    fn validates_parameters() {
        assert!(DeployParameters::new("0", 5).is_err());
        assert!(DeployParameters::new("one", 5).is_err());
        assert!(DeployParameters::new("-0.001", 5).is_err());
        assert!(DeployParameters::new("0.001", 101).is_err());
        assert!(DeployParameters::new("0.001", 100).is_ok());
        assert!(DeployParameters::new("0.001", 0).is_ok());
    }
}
