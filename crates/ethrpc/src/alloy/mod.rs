mod instrumentation;
pub mod wallet;

#[cfg(any(test, feature = "test-util"))]
use alloy::providers::mock;
use {
    crate::AlloyProvider,
    alloy::{
        network::EthereumWallet,
        providers::{Provider, ProviderBuilder},
        rpc::client::ClientBuilder,
    },
    instrumentation::InstrumentationLayer,
    url::Url,
};

/// Creates a provider talking to the node at `url`.
///
/// With a wallet, transactions are signed locally before they are sent.
/// Without one they are sent unsigned via `eth_sendTransaction`, which only
/// works for accounts the node manages itself (e.g. development nodes).
pub fn provider(url: &Url, wallet: Option<EthereumWallet>) -> AlloyProvider {
    let rpc = ClientBuilder::default()
        .layer(InstrumentationLayer {
            label: "main".into(),
        })
        .http(url.clone());
    let builder = ProviderBuilder::new();
    match wallet {
        Some(wallet) => builder.wallet(wallet).connect_client(rpc).erased(),
        None => builder.connect_client(rpc).erased(),
    }
}

/// Provider answering requests with the responses queued on `asserter`.
///
/// Unlike [`provider`] it has no fillers, so every call issues exactly one
/// request and consumes exactly one queued response.
#[cfg(any(test, feature = "test-util"))]
pub fn mock_provider(asserter: mock::Asserter) -> AlloyProvider {
    ProviderBuilder::default()
        .connect_mocked_client(asserter)
        .erased()
}
