use {
    alloy::{
        network::EthereumWallet,
        signers::local::{MnemonicBuilder, PrivateKeySigner, coins_bip39::English},
    },
    anyhow::{Context, Result},
    std::fmt,
};

/// Secrets from which the signing identities are derived.
#[derive(Clone, Default)]
pub struct Credentials {
    /// Hex encoded private keys, with or without `0x` prefix.
    pub private_keys: Vec<String>,
    /// BIP-39 phrase to derive accounts from.
    pub mnemonic: Option<String>,
    /// Number of accounts to derive from the mnemonic.
    pub mnemonic_accounts: u32,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("private_keys", &format_args!("{} SECRET", self.private_keys.len()))
            .field("mnemonic", &self.mnemonic.as_ref().map(|_| "SECRET"))
            .field("mnemonic_accounts", &self.mnemonic_accounts)
            .finish()
    }
}

impl Credentials {
    pub fn is_empty(&self) -> bool {
        self.private_keys.is_empty() && self.mnemonic.is_none()
    }

    /// Signers in a stable order: the private keys as given, followed by the
    /// accounts derived from the mnemonic (index `0..mnemonic_accounts`).
    /// Duplicate accounts only keep their first position.
    pub fn signers(&self) -> Result<Vec<PrivateKeySigner>> {
        let mut signers: Vec<PrivateKeySigner> = Vec::new();
        let mut push = |signer: PrivateKeySigner| {
            if !signers.iter().any(|s| s.address() == signer.address()) {
                signers.push(signer);
            }
        };

        for (i, key) in self.private_keys.iter().enumerate() {
            // Parse errors may contain the key itself.
            let signer: PrivateKeySigner = key
                .trim()
                .parse()
                .ok()
                .with_context(|| format!("private key #{i} is not a valid secp256k1 key"))?;
            push(signer);
        }

        if let Some(phrase) = &self.mnemonic {
            for index in 0..self.mnemonic_accounts {
                let signer = MnemonicBuilder::<English>::default()
                    .phrase(phrase.trim())
                    .index(index)
                    .context("invalid derivation index")?
                    .build()
                    .with_context(|| format!("could not derive account {index} from mnemonic"))?;
                push(signer);
            }
        }

        Ok(signers)
    }
}

/// Wallet holding all `signers`; the first one becomes the default signer.
pub fn wallet(signers: impl IntoIterator<Item = PrivateKeySigner>) -> Option<EthereumWallet> {
    let mut signers = signers.into_iter();
    let mut wallet = EthereumWallet::new(signers.next()?);
    for signer in signers {
        wallet.register_signer(signer);
    }
    Some(wallet)
}
