//! Domain name registration for one account.

use rand::Rng;

use crate::blockchain::{AccountClient, BlockchainResult, TransactionReceipt, TransactionSubmitter};
use crate::config::{FromTo, NamesConfig};

const NAME_FIRST: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const NAME_REST: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// A successfully registered name.
#[derive(Debug, Clone)]
pub struct MintedDomain {
    pub name: String,
    pub receipt: TransactionReceipt,
}

/// Random lowercase alphanumeric name starting with a letter.
pub fn generate_name<R: Rng + ?Sized>(rng: &mut R, length: FromTo) -> String {
    let len = rng.gen_range(length.from..=length.to.max(length.from)) as usize;
    (0..len)
        .map(|i| {
            let alphabet = if i == 0 { NAME_FIRST } else { NAME_REST };
            alphabet[rng.gen_range(0..alphabet.len())] as char
        })
        .collect()
}

/// Explorer page for a transaction.
pub fn explorer_tx_url(explorer_url: &str, hash: &str) -> String {
    format!("{}/{}?network=mainnet", explorer_url.trim_end_matches('/'), hash)
}

/// Registers a fresh name for the account it wraps.
pub struct DomainMinter<'a> {
    account: &'a AccountClient,
    names: &'a NamesConfig,
}

impl<'a> DomainMinter<'a> {
    pub fn new(account: &'a AccountClient, names: &'a NamesConfig) -> Self {
        Self { account, names }
    }

    /// Register `name`, or a random one when `None`.
    pub async fn mint(&self, name: Option<String>) -> BlockchainResult<MintedDomain> {
        let balance = self.account.get_balance(None).await;
        tracing::info!(address = %self.account.address(), balance = %balance, "Native balance");

        let name = name.unwrap_or_else(|| generate_name(&mut rand::thread_rng(), self.names.name_length));
        tracing::info!(address = %self.account.address(), name = %name, "Registering domain");

        let receipt = TransactionSubmitter::new(self.account)
            .register_domain(self.names, &name)
            .await?;

        tracing::info!(
            address = %self.account.address(),
            name = %name,
            explorer = %explorer_tx_url(&self.account.config().explorer_url, &receipt.hash.0),
            "Domain registered"
        );
        Ok(MintedDomain { name, receipt })
    }
}
