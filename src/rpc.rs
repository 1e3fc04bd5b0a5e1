use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use solana_account_decoder::UiAccountEncoding;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig};
use solana_client::rpc_filter::RpcFilterType;
use solana_sdk::account::Account;
use solana_sdk::pubkey::Pubkey;

use crate::error::LpResult;

/// Read-only account access. Implemented by the RPC client and by an
/// in-memory map for offline use.
#[async_trait]
pub trait AccountSource: Send + Sync {
    /// `Ok(None)` when the account does not exist.
    async fn get_account(&self, address: &Pubkey) -> LpResult<Option<Account>>;

    /// Accounts owned by `program_id` that pass every filter.
    async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        filters: Vec<RpcFilterType>,
    ) -> LpResult<Vec<(Pubkey, Account)>>;
}

#[async_trait]
impl AccountSource for RpcClient {
    async fn get_account(&self, address: &Pubkey) -> LpResult<Option<Account>> {
        let response = self.get_account_with_commitment(address, self.commitment()).await?;
        Ok(response.value)
    }

    async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        filters: Vec<RpcFilterType>,
    ) -> LpResult<Vec<(Pubkey, Account)>> {
        let config = RpcProgramAccountsConfig {
            filters: Some(filters),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                commitment: Some(self.commitment()),
                ..RpcAccountInfoConfig::default()
            },
            ..RpcProgramAccountsConfig::default()
        };
        Ok(self.get_program_accounts_with_config(program_id, config).await?)
    }
}

/// Account snapshot held in memory. Records every address it is asked for.
#[derive(Default)]
pub struct MemoryAccounts {
    accounts: HashMap<Pubkey, Account>,
    reads: Mutex<Vec<Pubkey>>,
}

impl MemoryAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, address: Pubkey, account: Account) {
        self.accounts.insert(address, account);
    }

    pub fn with_account(mut self, address: Pubkey, account: Account) -> Self {
        self.insert(address, account);
        self
    }

    /// Addresses read so far, in order.
    pub fn reads(&self) -> Vec<Pubkey> {
        self.reads.lock().map(|reads| reads.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl AccountSource for MemoryAccounts {
    async fn get_account(&self, address: &Pubkey) -> LpResult<Option<Account>> {
        if let Ok(mut reads) = self.reads.lock() {
            reads.push(*address);
        }
        Ok(self.accounts.get(address).cloned())
    }

    async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        filters: Vec<RpcFilterType>,
    ) -> LpResult<Vec<(Pubkey, Account)>> {
        let matches = self
            .accounts
            .iter()
            .filter(|(_, account)| account.owner == *program_id)
            .filter(|(_, account)| filters.iter().all(|filter| filter_allows(filter, &account.data)))
            .map(|(address, account)| (*address, account.clone()))
            .collect();
        Ok(matches)
    }
}

fn filter_allows(filter: &RpcFilterType, data: &[u8]) -> bool {
    match filter {
        RpcFilterType::DataSize(size) => data.len() as u64 == *size,
        RpcFilterType::Memcmp(memcmp) => memcmp.bytes_match(data),
        _ => true,
    }
}

/// Builds an account owned by `owner` holding `data`.
pub fn program_account(owner: Pubkey, data: Vec<u8>) -> Account {
    Account {
        lamports: 1_000_000,
        data,
        owner,
        executable: false,
        rent_epoch: 0,
    }
}
