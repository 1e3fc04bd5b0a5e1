use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::transaction::Transaction;

use crate::error::{LpError, LpResult};

/// Something that can sign transactions for one public key.
pub trait WalletSigner {
    fn pubkey(&self) -> Pubkey;

    /// Adds this wallet's signature using the transaction's recent blockhash.
    fn sign_transaction(&self, tx: &mut Transaction) -> LpResult<()>;

    fn sign_all_transactions(&self, txs: &mut [Transaction]) -> LpResult<()> {
        txs.iter_mut().try_for_each(|tx| self.sign_transaction(tx))
    }
}

/// Wallet backed by an in-memory keypair.
pub struct KeypairWallet {
    keypair: Keypair,
}

impl KeypairWallet {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }
}

impl WalletSigner for KeypairWallet {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    fn sign_transaction(&self, tx: &mut Transaction) -> LpResult<()> {
        let blockhash = tx.message.recent_blockhash;
        tx.try_partial_sign(&[&self.keypair], blockhash)
            .map_err(|err| LpError::Signing(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::hash::Hash;
    use solana_sdk::system_instruction;

    fn transfer_tx(payer: &Pubkey) -> Transaction {
        let ix = system_instruction::transfer(payer, &Pubkey::new_unique(), 1);
        let mut tx = Transaction::new_with_payer(&[ix], Some(payer));
        tx.message.recent_blockhash = Hash::new_unique();
        tx
    }

    #[test]
    fn signs_single_and_batch() {
        let wallet = KeypairWallet::new(Keypair::new());
        let mut single = transfer_tx(&wallet.pubkey());
        wallet.sign_transaction(&mut single).unwrap();
        assert!(single.is_signed());

        let mut batch = vec![transfer_tx(&wallet.pubkey()), transfer_tx(&wallet.pubkey())];
        wallet.sign_all_transactions(&mut batch).unwrap();
        assert!(batch.iter().all(Transaction::is_signed));
    }

    #[test]
    fn foreign_transaction_cannot_be_signed() {
        let wallet = KeypairWallet::new(Keypair::new());
        let mut tx = transfer_tx(&Pubkey::new_unique());
        assert!(matches!(wallet.sign_transaction(&mut tx), Err(LpError::Signing(_))));
    }
}
