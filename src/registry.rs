use std::collections::HashMap;

use solana_sdk::pubkey::Pubkey;

use crate::config::{parse_pubkey, USDT_MINT_ECLIPSE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub mint: Pubkey,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
}

/// Small hard-coded mint registry, used only to make log lines readable.
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    tokens: HashMap<Pubkey, TokenInfo>,
}

impl Default for TokenRegistry {
    fn default() -> Self {
        let mut registry = Self { tokens: HashMap::new() };
        // Native mint is bridged ETH on Eclipse.
        registry.insert(TokenInfo {
            mint: spl_token::native_mint::id(),
            symbol: "ETH".to_string(),
            name: "Ethereum".to_string(),
            decimals: 9,
        });
        if let Ok(usdt) = parse_pubkey(USDT_MINT_ECLIPSE) {
            registry.insert(TokenInfo {
                mint: usdt,
                symbol: "USDT".to_string(),
                name: "Tether USD".to_string(),
                decimals: 6,
            });
        }
        registry
    }
}

impl TokenRegistry {
    pub fn insert(&mut self, token: TokenInfo) {
        self.tokens.insert(token.mint, token);
    }

    pub fn get(&self, mint: &Pubkey) -> Option<&TokenInfo> {
        self.tokens.get(mint)
    }

    /// Display symbol for a mint; unknown mints fall back to a truncated address.
    pub fn symbol(&self, mint: &Pubkey) -> String {
        match self.get(mint) {
            Some(token) => token.symbol.clone(),
            None => truncate_address(mint),
        }
    }

    /// Registry entry, or a placeholder carrying the given on-chain decimals.
    pub fn info_or_placeholder(&self, mint: &Pubkey, decimals: u8) -> TokenInfo {
        match self.get(mint) {
            Some(token) => token.clone(),
            None => {
                let address = mint.to_string();
                TokenInfo {
                    mint: *mint,
                    symbol: format!("TOKEN_{}", &address[..4]),
                    name: format!("Unknown Token {}", &address[..8]),
                    decimals,
                }
            }
        }
    }

    /// `"ETH/USDT"` style label for a pair.
    pub fn pair_label(&self, mint_a: &Pubkey, mint_b: &Pubkey) -> String {
        format!("{}/{}", self.symbol(mint_a), self.symbol(mint_b))
    }
}

/// First 8 characters of the base58 address followed by `...`.
pub fn truncate_address(mint: &Pubkey) -> String {
    let address = mint.to_string();
    let cut = address.len().min(8);
    format!("{}...", &address[..cut])
}
