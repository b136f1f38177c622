//! Identifiers used throughout OpenLedger.
//!
//! Ledger ids are opaque strings chosen by the surrounding platform (wallet
//! addresses, token symbols, transaction hashes). Each kind gets its own
//! newtype so a wallet can never be passed where a token is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::SYSTEM_WALLET;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Default, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Ledger participants
// ---------------------------------------------------------------------------

string_id!(
    /// A wallet address. The reserve wallet is [`WalletId::system`].
    WalletId
);

impl WalletId {
    /// The reserve wallet: source of every mint, sink of every burn.
    #[must_use]
    pub fn system() -> Self {
        Self(SYSTEM_WALLET.to_string())
    }

    #[must_use]
    pub fn is_system(&self) -> bool {
        self.0 == SYSTEM_WALLET
    }
}

string_id!(
    /// Token symbol or token-type id.
    TokenId
);

// ---------------------------------------------------------------------------
// Ledger records
// ---------------------------------------------------------------------------

string_id!(
    /// Transaction record id.
    TxId
);

string_id!(
    /// UTXO id, `<originating-tx-id>.<index>`.
    UtxoId
);

impl UtxoId {
    /// Deterministic id of the `index`-th output created by `origin`.
    #[must_use]
    pub fn for_output(origin: &str, index: usize) -> Self {
        Self(format!("{origin}.{index}"))
    }
}

// ---------------------------------------------------------------------------
// Fundraising
// ---------------------------------------------------------------------------

string_id!(
    /// Fundraising campaign id.
    CampaignId
);

string_id!(
    /// Asset backing a campaign's asset token.
    AssetId
);

string_id!(
    /// Caller-chosen purchase request id.
    RequestId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_wallet_is_forty_zeros() {
        let sys = WalletId::system();
        assert_eq!(sys.as_str().len(), 40);
        assert!(sys.as_str().bytes().all(|b| b == b'0'));
        assert!(sys.is_system());
        assert!(!WalletId::new("alice").is_system());
    }

    #[test]
    fn utxo_output_ids_are_positional() {
        assert_eq!(UtxoId::for_output("abc", 0).as_str(), "abc.0");
        assert_eq!(UtxoId::for_output("abc", 12).to_string(), "abc.12");
    }

    #[test]
    fn ids_serialize_as_bare_strings() {
        let json = serde_json::to_string(&TokenId::new("USDT")).unwrap();
        assert_eq!(json, "\"USDT\"");
        let back: TokenId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TokenId::new("USDT"));
    }
}
