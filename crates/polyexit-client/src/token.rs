//! Bridged tokens and the burn events their exits are proven from.

use std::fmt;

use alloy_primitives::{Address, B256};
use polyexit_proof::EventSignature;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Operation called on the token of the wrong chain
    #[error("{operation} requires the {expected} token, {address} is the {actual} token")]
    WrongChain {
        operation: &'static str,
        address: Address,
        expected: ChainRole,
        actual: ChainRole,
    },
    #[error("{standard} tokens have no {kind} exit")]
    UnsupportedExit {
        standard: TokenStandard,
        kind: ExitKind,
    },
}

/// Token interface, which determines the burn events emitted on the child chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum TokenStandard {
    Erc20,
    Erc721,
    Erc1155,
}

/// Which child chain withdrawal the exit proves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum ExitKind {
    /// `withdraw` of one amount or token id
    Single,
    /// `withdrawBatch` of several token ids.
    ///
    /// An ERC-721 batch is proven from its single `WithdrawnBatch` log, so a burn yields one
    /// payload per batch log. The per-token `Transfer` logs emitted alongside it are not
    /// exits of their own.
    Batch,
    /// `withdrawWithMetadata` of an ERC-721 token
    WithMetadata,
}

impl TokenStandard {
    /// Burn event signature of the given withdrawal, if the standard supports it
    pub fn exit_signature(&self, kind: ExitKind) -> Option<B256> {
        match (self, kind) {
            (TokenStandard::Erc20, ExitKind::Single) => Some(EventSignature::ERC20_TRANSFER),
            (TokenStandard::Erc721, ExitKind::Single) => Some(EventSignature::ERC721_TRANSFER),
            (TokenStandard::Erc721, ExitKind::Batch) => {
                Some(EventSignature::ERC721_BATCH_TRANSFER)
            }
            (TokenStandard::Erc721, ExitKind::WithMetadata) => {
                Some(EventSignature::ERC721_TRANSFER_WITH_METADATA)
            }
            (TokenStandard::Erc1155, ExitKind::Single) => Some(EventSignature::ERC1155_TRANSFER),
            (TokenStandard::Erc1155, ExitKind::Batch) => {
                Some(EventSignature::ERC1155_BATCH_TRANSFER)
            }
            _ => None,
        }
    }
}

impl fmt::Display for TokenStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TokenStandard::Erc20 => "ERC-20",
            TokenStandard::Erc721 => "ERC-721",
            TokenStandard::Erc1155 => "ERC-1155",
        })
    }
}

impl fmt::Display for ExitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExitKind::Single => "single",
            ExitKind::Batch => "batch",
            ExitKind::WithMetadata => "with-metadata",
        })
    }
}

/// Chain a token contract lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainRole {
    /// Root chain (Ethereum)
    Parent,
    /// Child chain (Polygon PoS)
    Child,
}

impl fmt::Display for ChainRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChainRole::Parent => "parent",
            ChainRole::Child => "child",
        })
    }
}

/// A mapped token as seen from one chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BridgeToken {
    pub address: Address,
    pub role: ChainRole,
    pub standard: TokenStandard,
}

impl BridgeToken {
    pub fn parent(address: Address, standard: TokenStandard) -> Self {
        Self {
            address,
            role: ChainRole::Parent,
            standard,
        }
    }

    pub fn child(address: Address, standard: TokenStandard) -> Self {
        Self {
            address,
            role: ChainRole::Child,
            standard,
        }
    }

    /// Burn event an exit of this token is proven from. Exits are claimed on the root
    /// chain, so only parent tokens have one.
    pub fn exit_signature(&self, kind: ExitKind) -> Result<B256, TokenError> {
        self.ensure_role(ChainRole::Parent, "exit")?;
        self.standard
            .exit_signature(kind)
            .ok_or(TokenError::UnsupportedExit {
                standard: self.standard,
                kind,
            })
    }

    fn ensure_role(&self, expected: ChainRole, operation: &'static str) -> Result<(), TokenError> {
        if self.role == expected {
            Ok(())
        } else {
            Err(TokenError::WrongChain {
                operation,
                address: self.address,
                expected,
                actual: self.role,
            })
        }
    }
}
