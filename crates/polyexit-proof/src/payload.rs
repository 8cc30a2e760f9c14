//! Exit payload encoding and exit hash derivation.

use std::fmt;

use alloy_primitives::{keccak256, Bytes, B256, U256};
use alloy_rlp::{Decodable, Encodable, Header, RlpDecodable, RlpEncodable};
use alloy_sol_types::SolValue;

/// The ten fields of an exit payload, in encoding order
#[derive(Debug, Clone, PartialEq, Eq, RlpEncodable, RlpDecodable)]
pub struct ExitPayloadFields {
    /// Checkpoint key (`headerBlocks` index)
    pub header_block_number: u64,
    /// Concatenated 32-byte block inclusion proof nodes
    pub block_proof: Bytes,
    pub block_number: u64,
    pub timestamp: u64,
    pub transactions_root: B256,
    pub receipts_root: B256,
    /// Receipt bytes as stored in the receipts trie
    pub receipt: Bytes,
    /// RLP list of the raw receipts trie nodes
    pub receipt_parent_nodes: Bytes,
    /// `0x00` followed by the receipts trie key
    pub path: Bytes,
    /// Position of the burn log in the receipt
    pub log_index: u64,
}

impl ExitPayloadFields {
    /// Key of this exit in `RootChainManager.processedExits`
    pub fn exit_hash(&self) -> B256 {
        exit_hash(
            self.block_number,
            self.path.get(1..).unwrap_or_default(),
            self.log_index,
        )
    }
}

/// Canonically encoded exit payload, the `inputData` of `RootChainManager.exit`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitPayload(Bytes);

impl ExitPayload {
    pub fn encode(fields: &ExitPayloadFields) -> Self {
        let mut out = Vec::with_capacity(fields.length());
        fields.encode(&mut out);
        Self(out.into())
    }

    pub fn decode_fields(&self) -> Result<ExitPayloadFields, alloy_rlp::Error> {
        let mut buf = self.0.as_ref();
        let fields = ExitPayloadFields::decode(&mut buf)?;
        if !buf.is_empty() {
            return Err(alloy_rlp::Error::UnexpectedLength);
        }
        Ok(fields)
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl From<Bytes> for ExitPayload {
    fn from(bytes: Bytes) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for ExitPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// RLP list whose items are the given already-encoded trie nodes
pub fn encode_parent_nodes(nodes: &[Bytes]) -> Bytes {
    let payload_length: usize = nodes.iter().map(|node| node.len()).sum();
    let mut out = Vec::with_capacity(payload_length + 9);
    Header {
        list: true,
        payload_length,
    }
    .encode(&mut out);
    for node in nodes {
        out.extend_from_slice(node);
    }
    out.into()
}

/// Split an RLP list into its raw items, inverse of [`encode_parent_nodes`]
pub fn decode_parent_nodes(encoded: &[u8]) -> Result<Vec<Bytes>, alloy_rlp::Error> {
    let mut buf = encoded;
    let header = Header::decode(&mut buf)?;
    if !header.list {
        return Err(alloy_rlp::Error::UnexpectedString);
    }
    if header.payload_length != buf.len() {
        return Err(alloy_rlp::Error::UnexpectedLength);
    }

    let mut nodes = Vec::new();
    while !buf.is_empty() {
        let item = buf;
        let item_header = Header::decode(&mut buf)?;
        if item_header.payload_length > buf.len() {
            return Err(alloy_rlp::Error::InputTooShort);
        }
        let consumed = item.len() - buf.len() + item_header.payload_length;
        nodes.push(Bytes::copy_from_slice(&item[..consumed]));
        buf = &item[consumed..];
    }
    Ok(nodes)
}

/// Payload path field: a zero flag byte followed by the trie key
pub fn encode_exit_path(path: &[u8]) -> Bytes {
    let mut out = Vec::with_capacity(path.len() + 1);
    out.push(0x00);
    out.extend_from_slice(path);
    out.into()
}

/// Each byte split into its high and low nibble
pub fn path_to_nibbles(path: &[u8]) -> Vec<u8> {
    path.iter().flat_map(|byte| [byte >> 4, byte & 0x0f]).collect()
}

/// `keccak256(abi.encodePacked(uint256 blockNumber, bytes nibbles, uint256 logIndex))`,
/// the key of `RootChainManager.processedExits`
pub fn exit_hash(block_number: u64, path: &[u8], log_index: u64) -> B256 {
    let packed = (
        U256::from(block_number),
        Bytes::from(path_to_nibbles(path)),
        U256::from(log_index),
    )
        .abi_encode_packed();
    keccak256(packed)
}
