//! JSON file written by the `payload` and `payloads` commands.

use std::path::Path;

use alloy_primitives::{Address, Bytes, B256};
use anyhow::Context;
use polyexit_proof::ExitPayload;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::exit_calldata;

/// Exits of one burn transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitOutput {
    pub burn_tx_hash: B256,
    /// Contract the exits are submitted to
    pub root_chain_manager: Address,
    pub exits: Vec<ExitEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitEntry {
    pub log_index: u64,
    pub exit_hash: B256,
    pub payload: Bytes,
    /// `exit(payload)` call data, when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calldata: Option<Bytes>,
}

impl ExitEntry {
    pub fn from_payload(payload: &ExitPayload, with_calldata: bool) -> Result<Self, anyhow::Error> {
        let fields = payload
            .decode_fields()
            .map_err(|e| anyhow::anyhow!("Malformed exit payload: {}", e))?;
        Ok(Self {
            log_index: fields.log_index,
            exit_hash: fields.exit_hash(),
            payload: payload.as_bytes().clone(),
            calldata: with_calldata.then(|| exit_calldata(payload)),
        })
    }
}

/// Write `output` as pretty-printed JSON, creating parent directories
pub fn save_exit_output(output: &ExitOutput, path: &Path) -> Result<(), anyhow::Error> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, output)?;

    info!(
        "{} exit payload(s) written to {}",
        output.exits.len(),
        path.display()
    );
    Ok(())
}

/// Read a file written by [`save_exit_output`]
pub fn load_exit_output(path: &Path) -> Result<ExitOutput, anyhow::Error> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(serde_json::from_reader(file)?)
}
