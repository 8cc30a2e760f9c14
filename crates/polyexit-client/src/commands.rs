//! `polyexit` subcommands.

use std::path::PathBuf;
use std::time::Duration;

use alloy_primitives::{Address, B256};
use polyexit_client::output::{save_exit_output, ExitEntry, ExitOutput};
use polyexit_client::{
    ChainEndpoint, ExitKind, Network, NetworkConfigCache, PosBridgeConfig, PosExitClient,
    TokenStandard, DEFAULT_NETWORK_CONFIG_URL,
};
use polyexit_proof::{ExitPayload, DEFAULT_RECEIPT_CONCURRENCY};
use tracing::info;

/// Nodes, contracts and services to connect to
#[derive(Clone, Debug, clap::Args)]
pub struct ConnectionArgs {
    #[arg(long, value_enum, env = "POS_NETWORK", default_value = "mainnet")]
    network: Network,
    /// Deployment version in the address index (defaults per network)
    #[arg(long, env = "POS_VERSION")]
    version: Option<String>,
    /// Root chain (Ethereum) RPC URL
    #[arg(long, env = "PARENT_RPC")]
    parent_rpc_url: String,
    /// Root chain RPC user:password (optional)
    #[arg(long, env = "PARENT_USERPWD")]
    parent_rpc_userpwd: Option<String>,
    /// Child chain (Bor) RPC URL
    #[arg(long, env = "CHILD_RPC")]
    child_rpc_url: String,
    /// Child chain RPC user:password (optional)
    #[arg(long, env = "CHILD_USERPWD")]
    child_rpc_userpwd: Option<String>,
    /// Proof API base URL (optional)
    #[arg(long, env = "PROOF_API_URL")]
    proof_api_url: Option<String>,
    /// Address index base URL
    #[arg(long, env = "NETWORK_CONFIG_URL", default_value = DEFAULT_NETWORK_CONFIG_URL)]
    network_config_url: String,
    /// RootChainProxy address, overrides the address index
    #[arg(long, env = "ROOT_CHAIN")]
    root_chain: Option<Address>,
    /// RootChainManagerProxy address, overrides the address index
    #[arg(long, env = "ROOT_CHAIN_MANAGER")]
    root_chain_manager: Option<Address>,
    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout_secs: u64,
    /// Receipts fetched in parallel
    #[arg(long, default_value_t = DEFAULT_RECEIPT_CONCURRENCY)]
    receipt_concurrency: usize,
}

impl ConnectionArgs {
    fn config(&self) -> PosBridgeConfig {
        let mut config = PosBridgeConfig::new(
            self.network,
            ChainEndpoint {
                url: self.parent_rpc_url.clone(),
                userpwd: self.parent_rpc_userpwd.clone(),
            },
            ChainEndpoint {
                url: self.child_rpc_url.clone(),
                userpwd: self.child_rpc_userpwd.clone(),
            },
        );
        if let Some(version) = &self.version {
            config.version = version.clone();
        }
        config.root_chain = self.root_chain;
        config.root_chain_manager = self.root_chain_manager;
        config.proof_api_url = self.proof_api_url.clone();
        config.network_config_url = self.network_config_url.clone();
        config.request_timeout = Duration::from_secs(self.timeout_secs);
        config.receipt_concurrency = self.receipt_concurrency;
        config
    }

    async fn connect(&self) -> Result<PosExitClient, anyhow::Error> {
        let config = self.config();
        let network_config =
            NetworkConfigCache::new(config.network_config_url.clone(), config.request_timeout)?;
        PosExitClient::connect(&config, &network_config).await
    }
}

/// Burn transaction and the event its exit is proven from
#[derive(Clone, Debug, clap::Args)]
pub struct BurnArgs {
    /// Burn transaction hash on the child chain
    #[arg(long)]
    tx: B256,
    /// Standard of the burnt token
    #[arg(long, value_enum, default_value = "erc20")]
    standard: TokenStandard,
    /// Withdrawal kind
    #[arg(long, value_enum, default_value = "single")]
    kind: ExitKind,
    /// Burn event signature, overrides --standard and --kind
    #[arg(long)]
    event_signature: Option<B256>,
}

impl BurnArgs {
    fn event_signature(&self) -> Result<B256, anyhow::Error> {
        match self.event_signature {
            Some(signature) => Ok(signature),
            None => self.standard.exit_signature(self.kind).ok_or_else(|| {
                anyhow::anyhow!("{} tokens have no {} exit", self.standard, self.kind)
            }),
        }
    }
}

/// CLI arguments for the `payload` subcommand
#[derive(Clone, Debug, clap::Args)]
pub struct PayloadArgs {
    #[command(flatten)]
    connection: ConnectionArgs,
    #[command(flatten)]
    burn: BurnArgs,
    /// Position of the burn log among the matching logs of the receipt
    #[arg(long, default_value = "0")]
    index: usize,
    /// Get the checkpoint and block proof from the proof API
    #[arg(long, default_value = "false")]
    proof_api: bool,
    /// Also produce the `exit(bytes)` call data
    #[arg(long, default_value = "false")]
    calldata: bool,
    /// Write the result as JSON to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

/// CLI arguments for the `payloads` subcommand
#[derive(Clone, Debug, clap::Args)]
pub struct PayloadsArgs {
    #[command(flatten)]
    connection: ConnectionArgs,
    #[command(flatten)]
    burn: BurnArgs,
    /// Get the checkpoint and block proof from the proof API
    #[arg(long, default_value = "false")]
    proof_api: bool,
    /// Also produce the `exit(bytes)` call data
    #[arg(long, default_value = "false")]
    calldata: bool,
    /// Write the result as JSON to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

/// CLI arguments for the `exit-hash` and `status` subcommands
#[derive(Clone, Debug, clap::Args)]
pub struct ExitHashArgs {
    #[command(flatten)]
    connection: ConnectionArgs,
    #[command(flatten)]
    burn: BurnArgs,
    /// Position of the burn log among the matching logs of the receipt
    #[arg(long, default_value = "0")]
    index: usize,
}

/// Run the `payload` subcommand
pub async fn payload(args: PayloadArgs) -> Result<(), anyhow::Error> {
    let client = args.connection.connect().await?;
    let payload = client
        .build_payload_for_exit(
            args.burn.tx,
            args.index,
            args.burn.event_signature()?,
            args.proof_api,
        )
        .await?;
    emit(&client, args.burn.tx, &[payload], args.calldata, args.output)
}

/// Run the `payloads` subcommand
pub async fn payloads(args: PayloadsArgs) -> Result<(), anyhow::Error> {
    let client = args.connection.connect().await?;
    let payloads = client
        .build_multiple_payloads_for_exit(
            args.burn.tx,
            args.burn.event_signature()?,
            args.proof_api,
        )
        .await?;
    emit(&client, args.burn.tx, &payloads, args.calldata, args.output)
}

/// Run the `exit-hash` subcommand
pub async fn exit_hash(args: ExitHashArgs) -> Result<(), anyhow::Error> {
    let client = args.connection.connect().await?;
    let exit_hash = client
        .get_exit_hash(args.burn.tx, args.index, args.burn.event_signature()?)
        .await?;
    println!("{exit_hash}");
    Ok(())
}

/// Run the `status` subcommand
pub async fn status(args: ExitHashArgs) -> Result<(), anyhow::Error> {
    let client = args.connection.connect().await?;
    let checkpointed = client.is_checkpointed(args.burn.tx).await?;
    // Exit hashes exist only once the burn is checkpointed
    let processed = if checkpointed {
        Some(
            client
                .is_exit_processed(args.burn.tx, args.index, args.burn.event_signature()?)
                .await?,
        )
    } else {
        None
    };

    info!(
        "Burn {}: checkpointed={}, processed={:?}",
        args.burn.tx, checkpointed, processed
    );
    println!(
        "{}",
        serde_json::json!({
            "burnTxHash": args.burn.tx,
            "checkpointed": checkpointed,
            "processed": processed,
        })
    );
    Ok(())
}

fn emit(
    client: &PosExitClient,
    burn_tx_hash: B256,
    payloads: &[ExitPayload],
    with_calldata: bool,
    output_path: Option<PathBuf>,
) -> Result<(), anyhow::Error> {
    let output = ExitOutput {
        burn_tx_hash,
        root_chain_manager: client.root_chain_manager(),
        exits: payloads
            .iter()
            .map(|payload| ExitEntry::from_payload(payload, with_calldata))
            .collect::<Result<_, _>>()?,
    };

    match output_path {
        Some(path) => save_exit_output(&output, &path),
        None => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
    }
}
