//! Polygon PoS bridge exit client
//!
//! This library wires the exit proof engine to live root and child chain nodes, the
//! network address index and the optional proof API, and exposes the result as
//! [`PosExitClient`].

pub mod client;
pub mod config;
pub mod network_config;
pub mod output;
pub mod proof_api;
pub mod token;

pub use client::{exit_calldata, PosExitClient};
pub use config::{ChainEndpoint, ConfigError, Network, PosBridgeConfig};
pub use network_config::{NetworkConfigCache, NetworkConfigError, DEFAULT_NETWORK_CONFIG_URL};
pub use proof_api::ProofApiClient;
pub use token::{BridgeToken, ChainRole, ExitKind, TokenError, TokenStandard};
