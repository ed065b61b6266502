//! # Multicall CLI
use crate::{
    config::MulticallConfig,
    constants::DEFAULT_CONFIG_PATH,
    multicall::MultiCall,
    types::{BatchResult, Call},
};
use alloy::{
    dyn_abi::{DynSolType, DynSolValue, Specifier},
    hex,
    json_abi::Function,
    primitives::Address,
};
use clap::{Parser, Subcommand};
use eyre::{Context, OptionExt};
use serde_json::{Value, json};
use std::{path::PathBuf, time::Duration};
use tracing::debug;
use url::Url;

/// Batches contract reads and simulations into a single round trip.
#[derive(Debug, Parser)]
#[command(author, about = "Multicall", long_about = None)]
pub struct Args {
    /// The configuration file.
    ///
    /// If missing, the endpoint must be passed with `--endpoint`.
    #[arg(
        long,
        global = true,
        value_name = "CONFIG",
        env = "MULTICALL_CONFIG",
        default_value = DEFAULT_CONFIG_PATH
    )]
    pub config: PathBuf,
    /// The RPC endpoint of the chain.
    #[arg(long, global = true, value_name = "RPC_ENDPOINT", env = "MULTICALL_ENDPOINT")]
    pub endpoint: Option<Url>,
    /// The address of the batching contract.
    ///
    /// Results are composed from direct requests if there is no code at this address.
    #[arg(long, global = true, value_name = "ADDRESS", env = "MULTICALL_CONTRACT")]
    pub contract: Option<Address>,
    /// The block to query. Defaults to the latest block.
    #[arg(long, global = true, value_name = "NUMBER")]
    pub block: Option<u64>,
    /// Timeout for a single RPC request.
    #[arg(long, global = true, value_name = "SECONDS", value_parser = parse_duration_secs)]
    pub timeout: Option<Duration>,
    /// The command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Multicall commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Chain and block metadata.
    ChainData,
    /// Native balance of every address.
    Balances {
        /// The addresses to query.
        #[arg(required = true)]
        addresses: Vec<Address>,
    },
    /// Code length of every address.
    CodeLengths {
        /// The addresses to query.
        #[arg(required = true)]
        addresses: Vec<Address>,
    },
    /// Native balance and code length of every address.
    AddressesData {
        /// The addresses to query.
        #[arg(required = true)]
        addresses: Vec<Address>,
    },
    /// Read a batch of calls.
    Call {
        /// A call, as `TARGET:SIGNATURE[:ARGS][:RETURNS]`, e.g.
        /// `0x..:balanceOf(address):0x..:uint256`.
        #[arg(long = "call", required = true, value_name = "CALL", value_parser = parse_call)]
        calls: Vec<Call>,
        /// Tolerate reverting calls instead of failing the batch.
        #[arg(long)]
        allow_failure: bool,
    },
    /// Simulate a batch of calls in sequence.
    Simulate {
        /// A call, as `TARGET:SIGNATURE[:ARGS][:RETURNS]`.
        #[arg(long = "call", required = true, value_name = "CALL", value_parser = parse_call)]
        calls: Vec<Call>,
    },
}

impl Args {
    /// Runs the command and prints its result as JSON.
    pub async fn run(self) -> eyre::Result<()> {
        let config = self.load_config()?;
        let mut multicall = MultiCall::new(config.provider(), config.contract)
            .await
            .wrap_err_with(|| format!("failed to reach {}", config.endpoint))?;
        if let Some(signer) = config.signer()? {
            multicall = multicall.with_signer(signer);
        }
        debug!(deployed = multicall.is_deployed(), contract = %config.contract, "connected");

        let block = self.block;
        let result = match self.command {
            Command::ChainData => multicall.chain_data(block).await,
            Command::Balances { addresses } => multicall.balances(addresses, block).await,
            Command::CodeLengths { addresses } => multicall.code_lengths(addresses, block).await,
            Command::AddressesData { addresses } => {
                multicall.addresses_data(addresses, block).await
            }
            Command::Call { calls, allow_failure: false } => {
                multicall.aggregate_static(calls, block).await
            }
            Command::Call { calls, allow_failure: true } => {
                multicall.try_aggregate_static(calls, false, block).await
            }
            Command::Simulate { calls } => multicall.simulate_calls(calls, block).await,
        };

        println!("{}", serde_json::to_string_pretty(&render(&result))?);

        result.into_result().map(drop).wrap_err("batch failed")
    }

    /// Loads the configuration file if there is one, and merges the CLI arguments into it.
    pub fn load_config(&self) -> eyre::Result<MulticallConfig> {
        let config = if self.config.exists() {
            MulticallConfig::load_from_file(&self.config)?
        } else {
            let endpoint = self
                .endpoint
                .clone()
                .ok_or_eyre("no config file found, an endpoint is required")?;
            MulticallConfig::new(endpoint, self.contract.unwrap_or_default())
        };
        Ok(self.merge_config(config))
    }

    /// Merges [`Args`] values into an existing [`MulticallConfig`] instance.
    pub fn merge_config(&self, mut config: MulticallConfig) -> MulticallConfig {
        if let Some(endpoint) = &self.endpoint {
            config = config.with_endpoint(endpoint.clone());
        }
        if let Some(contract) = self.contract {
            config = config.with_contract(contract);
        }
        if let Some(timeout) = self.timeout {
            config = config.with_request_timeout(timeout);
        }
        config
    }
}

/// Renders a [`BatchResult`] as JSON.
pub fn render(result: &BatchResult) -> Value {
    json!({
        "success": result.success,
        "result": result.data.values().iter().map(render_value).collect::<Vec<_>>(),
        "error": result.error().map(|err| err.to_string()),
        "record": result.record,
    })
}

/// Renders a decoded value as JSON. Integers are rendered as decimal strings.
#[allow(unreachable_patterns)]
fn render_value(value: &DynSolValue) -> Value {
    match value {
        DynSolValue::Bool(value) => json!(value),
        DynSolValue::Int(value, _) => json!(value.to_string()),
        DynSolValue::Uint(value, _) => json!(value.to_string()),
        DynSolValue::FixedBytes(word, size) => json!(hex::encode_prefixed(&word[..*size])),
        DynSolValue::Address(address) => json!(address.to_checksum(None)),
        DynSolValue::Function(function) => json!(function.to_string()),
        DynSolValue::Bytes(bytes) => json!(hex::encode_prefixed(bytes)),
        DynSolValue::String(value) => json!(value),
        DynSolValue::Array(values)
        | DynSolValue::FixedArray(values)
        | DynSolValue::Tuple(values) => Value::Array(values.iter().map(render_value).collect()),
        _ => Value::Null,
    }
}

/// Parses a call in the format `TARGET:SIGNATURE[:ARGS][:RETURNS]`.
///
/// `ARGS` is a comma separated list of arguments, `RETURNS` a type or a tuple of types.
fn parse_call(arg: &str) -> eyre::Result<Call> {
    let mut parts = arg.splitn(4, ':');
    let target: Address = parts.next().unwrap_or_default().parse()?;
    let signature = parts.next().ok_or_eyre("expected TARGET:SIGNATURE")?;
    let args = parts.next().unwrap_or_default();
    let returns = parts.next().filter(|returns| !returns.is_empty());

    let function = Function::parse(signature)?;
    let types =
        function.inputs.iter().map(|param| param.resolve()).collect::<Result<Vec<_>, _>>()?;
    let values = if types.is_empty() {
        vec![]
    } else {
        match DynSolType::Tuple(types).coerce_str(&format!("({args})"))? {
            DynSolValue::Tuple(values) => values,
            value => vec![value],
        }
    };

    let mut call = Call::from_signature(target, signature, &values)?;
    if let Some(returns) = returns {
        call.return_types = Some(match DynSolType::parse(returns)? {
            DynSolType::Tuple(types) => types,
            ty => vec![ty],
        });
    }
    Ok(call)
}

/// Parses a string representing seconds to a [`Duration`].
fn parse_duration_secs(arg: &str) -> Result<std::time::Duration, std::num::ParseIntError> {
    let seconds = arg.parse()?;
    Ok(std::time::Duration::from_secs(seconds))
}
