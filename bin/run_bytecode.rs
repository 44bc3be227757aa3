//! A thin CLI harness around `execute_bytecode`, mirroring the entry point
//! from the library's public API with a hex-in/hex-out surface.

use clap::Parser;
use fevm::db::memory_store::InMemoryDatabase;
use fevm::execution_context::ExecutionContext;
use fevm::oracle::NullOracle;
use fevm::types::{Address, Word};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "run-bytecode", author, version, about = "Runs EVM bytecode through fevm and prints the resulting output")]
struct Cli {
    /// Hex-encoded runtime bytecode (with or without a leading `0x`).
    #[arg(long)]
    code: String,

    /// Hex-encoded calldata, defaults to empty.
    #[arg(long, default_value = "")]
    data: String,

    /// Gas made available to the top-level call.
    #[arg(long, default_value_t = 10_000_000)]
    gas: u64,

    /// Value transferred with the call, in wei.
    #[arg(long, default_value_t = 0)]
    value: u64,

    /// Hex-encoded sender address, defaults to the zero address.
    #[arg(long)]
    sender: Option<String>,

    /// Hex-encoded recipient address. Omit to deploy `code` as init code.
    #[arg(long)]
    to: Option<String>,
}

fn parse_address(hex_str: &str) -> Result<Address, String> {
    let trimmed = hex_str.trim_start_matches("0x");
    let bytes = hex::decode(trimmed).map_err(|e| format!("invalid address hex: {e}"))?;
    if bytes.len() != 20 {
        return Err(format!("address must be 20 bytes, got {}", bytes.len()));
    }
    Ok(Address::from_slice(&bytes))
}

fn parse_bytes(hex_str: &str) -> Result<bytes::Bytes, String> {
    let trimmed = hex_str.trim_start_matches("0x");
    hex::decode(trimmed).map(bytes::Bytes::from).map_err(|e| format!("invalid hex: {e}"))
}

fn run(cli: Cli) -> Result<(), String> {
    let code = parse_bytes(&cli.code)?;
    let data = parse_bytes(&cli.data)?;
    let sender = cli.sender.as_deref().map(parse_address).transpose()?.unwrap_or(Address::zero());
    let to = cli.to.as_deref().map(parse_address).transpose()?;

    let mut db = InMemoryDatabase::new();
    let oracle = NullOracle;

    let computation = fevm::execute_bytecode(
        sender,
        Word::zero(),
        cli.gas,
        to,
        sender,
        Word::from(cli.value),
        data,
        code,
        None,
        &mut db,
        &oracle,
        ExecutionContext::genesis(1),
    );

    match computation.error {
        None => {
            println!("0x{}", hex::encode(&computation.output));
            for log in computation.get_raw_log_entries() {
                println!(
                    "log address=0x{} topics={} data=0x{}",
                    hex::encode(log.address.as_bytes()),
                    log.topics.len(),
                    hex::encode(&log.data)
                );
            }
            Ok(())
        }
        Some(err) => Err(format!("{err}")),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
