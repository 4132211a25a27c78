// src/bin/arbt-bridge.rs

use arbt_bridge::{
    amount::PricerClient,
    app::{self, Session},
    config::{self, EndpointTable},
    endpoint::HttpProbe,
    error::BridgeError,
    prompt,
    submit::RetryPolicy,
    txlog::TxLogger,
    Route,
};
use clap::Parser;
use dotenv::dotenv;
use ethers::signers::LocalWallet;
use log::info;
use std::{io, process, time::Duration};

// CLI argument parsing
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Destination network (skips the menu)
    #[clap(short = 'r', long, value_enum)]
    route: Option<Route>,

    /// Transactions per wallet (skips the question)
    #[clap(short = 'n', long, allow_negative_numbers = true)]
    count: Option<i64>,

    /// JSON array of private keys
    #[clap(short = 'k', long, env = "PRIVATE_KEYS_FILE", default_value = config::DEFAULT_KEYS_FILE)]
    keys_file: String,

    /// JSON array of { rpc_url, contract } records (built-in table if omitted)
    #[clap(short = 'e', long, env = "ENDPOINTS_FILE")]
    endpoints_file: Option<String>,

    /// File the explorer links are appended to
    #[clap(short = 'o', long, env = "TX_LOG_FILE", default_value = config::DEFAULT_LOG_FILE)]
    log_file: String,

    /// Pricing API used to size each order
    #[clap(long, env = "PRICER_URL", default_value = config::PRICER_URL)]
    pricer_url: String,

    /// Seconds to wait between transactions of one wallet
    #[clap(long, default_value_t = 30)]
    delay_secs: u64,

    /// Give up after this many consecutive failures (retry forever if omitted)
    #[clap(long)]
    max_attempts: Option<u32>,

    /// Pause after a failed network call, in milliseconds
    #[clap(long, default_value_t = 0)]
    retry_backoff_ms: u64,
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    process::exit(run(args).await);
}

async fn run(args: Args) -> i32 {
    prompt::display_header();
    println!("⏳ Please wait...");
    println!();

    let keys = match config::load_private_keys(&args.keys_file) {
        Ok(keys) => keys,
        Err(e) => {
            eprintln!("✗ {}", e);
            return 1;
        }
    };
    let table = match &args.endpoints_file {
        Some(path) => EndpointTable::load(path),
        None => Ok(EndpointTable::builtin()),
    };
    let (table, contract) = match table.and_then(|t| t.bridge_contract().map(|c| (t, c))) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("✗ {}", e);
            return 1;
        }
    };
    let wallets = match keys
        .iter()
        .map(|k| config::parse_wallet(k))
        .collect::<Result<Vec<LocalWallet>, BridgeError>>()
    {
        Ok(wallets) => wallets,
        Err(e) => {
            eprintln!("✗ Failed to parse private key: {}", e);
            return 1;
        }
    };
    info!("Loaded {} wallet(s) from {}", wallets.len(), args.keys_file);

    let session = Session {
        route: args.route,
        count: args.count,
        rpc_urls: table.rpc_urls(),
        contract,
        wallets,
        logger: TxLogger::new(&args.log_file),
        delay: Duration::from_secs(args.delay_secs),
        retry: RetryPolicy {
            max_attempts: args.max_attempts,
            backoff: Duration::from_millis(args.retry_backoff_ms),
        },
    };
    let pricer = PricerClient::new(args.pricer_url.clone());

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    app::run(session, &HttpProbe, &pricer, &mut stdin.lock(), &mut stdout).await
}
