use arbt_bridge::{
    config::{self, EndpointTable},
    endpoint::{EndpointSelector, HttpProbe},
};
use clap::Parser;
use dotenv::dotenv;
use ethers::{
    prelude::*,
    utils::format_ether,
};
use eyre::Result;

/// Show the address, balance and nonce of every configured wallet.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// JSON array of private keys
    #[clap(short = 'k', long, env = "PRIVATE_KEYS_FILE", default_value = config::DEFAULT_KEYS_FILE)]
    keys_file: String,

    /// JSON array of { rpc_url, contract } records (built-in table if omitted)
    #[clap(short = 'e', long, env = "ENDPOINTS_FILE")]
    endpoints_file: Option<String>,

    /// Only derive addresses, do not query the chain
    #[clap(long)]
    offline: bool,

    /// Print one JSON object per wallet
    #[clap(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();
    let args = Args::parse();

    let keys = config::load_private_keys(&args.keys_file)?;
    let wallets = keys
        .iter()
        .map(|k| config::parse_wallet(k))
        .collect::<Result<Vec<LocalWallet>, _>>()?;

    let provider = if args.offline {
        None
    } else {
        let table = match &args.endpoints_file {
            Some(path) => EndpointTable::load(path)?,
            None => EndpointTable::builtin(),
        };
        let mut selector = EndpointSelector::new(table.rpc_urls());
        let chain = selector.acquire(&HttpProbe).await?;
        Some(chain.provider().clone())
    };

    let min_balance = config::min_balance();
    let mut funded = 0;

    for (idx, wallet) in wallets.iter().enumerate() {
        let address = wallet.address();

        let (balance, nonce) = match &provider {
            Some(provider) => {
                let balance = provider.get_balance(address, None).await?;
                let nonce = provider.get_transaction_count(address, None).await?;
                (Some(balance), Some(nonce))
            }
            None => (None, None),
        };
        if balance.map_or(false, |b| b >= min_balance) {
            funded += 1;
        }

        if args.json {
            let entry = serde_json::json!({
                "index": idx,
                "address": format!("{:#x}", address),
                "balance_eth": balance.map(format_ether),
                "nonce": nonce.map(|n| n.as_u64()),
                "funded": balance.map(|b| b >= min_balance),
            });
            println!("{}", entry);
            continue;
        }

        println!("Wallet #{}: {:#x}", idx + 1, address);
        if let (Some(balance), Some(nonce)) = (balance, nonce) {
            let marker = if balance >= min_balance { "✓" } else { "✗" };
            println!("  {} Balance: {} ETH", marker, format_ether(balance));
            println!("  Nonce: {}", nonce);
        }
    }

    if provider.is_some() && !args.json {
        println!(
            "\n{}/{} wallet(s) hold at least {} ETH",
            funded,
            wallets.len(),
            format_ether(min_balance)
        );
    }

    Ok(())
}
