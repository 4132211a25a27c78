use arbt_bridge::{
    builder::RemoteOrder,
    config::EndpointTable,
    endpoint::{EndpointSelector, HttpProbe},
    txlog::explorer_url,
};
use clap::Parser;
use dotenv::dotenv;
use ethers::{
    prelude::*,
    types::{Transaction, TransactionReceipt, H256},
    utils::format_ether,
};
use eyre::Result;

/// Fetch a bridge transaction and decode its remote order.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Transaction hash (0x-prefixed)
    tx_hash: String,

    /// JSON array of { rpc_url, contract } records (built-in table if omitted)
    #[clap(short = 'e', long, env = "ENDPOINTS_FILE")]
    endpoints_file: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();
    let args = Args::parse();
    let tx_hash = args.tx_hash.trim().parse::<H256>()?;

    let table = match &args.endpoints_file {
        Some(path) => EndpointTable::load(path)?,
        None => EndpointTable::builtin(),
    };
    let mut selector = EndpointSelector::new(table.rpc_urls());
    let chain = selector.acquire(&HttpProbe).await?;
    let provider = chain.provider();

    println!("Fetching transaction details for: {:#x}", tx_hash);
    println!("Explorer: {}", explorer_url(tx_hash));

    let tx = provider
        .get_transaction(tx_hash)
        .await?
        .ok_or_else(|| eyre::eyre!("Transaction not found"))?;
    let receipt = provider.get_transaction_receipt(tx_hash).await?;

    println!("\nTransaction Details:");
    println!("------------------");
    print_transaction_details(&tx, receipt.as_ref());

    if let Some(to) = tx.to {
        if to != table.bridge_contract()? {
            println!("\nNote: {:#x} is not the configured bridge contract", to);
        }
    }

    println!("\nBridge Order:");
    println!("-------------");
    match RemoteOrder::decode(&tx.input) {
        Ok(order) => print_order(&order),
        Err(e) => {
            println!("Could not decode function call: {}", e);
            println!("Raw input: 0x{}", hex::encode(&tx.input));
        }
    }

    Ok(())
}

fn print_transaction_details(tx: &Transaction, receipt: Option<&TransactionReceipt>) {
    match receipt {
        Some(receipt) => {
            let status = receipt.status.map(|s| s.as_u64());
            let status = match status {
                Some(1) => "Success",
                Some(_) => "Failed",
                None => "Unknown",
            };
            println!("Status: {}", status);
            if let Some(block) = receipt.block_number {
                println!("Block: #{}", block);
            }
            if let Some(gas_used) = receipt.gas_used {
                println!("Gas Used: {}", gas_used);
                if gas_used >= tx.gas {
                    println!("  Likely out of gas - used entire gas limit of {}", tx.gas);
                }
            }
        }
        None => println!("Status: Pending"),
    }

    println!("From: {:#x}", tx.from);
    if let Some(to) = tx.to {
        println!("To: {:#x}", to);
    }
    println!("Value: {} ETH", format_ether(tx.value));
    println!("Gas Limit: {}", tx.gas);
    if let Some(gas_price) = tx.gas_price {
        println!("Gas Price: {} wei", gas_price);
    }
    println!("Nonce: {}", tx.nonce);
}

fn print_order(order: &RemoteOrder) {
    let destination = match order.route() {
        Some(route) => route.network_name().to_string(),
        None => format!("unknown (0x{})", hex::encode(order.destination)),
    };
    println!("Destination: {}", destination);
    println!("Asset: {}", order.asset);
    println!("Target Account: {:#x}", order.target_account);
    println!("Amount: {} ETH ({} wei)", format_ether(order.amount), order.amount);
    println!("Reward Asset: {:#x}", order.reward_asset);
    println!("Insurance: {}", order.insurance);
    println!("Max Reward: {} ETH", format_ether(order.max_reward));
}
