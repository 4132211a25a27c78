//! One interactive run of the bot, from the route menu to the exit code.

use crate::amount::AmountProvider;
use crate::chain::BridgeChain;
use crate::endpoint::{EndpointProbe, EndpointSelector};
use crate::prompt::{self, MenuChoice};
use crate::route::Route;
use crate::submit::{validate_count, RetryPolicy, SubmissionLoop, SubmitConfig};
use crate::txlog::TxLogger;
use ethers::{core::types::Address, signers::LocalWallet};
use log::info;
use std::io::{BufRead, Write};
use std::time::Duration;

/// Everything a run needs once the configuration files have been read.
#[derive(Debug, Clone)]
pub struct Session {
    /// Preselected route; the menu is shown when `None`.
    pub route: Option<Route>,
    /// Preselected count; the question is asked when `None`.
    pub count: Option<i64>,
    pub rpc_urls: Vec<String>,
    pub contract: Address,
    pub wallets: Vec<LocalWallet>,
    pub logger: TxLogger,
    pub delay: Duration,
    pub retry: RetryPolicy,
}

/// Ask for whatever the session leaves open, connect and submit.
///
/// Returns the process exit code. Nothing touches the network before the
/// route and a positive count are known.
pub async fn run<P, A, R, W>(
    session: Session,
    probe: &P,
    amounts: &A,
    input: &mut R,
    out: &mut W,
) -> i32
where
    P: EndpointProbe + Sync,
    P::Connection: BridgeChain + Sync,
    A: AmountProvider + Sync,
    R: BufRead,
    W: Write,
{
    let route = match session.route {
        Some(route) => route,
        None => match prompt::ask_route(input, out) {
            Ok(MenuChoice::Route(route)) => route,
            Ok(MenuChoice::Exit) => {
                println!("👋 Exiting the bot. See you next time!");
                return 0;
            }
            Err(e) => {
                eprintln!("✗ Failed to read choice: {}", e);
                return 1;
            }
        },
    };

    let count = match session.count {
        Some(count) => count,
        None => match prompt::ask_count(input, out) {
            Ok(count) => count,
            Err(e) => {
                eprintln!("✗ Failed to read count: {}", e);
                return 1;
            }
        },
    };
    let target_count = match validate_count(count) {
        Some(n) => n,
        None => {
            println!("✗ Number of transactions must be greater than 0!");
            return 1;
        }
    };

    println!("Route: {}", route);
    println!("Transactions per wallet: {}", target_count);

    let mut selector = EndpointSelector::new(session.rpc_urls);
    let chain = match selector.acquire(probe).await {
        Ok(chain) => chain,
        Err(e) => {
            eprintln!("✗ {}", e);
            return e.exit_code();
        }
    };

    let mut submit_config = SubmitConfig::new(session.contract, route, target_count);
    submit_config.delay = session.delay;
    submit_config.retry = session.retry;

    info!(
        "Submitting {} order(s) per wallet for {} wallet(s)",
        target_count,
        session.wallets.len()
    );

    let submitter = SubmissionLoop::new(&chain, amounts, &session.logger, submit_config);
    match submitter.run(&session.wallets).await {
        Ok(reports) => {
            let total: usize = reports.iter().map(|r| r.hashes.len()).sum();
            println!(
                "🎉 All {} transactions complete! ({} across {} wallet(s))",
                target_count,
                total,
                reports.len()
            );
            0
        }
        Err(e) => {
            println!("✗ {}", e);
            e.exit_code()
        }
    }
}
