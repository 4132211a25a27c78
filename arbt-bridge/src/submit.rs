//! Per-wallet submission loop.
//!
//! Wallets are processed one after another and each wallet's transactions are
//! sent one at a time. A wallet is done when it has `target_count` successful
//! submissions; failed attempts are retried in place according to the
//! [`RetryPolicy`].

use crate::amount::AmountProvider;
use crate::builder::TransactionAttempt;
use crate::chain::BridgeChain;
use crate::config;
use crate::error::{BridgeError, Result};
use crate::route::Route;
use crate::txlog::{explorer_url, timestamp, TxLogger};
use ethers::{
    core::types::{Address, H256, U256},
    signers::{LocalWallet, Signer},
    utils::format_ether,
};
use log::{info, warn};
use std::future::Future;
use std::time::Duration;
use tokio::time;

/// How often a failing step is retried before the run gives up.
///
/// The default retries forever with no pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    /// Consecutive failures allowed for one step. `None` means unlimited.
    pub max_attempts: Option<u32>,
    /// Pause after a failed network call. Amount lookups are never paused.
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn unlimited() -> Self {
        RetryPolicy::default()
    }

    fn exhausted(&self, failures: u32) -> bool {
        matches!(self.max_attempts, Some(max) if failures >= max)
    }
}

#[derive(Debug, Clone)]
pub struct SubmitConfig {
    pub contract: Address,
    pub route: Route,
    pub target_count: u64,
    pub delay: Duration,
    pub min_balance: U256,
    pub value: U256,
    pub gas_price: U256,
    pub retry: RetryPolicy,
}

impl SubmitConfig {
    /// Standard pricing and pacing for `target_count` orders on `route`.
    pub fn new(contract: Address, route: Route, target_count: u64) -> Self {
        SubmitConfig {
            contract,
            route,
            target_count,
            delay: config::TX_DELAY,
            min_balance: config::min_balance(),
            value: config::bridge_value(),
            gas_price: config::gas_price(),
            retry: RetryPolicy::unlimited(),
        }
    }
}

/// Hashes sent from one wallet, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletReport {
    pub address: Address,
    pub hashes: Vec<H256>,
}

pub struct SubmissionLoop<'a, C, A> {
    chain: &'a C,
    amounts: &'a A,
    logger: &'a TxLogger,
    config: SubmitConfig,
}

impl<'a, C, A> SubmissionLoop<'a, C, A>
where
    C: BridgeChain + Sync,
    A: AmountProvider + Sync,
{
    pub fn new(chain: &'a C, amounts: &'a A, logger: &'a TxLogger, config: SubmitConfig) -> Self {
        SubmissionLoop {
            chain,
            amounts,
            logger,
            config,
        }
    }

    /// Run every wallet to completion.
    ///
    /// An underfunded wallet stops the whole run with
    /// [`BridgeError::InsufficientBalance`]; wallets after it are not touched.
    pub async fn run(&self, wallets: &[LocalWallet]) -> Result<Vec<WalletReport>> {
        let mut reports = Vec::with_capacity(wallets.len());
        for wallet in wallets {
            reports.push(self.run_wallet(wallet).await?);
        }
        Ok(reports)
    }

    pub async fn run_wallet(&self, wallet: &LocalWallet) -> Result<WalletReport> {
        let address = wallet.address();

        let balance = self
            .with_retry("checking balance", || self.chain.balance(address))
            .await?;

        println!(
            "⚙️ [{}] Processing transactions for {:?}...",
            timestamp(),
            address
        );

        if balance < self.config.min_balance {
            return Err(BridgeError::InsufficientBalance {
                address,
                balance: format_ether(balance),
            });
        }

        let mut report = WalletReport {
            address,
            hashes: Vec::new(),
        };
        let mut failures = 0u32;

        while (report.hashes.len() as u64) < self.config.target_count {
            match self.attempt(wallet).await {
                Ok(hash) => {
                    failures = 0;
                    self.record_success(hash);
                    report.hashes.push(hash);

                    if (report.hashes.len() as u64) < self.config.target_count {
                        time::sleep(self.config.delay).await;
                    }
                }
                Err(e) if e.is_recoverable() => {
                    failures += 1;
                    let amount_missing = matches!(e, BridgeError::AmountUnavailable(_));
                    if amount_missing {
                        println!("✗ Failed to get the amount. Skipping transaction...");
                    } else {
                        println!("✗ Error during transaction: {}", e);
                    }
                    warn!("attempt {} for {:?} failed: {}", failures, address, e);

                    if self.config.retry.exhausted(failures) {
                        return Err(BridgeError::RetriesExhausted {
                            attempts: failures,
                            last: e.to_string(),
                        });
                    }
                    if !amount_missing && !self.config.retry.backoff.is_zero() {
                        time::sleep(self.config.retry.backoff).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "{:?} finished with {} transaction(s)",
            address,
            report.hashes.len()
        );
        Ok(report)
    }

    /// One build-price-send pass for `wallet`.
    async fn attempt(&self, wallet: &LocalWallet) -> Result<H256> {
        let from = wallet.address();
        let amount = self.amounts.get_amount(self.config.route).await?;

        let attempt = TransactionAttempt::new(
            self.config.contract,
            from,
            amount,
            self.config.route,
            self.config.value,
            self.config.gas_price,
        );

        let gas_limit = self
            .chain
            .estimate_gas(&attempt.estimate_request(from))
            .await?;

        self.chain
            .send(wallet, attempt.send_request(from, gas_limit))
            .await
    }

    fn record_success(&self, hash: H256) {
        println!(
            "✓ Transaction successful to {} Sepolia!",
            self.config.route.display_name()
        );
        println!("🔗 Transaction hash: {}", explorer_url(hash));

        // The transaction is already on its way; a log failure must not
        // cause it to be sent again.
        match self.logger.append(hash) {
            Ok(_) => println!(
                "✓ Transaction hash saved to {}.",
                self.logger.path().display()
            ),
            Err(e) => warn!(
                "could not write {}: {}",
                self.logger.path().display(),
                e
            ),
        }
    }

    async fn with_retry<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut failures = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_recoverable() => {
                    failures += 1;
                    println!("✗ Error in processing transactions: {}", e);
                    warn!("{} failed ({} attempt(s)): {}", what, failures, e);

                    if self.config.retry.exhausted(failures) {
                        return Err(BridgeError::RetriesExhausted {
                            attempts: failures,
                            last: e.to_string(),
                        });
                    }
                    if !self.config.retry.backoff.is_zero() {
                        time::sleep(self.config.retry.backoff).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Turns the user's answer into a per-wallet target. Zero and negative
/// counts are rejected.
pub fn validate_count(count: i64) -> Option<u64> {
    if count > 0 {
        Some(count as u64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::RemoteOrder;
    use crate::txlog::is_record_line;
    use async_trait::async_trait;
    use ethers::core::types::transaction::eip2718::TypedTransaction;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    const KEYS: [&str; 2] = [
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
    ];

    fn wallets() -> Vec<LocalWallet> {
        KEYS.iter().map(|k| config::parse_wallet(k).unwrap()).collect()
    }

    fn contract() -> Address {
        Address::from([0x8d; 20])
    }

    fn temp_log(name: &str) -> TxLogger {
        let path = std::env::temp_dir().join(format!(
            "arbt-bridge-submit-{}-{}.txt",
            std::process::id(),
            name
        ));
        std::fs::remove_file(&path).ok();
        TxLogger::new(path)
    }

    /// Every call is recorded in order.
    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Balance(Address),
        Estimate,
        Send(Address),
    }

    struct FakeChain {
        balance: U256,
        estimate_failures: Mutex<u32>,
        send_failures: Mutex<u32>,
        calls: Mutex<Vec<Call>>,
        sent: Mutex<Vec<TypedTransaction>>,
    }

    impl FakeChain {
        fn funded() -> Self {
            FakeChain::with_balance(U256::exp10(18))
        }

        fn with_balance(balance: U256) -> Self {
            FakeChain {
                balance,
                estimate_failures: Mutex::new(0),
                send_failures: Mutex::new(0),
                calls: Mutex::new(Vec::new()),
                sent: Mutex::new(Vec::new()),
            }
        }

        fn failing_sends(self, n: u32) -> Self {
            *self.send_failures.lock().unwrap() = n;
            self
        }

        fn failing_estimates(self, n: u32) -> Self {
            *self.estimate_failures.lock().unwrap() = n;
            self
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn sends(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| matches!(c, Call::Send(_)))
                .count()
        }
    }

    fn take_failure(counter: &Mutex<u32>) -> bool {
        let mut left = counter.lock().unwrap();
        if *left > 0 {
            *left -= 1;
            true
        } else {
            false
        }
    }

    #[async_trait]
    impl BridgeChain for FakeChain {
        async fn balance(&self, address: Address) -> Result<U256> {
            self.calls.lock().unwrap().push(Call::Balance(address));
            Ok(self.balance)
        }

        async fn estimate_gas(&self, _tx: &TypedTransaction) -> Result<U256> {
            self.calls.lock().unwrap().push(Call::Estimate);
            if take_failure(&self.estimate_failures) {
                return Err(BridgeError::Transaction("execution reverted".into()));
            }
            Ok(U256::from(120_000u64))
        }

        async fn send(&self, wallet: &LocalWallet, tx: TypedTransaction) -> Result<H256> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Call::Send(wallet.address()));
            if take_failure(&self.send_failures) {
                return Err(BridgeError::Transaction("nonce too low".into()));
            }
            let n = calls.iter().filter(|c| matches!(c, Call::Send(_))).count();
            self.sent.lock().unwrap().push(tx);
            Ok(H256::from_low_u64_be(n as u64))
        }
    }

    /// Scripted amount answers; once the script runs out every call succeeds.
    struct FakeAmounts {
        script: Mutex<VecDeque<Option<U256>>>,
        calls: Mutex<u32>,
    }

    impl FakeAmounts {
        fn always() -> Self {
            FakeAmounts::scripted(vec![])
        }

        fn scripted(script: Vec<Option<U256>>) -> Self {
            FakeAmounts {
                script: Mutex::new(script.into()),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl AmountProvider for FakeAmounts {
        async fn get_amount(&self, _route: Route) -> Result<U256> {
            *self.calls.lock().unwrap() += 1;
            match self.script.lock().unwrap().pop_front() {
                Some(None) => Err(BridgeError::AmountUnavailable("pricer down".into())),
                Some(Some(amount)) => Ok(amount),
                None => Ok(U256::from(9_990_000_000_000_000u64)),
            }
        }
    }

    fn submit_config(target: u64) -> SubmitConfig {
        SubmitConfig::new(contract(), Route::Base, target)
    }

    #[tokio::test(start_paused = true)]
    async fn three_successes_sleep_twice() {
        let chain = FakeChain::funded();
        let amounts = FakeAmounts::always();
        let logger = temp_log("three");
        let wallet = &wallets()[0];
        let submitter = SubmissionLoop::new(&chain, &amounts, &logger, submit_config(3));

        let start = Instant::now();
        let report = submitter.run_wallet(wallet).await.unwrap();

        assert_eq!(report.hashes.len(), 3);
        assert_eq!(start.elapsed(), config::TX_DELAY * 2);
        assert_eq!(chain.sends(), 3);
        assert_eq!(
            chain.calls(),
            vec![
                Call::Balance(wallet.address()),
                Call::Estimate,
                Call::Send(wallet.address()),
                Call::Estimate,
                Call::Send(wallet.address()),
                Call::Estimate,
                Call::Send(wallet.address()),
            ]
        );

        let contents = std::fs::read_to_string(logger.path()).unwrap();
        assert_eq!(contents.lines().count(), 3);
        assert!(contents.lines().all(is_record_line));
        std::fs::remove_file(logger.path()).ok();
    }

    #[tokio::test(start_paused = true)]
    async fn single_transaction_has_no_delay() {
        let chain = FakeChain::funded();
        let amounts = FakeAmounts::always();
        let logger = temp_log("single");
        let submitter = SubmissionLoop::new(&chain, &amounts, &logger, submit_config(1));

        let start = Instant::now();
        submitter.run_wallet(&wallets()[0]).await.unwrap();

        assert_eq!(start.elapsed(), Duration::ZERO);
        std::fs::remove_file(logger.path()).ok();
    }

    #[tokio::test(start_paused = true)]
    async fn sent_transactions_carry_bridge_order() {
        let chain = FakeChain::funded();
        let amounts = FakeAmounts::scripted(vec![Some(U256::from(1234u64))]);
        let logger = temp_log("order");
        let wallet = &wallets()[0];
        let submitter = SubmissionLoop::new(&chain, &amounts, &logger, submit_config(1));

        submitter.run_wallet(wallet).await.unwrap();

        let sent = chain.sent.lock().unwrap();
        let tx = &sent[0];
        assert_eq!(tx.to_addr(), Some(&contract()));
        assert_eq!(tx.value(), Some(&config::bridge_value()));
        assert_eq!(tx.gas_price(), Some(config::gas_price()));
        assert_eq!(tx.gas(), Some(&U256::from(120_000u64)));

        let order = RemoteOrder::decode(tx.data().unwrap()).unwrap();
        assert_eq!(order.route(), Some(Route::Base));
        assert_eq!(order.target_account, wallet.address());
        assert_eq!(order.amount, U256::from(1234u64));
        std::fs::remove_file(logger.path()).ok();
    }

    #[tokio::test(start_paused = true)]
    async fn low_balance_stops_every_wallet() {
        let chain = FakeChain::with_balance(U256::from(config::MIN_BALANCE_WEI - 1));
        let amounts = FakeAmounts::always();
        let logger = temp_log("broke");
        let all = wallets();
        let submitter = SubmissionLoop::new(&chain, &amounts, &logger, submit_config(3));

        let err = submitter.run(&all).await.unwrap_err();

        match &err {
            BridgeError::InsufficientBalance { address, .. } => {
                assert_eq!(*address, all[0].address())
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(err.exit_code(), 0);
        assert_eq!(chain.calls(), vec![Call::Balance(all[0].address())]);
        assert_eq!(amounts.calls(), 0);
        assert!(!logger.path().exists());
    }

    #[tokio::test(start_paused = true)]
    async fn balance_at_threshold_is_enough() {
        let chain = FakeChain::with_balance(config::min_balance());
        let amounts = FakeAmounts::always();
        let logger = temp_log("threshold");
        let submitter = SubmissionLoop::new(&chain, &amounts, &logger, submit_config(1));

        assert!(submitter.run_wallet(&wallets()[0]).await.is_ok());
        std::fs::remove_file(logger.path()).ok();
    }

    #[tokio::test(start_paused = true)]
    async fn missing_amount_retries_without_delay() {
        let chain = FakeChain::funded();
        let amounts = FakeAmounts::scripted(vec![None, None, Some(U256::from(5u64))]);
        let logger = temp_log("amount");
        let mut cfg = submit_config(1);
        cfg.retry.backoff = Duration::from_secs(5);
        let submitter = SubmissionLoop::new(&chain, &amounts, &logger, cfg);

        let start = Instant::now();
        let report = submitter.run_wallet(&wallets()[0]).await.unwrap();

        assert_eq!(report.hashes.len(), 1);
        assert_eq!(amounts.calls(), 3);
        assert_eq!(start.elapsed(), Duration::ZERO);
        // no estimate or send happens for the skipped attempts
        assert_eq!(chain.sends(), 1);
        assert_eq!(
            chain
                .calls()
                .iter()
                .filter(|c| matches!(c, Call::Estimate))
                .count(),
            1
        );
        std::fs::remove_file(logger.path()).ok();
    }

    #[tokio::test(start_paused = true)]
    async fn transaction_errors_retry_same_slot() {
        let chain = FakeChain::funded().failing_estimates(2).failing_sends(3);
        let amounts = FakeAmounts::always();
        let logger = temp_log("retry");
        let submitter = SubmissionLoop::new(&chain, &amounts, &logger, submit_config(2));

        let start = Instant::now();
        let report = submitter.run_wallet(&wallets()[0]).await.unwrap();

        assert_eq!(report.hashes.len(), 2);
        // only the one delay between the two successes
        assert_eq!(start.elapsed(), config::TX_DELAY);
        let contents = std::fs::read_to_string(logger.path()).unwrap();
        assert_eq!(contents.lines().count(), 2);
        std::fs::remove_file(logger.path()).ok();
    }

    #[tokio::test(start_paused = true)]
    async fn finite_policy_gives_up_with_backoff() {
        let chain = FakeChain::funded().failing_sends(10);
        let amounts = FakeAmounts::always();
        let logger = temp_log("giveup");
        let mut cfg = submit_config(1);
        cfg.retry = RetryPolicy {
            max_attempts: Some(3),
            backoff: Duration::from_secs(2),
        };
        let submitter = SubmissionLoop::new(&chain, &amounts, &logger, cfg);

        let start = Instant::now();
        let err = submitter.run_wallet(&wallets()[0]).await.unwrap_err();

        assert!(matches!(err, BridgeError::RetriesExhausted { attempts: 3, .. }));
        assert_eq!(chain.sends(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(4));
        assert!(!logger.path().exists());
    }

    #[tokio::test(start_paused = true)]
    async fn wallets_run_in_order_to_their_quota() {
        let chain = FakeChain::funded();
        let amounts = FakeAmounts::always();
        let logger = temp_log("order-wallets");
        let all = wallets();
        let submitter = SubmissionLoop::new(&chain, &amounts, &logger, submit_config(2));

        let reports = submitter.run(&all).await.unwrap();

        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.hashes.len() == 2));
        let senders: Vec<Address> = chain
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send(a) => Some(a),
                _ => None,
            })
            .collect();
        assert_eq!(
            senders,
            vec![all[0].address(), all[0].address(), all[1].address(), all[1].address()]
        );
        let contents = std::fs::read_to_string(logger.path()).unwrap();
        assert_eq!(contents.lines().count(), 4);
        std::fs::remove_file(logger.path()).ok();
    }

    #[test]
    fn counts_must_be_positive() {
        assert_eq!(validate_count(0), None);
        assert_eq!(validate_count(-5), None);
        assert_eq!(validate_count(1), Some(1));
        assert_eq!(validate_count(25), Some(25));
    }

    #[test]
    fn default_policy_never_gives_up() {
        let policy = RetryPolicy::unlimited();
        assert!(!policy.exhausted(u32::MAX));
        assert!(policy.backoff.is_zero());
    }
}
