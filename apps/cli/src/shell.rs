//! Interactive operator session
//!
//! One client lives for the whole session, so a mock ledger keeps its state
//! between commands and batch events are printed as they arrive.

use std::io::Write;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use airdropper_distribution::{
    batch_total, lamports_to_sol, parse_lines, validate, DistributionClient, DistributionStatus,
    RecentDistributions,
};
use airdropper_keystore::expand_path;

use crate::{explain, print_batch, print_event, print_json, print_stats};

const HELP: &str = "\
Commands:
  init                        create the program state (operator becomes owner)
  add <address> <amount>      append a recipient to the pending batch
  load <recipients> <amounts> replace the pending batch from two files
  pending                     show the pending batch
  clear                       drop the pending batch
  send                        submit the pending batch
  stats                       aggregate statistics
  balance [address]           SOL balance (operator by default)
  recipient <address>         total received by an address
  history                     recent distributions of this session
  address                     operator address
  help                        this text
  quit                        leave the session";

enum Flow {
    Continue,
    Quit,
}

pub struct Shell {
    client: DistributionClient,
    history: RecentDistributions,
    recipients: Vec<String>,
    amounts: Vec<String>,
    json: bool,
}

impl Shell {
    pub fn new(client: DistributionClient, json: bool) -> Self {
        Self {
            client,
            history: RecentDistributions::new(),
            recipients: Vec::new(),
            amounts: Vec::new(),
            json,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        let json = self.json;
        let subscription = self
            .client
            .subscribe_to_events(move |event| print_event(&event, json))
            .await
            .map_err(explain)?;

        println!("Operator {}", self.client.operator());
        println!("Type `help` for commands.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("airdropper> ");
            std::io::stdout().flush().ok();

            let line = tokio::select! {
                line = lines.next_line() => line.context("Failed to read input")?,
                _ = tokio::signal::ctrl_c() => None,
            };
            let Some(line) = line else {
                println!();
                break;
            };

            match self.execute(&line).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(e) => println!("Error: {:#}", e),
            }
        }

        self.client.unsubscribe(subscription);
        Ok(())
    }

    async fn execute(&mut self, line: &str) -> Result<Flow> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(Flow::Continue);
        };
        let args: Vec<&str> = words.collect();
        debug!("shell command {} {:?}", command, args);

        match (command, args.as_slice()) {
            ("help" | "?", _) => println!("{}", HELP),
            ("quit" | "exit", _) => return Ok(Flow::Quit),
            ("init", []) => self.init().await?,
            ("add", [address, amount]) => {
                self.recipients.push(address.to_string());
                self.amounts.push(amount.to_string());
                println!("{} pending, {} SOL", self.recipients.len(), batch_total(&self.amounts));
            }
            ("load", [recipients, amounts]) => self.load(recipients, amounts)?,
            ("pending", []) => self.show_pending(),
            ("clear", []) => {
                self.recipients.clear();
                self.amounts.clear();
            }
            ("send", []) => self.send().await?,
            ("stats", []) => {
                let stats = self.client.get_stats().await?;
                if self.json {
                    print_json(&stats)?;
                } else {
                    print_stats(&stats);
                }
            }
            ("balance", []) => {
                let address = self.client.operator().to_string();
                println!("{} SOL", self.client.get_balance(&address).await?);
            }
            ("balance", [address]) => println!("{} SOL", self.client.get_balance(address).await?),
            ("recipient", [address]) => {
                let received = self.client.get_recipient_amount(address).await?;
                println!("{} has received {} SOL", address, received);
            }
            ("history", []) => self.show_history()?,
            ("address", []) => println!("{}", self.client.operator()),
            (other, _) => bail!("Unknown command or arguments: {} (try `help`)", other),
        }

        Ok(Flow::Continue)
    }

    async fn init(&self) -> Result<()> {
        let tx = self.client.initialize().await.map_err(explain)?;
        println!("Initialized. Owner: {}", self.client.operator());
        println!("Transaction: {}", tx);
        Ok(())
    }

    fn load(&mut self, recipients: &str, amounts: &str) -> Result<()> {
        let read = |path: &str| -> Result<Vec<String>> {
            let path = expand_path(path);
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(parse_lines(&text))
        };
        self.recipients = read(recipients)?;
        self.amounts = read(amounts)?;
        self.show_pending();
        Ok(())
    }

    fn show_pending(&self) {
        if self.recipients.is_empty() && self.amounts.is_empty() {
            println!("No pending recipients");
            return;
        }
        for (i, address) in self.recipients.iter().enumerate() {
            let amount = self.amounts.get(i).map(String::as_str).unwrap_or("?");
            println!("{:>3}. {:<44} {}", i + 1, address, amount);
        }
        if self.amounts.len() > self.recipients.len() {
            println!("    ({} amounts without a recipient)", self.amounts.len() - self.recipients.len());
        }
        println!("Total: {} SOL", batch_total(&self.amounts));
    }

    /// Validate against a fresh balance, then submit.
    ///
    /// The pending batch is kept when anything fails so it can be fixed.
    async fn send(&mut self) -> Result<()> {
        let operator = *self.client.operator();
        let available = lamports_to_sol(self.client.get_balance_lamports(&operator).await?);
        let batch = validate(&self.recipients, &self.amounts, available)?;
        let (count, total) = (batch.len(), batch.total());
        print_batch(&batch);

        match self.client.submit_batch(batch).await {
            Ok(tx) => {
                self.history.record_success(&tx, count, total);
                self.recipients.clear();
                self.amounts.clear();
                println!("Transaction: {}", tx);
                Ok(())
            }
            Err(e) => {
                self.history.record_failure(count, total);
                Err(explain(e))
            }
        }
    }

    fn show_history(&self) -> Result<()> {
        if self.json {
            let records: Vec<_> = self.history.iter().collect();
            return print_json(&records);
        }
        if self.history.is_empty() {
            println!("No distributions yet");
            return Ok(());
        }
        for record in self.history.iter() {
            let status = match record.status {
                DistributionStatus::Completed => "ok",
                DistributionStatus::Failed => "FAILED",
            };
            println!(
                "{} {:<6} {:>3} recipients {:>12} SOL  {}",
                record.timestamp,
                status,
                record.recipient_count,
                record.total_amount,
                record.tx_id.as_deref().unwrap_or("-")
            );
        }
        Ok(())
    }
}
