//! Interactive tessera client.
//!
//! Asks for name and surname, shows the card menu, sends one request and
//! prints the outcome. Any transport error ends the process with a
//! non-zero exit code.

use std::io::Write;

use anyhow::{Context, bail};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use tessera_server::client::TesseraClient;
use tessera_server::config::ClientConfig;
use tessera_server::domain::PoolId;
use tessera_server::logging;
use tessera_server::protocol::{CANCEL_SELECTOR, Request, Status, truncate_field};

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ClientConfig::from_env()?;
    logging::init(config.log_format, "warn");

    let mut input = BufReader::new(tokio::io::stdin()).lines();

    let name = prompt(&mut input, "\nEnter your name: ").await?;
    let surname = prompt(&mut input, "Enter your surname: ").await?;
    let name = truncate_field(&name).to_string();
    let surname = truncate_field(&surname).to_string();

    let choice = choose(&mut input).await?;
    let request = if choice == CANCEL_SELECTOR {
        let pool = choose_pool(&mut input, "Enter the card type to cancel (1-3): ").await?;
        Request::Cancel {
            name,
            surname,
            pool,
        }
    } else {
        let Some(pool) = PoolId::from_code(choice) else {
            bail!("menu returned invalid choice {choice}");
        };
        Request::Register {
            name,
            surname,
            pool,
        }
    };

    let client = TesseraClient::new(config.server_addr);
    let status = client
        .send(&request)
        .await
        .with_context(|| format!("request to {} failed", client.addr()))?;

    println!("\n{}", outcome_message(&request, status));
    Ok(())
}

async fn prompt(input: &mut Input, text: &str) -> anyhow::Result<String> {
    print!("{text}");
    std::io::stdout().flush()?;
    let line = input
        .next_line()
        .await?
        .context("standard input closed")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn choose(input: &mut Input) -> anyhow::Result<i32> {
    loop {
        println!("\nChoose a card type:");
        for pool in PoolId::ALL {
            println!(
                "{} - {} ({}, €{})",
                pool.code(),
                pool.label(),
                pool.description(),
                pool.price_eur()
            );
        }
        println!("{CANCEL_SELECTOR} - Cancel a subscription and request a refund");

        let line = prompt(input, "Enter your choice (1-4): ").await?;
        match line.trim().parse::<i32>() {
            Ok(choice) if (1..=CANCEL_SELECTOR).contains(&choice) => return Ok(choice),
            _ => println!("Invalid choice. Try again."),
        }
    }
}

async fn choose_pool(input: &mut Input, text: &str) -> anyhow::Result<PoolId> {
    loop {
        let line = prompt(input, text).await?;
        if let Some(pool) = line.trim().parse().ok().and_then(PoolId::from_code) {
            return Ok(pool);
        }
        println!("Invalid card type. Try again.");
    }
}

fn outcome_message(request: &Request, status: Status) -> String {
    match (request, status) {
        (Request::Register { pool, .. }, Status::Success) => {
            format!("{pool} registered successfully!")
        }
        (Request::Register { pool, .. }, Status::Failure) => {
            format!("No places left for {pool}.")
        }
        (Request::Cancel { .. }, Status::Success) => {
            "Cancellation completed. You can now request a refund.".to_string()
        }
        (Request::Cancel { pool, .. }, Status::Failure) => {
            format!("Cancellation failed: no active {pool} subscription found.")
        }
    }
}
