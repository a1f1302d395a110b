//! Text and JSON rendering of command results.

use ledger_sync::{Direction, LedgerError, NftRecord, TransactionRecord, TxStatus};
use serde_json::json;
use shared_types::{Address, TokenAmount};

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn balance(
    as_json: bool,
    address: Address,
    native: TokenAmount,
    token: TokenAmount,
) -> anyhow::Result<()> {
    if as_json {
        return print_json(&json!({
            "address": address.to_string(),
            "native": native.to_string(),
            "token": token.to_string(),
        }));
    }
    println!("account  {}", address.to_string());
    println!("native   {}", native);
    println!("token    {}", token);
    Ok(())
}

pub fn history(as_json: bool, records: &[TransactionRecord]) -> anyhow::Result<()> {
    if as_json {
        return print_json(&serde_json::to_value(records)?);
    }
    if records.is_empty() {
        println!("no transfers in range");
    }
    for record in records {
        let sign = match record.direction {
            Direction::Spent => "-",
            Direction::Earned | Direction::Received => "+",
        };
        let status = match record.status {
            TxStatus::Pending => "pending",
            TxStatus::Completed => "completed",
            TxStatus::Failed => "failed",
        };
        println!(
            "{:>10}  {:<9} {}{:<24} {}  {}",
            record.block_number.map(|b| b.to_string()).unwrap_or_default(),
            status,
            sign,
            record.amount.to_string(),
            record.counterparty,
            record.tx_hash.map(|h| h.to_string()).unwrap_or_default(),
        );
    }
    Ok(())
}

pub fn nfts(as_json: bool, records: &[NftRecord]) -> anyhow::Result<()> {
    if as_json {
        return print_json(&serde_json::to_value(records)?);
    }
    if records.is_empty() {
        println!("no achievements held");
    }
    for nft in records {
        println!(
            "#{:<6} {:<32} {}",
            nft.token_id.map(|id| id.to_string()).unwrap_or_default(),
            nft.metadata.name,
            nft.image_ref.uri(),
        );
    }
    Ok(())
}

pub fn value(as_json: bool, key: &str, value: String) -> anyhow::Result<()> {
    if as_json {
        let mut object = serde_json::Map::new();
        object.insert(key.to_string(), value.into());
        return print_json(&serde_json::Value::Object(object));
    }
    println!("{}", value);
    Ok(())
}

pub fn warnings(warnings: &[LedgerError]) {
    for warning in warnings {
        tracing::warn!("[ledger] Results may be incomplete: {}", warning);
    }
}
