//! CSV format handling for journal records and balance output
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvRecord structure for deserialization
//! - Conversion from CSV records to domain types
//! - Balance output serialization
//!
//! All functions are pure (no I/O) for easy testing.

use crate::types::{AccountId, AccountKind, Operation, OperationRecord};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;
use uuid::Uuid;

/// CSV record structure for deserialization
///
/// Matches the journal format with columns: op, account, currency, amount,
/// player. Everything after `account` is optional because membership
/// operations carry no amount and fund operations carry no player.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvRecord {
    pub op: String,
    pub account: String,
    pub currency: Option<String>,
    pub amount: Option<String>,
    pub player: Option<String>,
}

/// Convert a CsvRecord to an OperationRecord
///
/// This function:
/// - Parses the operation name (case-insensitive) into an Operation
/// - Parses the account and player ids as UUIDs
/// - Parses the amount string into a Decimal (if present)
/// - Validates that currency and amount are present for fund operations
/// - Validates that a player is present for bank and membership operations
///
/// Amount sign is not checked here; negative amounts reach the provider and
/// are rejected there.
///
/// # Arguments
///
/// * `csv_record` - The deserialized CSV record
///
/// # Returns
///
/// Result containing either:
/// - Ok(OperationRecord) - Successfully converted record
/// - Err(String) - Error message describing the conversion failure
pub fn convert_csv_record(csv_record: CsvRecord) -> Result<OperationRecord, String> {
    let op = match csv_record.op.to_lowercase().as_str() {
        "open" => Operation::Open,
        "open_bank" => Operation::OpenBank,
        "deposit" => Operation::Deposit,
        "withdraw" => Operation::Withdraw,
        "set" => Operation::SetBalance,
        "add_member" => Operation::AddMember,
        "remove_member" => Operation::RemoveMember,
        _ => {
            return Err(format!(
                "Invalid operation: '{}' for account {}",
                csv_record.op, csv_record.account
            ))
        }
    };

    let account = parse_id(&csv_record.account)
        .ok_or_else(|| format!("Invalid account id '{}'", csv_record.account))?;

    let currency = non_empty(csv_record.currency);

    let amount = match non_empty(csv_record.amount) {
        Some(amount_str) => match Decimal::from_str(&amount_str) {
            Ok(decimal) => Some(decimal),
            Err(_) => {
                return Err(format!(
                    "Invalid amount '{}' for account {}",
                    amount_str, account
                ))
            }
        },
        None => None,
    };

    let player = match non_empty(csv_record.player) {
        Some(player_str) => Some(
            parse_id(&player_str).ok_or_else(|| format!("Invalid player id '{}'", player_str))?,
        ),
        None => None,
    };

    if op.moves_funds() && (currency.is_none() || amount.is_none()) {
        return Err(format!(
            "{:?} on account {} requires a currency and an amount",
            op, account
        ));
    }
    if op.needs_player() && player.is_none() {
        return Err(format!("{:?} on account {} requires a player", op, account));
    }

    Ok(OperationRecord {
        op,
        account,
        currency,
        amount,
        player,
    })
}

fn parse_id(value: &str) -> Option<Uuid> {
    Uuid::parse_str(value.trim()).ok()
}

fn non_empty(field: Option<String>) -> Option<String> {
    field
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// One output line: an account's balance in one currency
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceRow {
    pub account: AccountId,
    pub kind: AccountKind,
    pub currency: String,
    /// Balance already rounded to the currency precision
    pub balance: Decimal,
    /// Decimal places the balance is printed with
    pub precision: u32,
    /// Member count for bank accounts, `None` for players
    pub members: Option<usize>,
}

/// Write balance rows to CSV format
///
/// Writes rows with columns: account, kind, currency, balance, members.
/// Rows are sorted by account, kind and currency for deterministic output.
///
/// # Arguments
///
/// * `rows` - Balance rows to write
/// * `output` - Mutable reference to a writer for outputting CSV
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(String)` if a write error occurred
pub fn write_balances_csv(rows: &[BalanceRow], output: &mut dyn Write) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["account", "kind", "currency", "balance", "members"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted_rows = rows.to_vec();
    sorted_rows.sort_by(|a, b| {
        (a.account, a.kind, &a.currency).cmp(&(b.account, b.kind, &b.currency))
    });

    for row in sorted_rows {
        writer
            .write_record(&[
                row.account.to_string(),
                row.kind.to_string(),
                row.currency,
                format!("{:.prec$}", row.balance, prec = row.precision as usize),
                row.members.map(|count| count.to_string()).unwrap_or_default(),
            ])
            .map_err(|e| format!("Failed to write balance record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}
