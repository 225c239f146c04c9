//! Transaction configuration for devchain

use alloy_eips::eip2930::{AccessList, AccessListItem};
use alloy_primitives::{utils::parse_units, Address, B256, U256};
use clap::Args;
use devchain::{AccessListSetting, ChainError, GasSetting, TransactionRequest, TxType};
use tracing::trace;

use super::{load_hex, CliError, Result};

/// Transaction configuration arguments
#[derive(Args, Debug, Clone, Default)]
#[command(next_help_heading = "Transaction Options")]
pub struct TxArgs {
    /// Transaction type (0=Legacy, 1=EIP-2930, 2=EIP-1559). Inferred from the fee fields when
    /// unset
    #[arg(long = "tx-type", visible_aliases = ["type", "ty"])]
    pub tx_type: Option<u64>,

    /// The transaction sender [default: the session's default sender]
    #[arg(long = "from", visible_aliases = ["sender"])]
    pub from: Option<Address>,

    /// The transaction receiver. Omit to deploy `--input` as init code
    #[arg(long = "to", visible_aliases = ["receiver"])]
    pub to: Option<Address>,

    /// The transaction nonce [default: next nonce of the sender]
    #[arg(long = "nonce")]
    pub nonce: Option<u64>,

    /// Gas limit, or `auto` to estimate it [default: block gas limit in development mode,
    /// estimated otherwise]
    #[arg(long = "gas", visible_aliases = ["gas-limit"])]
    pub gas: Option<GasSetting>,

    /// Legacy gas price in wei
    #[arg(long = "gas-price", visible_aliases = ["price"])]
    pub gas_price: Option<u128>,

    /// EIP-1559 priority fee in wei
    #[arg(long = "priority-fee", visible_aliases = ["priorityfee", "tip"])]
    pub priority_fee: Option<u128>,

    /// EIP-1559 fee cap in wei
    #[arg(long = "max-fee", visible_aliases = ["maxfee"])]
    pub max_fee: Option<u128>,

    /// Value to transfer.
    /// VALUE can be: plain number (wei), or number with suffix (ether, gwei, wei).
    /// Examples: `--value 1ether`, `--value 100gwei`, `--value 1000000000000000000`
    #[arg(long = "value")]
    pub value: Option<String>,

    /// Transaction data (input) as hex string
    #[arg(long = "input", visible_aliases = ["data"])]
    pub input: Option<String>,

    /// File containing transaction data (input). If '-' is specified, input is read from stdin
    #[arg(long = "inputfile", visible_aliases = ["datafile", "input-file", "data-file"])]
    pub inputfile: Option<String>,

    /// EIP-2930 access list entry in format `ADDRESS` or `ADDRESS:KEY1,KEY2,...` (can be repeated)
    #[arg(long = "access", visible_aliases = ["accesslist", "access-list"], value_name = "ACCESS")]
    pub access: Vec<String>,

    /// Generate the access list with `eth_createAccessList`
    #[arg(long = "access-auto", conflicts_with = "access")]
    pub access_auto: bool,
}

impl TxArgs {
    /// Creates a [`TransactionRequest`] from the transaction arguments.
    ///
    /// Unset arguments stay unset so the session fills them in.
    pub fn to_request(&self) -> Result<TransactionRequest> {
        let tx_type = self.tx_type.map(TxType::try_from).transpose().map_err(ChainError::from)?;
        let access_list = if self.access_auto {
            Some(AccessListSetting::Auto)
        } else if self.access.is_empty() {
            None
        } else {
            Some(AccessListSetting::List(self.parse_access_list()?))
        };

        let request = TransactionRequest {
            tx_type,
            nonce: self.nonce,
            to: self.to,
            from: self.from,
            gas: self.gas,
            value: self.value.as_deref().map(parse_ether_value).transpose()?,
            data: load_hex(self.input.as_deref(), self.inputfile.as_deref())?,
            gas_price: self.gas_price,
            max_priority_fee_per_gas: self.priority_fee,
            max_fee_per_gas: self.max_fee,
            access_list,
            chain_id: None,
        };
        trace!(?request, "Created request");
        Ok(request)
    }

    /// Parses access list from CLI arguments.
    pub(crate) fn parse_access_list(&self) -> Result<AccessList> {
        let items: Result<Vec<AccessListItem>> =
            self.access.iter().map(|s| parse_access_list_item(s)).collect();
        Ok(AccessList(items?))
    }
}

/// Parses a single access list item.
///
/// Format: `ADDRESS` or `ADDRESS:KEY1,KEY2,...` with B256 storage keys.
fn parse_access_list_item(s: &str) -> Result<AccessListItem> {
    let (addr_str, keys_str) = match s.split_once(':') {
        Some((addr_str, keys_str)) => (addr_str, Some(keys_str)),
        None => (s, None),
    };
    let address: Address = addr_str.trim().parse().map_err(|_| {
        CliError::InvalidInput(format!("Invalid access list address: {}", addr_str.trim()))
    })?;

    let storage_keys = keys_str
        .map(|keys| {
            keys.split(',')
                .map(|k| {
                    k.trim().parse::<B256>().map_err(|_| {
                        CliError::InvalidInput(format!("Invalid storage key: {}", k.trim()))
                    })
                })
                .collect::<Result<Vec<_>>>()
        })
        .transpose()?
        .unwrap_or_default();

    trace!(string = %s, %address, ?storage_keys, "Parsed access list item");
    Ok(AccessListItem { address, storage_keys })
}

/// Parse ether value string into wei (U256).
/// Supports: plain number (wei), or number with suffix (ether, gwei, wei, etc).
/// Examples: "1000000000000000000", "1ether", "100gwei", "1000wei"
pub fn parse_ether_value(s: &str) -> Result<U256> {
    let s = s.trim();

    // Find where digits/decimal end and unit begins
    let split_pos = s.find(|c: char| !c.is_ascii_digit() && c != '.').unwrap_or(s.len());

    let (num_str, unit) = s.split_at(split_pos);
    let unit = if unit.is_empty() { "wei" } else { unit };

    let parsed = parse_units(num_str, unit)
        .map_err(|e| CliError::InvalidInput(format!("Invalid ether value '{s}': {e}")))?;

    Ok(parsed.into())
}
