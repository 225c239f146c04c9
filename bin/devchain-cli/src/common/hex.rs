//! Calldata given inline or read from a file.

use std::{fs, io::Read};

use alloy_primitives::{hex, Bytes};

use super::{CliError, Result};

/// Transaction data from `--input` or, failing that, `--inputfile` (`-` is stdin).
pub fn load_hex(arg: Option<&str>, file: Option<&str>) -> Result<Option<Bytes>> {
    let text = match (arg, file) {
        (Some(arg), _) => arg.to_string(),
        (None, Some("-")) => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
        (None, Some(path)) => fs::read_to_string(path)?,
        (None, None) => return Ok(None),
    };
    decode_hex(&text).map(|bytes| Some(bytes.into()))
}

fn decode_hex(text: &str) -> Result<Vec<u8>> {
    let text = text.trim();
    let digits = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")).unwrap_or(text);
    if digits.len() % 2 == 1 {
        return Err(CliError::InvalidInput(format!(
            "calldata has an odd number of hex digits ({})",
            digits.len()
        )));
    }
    Ok(hex::decode(digits)?)
}
