use super::{TransactionRequest, TxType};
use crate::ConfigError;

/// Determines the envelope type of `request` and checks its fee fields against it.
///
/// An explicit `tx_type` wins. Otherwise dynamic-fee fields imply type 2, an access list
/// implies type 1, a gas price implies type 0, and `default` applies when none of them is set.
/// Mixing `gasPrice` with any dynamic-fee field is rejected regardless of type.
pub fn resolve_tx_type(
    request: &TransactionRequest,
    default: TxType,
) -> Result<TxType, ConfigError> {
    if request.gas_price.is_some() && request.has_dynamic_fee() {
        return Err(ConfigError::MixedFeeFields);
    }

    let tx_type = request.tx_type.unwrap_or(if request.has_dynamic_fee() {
        TxType::DynamicFee
    } else if request.access_list.is_some() {
        TxType::AccessList
    } else if request.gas_price.is_some() {
        TxType::Legacy
    } else {
        default
    });

    validate_fields(request, tx_type)?;
    Ok(tx_type)
}

fn validate_fields(request: &TransactionRequest, tx_type: TxType) -> Result<(), ConfigError> {
    let dynamic = tx_type == TxType::DynamicFee;
    // (field, present, allowed for `tx_type`)
    let fields = [
        ("accessList", request.access_list.is_some(), tx_type != TxType::Legacy),
        ("maxFeePerGas", request.max_fee_per_gas.is_some(), dynamic),
        ("maxPriorityFeePerGas", request.max_priority_fee_per_gas.is_some(), dynamic),
        ("gasPrice", request.gas_price.is_some(), !dynamic),
    ];

    match fields.into_iter().find(|&(_, present, allowed)| present && !allowed) {
        Some((field, ..)) => Err(ConfigError::FieldNotAllowed { field, tx_type }),
        None => Ok(()),
    }
}
