//! Call-data encoding and revert decoding.

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_json_abi::{InternalType, JsonAbi, Param};
use alloy_primitives::Bytes;
use alloy_sol_types::{Panic, Revert, SolError};

use crate::{ConfigError, Result};

/// Encodes `arguments` against the ABI `inputs`.
///
/// Without inputs the result is the encoding of zero arguments, i.e. empty. Inputs are first
/// passed through [`fix_library_params`] so library ABIs encode like their external signatures.
pub fn encode_arguments(inputs: Option<&[Param]>, arguments: &[DynSolValue]) -> Result<Bytes> {
    let inputs = fix_library_params(inputs.unwrap_or_default());
    if inputs.len() != arguments.len() {
        return Err(ConfigError::ArgumentCount { expected: inputs.len(), actual: arguments.len() }
            .into());
    }

    for (index, (param, value)) in inputs.iter().zip(arguments).enumerate() {
        let ty = param.selector_type();
        if !DynSolType::parse(&ty)?.matches(value) {
            return Err(ConfigError::ArgumentType { index, ty: ty.into_owned() }.into());
        }
    }

    Ok(DynSolValue::Tuple(arguments.to_vec()).abi_encode_params().into())
}

/// Rewrites library-only ABI types to the types they are encoded as.
///
/// Storage pointers become `uint256`, enums `uint8` and contract types `address`; tuple
/// components are fixed recursively and array suffixes are kept.
pub fn fix_library_params(params: &[Param]) -> Vec<Param> {
    params.iter().map(fix_library_param).collect()
}

fn fix_library_param(param: &Param) -> Param {
    let mut fixed = param.clone();
    fixed.components = fix_library_params(&param.components);

    let suffix = array_suffix(&param.ty);
    if param.ty.ends_with(" storage") {
        fixed.ty = "uint256".to_string();
    } else if param.internal_type.as_ref().is_some_and(InternalType::is_enum) {
        fixed.ty = format!("uint8{suffix}");
    } else if param.internal_type.as_ref().is_some_and(InternalType::is_contract) {
        fixed.ty = format!("address{suffix}");
    }
    fixed
}

/// Returns the trailing `[..]` dimensions of an ABI type string.
fn array_suffix(ty: &str) -> &str {
    ty.find('[').map_or("", |start| &ty[start..])
}

/// Decodes `Error(string)` and `Panic(uint256)` revert payloads.
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    if data.is_empty() {
        return None;
    }
    if let Ok(revert) = Revert::abi_decode(data) {
        return Some(revert.reason);
    }
    if let Ok(panic) = Panic::abi_decode(data) {
        return Some(panic.to_string());
    }
    alloy_sol_types::decode_revert_reason(data)
}

/// A custom error decoded from revert data.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedError {
    /// Error name
    pub name: String,
    /// Decoded error arguments
    pub values: Vec<DynSolValue>,
}

/// Matches revert `data` against the custom errors declared in `abi`.
pub fn decode_custom_error(abi: &JsonAbi, data: &[u8]) -> Option<DecodedError> {
    let (selector, body) = data.split_at_checked(4)?;
    abi.errors().find_map(|error| {
        if error.selector().as_slice() != selector {
            return None;
        }
        let types = error
            .inputs
            .iter()
            .map(|param| DynSolType::parse(&param.selector_type()))
            .collect::<Result<Vec<_>, _>>()
            .ok()?;
        match DynSolType::Tuple(types).abi_decode_params(body).ok()? {
            DynSolValue::Tuple(values) => Some(DecodedError { name: error.name.clone(), values }),
            _ => None,
        }
    })
}

impl crate::RevertError {
    /// Decodes the revert data as one of the custom errors in `abi`.
    pub fn decode_custom(&self, abi: &JsonAbi) -> Option<DecodedError> {
        decode_custom_error(abi, &self.data)
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, hex, Address, U256};

    use super::*;
    use crate::ChainError;

    fn params(json: &str) -> Vec<Param> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn no_abi_encodes_nothing() {
        assert!(encode_arguments(None, &[]).unwrap().is_empty());
        assert!(matches!(
            encode_arguments(None, &[DynSolValue::Bool(true)]),
            Err(ChainError::Config(ConfigError::ArgumentCount { expected: 0, actual: 1 }))
        ));
    }

    #[test]
    fn encodes_static_and_tuple_arguments() {
        let inputs = params(
            r#"[
                {"name": "to", "type": "address"},
                {"name": "amount", "type": "tuple", "components": [
                    {"name": "value", "type": "uint256"},
                    {"name": "flag", "type": "bool"}
                ]}
            ]"#,
        );
        let to = address!("5fbdb2315678afecb367f032d93f642f64180aa3");
        let encoded = encode_arguments(
            Some(&inputs),
            &[
                DynSolValue::Address(to),
                DynSolValue::Tuple(vec![
                    DynSolValue::Uint(U256::from(1000), 256),
                    DynSolValue::Bool(true),
                ]),
            ],
        )
        .unwrap();
        assert_eq!(encoded.len(), 96);
        assert_eq!(&encoded[12..32], to.as_slice());
        assert_eq!(U256::from_be_slice(&encoded[32..64]), U256::from(1000));
        assert_eq!(encoded[95], 1);
    }

    #[test]
    fn rejects_mismatched_arguments() {
        let inputs = params(r#"[{"name": "a", "type": "uint256"}]"#);
        assert!(matches!(
            encode_arguments(Some(&inputs), &[DynSolValue::Address(Address::ZERO)]),
            Err(ChainError::Config(ConfigError::ArgumentType { index: 0, .. }))
        ));
    }

    fn param(ty: &str, internal_type: Option<&str>, components: Vec<Param>) -> Param {
        Param {
            ty: ty.to_string(),
            name: String::new(),
            components,
            internal_type: internal_type.and_then(InternalType::parse),
        }
    }

    #[test]
    fn fixes_library_types() {
        let inputs = vec![
            param("Lib.Data storage", Some("struct Lib.Data"), vec![]),
            param("Lib.Kind[2]", Some("enum Lib.Kind[2]"), vec![]),
            param("IERC20", Some("contract IERC20"), vec![]),
            param(
                "tuple",
                Some("struct Lib.Pair"),
                vec![
                    param("Ownable", Some("contract Ownable"), vec![]),
                    param("uint128", Some("uint128"), vec![]),
                ],
            ),
        ];
        let fixed = fix_library_params(&inputs);
        let types: Vec<_> = fixed.iter().map(|p| p.selector_type().into_owned()).collect();
        assert_eq!(types, ["uint256", "uint8[2]", "address", "(address,uint128)"]);
    }

    #[test]
    fn decodes_standard_reasons() {
        // Error("nope")
        let data = hex!(
            "08c379a0"
            "0000000000000000000000000000000000000000000000000000000000000020"
            "0000000000000000000000000000000000000000000000000000000000000004"
            "6e6f706500000000000000000000000000000000000000000000000000000000"
        );
        assert_eq!(decode_revert_reason(&data).as_deref(), Some("nope"));
        assert_eq!(decode_revert_reason(&[]), None);
    }

    #[test]
    fn decodes_custom_errors() {
        let abi: JsonAbi = serde_json::from_str(
            r#"[{"type": "error", "name": "Insufficient", "inputs": [
                {"name": "available", "type": "uint256"},
                {"name": "required", "type": "uint256"}
            ]}]"#,
        )
        .unwrap();
        let error = abi.errors().next().unwrap();
        let mut data = error.selector().to_vec();
        data.extend(DynSolValue::Tuple(vec![
            DynSolValue::Uint(U256::from(1), 256),
            DynSolValue::Uint(U256::from(2), 256),
        ])
        .abi_encode_params());

        let decoded = decode_custom_error(&abi, &data).unwrap();
        assert_eq!(decoded.name, "Insufficient");
        assert_eq!(decoded.values[1], DynSolValue::Uint(U256::from(2), 256));
        assert_eq!(decode_custom_error(&abi, &data[..3]), None);
    }
}
