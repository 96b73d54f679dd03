//! Call trace payload as returned by geth's `callTracer`.

use super::DataSourceError;
use crate::domain::{Address, Wei};
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// Trace of a whole transaction: the root call frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trace {
    pub root: CallFrame,
}

impl Trace {
    pub fn new(root: CallFrame) -> Self {
        Trace { root }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallFrame {
    /// CALL, STATICCALL, DELEGATECALL, CALLCODE, CREATE, CREATE2, SELFDESTRUCT
    #[serde(rename = "type")]
    pub call_type: String,
    pub from: Address,
    #[serde(default)]
    pub to: Option<Address>,
    /// Hex quantity, e.g. "0x2386f26fc10000".
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub input: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calls: Vec<CallFrame>,
}

impl CallFrame {
    /// Value transferred with the call. Missing or empty values are zero.
    pub fn value_wei(&self) -> Result<Wei, DataSourceError> {
        let digits = match self.value.as_deref().map(strip_hex_prefix) {
            None | Some("") => return Ok(Wei::ZERO),
            Some(digits) => digits,
        };
        U256::from_str_radix(digits, 16).map(Wei::new).map_err(|e| {
            DataSourceError::ParseError(format!(
                "invalid call value {:?} from {}: {}",
                self.value.as_deref().unwrap_or_default(),
                self.from,
                e
            ))
        })
    }

    pub fn reverted(&self) -> bool {
        self.error.is_some()
    }

    /// Calldata bytes; `""` and `"0x"` are empty calldata.
    pub fn input_bytes(&self) -> Result<Vec<u8>, DataSourceError> {
        hex::decode(strip_hex_prefix(&self.input)).map_err(|e| {
            DataSourceError::ParseError(format!(
                "invalid calldata {:?} from {}: {}",
                self.input, self.from, e
            ))
        })
    }
}

fn strip_hex_prefix(value: &str) -> &str {
    value.trim().trim_start_matches("0x")
}
