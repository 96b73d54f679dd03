//! Balance delta computation from a call trace.
//!
//! Walks the call tree and records value movements:
//! - native value carried by CALL / CREATE / CREATE2 / SELFDESTRUCT frames
//! - ERC-20 `transfer` and `transferFrom` (the latter only on known fungible contracts)
//! - ERC-721 `transferFrom` and both `safeTransferFrom` overloads
//! - ERC-1155 `safeTransferFrom` and `safeBatchTransferFrom`
//! - wrapped-native `deposit` / `withdraw`
//!
//! Reverted frames and everything below them are ignored, as are DELEGATECALL and
//! STATICCALL frames.

use super::{BalanceDeltaComputer, CallFrame, DataSourceError, Trace};
use crate::domain::{Address, AssetKind, AssetStateId, BalanceDelta, BalanceDeltaMap, Wei};
use alloy_sol_types::{sol, SolCall};
use std::collections::HashSet;

sol! {
    interface IERC20 {
        function transfer(address to, uint256 amount);
        /// Same selector as ERC-721 `transferFrom`; `amount` is the token id there.
        function transferFrom(address from, address to, uint256 amount);
    }

    interface IERC721 {
        function safeTransferFrom(address from, address to, uint256 tokenId);
        function safeTransferFrom(address from, address to, uint256 tokenId, bytes data);
    }

    interface IERC1155 {
        function safeTransferFrom(address from, address to, uint256 id, uint256 amount, bytes data);
        function safeBatchTransferFrom(address from, address to, uint256[] ids, uint256[] amounts, bytes data);
    }

    interface IWETH {
        function deposit();
        function withdraw(uint256 wad);
    }
}

/// Computes net balance changes by replaying transfers found in the call tree.
#[derive(Debug, Clone)]
pub struct CallTraceDeltaComputer {
    wrapped_native: Address,
    fungible: HashSet<Address>,
}

impl CallTraceDeltaComputer {
    pub fn new(wrapped_native: Address) -> Self {
        let mut fungible = HashSet::new();
        fungible.insert(wrapped_native);
        Self {
            wrapped_native,
            fungible,
        }
    }

    /// Treat `transferFrom` on these contracts as ERC-20 rather than ERC-721.
    pub fn with_fungible_contracts(mut self, contracts: impl IntoIterator<Item = Address>) -> Self {
        self.fungible.extend(contracts);
        self
    }

    fn visit(&self, frame: &CallFrame, acc: &mut DeltaAccumulator) -> Result<(), DataSourceError> {
        if frame.reverted() {
            return Ok(());
        }

        let call_type = frame.call_type.to_ascii_uppercase();
        let moves_value = matches!(
            call_type.as_str(),
            "CALL" | "CREATE" | "CREATE2" | "SELFDESTRUCT"
        );

        if moves_value {
            let value = frame.value_wei()?;
            if let (false, Some(to)) = (value.is_zero(), frame.to.as_ref()) {
                acc.transfer(&frame.from, to, AssetStateId::native(), value)?;
            }
        }

        if call_type == "CALL" {
            if let Some(token) = frame.to.as_ref() {
                self.apply_calldata(frame, token, acc)?;
            }
        }

        for child in &frame.calls {
            self.visit(child, acc)?;
        }
        Ok(())
    }

    fn apply_calldata(
        &self,
        frame: &CallFrame,
        token: &Address,
        acc: &mut DeltaAccumulator,
    ) -> Result<(), DataSourceError> {
        let input = frame.input_bytes()?;
        let Some(selector) = input.get(..4).and_then(|s| <[u8; 4]>::try_from(s).ok()) else {
            return Ok(());
        };

        // Calldata that fails to decode is not a transfer we can account for.
        match selector {
            IERC20::transferCall::SELECTOR => {
                if let Ok(call) = IERC20::transferCall::abi_decode(&input, false) {
                    let state = AssetStateId::erc20(*token);
                    acc.transfer(&frame.from, &call.to.into(), state, Wei::new(call.amount))?;
                }
            }
            IERC20::transferFromCall::SELECTOR => {
                if let Ok(call) = IERC20::transferFromCall::abi_decode(&input, false) {
                    let (from, to) = (call.from.into(), call.to.into());
                    if self.fungible.contains(token) {
                        acc.transfer(&from, &to, AssetStateId::erc20(*token), Wei::new(call.amount))?;
                    } else {
                        let state = AssetStateId::nft(AssetKind::Erc721, *token, call.amount.to_string());
                        acc.transfer(&from, &to, state, Wei::from_u128(1))?;
                    }
                }
            }
            IERC721::safeTransferFrom_0Call::SELECTOR => {
                if let Ok(call) = IERC721::safeTransferFrom_0Call::abi_decode(&input, false) {
                    let state = AssetStateId::nft(AssetKind::Erc721, *token, call.tokenId.to_string());
                    acc.transfer(&call.from.into(), &call.to.into(), state, Wei::from_u128(1))?;
                }
            }
            IERC721::safeTransferFrom_1Call::SELECTOR => {
                if let Ok(call) = IERC721::safeTransferFrom_1Call::abi_decode(&input, false) {
                    let state = AssetStateId::nft(AssetKind::Erc721, *token, call.tokenId.to_string());
                    acc.transfer(&call.from.into(), &call.to.into(), state, Wei::from_u128(1))?;
                }
            }
            IERC1155::safeTransferFromCall::SELECTOR => {
                if let Ok(call) = IERC1155::safeTransferFromCall::abi_decode(&input, false) {
                    let state = AssetStateId::nft(AssetKind::Erc1155, *token, call.id.to_string());
                    acc.transfer(&call.from.into(), &call.to.into(), state, Wei::new(call.amount))?;
                }
            }
            IERC1155::safeBatchTransferFromCall::SELECTOR => {
                if let Ok(call) = IERC1155::safeBatchTransferFromCall::abi_decode(&input, false) {
                    let (from, to) = (call.from.into(), call.to.into());
                    for (id, amount) in call.ids.iter().zip(call.amounts.iter()) {
                        let state = AssetStateId::nft(AssetKind::Erc1155, *token, id.to_string());
                        acc.transfer(&from, &to, state, Wei::new(*amount))?;
                    }
                }
            }
            IWETH::depositCall::SELECTOR if *token == self.wrapped_native => {
                acc.credit(&frame.from, AssetStateId::erc20(*token), frame.value_wei()?)?;
            }
            IWETH::withdrawCall::SELECTOR if *token == self.wrapped_native => {
                if let Ok(call) = IWETH::withdrawCall::abi_decode(&input, false) {
                    acc.debit(&frame.from, AssetStateId::erc20(*token), Wei::new(call.wad))?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

impl BalanceDeltaComputer for CallTraceDeltaComputer {
    fn compute_balance_deltas(&self, trace: &Trace) -> Result<BalanceDeltaMap, DataSourceError> {
        let mut acc = DeltaAccumulator::default();
        self.visit(&trace.root, &mut acc)?;
        Ok(acc.finish())
    }
}

#[derive(Default)]
struct DeltaAccumulator {
    map: BalanceDeltaMap,
}

impl DeltaAccumulator {
    fn apply(
        &mut self,
        address: &Address,
        state: AssetStateId,
        amount: Wei,
        outflow: bool,
    ) -> Result<(), DataSourceError> {
        let delta = BalanceDelta::from_wei(amount, outflow)
            .ok_or_else(|| DataSourceError::ParseError(format!("amount out of range: {}", amount)))?;
        let entry = self
            .map
            .entry(*address)
            .or_default()
            .entry(state)
            .or_insert(BalanceDelta::ZERO);
        *entry = entry
            .checked_add(delta)
            .ok_or_else(|| DataSourceError::Other(format!("balance delta overflow for {}", address)))?;
        Ok(())
    }

    fn credit(&mut self, address: &Address, state: AssetStateId, amount: Wei) -> Result<(), DataSourceError> {
        self.apply(address, state, amount, false)
    }

    fn debit(&mut self, address: &Address, state: AssetStateId, amount: Wei) -> Result<(), DataSourceError> {
        self.apply(address, state, amount, true)
    }

    fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        state: AssetStateId,
        amount: Wei,
    ) -> Result<(), DataSourceError> {
        self.debit(from, state.clone(), amount)?;
        self.credit(to, state, amount)
    }

    /// Drop slots that net to zero and addresses left with no slots.
    fn finish(mut self) -> BalanceDeltaMap {
        for states in self.map.values_mut() {
            states.retain(|_, delta| !delta.is_zero());
        }
        self.map.retain(|_, states| !states.is_empty());
        self.map
    }
}
