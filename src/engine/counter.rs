//! Transaction-wide NFT activity signals.

use crate::domain::{Address, BalanceDeltaMap};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaleActivity {
    /// NFT inflows of any collection.
    pub total_transfers: u64,
    /// NFT inflows of the sale's collection.
    pub same_collection_sales: u64,
}

pub struct SaleActivityCounter;

impl SaleActivityCounter {
    pub fn count(deltas: &BalanceDeltaMap, collection: &Address) -> SaleActivity {
        deltas
            .values()
            .flat_map(|states| states.iter())
            .filter(|(state, delta)| state.is_nft() && !delta.is_outflow())
            .fold(SaleActivity::default(), |mut activity, (state, _)| {
                activity.total_transfers += 1;
                if state.contract == *collection {
                    activity.same_collection_sales += 1;
                }
                activity
            })
    }
}
