//! Delivery bid selection.
//!
//! The backend returns a flat list of pending bids with the order fields
//! inlined on every row. This module regroups them per order, works out
//! which bids sit at the group minimum, and decides whether approving a
//! given bid needs a written justification.
//!
//! Ties are not broken: every bid equal to the minimum is flagged lowest,
//! and any of them may be approved without a justification.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{ValidationError, ValidationResult};
use crate::model::{Bid, BidId, OrderBidGroup, OrderId};

/// Group a flat bid list by order.
///
/// Groups appear in the order their first bid was seen, and each group keeps
/// its bids in input order. No bid is dropped or merged.
pub fn group_bids_by_order<I>(bids: I) -> Vec<OrderBidGroup>
where
    I: IntoIterator<Item = Bid>,
{
    let mut groups: Vec<OrderBidGroup> = Vec::new();
    let mut index: HashMap<OrderId, usize> = HashMap::new();

    for bid in bids {
        let slot = *index.entry(bid.order_id).or_insert_with(|| {
            groups.push(OrderBidGroup {
                order_id: bid.order_id,
                customer_name: bid.customer_name.clone(),
                delivered_to: bid.delivered_to.clone(),
                order_total: bid.order_total,
                bids: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].bids.push(bid);
    }

    debug!(orders = groups.len(), "Grouped pending bids by order");
    groups
}

/// Minimum `bid_amount` in the group, or `None` when the group is empty.
pub fn lowest_bid(group: &OrderBidGroup) -> Option<f64> {
    group
        .bids
        .iter()
        .map(|b| b.bid_amount)
        .fold(None, |acc: Option<f64>, amount| {
            Some(acc.map_or(amount, |m| m.min(amount)))
        })
}

/// Whether `bid` sits exactly at the group minimum.
pub fn is_lowest(group: &OrderBidGroup, bid: &Bid) -> bool {
    lowest_bid(group).is_some_and(|min| bid.bid_amount == min)
}

/// A bid annotated with its standing inside its order group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedBid<'a> {
    pub bid: &'a Bid,
    pub is_lowest: bool,
}

impl RankedBid<'_> {
    pub fn requires_justification(&self) -> bool {
        !self.is_lowest
    }
}

/// Annotate every bid in the group, preserving order.
pub fn rank_bids(group: &OrderBidGroup) -> Vec<RankedBid<'_>> {
    let min = lowest_bid(group);
    group
        .bids
        .iter()
        .map(|bid| RankedBid {
            bid,
            is_lowest: min.is_some_and(|m| bid.bid_amount == m),
        })
        .collect()
}

/// Locate a bid across all groups, returning it with its lowest flag.
pub fn find_ranked(groups: &[OrderBidGroup], bid_id: BidId) -> Option<RankedBid<'_>> {
    groups.iter().find_map(|group| {
        group
            .bids
            .iter()
            .find(|b| b.bid_id == bid_id)
            .map(|bid| RankedBid {
                bid,
                is_lowest: is_lowest(group, bid),
            })
    })
}

/// Check the justification rule for approving a bid.
///
/// Returns the trimmed justification to send (or `None` when there is
/// nothing to send). A blank justification counts as missing.
pub fn validate_approval(
    is_lowest_bid: bool,
    justification: Option<&str>,
) -> ValidationResult<Option<String>> {
    let justification = justification
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_owned);

    if !is_lowest_bid && justification.is_none() {
        return Err(ValidationError::JustificationRequired);
    }
    Ok(justification)
}
