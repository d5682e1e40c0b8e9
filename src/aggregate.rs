//! Final row aggregation: drop unusable addresses and establish the total
//! order every output format relies on.

use crate::model::GroupAddressRow;

/// Filter the sentinel addresses out and sort.
///
/// The order is by owning device (physical address, with `[0, 0, 0]` rows
/// first), then by the group address itself, then channel number, then the
/// object's position within its channel. The sort is stable, so rows that tie
/// on the whole key keep their generation order.
pub fn finalize(mut rows: Vec<GroupAddressRow>) -> Vec<GroupAddressRow> {
    let before = rows.len();
    rows.retain(|row| !row.address.is_invalid());
    let dropped = before - rows.len();
    if dropped > 0 {
        tracing::debug!(dropped, "removed rows with unusable addresses");
    }

    rows.sort_by_key(|row| {
        (
            row.sort_key.physical_address,
            row.address.parts(),
            row.sort_key.channel_number,
            row.sort_key.object_index,
        )
    });
    rows
}
