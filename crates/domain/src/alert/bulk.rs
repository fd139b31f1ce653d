use crate::common::entity::AlertId;

use super::error::AlertError;

/// Maximum number of alert IDs accepted in a single bulk transition.
pub const MAX_BULK_IDS: usize = 100;

/// Validate and parse a raw bulk-transition batch.
///
/// The size cap is checked against the raw batch before any parsing.
/// Unparseable IDs are dropped rather than rejected; if nothing
/// parseable remains the whole request fails with `NoValidIds`.
pub fn parse_batch(raw_ids: &[String]) -> Result<Vec<AlertId>, AlertError> {
    if raw_ids.is_empty() {
        return Err(AlertError::EmptyBatch);
    }
    if raw_ids.len() > MAX_BULK_IDS {
        return Err(AlertError::TooManyIds {
            count: raw_ids.len(),
            max: MAX_BULK_IDS,
        });
    }

    let ids: Vec<AlertId> = raw_ids.iter().filter_map(|s| AlertId::parse(s)).collect();
    if ids.is_empty() {
        return Err(AlertError::NoValidIds);
    }
    Ok(ids)
}
