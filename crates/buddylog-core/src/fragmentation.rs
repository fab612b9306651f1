//! Memory fragmentation derived from buddy allocator free lists.
//!
//! For every order `i` of a zone the free pages are `count_i * 2^i`. Walking
//! the orders from smallest to largest, each order contributes the share of
//! all free pages held by the smaller orders already walked. The zone value
//! is the mean of those shares:
//!
//! - close to 0: free memory sits in the largest blocks
//! - close to 100: free memory sits in order-0 pages (fragmented)
//!
//! Values are percentages in `[0, 100]`.

use crate::model::{BuddyInfoSnapshot, FragmentationMeasurement, Zone};

/// Error type for fragmentation computation.
#[derive(Debug, Clone, PartialEq)]
pub enum FragmentationError {
    /// The zone has no free pages, so no share can be computed.
    ZeroFreePages {
        node_index: Option<u32>,
        zone_type: String,
    },
}

impl std::fmt::Display for FragmentationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FragmentationError::ZeroFreePages {
                node_index: Some(node),
                zone_type,
            } => write!(f, "node {} zone {} has no free pages", node, zone_type),
            FragmentationError::ZeroFreePages {
                node_index: None,
                zone_type,
            } => write!(f, "zone {} has no free pages", zone_type),
        }
    }
}

impl std::error::Error for FragmentationError {}

/// Computes the fragmentation percentage of a single zone.
///
/// Fails with [`FragmentationError::ZeroFreePages`] when the zone has no
/// free pages (all counts zero, or no orders at all).
pub fn compute(zone: &Zone) -> Result<f64, FragmentationError> {
    let pages: Vec<f64> = zone
        .free_fragments
        .iter()
        .enumerate()
        .map(|(order, &count)| count as f64 * 2f64.powi(order as i32))
        .collect();

    let total: f64 = pages.iter().sum();
    if total == 0.0 {
        return Err(FragmentationError::ZeroFreePages {
            node_index: None,
            zone_type: zone.zone_type.clone(),
        });
    }

    let mut running = 0.0;
    let mut percent_sum = 0.0;
    for order_pages in &pages {
        let residual = total - running;
        percent_sum += 100.0 - residual * 100.0 / total;
        running += order_pages;
    }

    Ok(percent_sum / pages.len() as f64)
}

/// Computes one measurement per node/zone pair, in snapshot order.
///
/// Every measurement carries the snapshot timestamp. The first zone without
/// free pages fails the whole call.
pub fn compute_all(
    snapshot: &BuddyInfoSnapshot,
) -> Result<Vec<FragmentationMeasurement>, FragmentationError> {
    let mut output = Vec::with_capacity(snapshot.zone_count());

    for node in &snapshot.numa_nodes {
        for zone in &node.zones {
            let percentage = compute(zone).map_err(|_| FragmentationError::ZeroFreePages {
                node_index: Some(node.node_index),
                zone_type: zone.zone_type.clone(),
            })?;
            output.push(FragmentationMeasurement {
                timestamp: snapshot.timestamp,
                node_index: node.node_index,
                zone_type: zone.zone_type.clone(),
                percentage,
            });
        }
    }

    Ok(output)
}
