//! Grouping of packages into delivery stops

use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

use crate::services::address::canonical_key;
use crate::types::{DeliveryPoint, Package};

/// Stop id derived from the canonical address key, stable across requests
pub fn stop_id_for_key(key: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes())
}

/// Collapse packages sharing a canonical address into one stop.
///
/// Stops come out in first-seen order with a provisional 1-based `order` and
/// zero `distance`; packages keep their input order inside a stop. The stop
/// takes the first package's address, borrowing coordinates from a later
/// package when the first one has none. Callers filter out non-pending
/// packages beforehand.
pub fn group_by_address(packages: Vec<Package>) -> Vec<DeliveryPoint> {
    let mut index_by_key: HashMap<String, usize> = HashMap::new();
    let mut points: Vec<DeliveryPoint> = Vec::new();

    for package in packages {
        let key = canonical_key(&package.address);

        match index_by_key.get(&key) {
            Some(&idx) => {
                let point = &mut points[idx];
                if point.address.located().is_none() {
                    if let Some(coords) = package.address.located() {
                        point.address.coordinates = Some(coords);
                    }
                }
                point.packages.push(package);
            }
            None => {
                let order = points.len() as u32 + 1;
                points.push(DeliveryPoint {
                    id: stop_id_for_key(&key),
                    address: package.address.clone(),
                    packages: vec![package],
                    order,
                    distance: 0.0,
                    estimated_time: None,
                });
                index_by_key.insert(key, points.len() - 1);
            }
        }
    }

    debug!(
        "Grouped {} packages into {} stops",
        points.iter().map(|p| p.packages.len()).sum::<usize>(),
        points.len()
    );

    points
}
