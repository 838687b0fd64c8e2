//! Delivery stop types

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Address, Coordinates, Package, PackageStatus, Priority, TimeWindow};

/// Stop status derived from its packages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopStatus {
    Pending,
    Partial,
    Completed,
}

/// One or more packages sharing a delivery address; the unit the optimizer orders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryPoint {
    pub id: Uuid,
    pub address: Address,
    pub packages: Vec<Package>,
    /// 1-based position in the route
    pub order: u32,
    /// Kilometers from the previous stop (start depot for the first stop)
    pub distance: f64,
    /// Projected arrival, "HH:MM"; hours keep counting past midnight
    pub estimated_time: Option<String>,
}

impl DeliveryPoint {
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.address.located()
    }

    /// all delivered -> completed, some delivered -> partial, else pending
    pub fn status(&self) -> StopStatus {
        let delivered = self
            .packages
            .iter()
            .filter(|p| p.status == PackageStatus::Delivered)
            .count();

        if delivered > 0 && delivered == self.packages.len() {
            StopStatus::Completed
        } else if delivered > 0 {
            StopStatus::Partial
        } else {
            StopStatus::Pending
        }
    }

    /// Highest priority tier among the stop's packages
    pub fn priority(&self) -> Priority {
        self.packages
            .iter()
            .map(|p| p.priority)
            .max()
            .unwrap_or_default()
    }

    /// Combined arrival window of the stop.
    ///
    /// Intersection of the packages' explicit windows, with `express_midi`
    /// packages contributing a window that closes at `express_deadline`.
    /// When two windows are disjoint the one closing first is kept.
    pub fn time_window(&self, express_deadline: NaiveTime) -> Option<TimeWindow> {
        let windows = self.packages.iter().flat_map(|p| {
            let express = (p.priority == Priority::ExpressMidi)
                .then(|| TimeWindow::until(express_deadline));
            p.time_window.into_iter().chain(express)
        });

        windows.fold(None, |acc: Option<TimeWindow>, window| match acc {
            None => Some(window),
            Some(current) => Some(current.intersect(&window).unwrap_or(
                if window.end() < current.end() { window } else { current },
            )),
        })
    }
}
