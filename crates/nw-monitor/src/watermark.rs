//! Discount arithmetic, alert policies and their per-run watermarks.

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};

/// Relative discount of `price` against `projected_nav`.
///
/// `None` when the projected NAV is not positive.
pub fn discount(projected_nav: Decimal, price: Decimal) -> Option<Decimal> {
    if projected_nav <= Decimal::ZERO {
        return None;
    }
    Some((projected_nav - price) / projected_nav)
}

/// Render a fraction in basis points with two decimals, e.g. `1.62‱`.
pub fn format_bp(fraction: Decimal) -> String {
    let bp = (fraction * Decimal::from(10_000))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{bp:.2}‱")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertDecision {
    Alert,
    Quiet,
}

/// Highest discount alerted on so far. Starts at zero and never decreases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertWatermark {
    level: Decimal,
}

impl AlertWatermark {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self) -> Decimal {
        self.level
    }

    /// Alert iff `discount >= threshold` and `discount` beats every earlier
    /// alert. The watermark is raised before the caller attempts delivery.
    pub fn observe(&mut self, discount: Decimal, threshold: Decimal) -> AlertDecision {
        if discount >= threshold && discount > self.level {
            self.level = discount;
            AlertDecision::Alert
        } else {
            AlertDecision::Quiet
        }
    }
}

/// Lowest price alerted on so far. Unbounded until the first alert, then
/// only ever lowered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriceFloorWatermark {
    lowest: Option<Decimal>,
}

impl PriceFloorWatermark {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` until something alerted.
    pub fn lowest(&self) -> Option<Decimal> {
        self.lowest
    }

    /// Alert iff `price < floor` and `price` undercuts every earlier alert.
    pub fn observe(&mut self, price: Decimal, floor: Decimal) -> AlertDecision {
        let undercuts = self.lowest.map_or(true, |lowest| price < lowest);
        if price < floor && undercuts {
            self.lowest = Some(price);
            AlertDecision::Alert
        } else {
            AlertDecision::Quiet
        }
    }
}

/// Rule deciding when a live price is worth an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertPolicy {
    /// Discount against the reference NAV reaches `threshold` (a fraction)
    /// and beats every earlier alert.
    Discount { threshold: Decimal },
    /// Live price is under `floor` and under every price already alerted on.
    PriceFloor { floor: Decimal },
}

impl fmt::Display for AlertPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertPolicy::Discount { threshold } => {
                write!(f, "discount >= {}", format_bp(*threshold))
            }
            AlertPolicy::PriceFloor { floor } => write!(f, "price < {floor}"),
        }
    }
}

/// An [`AlertPolicy`] together with its watermark for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertState {
    Discount {
        threshold: Decimal,
        watermark: AlertWatermark,
    },
    PriceFloor {
        floor: Decimal,
        watermark: PriceFloorWatermark,
    },
}

impl AlertState {
    pub fn new(policy: AlertPolicy) -> Self {
        match policy {
            AlertPolicy::Discount { threshold } => AlertState::Discount {
                threshold,
                watermark: AlertWatermark::new(),
            },
            AlertPolicy::PriceFloor { floor } => AlertState::PriceFloor {
                floor,
                watermark: PriceFloorWatermark::new(),
            },
        }
    }

    pub fn observe(&mut self, price: Decimal, discount: Decimal) -> AlertDecision {
        match self {
            AlertState::Discount {
                threshold,
                watermark,
            } => watermark.observe(discount, *threshold),
            AlertState::PriceFloor { floor, watermark } => watermark.observe(price, *floor),
        }
    }

    /// Highest discount alerted on; zero under the price-floor policy.
    pub fn discount_level(&self) -> Decimal {
        match self {
            AlertState::Discount { watermark, .. } => watermark.level(),
            AlertState::PriceFloor { .. } => Decimal::ZERO,
        }
    }

    /// Lowest price alerted on; always `None` under the discount policy.
    pub fn lowest_alerted_price(&self) -> Option<Decimal> {
        match self {
            AlertState::Discount { .. } => None,
            AlertState::PriceFloor { watermark, .. } => watermark.lowest(),
        }
    }
}
