//! Alert message rendering.

use chrono::DateTime;
use chrono_tz::Tz;
use rust_decimal::Decimal;

use nw_md::LiveQuote;

use crate::projection::NavReference;
use crate::watermark::format_bp;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub title: String,
    pub body: String,
}

impl AlertMessage {
    /// Title defaults to `<fund name> discount` (`<fund code> discount` for
    /// a fixed NAV). Body is a markdown bullet list ending with the live
    /// price, its change on the day, and the discount.
    pub fn render(
        title_override: Option<&str>,
        reference: &NavReference,
        quote: &LiveQuote,
        at: DateTime<Tz>,
        discount: Decimal,
    ) -> Self {
        let default_title = match reference {
            NavReference::Projected { snapshot, .. } => format!("{} discount", snapshot.fund_name),
            NavReference::Fixed { fund_code, .. } => format!("{fund_code} discount"),
        };
        let title = match title_override {
            Some(t) if !t.trim().is_empty() => t.trim().to_string(),
            _ => default_title,
        };

        let mut lines = match reference {
            NavReference::Projected { snapshot, projection } => vec![
                format!(
                    "- Latest NAV: {:.4} ({})",
                    snapshot.latest_nav, snapshot.latest_nav_date
                ),
                format!(
                    "- Projected NAV: {:.4} ({})",
                    projection.next_estimated_nav, projection.next_estimated_date
                ),
            ],
            NavReference::Fixed { nav, .. } => vec![format!("- NAV estimate: {nav:.4}")],
        };
        lines.push(format!(
            "- Live price: {:.4} ({}, {})",
            quote.price,
            at.format("%H:%M:%S"),
            signed_percent(quote.percent_change)
        ));
        lines.push(format!("- Discount: {}", format_bp(discount)));

        Self {
            title,
            body: lines.join("\n\n"),
        }
    }
}

/// `+0.01%` / `-0.02%`.
fn signed_percent(pct: Decimal) -> String {
    if pct < Decimal::ZERO {
        format!("{pct}%")
    } else {
        format!("+{pct}%")
    }
}
