//! Pure projection from a snapshot to a render model.

use serde::Serialize;

use crate::ids::ProductId;
use crate::money::Money;
use crate::snapshot::CartSnapshot;

/// One rendered cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub unit_price_formatted: String,
    pub quantity: u32,
    pub line_total_formatted: String,
}

/// Everything a presentation layer needs to draw the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderModel {
    /// Lines in insertion order.
    pub lines: Vec<RenderLine>,
    /// Σ quantity.
    pub item_count: u64,
    /// Number of distinct products.
    pub distinct_items: usize,
    /// Subtotal with exactly two decimals and no symbol, e.g. `"2500.00"`.
    pub subtotal_formatted: String,
    /// Subtotal with the currency symbol, e.g. `"Ksh 2500.00"`.
    pub subtotal_display: String,
    pub version: u64,
    pub is_empty: bool,
}

/// Derive the render model. Same snapshot in, same model out.
pub fn project(snapshot: &CartSnapshot) -> RenderModel {
    let lines = snapshot
        .items()
        .iter()
        .map(|item| {
            let total = item
                .line_total()
                .unwrap_or_else(|| Money::new(i64::MAX, snapshot.currency()));
            RenderLine {
                product_id: item.product_id().clone(),
                name: item.name().to_string(),
                unit_price: item.unit_price(),
                unit_price_formatted: item.unit_price().display(),
                quantity: item.quantity(),
                line_total_formatted: total.display(),
            }
        })
        .collect::<Vec<_>>();

    let subtotal = snapshot.subtotal();

    RenderModel {
        item_count: snapshot.item_count(),
        distinct_items: lines.len(),
        subtotal_formatted: subtotal.display_amount(),
        subtotal_display: subtotal.display(),
        version: snapshot.version(),
        is_empty: lines.is_empty(),
        lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;
    use crate::snapshot::LineItem;

    fn sample() -> CartSnapshot {
        let kes = |c| Money::new(c, Currency::KES);
        CartSnapshot::new(
            vec![
                LineItem::new("p1", "Kiondo Basket", kes(125_000), 2).unwrap(),
                LineItem::new("p2", "Kikoi", kes(80_050), 1).unwrap(),
            ],
            3,
            Currency::KES,
        )
        .unwrap()
    }

    #[test]
    fn test_project_totals() {
        let model = project(&sample());
        assert_eq!(model.item_count, 3);
        assert_eq!(model.distinct_items, 2);
        assert_eq!(model.subtotal_formatted, "3300.50");
        assert_eq!(model.subtotal_display, "Ksh 3300.50");
        assert_eq!(model.version, 3);
        assert!(!model.is_empty);
    }

    #[test]
    fn test_project_lines_keep_order() {
        let model = project(&sample());
        let names: Vec<_> = model.lines.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Kiondo Basket", "Kikoi"]);
        assert_eq!(model.lines[0].quantity, 2);
        assert_eq!(model.lines[0].line_total_formatted, "Ksh 2500.00");
    }

    #[test]
    fn test_project_empty_cart() {
        let model = project(&CartSnapshot::empty(Currency::USD));
        assert!(model.is_empty);
        assert_eq!(model.item_count, 0);
        assert_eq!(model.subtotal_formatted, "0.00");
    }

    #[test]
    fn test_project_is_deterministic() {
        let snapshot = sample();
        assert_eq!(project(&snapshot), project(&snapshot));
        assert_eq!(project(&snapshot), project(&snapshot.clone()));
    }
}
