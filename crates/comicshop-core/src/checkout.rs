//! Checkout pricing: turns a wishlist into priced order lines.
//!
//! Everything here is pure. Validation failures are reported before the
//! workflow touches the store or the payment gateway.

use crate::error::{Result, ShopError};
use crate::money::{normalize_currency, to_minor_units};
use crate::order::{OrderItem, StockDecrement, WishlistItem};
use crate::ComicId;
use rust_decimal::Decimal;

/// A validated wishlist line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLine {
    /// Client-side wishlist row ID.
    pub item_id: Option<String>,
    /// Comic being bought.
    pub comic_id: ComicId,
    /// Title snapshot.
    pub title: String,
    /// Unit price as sent, in major units.
    pub major_price: Decimal,
    /// Unit price in minor units.
    pub unit_price: i64,
    /// Units requested.
    pub quantity: i64,
    /// Cover image URL.
    pub image: Option<String>,
}

/// A priced wishlist: the amount to charge and the lines it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSummary {
    /// Lower-case currency shared by every line.
    pub currency: String,
    /// Amount to charge in minor units.
    pub total_amount: i64,
    /// Lines in wishlist order.
    pub lines: Vec<CheckoutLine>,
}

impl CheckoutSummary {
    /// Validate and price a wishlist.
    ///
    /// The currency is taken from the first item; every other item must match it.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Validation` if the wishlist is empty, an item is
    /// missing its comic, price, currency or quantity, a price or quantity is
    /// not positive, currencies differ, or the total overflows.
    pub fn from_wishlist(items: &[WishlistItem]) -> Result<Self> {
        let Some(first) = items.first() else {
            return Err(ShopError::validation("wishlistItems must not be empty"));
        };
        let currency = item_currency(0, first)?;

        let mut lines = Vec::with_capacity(items.len());
        let mut major_total = Decimal::ZERO;

        for (index, item) in items.iter().enumerate() {
            let line_currency = item_currency(index, item)?;
            if line_currency != currency {
                return Err(ShopError::validation(format!(
                    "wishlist item {index}: currency {line_currency} differs from {currency}"
                )));
            }

            let line = checkout_line(index, item)?;
            major_total = line
                .major_price
                .checked_mul(Decimal::from(line.quantity))
                .and_then(|line_total| major_total.checked_add(line_total))
                .ok_or_else(|| ShopError::validation("order total is out of range"))?;
            lines.push(line);
        }

        // Rounded once, from the exact major-unit sum.
        let total_amount = to_minor_units(major_total)?;

        Ok(Self {
            currency,
            total_amount,
            lines,
        })
    }

    /// Project the lines into order items.
    #[must_use]
    pub fn order_items(&self) -> Vec<OrderItem> {
        self.lines
            .iter()
            .map(|line| OrderItem {
                id: line.item_id.clone(),
                comic_id: line.comic_id,
                title: line.title.clone(),
                price: line.unit_price,
                currency: self.currency.clone(),
                image: line.image.clone(),
                quantity: line.quantity,
            })
            .collect()
    }

    /// One conditional decrement per distinct comic.
    #[must_use]
    pub fn stock_decrements(&self) -> Vec<StockDecrement> {
        reconcile_stock(&self.lines)
    }
}

/// Turn checkout lines into stock decrements, merging repeated comics.
#[must_use]
pub fn reconcile_stock(lines: &[CheckoutLine]) -> Vec<StockDecrement> {
    StockDecrement::merge(
        lines
            .iter()
            .map(|line| StockDecrement::new(line.comic_id, line.quantity)),
    )
}

fn item_currency(index: usize, item: &WishlistItem) -> Result<String> {
    let code = item
        .comic
        .as_ref()
        .and_then(|comic| comic.currency.as_deref())
        .ok_or_else(|| ShopError::validation(format!("wishlist item {index}: missing currency")))?;
    normalize_currency(code)
}

fn checkout_line(index: usize, item: &WishlistItem) -> Result<CheckoutLine> {
    let comic = item
        .comic
        .as_ref()
        .ok_or_else(|| ShopError::validation(format!("wishlist item {index}: missing comic")))?;

    let comic_id = item
        .comic_id
        .as_deref()
        .or(comic.id.as_deref())
        .ok_or_else(|| ShopError::validation(format!("wishlist item {index}: missing comic_id")))?
        .parse::<ComicId>()
        .map_err(|e| ShopError::validation(format!("wishlist item {index}: comic_id: {e}")))?;

    let quantity = item.requested_quantity.ok_or_else(|| {
        ShopError::validation(format!("wishlist item {index}: missing requested quantity"))
    })?;
    if quantity <= 0 {
        return Err(ShopError::validation(format!(
            "wishlist item {index}: requested quantity must be positive, got {quantity}"
        )));
    }

    let price = comic
        .price
        .ok_or_else(|| ShopError::validation(format!("wishlist item {index}: missing price")))?;
    if price.is_sign_negative() || price.is_zero() {
        return Err(ShopError::validation(format!(
            "wishlist item {index}: price must be positive, got {price}"
        )));
    }
    let unit_price = to_minor_units(price)?;

    let title = comic
        .title
        .clone()
        .or_else(|| item.title.clone())
        .unwrap_or_default();

    Ok(CheckoutLine {
        item_id: item.id.clone(),
        comic_id,
        title,
        major_price: price,
        unit_price,
        quantity,
        image: comic.image.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::round_to_minor_units;
    use crate::order::ComicSnapshot;
    use rust_decimal_macros::dec;

    fn item(comic_id: ComicId, price: Decimal, currency: &str, quantity: i64) -> WishlistItem {
        WishlistItem {
            id: None,
            comic_id: Some(comic_id.to_string()),
            title: Some("Watchmen".into()),
            requested_quantity: Some(quantity),
            comic: Some(ComicSnapshot {
                id: None,
                title: None,
                price: Some(price),
                currency: Some(currency.into()),
                image: None,
            }),
        }
    }

    #[test]
    fn single_item_total_is_in_cents() {
        let summary =
            CheckoutSummary::from_wishlist(&[item(ComicId::generate(), dec!(9.99), "usd", 2)])
                .unwrap();
        assert_eq!(summary.total_amount, 1998);
        assert_eq!(summary.currency, "usd");
        assert_eq!(summary.order_items()[0].price, 999);
        assert_eq!(summary.order_items()[0].title, "Watchmen");
    }

    #[test]
    fn total_matches_rounded_major_unit_sum() {
        let cases = [
            vec![(dec!(0.10), 3), (dec!(0.20), 1)],
            vec![(dec!(19.99), 7), (dec!(4.01), 13), (dec!(100), 1)],
            vec![(dec!(1.05), 1), (dec!(2.35), 3)],
            vec![(dec!(0.01), 999)],
            vec![(dec!(0.333), 3), (dec!(1.005), 1)],
            vec![(dec!(2.4999), 2)],
        ];

        for case in cases {
            let items: Vec<_> = case
                .iter()
                .map(|(price, qty)| item(ComicId::generate(), *price, "usd", *qty))
                .collect();
            let summary = CheckoutSummary::from_wishlist(&items).unwrap();

            let major_sum: Decimal = case
                .iter()
                .map(|(price, qty)| *price * Decimal::from(*qty))
                .sum();
            assert_eq!(
                Some(summary.total_amount),
                round_to_minor_units(major_sum),
                "case {case:?}"
            );
        }
    }

    #[test]
    fn sub_cent_prices_round_on_the_total() {
        let summary =
            CheckoutSummary::from_wishlist(&[item(ComicId::generate(), dec!(0.333), "usd", 3)])
                .unwrap();
        assert_eq!(summary.total_amount, 100);
        assert_eq!(summary.lines[0].unit_price, 33);
    }

    #[test]
    fn float_noise_in_prices_is_accepted() {
        let price: Decimal = serde_json::from_str("0.30000000000000004").unwrap();
        let summary =
            CheckoutSummary::from_wishlist(&[item(ComicId::generate(), price, "usd", 1)]).unwrap();
        assert_eq!(summary.total_amount, 30);
    }

    #[test]
    fn currency_comes_from_first_item() {
        let summary = CheckoutSummary::from_wishlist(&[
            item(ComicId::generate(), dec!(3), "EUR", 1),
            item(ComicId::generate(), dec!(4), "eur", 1),
        ])
        .unwrap();
        assert_eq!(summary.currency, "eur");
    }

    #[test]
    fn empty_wishlist_is_rejected() {
        let err = CheckoutSummary::from_wishlist(&[]).unwrap_err();
        assert!(matches!(err, ShopError::Validation(_)));
    }

    #[test]
    fn mixed_currencies_are_rejected() {
        let err = CheckoutSummary::from_wishlist(&[
            item(ComicId::generate(), dec!(3), "usd", 1),
            item(ComicId::generate(), dec!(4), "gbp", 1),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("differs"));
    }

    #[test]
    fn non_positive_values_are_rejected() {
        let id = ComicId::generate();
        assert!(CheckoutSummary::from_wishlist(&[item(id, dec!(0), "usd", 1)]).is_err());
        assert!(CheckoutSummary::from_wishlist(&[item(id, dec!(-1), "usd", 1)]).is_err());
        assert!(CheckoutSummary::from_wishlist(&[item(id, dec!(1), "usd", 0)]).is_err());
        assert!(CheckoutSummary::from_wishlist(&[item(id, dec!(1), "usd", -2)]).is_err());
    }

    #[test]
    fn missing_comic_id_is_rejected() {
        let mut wishlist_item = item(ComicId::generate(), dec!(1), "usd", 1);
        wishlist_item.comic_id = None;
        let err = CheckoutSummary::from_wishlist(&[wishlist_item]).unwrap_err();
        assert!(err.to_string().contains("missing comic_id"));
    }

    #[test]
    fn comic_id_may_come_from_snapshot() {
        let id = ComicId::generate();
        let mut wishlist_item = item(id, dec!(1), "usd", 1);
        wishlist_item.comic_id = None;
        if let Some(comic) = wishlist_item.comic.as_mut() {
            comic.id = Some(id.to_string());
        }
        let summary = CheckoutSummary::from_wishlist(&[wishlist_item]).unwrap();
        assert_eq!(summary.lines[0].comic_id, id);
    }

    #[test]
    fn overflowing_total_is_rejected() {
        let err = CheckoutSummary::from_wishlist(&[item(
            ComicId::generate(),
            dec!(90000000000),
            "usd",
            i64::MAX / 2,
        )])
        .unwrap_err();
        assert!(matches!(err, ShopError::Validation(_)));
    }

    #[test]
    fn repeated_comics_merge_into_one_decrement() {
        let id = ComicId::generate();
        let summary = CheckoutSummary::from_wishlist(&[
            item(id, dec!(2), "usd", 1),
            item(id, dec!(2), "usd", 2),
        ])
        .unwrap();
        assert_eq!(summary.lines.len(), 2);
        assert_eq!(summary.stock_decrements(), vec![StockDecrement::new(id, 3)]);
    }
}
