//! Price selection for maker and taker attempts.

use rust_decimal::Decimal;

use crate::exchange::TopOfBook;
use crate::models::OrderSide;

/// Passive limit price: best bid/ask backed off by a cushion of ticks.
///
/// The cushion keeps the order from crossing when the book moves between
/// the quote and the placement; it is widened by the escalation loop only
/// on repeated post-only rejection, never on mere non-fill.
#[must_use]
pub fn maker_price(side: OrderSide, book: &TopOfBook, cushion_ticks: u32) -> Decimal {
    let cushion = book.tick * Decimal::from(cushion_ticks);
    match side {
        OrderSide::Buy => book.bid - cushion,
        OrderSide::Sell => book.ask + cushion,
    }
}

/// Marketable limit price bounded by the slippage budget.
///
/// The order crosses the spread but cannot fill beyond
/// `max_slippage_bps` past the touch, which caps the worst-case cost of
/// the taker fallback.
#[must_use]
pub fn taker_limit_price(side: OrderSide, book: &TopOfBook, max_slippage_bps: u32) -> Decimal {
    let slip = Decimal::from(max_slippage_bps) / Decimal::from(10_000);
    match side {
        OrderSide::Buy => book.ask * (Decimal::ONE + slip),
        OrderSide::Sell => book.bid * (Decimal::ONE - slip),
    }
}
