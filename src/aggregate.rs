//! Per-(draw, outlet) accumulation of decoded ledger transactions.
//!
//! One in-memory, single-pass fold. Amounts stay in integer cents while
//! accumulating; the 2-decimal representation exists only at the read/write
//! boundary, so rounding happens exactly once.

use rustc_hash::FxHashMap;

use chrono::NaiveDate;

use crate::decoder::LedgerTransaction;

/// Running totals for one outlet within one draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutletTotals {
    /// Venue abbreviation + meeting number, e.g. "CPK127"
    pub draw_key: String,
    pub outlet_code: String,
    pub region_code: String,
    pub draw_date: NaiveDate,
    pub wagered_cents: i64,
    pub cancelled_cents: i64,
    pub refunded_cents: i64,
    pub paid_cents: i64,
}

impl OutletTotals {
    pub fn wagered(&self) -> f64 {
        cents_to_amount(self.wagered_cents)
    }

    pub fn cancelled(&self) -> f64 {
        cents_to_amount(self.cancelled_cents)
    }

    pub fn refunded(&self) -> f64 {
        cents_to_amount(self.refunded_cents)
    }

    pub fn paid(&self) -> f64 {
        cents_to_amount(self.paid_cents)
    }
}

/// Boundary conversion from integer cents to a 2-decimal amount.
pub fn cents_to_amount(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Build the draw key for a venue meeting.
pub fn draw_key(venue_abbr: &str, meeting_number: u32) -> String {
    format!("{}{}", venue_abbr, meeting_number)
}

/// Fold a finite transaction stream into exactly one record per observed
/// (draw key, outlet) pair. The four monetary fields are summed
/// independently; region and date are taken from the first transaction seen
/// for the pair. Output is sorted by key for deterministic write order.
pub fn aggregate<I>(transactions: I) -> Vec<OutletTotals>
where
    I: IntoIterator<Item = LedgerTransaction>,
{
    let mut totals: FxHashMap<(String, String), OutletTotals> = FxHashMap::default();

    for tx in transactions {
        let key = (
            draw_key(&tx.venue_abbr, tx.meeting_number),
            tx.outlet_code.clone(),
        );
        let entry = totals.entry(key).or_insert_with(|| OutletTotals {
            draw_key: draw_key(&tx.venue_abbr, tx.meeting_number),
            outlet_code: tx.outlet_code.clone(),
            region_code: tx.region_code.clone(),
            draw_date: tx.draw_date,
            wagered_cents: 0,
            cancelled_cents: 0,
            refunded_cents: 0,
            paid_cents: 0,
        });
        entry.wagered_cents += tx.wagered_cents;
        entry.cancelled_cents += tx.cancelled_cents;
        entry.refunded_cents += tx.refunded_cents;
        entry.paid_cents += tx.paid_cents;
    }

    let mut records: Vec<OutletTotals> = totals.into_values().collect();
    records.sort_by(|a, b| {
        (a.draw_key.as_str(), a.outlet_code.as_str())
            .cmp(&(b.draw_key.as_str(), b.outlet_code.as_str()))
    });
    records
}
