//! Fixed-position decoding of legacy ledger lines.
//!
//! The ledger interchange format is a fixed-width layout with no field
//! separators, shared across multiple producers. Decoding is purely
//! positional: each field lives at a fixed byte offset, monetary fields are
//! digit runs with an implied 2-decimal point, and anything that does not
//! decode is skipped, never raised as an error.

use std::ops::Range;

use chrono::NaiveDate;

use crate::catalog::Catalog;

/// Lines shorter than this cannot carry a complete record.
pub const MIN_LINE_LEN: usize = 75;

/// Reserved digit run marking filler/terminator lines emitted by the producer.
pub const SENTINEL_RUN: &str = "999999999";

// Field offsets (0-indexed, half-open). The refunds range overlaps the
// cancellations range by one byte and the payouts range by two; that is the
// upstream producer's layout and is preserved bit-for-bit.
const VENUE_CODE: Range<usize> = 0..4;
const REGION_CODE: Range<usize> = 4..6;
const OUTLET_CODE: Range<usize> = 6..11;
const MEETING_NUMBER: Range<usize> = 19..22;
const DRAW_DATE: Range<usize> = 22..30;
const WAGERED: Range<usize> = 30..42;
const CANCELLED: Range<usize> = 42..54;
const REFUNDED: Range<usize> = 53..66;
const PAID: Range<usize> = 64..78;

/// One decoded ledger record. Monetary fields are integer cents; conversion
/// to 2-decimal amounts happens only at read/write boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerTransaction {
    pub venue_abbr: String,
    pub meeting_number: u32,
    pub region_code: String,
    /// Outlet code with leading zeros stripped ("00000" normalizes to "0")
    pub outlet_code: String,
    pub draw_date: NaiveDate,
    pub wagered_cents: i64,
    pub cancelled_cents: i64,
    pub refunded_cents: i64,
    pub paid_cents: i64,
}

/// Why a line produced no transaction. Skips are expected and counted,
/// never reported as failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    TooShort,
    Sentinel,
    UnknownVenue,
    BadMeeting,
    BadDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    Transaction(LedgerTransaction),
    Skip(SkipReason),
}

/// Per-reason skip counters for one decode pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    pub accepted: u64,
    pub too_short: u64,
    pub sentinel: u64,
    pub unknown_venue: u64,
    pub bad_meeting: u64,
    pub bad_date: u64,
}

impl DecodeStats {
    pub fn skipped(&self) -> u64 {
        self.too_short + self.sentinel + self.unknown_venue + self.bad_meeting + self.bad_date
    }

    fn record_skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::TooShort => self.too_short += 1,
            SkipReason::Sentinel => self.sentinel += 1,
            SkipReason::UnknownVenue => self.unknown_venue += 1,
            SkipReason::BadMeeting => self.bad_meeting += 1,
            SkipReason::BadDate => self.bad_date += 1,
        }
    }
}

/// Decode one ledger line. Never panics and never errors: malformed input
/// yields a counted skip.
pub fn decode_line(catalog: &Catalog, line: &str) -> DecodeOutcome {
    if line.len() < MIN_LINE_LEN {
        return DecodeOutcome::Skip(SkipReason::TooShort);
    }
    if line.contains(SENTINEL_RUN) {
        return DecodeOutcome::Skip(SkipReason::Sentinel);
    }

    let bytes = line.as_bytes();

    let venue = match catalog.venue(field(bytes, VENUE_CODE).trim()) {
        Some(v) => v,
        // The format is shared across producers; foreign venues are routine.
        None => return DecodeOutcome::Skip(SkipReason::UnknownVenue),
    };

    let meeting_number = match field(bytes, MEETING_NUMBER).trim().parse::<u32>() {
        Ok(n) => n,
        Err(_) => return DecodeOutcome::Skip(SkipReason::BadMeeting),
    };

    let draw_date = match decode_date(field(bytes, DRAW_DATE)) {
        Some(d) => d,
        None => return DecodeOutcome::Skip(SkipReason::BadDate),
    };

    DecodeOutcome::Transaction(LedgerTransaction {
        venue_abbr: venue.abbr.clone(),
        meeting_number,
        region_code: field(bytes, REGION_CODE).to_string(),
        outlet_code: normalize_outlet(field(bytes, OUTLET_CODE)),
        draw_date,
        wagered_cents: decode_money(field(bytes, WAGERED)),
        cancelled_cents: decode_money(field(bytes, CANCELLED)),
        refunded_cents: decode_money(field(bytes, REFUNDED)),
        paid_cents: decode_money(field(bytes, PAID)),
    })
}

/// Decode a full line stream in one pass, collecting accepted transactions
/// and per-reason skip counts.
pub fn decode_all<'a, I>(catalog: &Catalog, lines: I) -> (Vec<LedgerTransaction>, DecodeStats)
where
    I: IntoIterator<Item = &'a str>,
{
    let mut transactions = Vec::new();
    let mut stats = DecodeStats::default();
    for line in lines {
        match decode_line(catalog, line) {
            DecodeOutcome::Transaction(tx) => {
                stats.accepted += 1;
                transactions.push(tx);
            }
            DecodeOutcome::Skip(reason) => stats.record_skip(reason),
        }
    }
    (transactions, stats)
}

/// Slice a fixed field, clamping the end to the line length (the payouts
/// field extends past the 75-byte minimum). Returns "" if the slice is not
/// valid UTF-8, which downstream decoders treat as empty.
fn field(bytes: &[u8], range: Range<usize>) -> &str {
    let end = range.end.min(bytes.len());
    std::str::from_utf8(&bytes[range.start..end]).unwrap_or("")
}

/// Monetary fields are digit runs with an implied 2-decimal point:
/// "000001234" is 12.34, stored as 1234 cents. Non-digits are stripped
/// first; an empty digit run decodes to zero, not an error.
fn decode_money(s: &str) -> i64 {
    let digits: String = s.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return 0;
    }
    digits.parse().unwrap_or(0)
}

/// Dates are DDMMYYYY. Anything short of 8 digits, or not a real calendar
/// date, rejects the line.
fn decode_date(s: &str) -> Option<NaiveDate> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let day: u32 = s[0..2].parse().ok()?;
    let month: u32 = s[2..4].parse().ok()?;
    let year: i32 = s[4..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Outlet codes drop their leading zeros; an all-zero code normalizes to
/// "0" rather than the empty string.
fn normalize_outlet(s: &str) -> String {
    let stripped = s.trim().trim_start_matches('0');
    if stripped.is_empty() {
        "0".to_string()
    } else {
        stripped.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::with_defaults()
    }

    /// A well-formed 78-byte line for venue CPK, region 01, outlet 42,
    /// meeting 127 on 2026-08-05.
    ///
    /// Tail layout (columns 42..78): cancelled [42,54) = 000000000500,
    /// refunds [53,66) start on cancelled's last byte, payouts [64,78)
    /// start on refunds' last two bytes.
    fn sample_line() -> String {
        let mut line = String::new();
        line.push_str("0101"); //            [0,4)   venue
        line.push_str("01"); //              [4,6)   region
        line.push_str("00042"); //           [6,11)  outlet
        line.push_str("00000001"); //        [11,19) serial (ignored)
        line.push_str("127"); //             [19,22) meeting
        line.push_str("05082026"); //        [22,30) date DDMMYYYY
        line.push_str("000000012345"); //    [30,42) wagered 123.45
        line.push_str("000000000500"); //    [42,54) cancelled 5.00
        line.push_str("000000025000"); //    [54,66)
        line.push_str("000000004200"); //    [66,78)
        assert_eq!(line.len(), 78);
        line
    }

    #[test]
    fn test_decode_valid_line() {
        let line = sample_line();
        let tx = match decode_line(&catalog(), &line) {
            DecodeOutcome::Transaction(tx) => tx,
            DecodeOutcome::Skip(reason) => panic!("expected transaction, got skip {:?}", reason),
        };

        assert_eq!(tx.venue_abbr, "CPK");
        assert_eq!(tx.meeting_number, 127);
        assert_eq!(tx.region_code, "01");
        assert_eq!(tx.outlet_code, "42", "leading zeros stripped");
        assert_eq!(tx.draw_date, NaiveDate::from_ymd_opt(2026, 8, 5).unwrap());
        assert_eq!(tx.wagered_cents, 12345);
        assert_eq!(tx.cancelled_cents, 500);
        // Refunds [53,66): cancelled's last byte "0" + "000000025000" = 25000
        assert_eq!(tx.refunded_cents, 25000);
        // Payouts [64,78): refunds' last two bytes "00" + "000000004200" = 4200
        assert_eq!(tx.paid_cents, 4200);
    }

    #[test]
    fn test_refund_field_shares_bytes_with_neighbors() {
        // Put a nonzero digit on column 53: it must land in BOTH the
        // cancellations and the refunds totals, per the producer's layout.
        let mut line = sample_line();
        line.replace_range(53..54, "7");
        let tx = match decode_line(&catalog(), &line) {
            DecodeOutcome::Transaction(tx) => tx,
            other => panic!("expected transaction, got {:?}", other),
        };

        // Cancelled [42,54) becomes "000000000507"
        assert_eq!(tx.cancelled_cents, 507, "column 53 is cancellations' last digit");
        // Refunds [53,66) becomes "7000000025000"
        assert_eq!(
            tx.refunded_cents, 7_000_000_025_000,
            "column 53 is refunds' first digit"
        );
    }

    #[test]
    fn test_line_too_short_rejected() {
        let full = sample_line();
        let line = &full[..MIN_LINE_LEN - 1];
        assert_eq!(
            decode_line(&catalog(), line),
            DecodeOutcome::Skip(SkipReason::TooShort)
        );
    }

    #[test]
    fn test_minimum_length_accepted() {
        // 75 bytes is the documented minimum; the payouts field is clamped.
        let full = sample_line();
        let line = &full[..MIN_LINE_LEN];
        assert!(matches!(
            decode_line(&catalog(), line),
            DecodeOutcome::Transaction(_)
        ));
    }

    #[test]
    fn test_sentinel_rejected_anywhere_in_line() {
        let mut line = sample_line();
        line.replace_range(30..39, SENTINEL_RUN);
        assert_eq!(
            decode_line(&catalog(), &line),
            DecodeOutcome::Skip(SkipReason::Sentinel)
        );
    }

    #[test]
    fn test_unknown_venue_is_silent_skip() {
        let mut line = sample_line();
        line.replace_range(0..4, "7777");
        assert_eq!(
            decode_line(&catalog(), &line),
            DecodeOutcome::Skip(SkipReason::UnknownVenue)
        );
    }

    #[test]
    fn test_bad_date_rejected() {
        let mut line = sample_line();
        line.replace_range(22..30, "05AUG202");
        assert_eq!(
            decode_line(&catalog(), &line),
            DecodeOutcome::Skip(SkipReason::BadDate)
        );

        // Digits that do not form a real calendar date reject too
        let mut line = sample_line();
        line.replace_range(22..30, "32132026");
        assert_eq!(
            decode_line(&catalog(), &line),
            DecodeOutcome::Skip(SkipReason::BadDate)
        );
    }

    #[test]
    fn test_bad_meeting_rejected() {
        let mut line = sample_line();
        line.replace_range(19..22, "AB1");
        assert_eq!(
            decode_line(&catalog(), &line),
            DecodeOutcome::Skip(SkipReason::BadMeeting)
        );
    }

    #[test]
    fn test_money_strips_non_digits() {
        let mut line = sample_line();
        line.replace_range(30..42, "   00012345 ");
        let tx = match decode_line(&catalog(), &line) {
            DecodeOutcome::Transaction(tx) => tx,
            other => panic!("expected transaction, got {:?}", other),
        };
        assert_eq!(tx.wagered_cents, 12345);
    }

    #[test]
    fn test_empty_money_field_decodes_zero() {
        let mut line = sample_line();
        line.replace_range(30..42, "            ");
        let tx = match decode_line(&catalog(), &line) {
            DecodeOutcome::Transaction(tx) => tx,
            other => panic!("expected transaction, got {:?}", other),
        };
        assert_eq!(tx.wagered_cents, 0, "blank amount is zero, not an error");
    }

    #[test]
    fn test_all_zero_outlet_normalizes_to_single_zero() {
        let mut line = sample_line();
        line.replace_range(6..11, "00000");
        let tx = match decode_line(&catalog(), &line) {
            DecodeOutcome::Transaction(tx) => tx,
            other => panic!("expected transaction, got {:?}", other),
        };
        assert_eq!(tx.outlet_code, "0");
    }

    #[test]
    fn test_decode_all_counts_skips() {
        let good = sample_line();
        let mut sentinel = sample_line();
        sentinel.replace_range(30..39, SENTINEL_RUN);
        let mut foreign = sample_line();
        foreign.replace_range(0..4, "7777");

        let lines = vec![good.as_str(), "short", sentinel.as_str(), foreign.as_str()];
        let (transactions, stats) = decode_all(&catalog(), lines);

        assert_eq!(transactions.len(), 1);
        assert_eq!(stats.accepted, 1);
        assert_eq!(stats.too_short, 1);
        assert_eq!(stats.sentinel, 1);
        assert_eq!(stats.unknown_venue, 1);
        assert_eq!(stats.skipped(), 3);
    }
}
