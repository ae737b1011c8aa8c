//! Interest-free installment calculator shown on the landing page

use serde::Serialize;

pub const MIN_AMOUNT: u64 = 10_000;
pub const MAX_AMOUNT: u64 = 500_000;
pub const AMOUNT_STEP: u64 = 5_000;
pub const DEFAULT_AMOUNT: u64 = 100_000;

pub const MIN_TERM: u32 = 3;
pub const MAX_TERM: u32 = 36;
pub const DEFAULT_TERM: u32 = 12;

/// Result of a calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoanQuote {
    /// Amount actually used, after clamping and snapping to the step
    pub amount: u64,
    /// Term in months, after clamping
    pub term: u32,
    pub monthly_payment: u64,
    pub overpayment: u64,
    pub rate_percent: u32,
}

impl Default for LoanQuote {
    fn default() -> Self {
        quote(DEFAULT_AMOUNT, DEFAULT_TERM)
    }
}

/// Compute the monthly payment for an amount and a term
///
/// Out-of-range inputs are clamped; the amount is snapped to the nearest
/// step. The payment is `amount / term` rounded half up.
#[must_use]
pub fn quote(amount: u64, term: u32) -> LoanQuote {
    let amount = snap_amount(amount);
    let term = term.clamp(MIN_TERM, MAX_TERM);
    let term_wide = u64::from(term);

    LoanQuote {
        amount,
        term,
        monthly_payment: (2 * amount + term_wide) / (2 * term_wide),
        overpayment: 0,
        rate_percent: 0,
    }
}

/// Quote from optional, possibly unparsed user input
#[must_use]
pub fn quote_from_input(amount: Option<&str>, term: Option<&str>) -> LoanQuote {
    let amount = amount
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_AMOUNT);
    let term = term
        .and_then(|raw| raw.trim().parse::<u32>().ok())
        .unwrap_or(DEFAULT_TERM);
    quote(amount, term)
}

fn snap_amount(amount: u64) -> u64 {
    let clamped = amount.clamp(MIN_AMOUNT, MAX_AMOUNT);
    let snapped = (clamped + AMOUNT_STEP / 2) / AMOUNT_STEP * AMOUNT_STEP;
    snapped.clamp(MIN_AMOUNT, MAX_AMOUNT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_quote() {
        let q = LoanQuote::default();
        assert_eq!(q.amount, 100_000);
        assert_eq!(q.term, 12);
        // 8333.33 rounds down
        assert_eq!(q.monthly_payment, 8_333);
        assert_eq!(q.overpayment, 0);
        assert_eq!(q.rate_percent, 0);
    }

    #[test]
    fn test_rounds_half_up() {
        // 15000 / 8 = 1875 exactly, 25000 / 3 = 8333.33, 35000 / 36 = 972.2
        assert_eq!(quote(15_000, 8).monthly_payment, 1_875);
        assert_eq!(quote(25_000, 3).monthly_payment, 8_333);
        assert_eq!(quote(35_000, 36).monthly_payment, 972);
        // 55000 / 6 = 9166.67
        assert_eq!(quote(55_000, 6).monthly_payment, 9_167);
    }

    #[test]
    fn test_clamps_and_snaps() {
        let q = quote(1_000_000, 100);
        assert_eq!(q.amount, MAX_AMOUNT);
        assert_eq!(q.term, MAX_TERM);

        let q = quote(0, 0);
        assert_eq!(q.amount, MIN_AMOUNT);
        assert_eq!(q.term, MIN_TERM);

        assert_eq!(quote(12_400, 12).amount, 10_000);
        assert_eq!(quote(12_500, 12).amount, 15_000);
    }

    #[test]
    fn test_quote_from_input() {
        assert_eq!(quote_from_input(None, None), LoanQuote::default());
        assert_eq!(quote_from_input(Some("abc"), Some("")), LoanQuote::default());

        let q = quote_from_input(Some(" 250000 "), Some("24"));
        assert_eq!(q.amount, 250_000);
        assert_eq!(q.term, 24);
        assert_eq!(q.monthly_payment, 10_417);
    }
}
