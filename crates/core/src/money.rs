use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};

/// Currency amount as delivered by the matching engine.
///
/// The full precision of the payload is kept; rounding to two places happens
/// only when an amount is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn abs(self) -> Self {
        Money(self.0.abs())
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    /// Two decimal places, half away from zero. A rounded zero never carries a sign.
    pub fn rounded(self) -> Decimal {
        let r = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        if r.is_zero() {
            Decimal::new(0, 2)
        } else {
            r
        }
    }

    /// Ungrouped two-decimal form used in delimited output, e.g. `1250.50`.
    pub fn to_plain_string(self) -> String {
        format!("{:.2}", self.rounded())
    }

    /// Rupee amount with en-IN (lakh/crore) grouping, e.g. `₹12,34,567.89`.
    pub fn format_inr(self) -> String {
        let r = self.rounded();
        let sign = if r < Decimal::ZERO { "-" } else { "" };
        let plain = format!("{:.2}", r.abs());
        let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));
        format!("{sign}₹{}.{frac_part}", group_en_in(int_part))
    }
}

/// Groups an unsigned digit string the Indian way: the last three digits,
/// then pairs (`1234567` → `12,34,567`).
fn group_en_in(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::new();
    let mut end = head.len();
    while end > 2 {
        groups.push(&head[end - 2..end]);
        end -= 2;
    }
    groups.push(&head[..end]);
    groups.reverse();
    format!("{},{tail}", groups.join(","))
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_inr())
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Self;
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl From<Decimal> for Money {
    fn from(d: Decimal) -> Self {
        Money(d)
    }
}

impl std::str::FromStr for Money {
    type Err = rust_decimal::Error;

    /// Plain decimal text, e.g. `1543210.50`. Grouping separators are not accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<Decimal>().map(Money)
    }
}
