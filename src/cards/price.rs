use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Market price of a single card in USD.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Price {
    pub amount: f64,
}

impl Price {
    pub fn new(amount: f64) -> Self {
        Self { amount }
    }

    pub fn zero() -> Self {
        Self { amount: 0.0 }
    }

    /// Missing prices count as zero when sorting and summing.
    pub fn or_zero(price: Option<Price>) -> Price {
        price.unwrap_or_default()
    }

    pub fn times(&self, quantity: u32) -> Price {
        Price::new(self.amount * f64::from(quantity))
    }

    pub fn parse(text: &str) -> Option<Price> {
        text.trim()
            .parse::<f64>()
            .ok()
            .filter(|amount| amount.is_finite())
            .map(Price::new)
    }
}

impl PartialEq for Price {
    fn eq(&self, other: &Self) -> bool {
        self.amount.total_cmp(&other.amount) == Ordering::Equal
    }
}

impl Eq for Price {}

impl PartialOrd for Price {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Price {
    fn cmp(&self, other: &Self) -> Ordering {
        self.amount.total_cmp(&other.amount)
    }
}

impl Add for Price {
    type Output = Price;

    fn add(self, rhs: Price) -> Price {
        Price::new(self.amount + rhs.amount)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Price>>(iter: I) -> Price {
        iter.fold(Price::zero(), |acc, price| acc + price)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.amount)
    }
}
