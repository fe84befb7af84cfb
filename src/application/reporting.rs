use serde::{Deserialize, Serialize};

use crate::domain::{format_cents, Cents, YearMonth};

/// Income, expense and balance for one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub month: YearMonth,
    pub total_income: Cents,
    pub total_expense: Cents,
    pub balance: Cents,
}

impl MonthlySummary {
    pub fn new(month: YearMonth, total_income: Cents, total_expense: Cents) -> Self {
        Self {
            month,
            total_income,
            total_expense,
            balance: total_income - total_expense,
        }
    }

    /// `(income, expense, balance)` formatted with two decimals.
    pub fn formatted(&self) -> (String, String, String) {
        (
            format_cents(self.total_income),
            format_cents(self.total_expense),
            format_cents(self.balance),
        )
    }
}
