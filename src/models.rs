// Copyright (c) Terracotta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::ValuationError;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role whose share transactions can be excluded from cumulative share
/// totals when a caller opts into the exclusion.
pub const NON_MEMBER_ROLE: &str = "non-member";

/// A valuation period. Field order matters: the derived `Ord` compares
/// (year, month), which is chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub const MIN_YEAR: i32 = 1900;
    pub const MAX_YEAR: i32 = 2100;

    pub fn new(month: u32, year: i32) -> Result<Self, ValuationError> {
        if !(1..=12).contains(&month) || !(Self::MIN_YEAR..=Self::MAX_YEAR).contains(&year) {
            return Err(ValuationError::InvalidPeriod { month, year });
        }
        Ok(MonthKey { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        MonthKey {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The month immediately after. Not range-checked; only used for walking
    /// a chain whose endpoints were validated.
    pub fn next(self) -> Self {
        if self.month == 12 {
            MonthKey {
                year: self.year + 1,
                month: 1,
            }
        } else {
            MonthKey {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The month immediately before. Not range-checked.
    pub fn prev(self) -> Self {
        if self.month == 1 {
            MonthKey {
                year: self.year - 1,
                month: 12,
            }
        } else {
            MonthKey {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn first_day(self) -> NaiveDate {
        // month is 1-12 by construction
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(self) -> NaiveDate {
        self.next().first_day().pred_opt().unwrap_or(NaiveDate::MAX)
    }

    /// All months from `self` through `end`, inclusive, ascending. Empty when
    /// `end` precedes `self`.
    pub fn through(self, end: MonthKey) -> impl Iterator<Item = MonthKey> {
        std::iter::successors(Some(self), |k| Some(k.next())).take_while(move |k| *k <= end)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    pub name: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeEntry {
    pub id: i64,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub net_amount: Decimal,
    pub source: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseEntry {
    pub id: i64,
    pub date: NaiveDate,
    pub net_amount: Decimal,
    pub payee: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareTransaction {
    pub id: i64,
    pub date: NaiveDate,
    pub member_id: i64,
    pub contribution_amount: Decimal,
    pub share_count: Decimal,
    pub note: Option<String>,
}

/// One computed valuation period. At most one row exists per (month, year);
/// the engine overwrites it in place on every recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyValuation {
    pub month: u32,
    pub year: i32,
    pub total_inflows: Decimal,
    pub total_outflows: Decimal,
    pub total_flows: Decimal,
    pub total_shares_previous_month: Decimal,
    pub valuation: Decimal,
    pub share_price: Decimal,
}

impl MonthlyValuation {
    pub fn key(&self) -> MonthKey {
        MonthKey {
            year: self.year,
            month: self.month,
        }
    }
}
