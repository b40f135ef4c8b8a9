// Copyright (c) Terracotta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Failures the valuation engine reports to its callers. Storage-level
/// failures are not enumerated here; they propagate through `anyhow` and
/// abort the whole chain (§ no partial persistence).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValuationError {
    /// No income, expense, or share-transaction records exist, so there is
    /// no floor month and nothing to value.
    #[error("no ledger activity recorded; no valuation history available")]
    NoData,

    /// Requested period outside month 1-12 / year 1900-2100.
    #[error("invalid valuation period: month {month}, year {year}")]
    InvalidPeriod { month: u32, year: i32 },
}
