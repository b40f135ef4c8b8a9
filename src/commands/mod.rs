// Copyright (c) Terracotta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod members;
pub mod income;
pub mod expenses;
pub mod shares;
pub mod valuation;
pub mod doctor;
