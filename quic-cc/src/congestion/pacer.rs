// Copyright (C) 2024, Cloudflare, Inc.
// All rights reserved.
//
// Redistribution and use in source and binary forms, with or without
// modification, are permitted provided that the following conditions are
// met:
//
//     * Redistributions of source code must retain the above copyright notice,
//       this list of conditions and the following disclaimer.
//
//     * Redistributions in binary form must reproduce the above copyright
//       notice, this list of conditions and the following disclaimer in the
//       documentation and/or other materials provided with the distribution.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS
// IS" AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO,
// THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR
// PURPOSE ARE DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR
// CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL,
// EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO,
// PROCUREMENT OF SUBSTITUTE GOODS OR SERVICES; LOSS OF USE, DATA, OR
// PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF
// LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING
// NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE OF THIS
// SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

//! Pacing multiplier handed to the pacer.

use std::time::Duration;

// Fixed point scale of the multiplier.
const SCALE: u32 = 1024;

/// How fast the pacer may send relative to `cwnd / srtt`.
///
/// The value is stored in fixed point so that it can be compared exactly.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PacerMultiplier(u16);

impl PacerMultiplier {
    /// Pace at exactly `cwnd / srtt`, used while jumpstart is active.
    pub const JUMPSTART: PacerMultiplier = PacerMultiplier(SCALE as u16);

    /// Pace at twice `cwnd / srtt`, used in slow start.
    pub const SLOW_START: PacerMultiplier = PacerMultiplier(2 * SCALE as u16);

    /// Pace at 1.2 times `cwnd / srtt`, used after a loss.
    pub const POST_LOSS: PacerMultiplier =
        PacerMultiplier((12 * SCALE / 10) as u16);

    /// Returns the multiplier as a floating point factor.
    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / f64::from(SCALE)
    }

    /// Returns the pacing rate in bytes per second for `cwnd` and `srtt`.
    ///
    /// A zero `srtt` yields `u64::MAX`.
    pub fn pacing_rate(self, cwnd: usize, srtt: Duration) -> u64 {
        let srtt = srtt.as_secs_f64();

        if srtt == 0.0 {
            return u64::MAX;
        }

        (self.as_f64() * cwnd as f64 / srtt) as u64
    }
}

impl std::fmt::Debug for PacerMultiplier {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self.as_f64())
    }
}
