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

//! Jumpstart bookkeeping.
//!
//! Jumpstart opens the window of a new path to a size learned from a
//! previous connection. The packets sent between entering jumpstart and
//! receiving its first acknowledgment form the jumpstart interval. Bytes
//! acknowledged for that interval tell how much the path actually carried,
//! and are used to size the window if a loss shows the jump was too large.

/// Jumpstart sub-state of Reno.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) struct Jumpstart {
    /// First packet number sent in jumpstart, `u64::MAX` when never entered.
    pub(crate) enter_pn: u64,

    /// First packet number sent after jumpstart ended, 0 until it ended.
    pub(crate) exit_pn: u64,

    /// Bytes acknowledged for packets in `[enter_pn, exit_pn)`.
    pub(crate) bytes_acked: usize,
}

impl Jumpstart {
    pub(crate) const fn new() -> Self {
        Jumpstart {
            enter_pn: u64::MAX,
            exit_pn: 0,
            bytes_acked: 0,
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.enter_pn != u64::MAX && self.exit_pn == 0
    }

    /// Returns true if `pn` was sent at or after entering jumpstart.
    pub(crate) fn is_entered_by(&self, pn: u64) -> bool {
        self.enter_pn <= pn
    }

    /// Returns true if `pn` was sent before jumpstart ended.
    pub(crate) fn is_before_exit(&self, pn: u64) -> bool {
        pn < self.exit_pn
    }

    /// Returns true if `pn` belongs to the jumpstart interval.
    pub(crate) fn contains(&self, pn: u64) -> bool {
        self.is_entered_by(pn) && self.is_before_exit(pn)
    }
}

impl std::fmt::Debug for Jumpstart {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.enter_pn == u64::MAX {
            return write!(f, "none");
        }

        if self.exit_pn == 0 {
            return write!(f, "[{}, ..)", self.enter_pn);
        }

        write!(
            f,
            "[{}, {}) bytes_acked={}",
            self.enter_pn, self.exit_pn, self.bytes_acked
        )
    }
}
