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

//! Callbacks for algorithms whose window growth is implemented elsewhere.
//!
//! While such an algorithm is active the engine keeps its statistics and
//! tells the ECN tracker about losses, but leaves the window to the
//! algorithm's own implementation.

use std::time::Instant;

use super::Congestion;
use super::EcnEpisodes;

pub(super) fn on_sent(_r: &mut Congestion, _bytes: usize, _now: Instant) {}

pub(super) fn on_acked(
    r: &mut Congestion, bytes: usize, largest_acked: u64, inflight: usize,
    _next_pn: u64, _now: Instant, _max_udp_payload_size: usize,
) {
    assert!(
        inflight >= bytes,
        "acked {bytes} bytes with only {inflight} bytes in flight"
    );

    trace!(
        "{} acked pn={} bytes={} left to external growth",
        r.algorithm().name(),
        largest_acked,
        bytes
    );
}

pub(super) fn on_lost(
    r: &mut Congestion, ecn: &mut dyn EcnEpisodes, bytes: usize, lost_pn: u64,
    _next_pn: u64, _now: Instant, _max_udp_payload_size: usize,
) {
    ecn.record_ecn_loss(bytes, lost_pn);

    trace!(
        "{} lost pn={} bytes={} left to external growth",
        r.algorithm().name(),
        lost_pn,
        bytes
    );
}

pub(super) fn on_persistent_congestion(
    r: &mut Congestion, _now: Instant, _max_udp_payload_size: usize,
) {
    trace!(
        "{} persistent congestion left to external growth",
        r.algorithm().name()
    );
}

pub(super) fn enter_jumpstart(
    _r: &mut Congestion, _jump_cwnd: usize, _next_pn: u64,
) {
}
