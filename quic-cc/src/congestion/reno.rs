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

//! Reno Congestion Control
//!
//! Slow start grows the window by every acknowledged byte, congestion
//! avoidance by one full-sized packet per window acknowledged. A loss outside
//! the current recovery episode multiplies the window by [`RENO_BETA`].
//!
//! Jumpstart may open the window of a fresh path to a larger, previously
//! observed size. If a loss reveals that the path did not sustain it, the
//! window is rebuilt from the bytes actually acknowledged during jumpstart.
//!
//! [`RENO_BETA`]: crate::RENO_BETA

use std::cmp;
use std::time::Instant;

use crate::Result;
use crate::MIN_CWND_PACKETS;
use crate::RENO_BETA;

use super::jumpstart::Jumpstart;
use super::Algorithm;
use super::AlgorithmState;
use super::Congestion;
use super::CongestionControlOps;
use super::EcnEpisodes;
use super::PacerMultiplier;

pub(crate) static RENO: CongestionControlOps = CongestionControlOps {
    name: "reno",
    algorithm: Algorithm::Reno,
    on_sent,
    on_acked,
    on_lost,
    on_persistent_congestion,
    on_switch,
    enter_jumpstart,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct State {
    // Bytes acknowledged towards the next congestion avoidance increase.
    pub(crate) stash: usize,

    pub(crate) jumpstart: Jumpstart,
}

impl State {
    pub(crate) const fn new() -> Self {
        State {
            stash: 0,
            jumpstart: Jumpstart::new(),
        }
    }

    pub(crate) fn debug_fmt(
        &self, f: &mut std::fmt::Formatter,
    ) -> std::fmt::Result {
        write!(f, "stash={} jumpstart={:?}", self.stash, self.jumpstart)
    }
}

fn reno_state(state: &mut AlgorithmState) -> &mut State {
    match state {
        AlgorithmState::Reno(reno) => reno,

        other => unreachable!("reno callback for {:?}", other.algorithm()),
    }
}

fn on_sent(_r: &mut Congestion, _bytes: usize, _now: Instant) {}

fn on_acked(
    r: &mut Congestion, bytes: usize, largest_acked: u64, inflight: usize,
    next_pn: u64, _now: Instant, max_udp_payload_size: usize,
) {
    assert!(
        inflight >= bytes,
        "acked {bytes} bytes with only {inflight} bytes in flight"
    );

    let reno = reno_state(&mut r.state);

    // No growth in recovery. Acks of jumpstart packets still count, the
    // window then adds up to what jumpstart actually delivered.
    if largest_acked < r.recovery_end {
        if reno.jumpstart.is_before_exit(largest_acked) {
            r.cwnd += bytes;
        }

        return;
    }

    if reno.jumpstart.contains(largest_acked) {
        reno.jumpstart.bytes_acked += bytes;
    }

    // The first ack of a jumpstart packet ends jumpstart. The window becomes
    // what is in flight and pacing goes back to slow start.
    if r.pacer_multiplier == PacerMultiplier::JUMPSTART &&
        reno.jumpstart.is_entered_by(largest_acked)
    {
        assert!(r.cwnd < r.ssthresh, "jumpstart ended outside slow start");

        r.cwnd = inflight;
        reno.jumpstart.exit_pn = next_pn;
        r.pacer_multiplier = PacerMultiplier::SLOW_START;

        trace!(
            "reno jumpstart exit pn={} cwnd={} jumpstart={:?}",
            largest_acked,
            r.cwnd,
            reno.jumpstart
        );
    }

    // Slow start.
    if r.cwnd < r.ssthresh {
        r.cwnd += bytes;
        r.cwnd_maximum = cmp::max(r.cwnd_maximum, r.cwnd);

        return;
    }

    // Congestion avoidance.
    reno.stash += bytes;

    if reno.stash < r.cwnd {
        return;
    }

    // One full-sized packet per window acknowledged.
    let count = reno.stash / r.cwnd;
    reno.stash -= count * r.cwnd;
    r.cwnd += count * max_udp_payload_size;
    r.cwnd_maximum = cmp::max(r.cwnd_maximum, r.cwnd);
}

fn on_lost(
    r: &mut Congestion, ecn: &mut dyn EcnEpisodes, bytes: usize, lost_pn: u64,
    next_pn: u64, _now: Instant, max_udp_payload_size: usize,
) {
    ecn.record_ecn_loss(bytes, lost_pn);

    // Already reacted to this episode.
    if lost_pn < r.recovery_end {
        return;
    }

    r.recovery_end = next_pn;
    r.pacer_multiplier = PacerMultiplier::POST_LOSS;

    let reno = reno_state(&mut r.state);

    // A loss before jumpstart's acks are all in. Size the window to the bytes
    // delivered during jumpstart, compensating for the reduction below.
    if r.ssthresh == usize::MAX && reno.jumpstart.is_before_exit(lost_pn) {
        assert!(r.cwnd < r.ssthresh);

        r.cwnd = (reno.jumpstart.bytes_acked as f64 / RENO_BETA) as usize;

        trace!(
            "reno jumpstart restore pn={} cwnd={} jumpstart={:?}",
            lost_pn,
            r.cwnd,
            reno.jumpstart
        );
    }

    r.num_loss_episodes += 1;

    if r.cwnd_exiting_slow_start == 0 {
        r.cwnd_exiting_slow_start = r.cwnd;
    }

    r.cwnd = (r.cwnd as f64 * RENO_BETA) as usize;
    r.cwnd = cmp::max(r.cwnd, MIN_CWND_PACKETS * max_udp_payload_size);
    r.ssthresh = r.cwnd;
    r.cwnd_minimum = cmp::min(r.cwnd_minimum, r.cwnd);

    debug!("reno recovery start pn={} {:?}", lost_pn, r);
}

fn on_persistent_congestion(
    r: &mut Congestion, _now: Instant, max_udp_payload_size: usize,
) {
    let reno = reno_state(&mut r.state);

    if reno.jumpstart.is_active() {
        trace!("reno jumpstart abandoned {:?}", reno.jumpstart);
    }

    reno.stash = 0;

    r.cwnd = MIN_CWND_PACKETS * max_udp_payload_size;
    r.cwnd_minimum = cmp::min(r.cwnd_minimum, r.cwnd);
    r.pacer_multiplier = PacerMultiplier::SLOW_START;

    debug!("reno persistent congestion {:?}", r);
}

fn on_switch(r: &mut Congestion) -> Result<()> {
    match r.state {
        AlgorithmState::Reno(_) => (),

        // The stash means the same thing to both.
        AlgorithmState::Pico(pico) =>
            r.state = AlgorithmState::Reno(State {
                stash: pico.stash,
                ..State::new()
            }),

        // Slow start state is shared, anything learnt in congestion
        // avoidance is not.
        AlgorithmState::Cubic =>
            if r.cwnd_exiting_slow_start == 0 {
                r.state = AlgorithmState::Reno(State::new());
            } else {
                r.reinit(Algorithm::Reno, r.cwnd_initial);
            },
    }

    Ok(())
}

fn enter_jumpstart(r: &mut Congestion, jump_cwnd: usize, next_pn: u64) {
    // Not worth it unless the window at least doubles.
    if r.cwnd * 2 >= jump_cwnd {
        return;
    }

    let reno = reno_state(&mut r.state);
    reno.jumpstart.enter_pn = next_pn;

    r.cwnd = jump_cwnd;
    r.pacer_multiplier = PacerMultiplier::JUMPSTART;

    trace!("reno jumpstart enter pn={} {:?}", next_pn, r);
}
