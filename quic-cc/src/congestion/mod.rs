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

use std::cmp;
use std::str::FromStr;
use std::time::Instant;

#[cfg(feature = "qlog")]
use qlog::events::EventData;

use crate::Config;
use crate::Result;
use crate::MAX_UDP_PAYLOAD_CEILING;
use crate::MIN_CWND_PACKETS;

pub use self::pacer::PacerMultiplier;

/// All congestion control algorithms known to the engine.
pub static ALL_ALGORITHMS: [&CongestionControlOps; 3] =
    [&reno::RENO, &cubic::CUBIC, &pico::PICO];

/// Computes the initial congestion window in bytes.
///
/// The packet count is raised to at least [`MIN_CWND_PACKETS`], and the
/// payload size is capped at [`MAX_UDP_PAYLOAD_CEILING`]. A larger declared
/// payload size is never trusted.
///
/// [`MIN_CWND_PACKETS`]: crate::MIN_CWND_PACKETS
/// [`MAX_UDP_PAYLOAD_CEILING`]: crate::MAX_UDP_PAYLOAD_CEILING
pub fn calc_initial_cwnd(
    max_packets: usize, max_udp_payload_size: usize,
) -> usize {
    let max_packets = cmp::max(max_packets, MIN_CWND_PACKETS);
    let max_udp_payload_size =
        cmp::min(max_udp_payload_size, MAX_UDP_PAYLOAD_CEILING);

    max_packets * max_udp_payload_size
}

/// Available congestion control algorithms.
///
/// This enum provides currently available list of congestion control
/// algorithms.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(C)]
pub enum Algorithm {
    /// Reno congestion control algorithm (default). `reno` in a string form.
    Reno  = 0,
    /// CUBIC congestion control algorithm. `cubic` in a string form.
    Cubic = 1,
    /// Pico congestion control algorithm. `pico` in a string form.
    Pico  = 2,
}

impl Algorithm {
    /// Returns the string form of the algorithm.
    pub fn name(self) -> &'static str {
        let ops: &'static CongestionControlOps = self.into();
        ops.name
    }
}

impl FromStr for Algorithm {
    type Err = crate::Error;

    /// Converts a string to `Algorithm`.
    ///
    /// If `name` is not valid, `Error::CongestionControl` is returned.
    fn from_str(name: &str) -> std::result::Result<Self, Self::Err> {
        ALL_ALGORITHMS
            .iter()
            .find(|ops| ops.name == name)
            .map(|ops| ops.algorithm)
            .ok_or(crate::Error::CongestionControl)
    }
}

impl From<Algorithm> for &'static CongestionControlOps {
    fn from(algo: Algorithm) -> Self {
        match algo {
            Algorithm::Reno => &reno::RENO,
            Algorithm::Cubic => &cubic::CUBIC,
            Algorithm::Pico => &pico::PICO,
        }
    }
}

/// Receives every reported loss, including those inside a recovery episode.
///
/// ECN episode bookkeeping is owned by the caller. The unit type can be used
/// when there is none.
pub trait EcnEpisodes {
    /// Records `bytes` lost with packet number `lost_pn`.
    fn record_ecn_loss(&mut self, bytes: usize, lost_pn: u64);
}

impl EcnEpisodes for () {
    fn record_ecn_loss(&mut self, _bytes: usize, _lost_pn: u64) {}
}

/// Lifecycle callbacks of a congestion control algorithm.
pub struct CongestionControlOps {
    /// The string form of the algorithm.
    pub name: &'static str,

    /// The algorithm the callbacks belong to.
    pub algorithm: Algorithm,

    pub(crate) on_sent: fn(r: &mut Congestion, bytes: usize, now: Instant),

    pub(crate) on_acked: fn(
        r: &mut Congestion,
        bytes: usize,
        largest_acked: u64,
        inflight: usize,
        next_pn: u64,
        now: Instant,
        max_udp_payload_size: usize,
    ),

    pub(crate) on_lost: fn(
        r: &mut Congestion,
        ecn: &mut dyn EcnEpisodes,
        bytes: usize,
        lost_pn: u64,
        next_pn: u64,
        now: Instant,
        max_udp_payload_size: usize,
    ),

    pub(crate) on_persistent_congestion:
        fn(r: &mut Congestion, now: Instant, max_udp_payload_size: usize),

    /// Makes the callbacks' algorithm the active one.
    pub(crate) on_switch: fn(r: &mut Congestion) -> Result<()>,

    pub(crate) enter_jumpstart:
        fn(r: &mut Congestion, jump_cwnd: usize, next_pn: u64),
}

impl std::fmt::Debug for CongestionControlOps {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Algorithm specific state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AlgorithmState {
    Reno(reno::State),

    /// CUBIC keeps its growth state with its own implementation.
    Cubic,

    Pico(pico::State),
}

impl AlgorithmState {
    fn new(algo: Algorithm) -> Self {
        match algo {
            Algorithm::Reno => AlgorithmState::Reno(reno::State::new()),
            Algorithm::Cubic => AlgorithmState::Cubic,
            Algorithm::Pico => AlgorithmState::Pico(pico::State::new()),
        }
    }

    pub(crate) fn algorithm(&self) -> Algorithm {
        match self {
            AlgorithmState::Reno(_) => Algorithm::Reno,
            AlgorithmState::Cubic => Algorithm::Cubic,
            AlgorithmState::Pico(_) => Algorithm::Pico,
        }
    }
}

/// A snapshot of a path's congestion control statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    /// The current congestion window in bytes.
    pub cwnd: usize,

    /// The congestion window the path started with.
    pub cwnd_initial: usize,

    /// The smallest congestion window after a reduction. `usize::MAX` until
    /// the first loss episode.
    pub cwnd_minimum: usize,

    /// The largest congestion window reached through growth.
    pub cwnd_maximum: usize,

    /// The congestion window when slow start was first exited, or 0.
    pub cwnd_exiting_slow_start: usize,

    /// The slow start threshold. `usize::MAX` until the first loss episode.
    pub ssthresh: usize,

    /// The number of recovery episodes.
    pub num_loss_episodes: u64,
}

/// Per-path congestion control state.
///
/// A `Congestion` is mutated only by the path's loss detector through the
/// feedback callbacks, and read by the pacer through [`cwnd()`] and
/// [`pacer_multiplier()`].
///
/// [`cwnd()`]: Congestion::cwnd
/// [`pacer_multiplier()`]: Congestion::pacer_multiplier
pub struct Congestion {
    pub(crate) state: AlgorithmState,

    pub(crate) cwnd: usize,

    pub(crate) cwnd_initial: usize,

    pub(crate) cwnd_minimum: usize,

    pub(crate) cwnd_maximum: usize,

    pub(crate) cwnd_exiting_slow_start: usize,

    pub(crate) ssthresh: usize,

    // Losses of packets numbered below this belong to the current recovery
    // episode.
    pub(crate) recovery_end: u64,

    pub(crate) pacer_multiplier: PacerMultiplier,

    pub(crate) num_loss_episodes: u64,

    #[cfg(feature = "qlog")]
    qlog_metrics: QlogMetrics,
}

impl Congestion {
    /// Creates Reno congestion control state with the given initial window.
    pub fn new(initial_cwnd: usize, now: Instant) -> Self {
        Self::with_algorithm(Algorithm::Reno, initial_cwnd, now)
    }

    /// Creates congestion control state for `algo`.
    pub fn with_algorithm(
        algo: Algorithm, initial_cwnd: usize, _now: Instant,
    ) -> Self {
        Self::initial(algo, initial_cwnd)
    }

    /// Creates congestion control state from a [`Config`].
    pub fn from_config(config: &Config, now: Instant) -> Self {
        Self::with_algorithm(
            config.cc_algorithm(),
            config.initial_congestion_window(),
            now,
        )
    }

    /// Resets all state of the active algorithm to its initial values.
    pub fn reset(&mut self, initial_cwnd: usize, _now: Instant) {
        self.reinit(self.algorithm(), initial_cwnd);
    }

    pub(crate) fn reinit(&mut self, algo: Algorithm, initial_cwnd: usize) {
        *self = Self::initial(algo, initial_cwnd);
    }

    fn initial(algo: Algorithm, initial_cwnd: usize) -> Self {
        let cc = Congestion {
            state: AlgorithmState::new(algo),

            cwnd: initial_cwnd,

            cwnd_initial: initial_cwnd,

            cwnd_minimum: usize::MAX,

            cwnd_maximum: initial_cwnd,

            cwnd_exiting_slow_start: 0,

            ssthresh: usize::MAX,

            recovery_end: 0,

            pacer_multiplier: PacerMultiplier::SLOW_START,

            num_loss_episodes: 0,

            #[cfg(feature = "qlog")]
            qlog_metrics: QlogMetrics::default(),
        };

        trace!("{} init {:?}", algo.name(), cc);

        cc
    }

    fn ops(&self) -> &'static CongestionControlOps {
        self.algorithm().into()
    }

    /// Returns the active algorithm.
    pub fn algorithm(&self) -> Algorithm {
        self.state.algorithm()
    }

    /// Returns the congestion window in bytes.
    pub fn cwnd(&self) -> usize {
        self.cwnd
    }

    /// Returns the slow start threshold in bytes.
    pub fn ssthresh(&self) -> usize {
        self.ssthresh
    }

    /// Returns the pacing multiplier the pacer should apply.
    pub fn pacer_multiplier(&self) -> PacerMultiplier {
        self.pacer_multiplier
    }

    /// Returns true while the window is below the slow start threshold.
    pub fn in_slow_start(&self) -> bool {
        self.cwnd < self.ssthresh
    }

    /// Returns true if a loss of `pn` belongs to the current recovery
    /// episode.
    pub fn in_recovery(&self, pn: u64) -> bool {
        pn < self.recovery_end
    }

    /// Returns a snapshot of the statistics.
    pub fn stats(&self) -> Stats {
        Stats {
            cwnd: self.cwnd,
            cwnd_initial: self.cwnd_initial,
            cwnd_minimum: self.cwnd_minimum,
            cwnd_maximum: self.cwnd_maximum,
            cwnd_exiting_slow_start: self.cwnd_exiting_slow_start,
            ssthresh: self.ssthresh,
            num_loss_episodes: self.num_loss_episodes,
        }
    }

    /// Called when `bytes` are sent.
    pub fn on_sent(&mut self, bytes: usize, now: Instant) {
        (self.ops().on_sent)(self, bytes, now);
    }

    /// Called when `bytes` are newly acknowledged.
    ///
    /// `largest_acked` is the largest packet number acknowledged in this
    /// event and `inflight` the bytes in flight before it, which must be at
    /// least `bytes`. `next_pn` is the next packet number to be sent.
    ///
    /// ## Panics
    ///
    /// Panics if `inflight` is smaller than `bytes`.
    #[allow(clippy::too_many_arguments)]
    pub fn on_acked(
        &mut self, bytes: usize, largest_acked: u64, inflight: usize,
        next_pn: u64, now: Instant, max_udp_payload_size: usize,
    ) {
        (self.ops().on_acked)(
            self,
            bytes,
            largest_acked,
            inflight,
            next_pn,
            now,
            max_udp_payload_size,
        );
    }

    /// Called when the packet `lost_pn` carrying `bytes` is declared lost.
    ///
    /// `ecn` is told about every loss, before recovery deduplication.
    #[allow(clippy::too_many_arguments)]
    pub fn on_lost(
        &mut self, ecn: &mut dyn EcnEpisodes, bytes: usize, lost_pn: u64,
        next_pn: u64, now: Instant, max_udp_payload_size: usize,
    ) {
        (self.ops().on_lost)(
            self,
            ecn,
            bytes,
            lost_pn,
            next_pn,
            now,
            max_udp_payload_size,
        );
    }

    /// Called when persistent congestion is established.
    pub fn on_persistent_congestion(
        &mut self, now: Instant, max_udp_payload_size: usize,
    ) {
        (self.ops().on_persistent_congestion)(self, now, max_udp_payload_size);
    }

    /// Switches the active algorithm to `algo`.
    ///
    /// On error `Error::UnsupportedSwitch` is returned and the previous
    /// algorithm stays active with its state untouched.
    pub fn switch_to(&mut self, algo: Algorithm) -> Result<()> {
        let from = self.algorithm();

        let ops: &CongestionControlOps = algo.into();
        (ops.on_switch)(self)?;

        debug!("switched {} -> {} {:?}", from.name(), algo.name(), self);

        Ok(())
    }

    /// Jumps the window to `jump_cwnd` if that at least doubles it.
    ///
    /// `jump_cwnd` usually comes from the history of a previous connection
    /// to the same peer.
    pub fn enter_jumpstart(&mut self, jump_cwnd: usize, next_pn: u64) {
        (self.ops().enter_jumpstart)(self, jump_cwnd, next_pn);
    }

    /// Returns a qlog event if the window or threshold changed since the
    /// last call.
    #[cfg(feature = "qlog")]
    pub fn maybe_qlog(&mut self) -> Option<EventData> {
        let latest = QlogMetrics {
            cwnd: self.cwnd as u64,
            ssthresh: self.ssthresh as u64,
        };

        self.qlog_metrics.maybe_update(latest)
    }
}

impl std::fmt::Debug for Congestion {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "cwnd={} ", self.cwnd)?;

        if self.ssthresh == usize::MAX {
            write!(f, "ssthresh=none ")?;
        } else {
            write!(f, "ssthresh={} ", self.ssthresh)?;
        }

        write!(
            f,
            "recovery_end={} pacer_multiplier={:?} loss_episodes={} ",
            self.recovery_end, self.pacer_multiplier, self.num_loss_episodes,
        )?;

        match &self.state {
            AlgorithmState::Reno(reno) => reno.debug_fmt(f),

            AlgorithmState::Pico(pico) => write!(f, "stash={}", pico.stash),

            AlgorithmState::Cubic => Ok(()),
        }
    }
}

// We don't need to log the metrics every time a callback runs.
#[cfg(feature = "qlog")]
#[derive(Default)]
struct QlogMetrics {
    cwnd: u64,
    ssthresh: u64,
}

#[cfg(feature = "qlog")]
impl QlogMetrics {
    // Make a qlog event if the latest instance of QlogMetrics is different.
    fn maybe_update(&mut self, latest: Self) -> Option<EventData> {
        let mut emit_event = false;

        let new_cwnd = if self.cwnd != latest.cwnd {
            self.cwnd = latest.cwnd;
            emit_event = true;
            Some(latest.cwnd)
        } else {
            None
        };

        let new_ssthresh = if self.ssthresh != latest.ssthresh {
            self.ssthresh = latest.ssthresh;
            emit_event = true;
            Some(latest.ssthresh)
        } else {
            None
        };

        if emit_event {
            return Some(EventData::MetricsUpdated(
                qlog::events::quic::MetricsUpdated {
                    congestion_window: new_cwnd,
                    ssthresh: new_ssthresh,
                    ..Default::default()
                },
            ));
        }

        None
    }
}

mod cubic;
mod external;
mod jumpstart;
mod pacer;
mod pico;
mod reno;

#[cfg(test)]
pub(crate) mod test_sender;
