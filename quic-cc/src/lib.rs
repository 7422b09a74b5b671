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

//! Congestion control for QUIC connection paths.
//!
//! This crate implements the congestion window state machine a QUIC sender
//! consults before putting new packets on the wire. The loss detector feeds
//! it acknowledgments and losses, and the pacer reads back the resulting
//! congestion window together with a pacing multiplier.
//!
//! The classic Reno algorithm is provided, including slow start, congestion
//! avoidance, loss recovery and the jumpstart fast-start mechanism. The
//! CUBIC and Pico variants are known to the engine so that a connection can
//! switch between algorithms at runtime, but their growth functions live with
//! their own implementations.
//!
//! ## Configuring a path
//!
//! ```
//! use std::time::Instant;
//!
//! let mut config = quic_cc::Config::new();
//! config.set_cc_algorithm_name("reno")?;
//! config.set_initial_congestion_window_packets(10);
//! config.set_max_send_udp_payload_size(1472);
//!
//! let cc = quic_cc::Congestion::from_config(&config, Instant::now());
//! assert_eq!(cc.cwnd(), 14720);
//! # Ok::<(), quic_cc::Error>(())
//! ```
//!
//! ## Feeding it
//!
//! The loss detector reports every acknowledgment and loss along with the
//! packet numbers involved:
//!
//! ```
//! # use std::time::Instant;
//! # let now = Instant::now();
//! let mut cc = quic_cc::Congestion::new(14720, now);
//!
//! // 1472 bytes acknowledged, largest acked pn 0, 14720 bytes in flight
//! // and pn 10 is the next one to be sent.
//! cc.on_acked(1472, 0, 14720, 10, now, 1472);
//! assert_eq!(cc.cwnd(), 16192);
//!
//! // Losing pn 1 opens a recovery episode ending at pn 10.
//! cc.on_lost(&mut (), 1472, 1, 10, now, 1472);
//! assert_eq!(cc.stats().num_loss_episodes, 1);
//! assert!(!cc.in_slow_start());
//! ```

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[macro_use]
extern crate log;

use std::str::FromStr;

pub use crate::congestion::calc_initial_cwnd;
pub use crate::congestion::Algorithm;
pub use crate::congestion::Congestion;
pub use crate::congestion::CongestionControlOps;
pub use crate::congestion::EcnEpisodes;
pub use crate::congestion::PacerMultiplier;
pub use crate::congestion::Stats;
pub use crate::congestion::ALL_ALGORITHMS;
pub use crate::error::Error;
pub use crate::error::Result;

/// The minimum congestion window, in packets.
///
/// The window never shrinks below this many full-sized packets.
pub const MIN_CWND_PACKETS: usize = 2;

/// The largest UDP payload size trusted when computing an initial window.
///
/// This is the payload left by a 1500 byte Ethernet MTU after the IPv4 and
/// UDP headers.
pub const MAX_UDP_PAYLOAD_CEILING: usize = 1472;

/// The multiplicative decrease factor applied to the window on loss.
pub const RENO_BETA: f64 = 0.7;

const DEFAULT_INITIAL_CONGESTION_WINDOW_PACKETS: usize = 10;

const DEFAULT_MAX_SEND_UDP_PAYLOAD_SIZE: usize = 1472;

/// Stores configuration shared between multiple paths.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    cc_algorithm: Algorithm,

    initial_congestion_window_packets: usize,

    max_send_udp_payload_size: usize,
}

impl Config {
    /// Creates a config object with default values.
    pub fn new() -> Self {
        Config {
            cc_algorithm: Algorithm::Reno,
            initial_congestion_window_packets:
                DEFAULT_INITIAL_CONGESTION_WINDOW_PACKETS,
            max_send_udp_payload_size: DEFAULT_MAX_SEND_UDP_PAYLOAD_SIZE,
        }
    }

    /// Sets the congestion control algorithm used by string.
    ///
    /// The default value is `reno`. On error `Error::CongestionControl`
    /// will be returned.
    ///
    /// ## Examples:
    ///
    /// ```
    /// let mut config = quic_cc::Config::new();
    /// config.set_cc_algorithm_name("cubic")?;
    /// # Ok::<(), quic_cc::Error>(())
    /// ```
    pub fn set_cc_algorithm_name(&mut self, name: &str) -> Result<()> {
        self.cc_algorithm = Algorithm::from_str(name)?;

        Ok(())
    }

    /// Sets the congestion control algorithm used.
    ///
    /// The default value is `Algorithm::Reno`.
    pub fn set_cc_algorithm(&mut self, algo: Algorithm) {
        self.cc_algorithm = algo;
    }

    /// Sets the initial congestion window size in terms of packet count.
    ///
    /// Values below [`MIN_CWND_PACKETS`] are raised to it when the window is
    /// computed. The default value is 10.
    pub fn set_initial_congestion_window_packets(&mut self, packets: usize) {
        self.initial_congestion_window_packets = packets;
    }

    /// Sets the maximum outgoing UDP payload size.
    ///
    /// Values above [`MAX_UDP_PAYLOAD_CEILING`] are not trusted for the
    /// initial window. The default value is `1472`.
    pub fn set_max_send_udp_payload_size(&mut self, v: usize) {
        self.max_send_udp_payload_size = v;
    }

    /// Returns the configured congestion control algorithm.
    pub fn cc_algorithm(&self) -> Algorithm {
        self.cc_algorithm
    }

    /// Returns the initial congestion window in bytes.
    pub fn initial_congestion_window(&self) -> usize {
        calc_initial_cwnd(
            self.initial_congestion_window_packets,
            self.max_send_udp_payload_size,
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

mod congestion;
mod error;

#[cfg(test)]
mod tests;
