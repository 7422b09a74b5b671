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

use std::collections::VecDeque;
use std::ops::Deref;
use std::ops::DerefMut;
use std::time::Duration;
use std::time::Instant;

use crate::congestion::Algorithm;
use crate::congestion::Congestion;
use crate::congestion::EcnEpisodes;
use crate::Config;

impl EcnEpisodes for Vec<(usize, u64)> {
    fn record_ecn_loss(&mut self, bytes: usize, lost_pn: u64) {
        self.push((bytes, lost_pn));
    }
}

struct SentPacket {
    pkt_num: u64,
    size: usize,
}

/// Plays the loss detector: sends packets in order and reports their acks
/// and losses.
pub(crate) struct TestSender {
    cc: Congestion,
    pub(crate) next_pkt: u64,
    pub(crate) bytes_in_flight: usize,
    pub(crate) max_datagram_size: usize,
    pub(crate) time: Instant,
    pub(crate) ecn: Vec<(usize, u64)>,
    sent_packets: VecDeque<SentPacket>,
}

impl TestSender {
    pub(crate) fn new(algo: Algorithm) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut cfg = Config::new();
        cfg.set_cc_algorithm(algo);

        let time = Instant::now();

        TestSender {
            cc: Congestion::from_config(&cfg, time),
            next_pkt: 0,
            bytes_in_flight: 0,
            max_datagram_size: 1472,
            time,
            ecn: Vec::new(),
            sent_packets: VecDeque::new(),
        }
    }

    pub(crate) fn send_packet(&mut self, bytes: usize) {
        self.cc.on_sent(bytes, self.time);

        self.sent_packets.push_back(SentPacket {
            pkt_num: self.next_pkt,
            size: bytes,
        });

        self.bytes_in_flight += bytes;
        self.next_pkt += 1;
    }

    pub(crate) fn send_n_packets(&mut self, n: usize) {
        for _ in 0..n {
            self.send_packet(self.max_datagram_size);
        }
    }

    /// Acknowledges the `n` oldest outstanding packets in a single ack.
    pub(crate) fn ack_n_packets(&mut self, n: usize) {
        let mut bytes = 0;
        let mut largest_acked = 0;

        for _ in 0..n {
            let acked = self.sent_packets.pop_front().unwrap();

            bytes += acked.size;
            largest_acked = acked.pkt_num;
        }

        self.cc.on_acked(
            bytes,
            largest_acked,
            self.bytes_in_flight,
            self.next_pkt,
            self.time,
            self.max_datagram_size,
        );

        self.bytes_in_flight -= bytes;
    }

    /// Acknowledges the `n` oldest outstanding packets one ack at a time.
    pub(crate) fn ack_n_packets_each(&mut self, n: usize) {
        for _ in 0..n {
            self.ack_n_packets(1);
        }
    }

    /// Declares the `n` oldest outstanding packets lost, in order.
    pub(crate) fn lose_n_packets(&mut self, n: usize) {
        for _ in 0..n {
            let lost = self.sent_packets.pop_front().unwrap();

            self.cc.on_lost(
                &mut self.ecn,
                lost.size,
                lost.pkt_num,
                self.next_pkt,
                self.time,
                self.max_datagram_size,
            );

            self.bytes_in_flight -= lost.size;
        }
    }

    /// Returns the packet number of the oldest outstanding packet.
    pub(crate) fn oldest_unacked(&self) -> Option<u64> {
        self.sent_packets.front().map(|p| p.pkt_num)
    }

    pub(crate) fn advance_time(&mut self, period: Duration) {
        self.time += period;
    }
}

impl Deref for TestSender {
    type Target = Congestion;

    fn deref(&self) -> &Self::Target {
        &self.cc
    }
}

impl DerefMut for TestSender {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.cc
    }
}
