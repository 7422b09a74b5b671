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

use super::*;

use std::cmp;
use std::time::Duration;
use std::time::Instant;

use rstest::rstest;

use crate::congestion::AlgorithmState;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn stash(cc: &Congestion) -> usize {
    match cc.state {
        AlgorithmState::Reno(reno) => reno.stash,

        _ => panic!("not reno"),
    }
}

#[test]
fn slow_start_three_acks() {
    init();

    let now = Instant::now();
    let mut cc = Congestion::new(calc_initial_cwnd(10, 1472), now);

    assert_eq!(cc.cwnd(), 14720);
    assert_eq!(cc.ssthresh(), usize::MAX);

    for pn in 0..3 {
        cc.on_acked(1472, pn, 14720, 10, now, 1472);
    }

    assert_eq!(cc.cwnd(), 14720 + 3 * 1472);
    assert_eq!(cc.cwnd(), 19136);
    assert!(cc.in_slow_start());
}

#[rstest]
fn slow_start_grows_by_acked_bytes(
    #[values(1, 100, 1200, 1472)] bytes: usize,
    #[values(1, 5, 32)] acks: u64,
) {
    init();

    let now = Instant::now();
    let mut cc = Congestion::new(14720, now);

    let mut max = cc.cwnd();

    for pn in 0..acks {
        cc.on_acked(bytes, pn, bytes * 64, acks, now, 1472);

        max = cmp::max(max, cc.cwnd());
        assert_eq!(cc.stats().cwnd_maximum, max);
    }

    assert_eq!(cc.cwnd(), 14720 + bytes * acks as usize);
}

#[test]
fn congestion_avoidance_stashes_partial_window() {
    init();

    let now = Instant::now();
    let mut cc = Congestion::new(14286, now);

    cc.on_lost(&mut (), 1472, 0, 1, now, 1472);

    assert_eq!(cc.cwnd(), 10000);
    assert_eq!(cc.ssthresh(), 10000);
    assert!(!cc.in_slow_start());

    cc.on_acked(1472, 1, 1472, 2, now, 1472);

    assert_eq!(cc.cwnd(), 10000);
    assert_eq!(stash(&cc), 1472);
}

#[test]
fn loss_opens_recovery_episode() {
    init();

    let now = Instant::now();
    let mut cc = Congestion::new(20000, now);

    assert_eq!(cc.recovery_end, 0);

    cc.on_lost(&mut (), 1200, 5, 10, now, 1472);

    assert_eq!(cc.recovery_end, 10);
    assert_eq!(cc.cwnd(), cmp::max((20000.0 * RENO_BETA) as usize, 2 * 1472));
    assert_eq!(cc.cwnd(), 14000);
    assert_eq!(cc.ssthresh(), cc.cwnd());
    assert_eq!(cc.stats().num_loss_episodes, 1);
    assert_eq!(cc.pacer_multiplier(), PacerMultiplier::POST_LOSS);
}

#[rstest]
fn loss_in_recovery_is_ignored(#[values(0, 5, 9)] lost_pn: u64) {
    init();

    let now = Instant::now();
    let mut cc = Congestion::new(20000, now);

    cc.on_lost(&mut (), 1200, 0, 10, now, 1472);

    let stats = cc.stats();

    cc.on_lost(&mut (), 1200, lost_pn, 30, now, 1472);

    assert_eq!(cc.stats(), stats);
    assert_eq!(cc.recovery_end, 10);
}

#[rstest]
fn loss_after_recovery_reduces(#[values(10, 11, 1000)] lost_pn: u64) {
    init();

    let now = Instant::now();
    let mut cc = Congestion::new(20000, now);

    cc.on_lost(&mut (), 1200, 0, 10, now, 1472);

    let prev = cc.cwnd();

    cc.on_lost(&mut (), 1200, lost_pn, 2000, now, 1472);

    assert!(cc.cwnd() < prev);
    assert_eq!(cc.cwnd(), (prev as f64 * RENO_BETA) as usize);
    assert_eq!(cc.ssthresh(), cc.cwnd());
    assert_eq!(cc.stats().num_loss_episodes, 2);
    assert_eq!(cc.recovery_end, 2000);
}

#[rstest]
fn jumpstart_small_target_is_noop(
    #[values(0, 14720, 29440)] jump_cwnd: usize,
) {
    init();

    let now = Instant::now();
    let mut cc = Congestion::new(14720, now);
    let state = cc.state;

    cc.enter_jumpstart(jump_cwnd, 3);

    assert_eq!(cc.state, state);
    assert_eq!(cc.cwnd(), 14720);
    assert_eq!(cc.pacer_multiplier(), PacerMultiplier::SLOW_START);
}

#[test]
fn jumpstart_round_trip() {
    init();

    let now = Instant::now();
    let mut cc = Congestion::new(14720, now);

    cc.enter_jumpstart(147200, 0);
    assert_eq!(cc.pacer_multiplier(), PacerMultiplier::JUMPSTART);

    // 100 packets in flight, the first ack ends jumpstart.
    cc.on_acked(1472, 0, 147200, 100, now, 1472);
    assert_eq!(cc.cwnd(), 147200 + 1472);
    assert_eq!(cc.pacer_multiplier(), PacerMultiplier::SLOW_START);

    // Only half of the remaining interval makes it through.
    let mut inflight = 147200 - 1472;

    for pn in 1..50 {
        cc.on_acked(1472, pn, inflight, 100, now, 1472);
        inflight -= 1472;
    }

    cc.on_lost(&mut (), 1472, 50, 100, now, 1472);

    let delivered = 49 * 1472;
    let restored = (delivered as f64 / RENO_BETA) as usize;

    assert_eq!(cc.cwnd(), (restored as f64 * RENO_BETA) as usize);
    assert!(cc.cwnd() <= delivered);
    assert!(!cc.in_slow_start());
}

#[test]
fn persistent_congestion_collapses_window() {
    init();

    let now = Instant::now();
    let mut cc = Congestion::new(14720, now);

    cc.on_lost(&mut (), 1472, 0, 10, now, 1200);
    cc.on_persistent_congestion(now + Duration::from_secs(1), 1200);

    assert_eq!(cc.cwnd(), MIN_CWND_PACKETS * 1200);
    assert_eq!(cc.stats().cwnd_minimum, MIN_CWND_PACKETS * 1200);
}

#[rstest]
fn switch_to_reno_is_idempotent(
    #[values(Algorithm::Reno, Algorithm::Cubic, Algorithm::Pico)]
    from: Algorithm,
) {
    init();

    let now = Instant::now();
    let mut cc = Congestion::with_algorithm(from, 14720, now);

    assert_eq!(cc.switch_to(Algorithm::Reno), Ok(()));
    assert_eq!(cc.algorithm(), Algorithm::Reno);

    let state = cc.state;
    let stats = cc.stats();

    assert_eq!(cc.switch_to(Algorithm::Reno), Ok(()));
    assert_eq!(cc.state, state);
    assert_eq!(cc.stats(), stats);
}

#[rstest]
#[case::default("reno", 10, 1472, 14720)]
#[case::small_mtu("reno", 10, 1200, 12000)]
#[case::untrusted_mtu("cubic", 10, 65527, 14720)]
#[case::tiny_window("pico", 1, 1472, 2944)]
fn config(
    #[case] name: &str, #[case] packets: usize, #[case] payload: usize,
    #[case] cwnd: usize,
) {
    init();

    let mut config = Config::new();
    assert_eq!(config.set_cc_algorithm_name(name), Ok(()));
    config.set_initial_congestion_window_packets(packets);
    config.set_max_send_udp_payload_size(payload);

    assert_eq!(config.initial_congestion_window(), cwnd);

    let cc = Congestion::from_config(&config, Instant::now());

    assert_eq!(cc.algorithm().name(), name);
    assert_eq!(cc.cwnd(), cwnd);
    assert_eq!(cc.stats().cwnd_initial, cwnd);
}

#[test]
fn config_bad_algorithm() {
    let mut config = Config::default();

    assert_eq!(
        config.set_cc_algorithm_name("bbr"),
        Err(Error::CongestionControl)
    );
    assert_eq!(config.cc_algorithm(), Algorithm::Reno);

    config.set_cc_algorithm(Algorithm::Pico);
    assert_eq!(config.cc_algorithm(), Algorithm::Pico);
}
