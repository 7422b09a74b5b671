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

//! CUBIC tag.
//!
//! The cubic growth function is provided by its own implementation. The
//! engine only needs to know when CUBIC is active and whether it has left
//! slow start, which is tracked by the shared state.

use crate::Error;
use crate::Result;

use super::external;
use super::Algorithm;
use super::AlgorithmState;
use super::Congestion;
use super::CongestionControlOps;

pub(crate) static CUBIC: CongestionControlOps = CongestionControlOps {
    name: "cubic",
    algorithm: Algorithm::Cubic,
    on_sent: external::on_sent,
    on_acked: external::on_acked,
    on_lost: external::on_lost,
    on_persistent_congestion: external::on_persistent_congestion,
    on_switch,
    enter_jumpstart: external::enter_jumpstart,
};

// Converting another algorithm's state belongs to the CUBIC implementation.
fn on_switch(r: &mut Congestion) -> Result<()> {
    match r.state {
        AlgorithmState::Cubic => Ok(()),

        _ => Err(Error::UnsupportedSwitch),
    }
}
