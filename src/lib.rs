// SPDX-License-Identifier: PMPL-1.0-or-later

//! psk-audit — staged WPA/WPA2-PSK recovery auditing.
//!
//! The crate drives an external cracking engine through an escalating
//! attack plan, one target at a time, against handshake-derived hash
//! artifacts.
//!
//! PIPELINE:
//! 1. **Seeds**: structured facts about a target are tokenized
//!    (`seed`) and expanded into a bounded candidate wordlist
//!    (`wordlist`).
//! 2. **Plan**: four fixed stages — targeted dictionary, combinator,
//!    brute-force masks, curated smart list — each mapping a target to
//!    concrete engine invocations (`plan`).
//! 3. **Orchestration**: sequential execution with resumable sessions,
//!    recovery detection against the shared potfile, and JSONL telemetry
//!    (`orchestrator`, `engine`, `store`, `session`, `telemetry`).

pub mod config;
pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod plan;
pub mod seed;
pub mod session;
pub mod store;
pub mod targets;
pub mod telemetry;
pub mod types;
pub mod wordlist;
