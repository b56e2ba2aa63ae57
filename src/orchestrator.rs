// SPDX-License-Identifier: PMPL-1.0-or-later

//! The per-target attack state machine.
//!
//! Targets run strictly one after another, stages in plan order, and
//! invocations within a stage in order — the engine process, the durable
//! store, and the session checkpoints are shared mutable resources, so the
//! sequential scheduler is what makes them safe to share without locks.
//!
//! Recovery detection is a diff against the durable store: the known-set is
//! re-queried after every invocation, and anything new relative to the
//! stage baseline stops the stage and marks the target found.

use crate::config::AuditConfig;
use crate::engine::Engine;
use crate::error::Result;
use crate::plan::{standard_plan, Stage};
use crate::store::RecoveryStore;
use crate::telemetry::{JsonlLog, StageRecord};
use crate::types::{EngineExit, EngineStatus, StageResult, Target, TargetOutcome};
use colored::Colorize;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

pub struct Orchestrator<'a> {
    cfg: &'a AuditConfig,
    engine: &'a dyn Engine,
    store: &'a dyn RecoveryStore,
    stage_log: JsonlLog,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        cfg: &'a AuditConfig,
        engine: &'a dyn Engine,
        store: &'a dyn RecoveryStore,
        stage_log: JsonlLog,
    ) -> Self {
        Self {
            cfg,
            engine,
            store,
            stage_log,
        }
    }

    /// Drive every target through the plan, in discovery order. Returns one
    /// outcome row per target regardless of how each one ends.
    pub fn run(&self, targets: &[Target]) -> Result<Vec<TargetOutcome>> {
        let plan = standard_plan();
        let mut outcomes = Vec::with_capacity(targets.len());
        for target in targets {
            println!("{} {}", "auditing".cyan().bold(), target.label);
            outcomes.push(self.audit_target(target, &plan)?);
        }
        Ok(outcomes)
    }

    fn audit_target(&self, target: &Target, plan: &[Stage]) -> Result<TargetOutcome> {
        let mut known = self.query_known(target, None);
        let mut outcome = TargetOutcome {
            label: target.label.clone(),
            found: false,
            stage: None,
            guess: None,
            elapsed_secs: 0,
        };
        let mut elapsed = Duration::ZERO;

        for stage in plan {
            let result = self.run_stage(target, stage, &mut known)?;
            elapsed += result.duration;

            if !result.recovered.is_empty() {
                println!(
                    "  {} {} recovered at stage {}",
                    "found".green().bold(),
                    target.label,
                    stage.id
                );
                outcome.found = true;
                outcome.stage = Some(result.stage.to_string());
                outcome.guess = result.recovered.first().cloned();
                break;
            }
        }

        outcome.elapsed_secs = elapsed.as_secs();
        Ok(outcome)
    }

    /// Execute one stage's invocations in order, stopping on the first new
    /// recovery, and append its telemetry record.
    fn run_stage(
        &self,
        target: &Target,
        stage: &Stage,
        known: &mut BTreeSet<String>,
    ) -> Result<StageResult> {
        let invocations = stage.invocations(target, self.cfg);
        let started = Instant::now();

        if invocations.is_empty() {
            println!("  {} {} (precondition unmet)", "skip".yellow(), stage.id);
            let result = StageResult {
                stage: stage.id,
                duration: started.elapsed(),
                recovered: Vec::new(),
                skipped: true,
                last_status: None,
            };
            self.log_stage(target, &result)?;
            return Ok(result);
        }

        let mut recovered: Vec<String> = Vec::new();
        let mut last_status: Option<EngineStatus> = None;
        for invocation in &invocations {
            println!(
                "  {} {} (session {})",
                "stage".cyan(),
                stage.id,
                invocation.session
            );
            match self.engine.run(target, invocation) {
                Ok(report) => {
                    if report.resumed {
                        println!("    resuming existing session checkpoint");
                    }
                    if report.last_status.is_some() {
                        last_status = report.last_status;
                    }
                    if let EngineExit::Error(code) = report.exit {
                        eprintln!(
                            "  {} session {} exited with {code}: {}",
                            "warning:".yellow().bold(),
                            invocation.session,
                            report.stderr_tail.join(" | ")
                        );
                    }
                }
                // A failed invocation is a warning; the recovery query
                // below still decides the outcome.
                Err(err) => {
                    eprintln!("  {} {err}", "warning:".yellow().bold());
                }
            }

            let current = self.query_known(target, Some(known));
            recovered = current.difference(known).cloned().collect();
            *known = current;
            if !recovered.is_empty() {
                break;
            }
        }

        let result = StageResult {
            stage: stage.id,
            duration: started.elapsed(),
            recovered,
            skipped: false,
            last_status,
        };
        self.log_stage(target, &result)?;
        Ok(result)
    }

    /// Query the durable store. Failures are warnings: the previous
    /// known-set stands and the run continues.
    fn query_known(
        &self,
        target: &Target,
        prior: Option<&BTreeSet<String>>,
    ) -> BTreeSet<String> {
        match self.store.query(target) {
            Ok(current) => current,
            Err(err) => {
                eprintln!("  {} {err}", "warning:".yellow().bold());
                prior.cloned().unwrap_or_default()
            }
        }
    }

    fn log_stage(&self, target: &Target, result: &StageResult) -> Result<()> {
        self.stage_log.append(&StageRecord::new(
            &target.label,
            &target.fingerprint,
            result.stage,
            result.duration,
            result.recovered.len(),
            result.skipped,
            result.last_status,
        ))
    }
}
