// SPDX-License-Identifier: PMPL-1.0-or-later

//! psk-audit: staged WPA/WPA2-PSK recovery auditing against captured
//! handshake hash artifacts, driven by an external cracking engine.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use psk_audit::config::{AuditConfig, Overrides};
use psk_audit::engine::HashcatEngine;
use psk_audit::orchestrator::Orchestrator;
use psk_audit::seed::{self, SeedValue};
use psk_audit::store::RecoveryStore;
use psk_audit::targets;
use psk_audit::telemetry::{self, JsonlLog, WordlistRecord};
use psk_audit::wordlist::{self, GeneratorPolicy, SynthReport};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "psk-audit")]
#[command(version)]
#[command(about = "Staged WPA/WPA2-PSK recovery auditing driven by an external cracking engine")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize a candidate wordlist from a seed document
    Wordlist {
        /// Seed facts document (JSON or YAML); built-in defaults when absent
        #[arg(short, long)]
        seeds: Option<PathBuf>,

        /// Output wordlist path
        #[arg(short, long)]
        output: PathBuf,

        /// Candidate policy
        #[arg(short, long, value_enum, default_value = "focused")]
        policy: PolicyArg,

        /// Configuration file (YAML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Working root
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Drive every discovered target through the staged attack plan
    Run {
        /// Configuration file (YAML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Working root (hashes/, wordlists/, lists/, rules/, ...)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Seed document used to synthesize missing targeted wordlists
        #[arg(long)]
        seeds: Option<PathBuf>,

        /// Alternate wordlist for the dictionary stages
        #[arg(long)]
        wordlist: Option<PathBuf>,

        /// Candidate policy used with --seeds
        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,
    },

    /// Print recoveries already present in the durable store
    Show {
        /// Configuration file (YAML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Working root
        #[arg(long)]
        root: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    Focused,
    Broad,
}

impl From<PolicyArg> for GeneratorPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Focused => GeneratorPolicy::focused(),
            PolicyArg::Broad => GeneratorPolicy::broad(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Wordlist {
            seeds,
            output,
            policy,
            config,
            root,
        } => cmd_wordlist(seeds, output, policy, config, root),
        Commands::Run {
            config,
            root,
            seeds,
            wordlist,
            policy,
        } => cmd_run(config, root, seeds, wordlist, policy),
        Commands::Show { config, root } => cmd_show(config, root),
    }
}

fn cmd_wordlist(
    seeds: Option<PathBuf>,
    output: PathBuf,
    policy: PolicyArg,
    config: Option<PathBuf>,
    root: Option<PathBuf>,
) -> Result<()> {
    let overrides = Overrides {
        root,
        policy: Some(policy.into()),
        ..Overrides::default()
    };
    let cfg = AuditConfig::resolve(config.as_deref(), &overrides)?;
    let facts = load_facts_or_default(seeds.as_deref());

    let report = wordlist::synthesize_to(&output, &facts, &cfg.policy)?;
    log_wordlist(&cfg, &report)?;
    println!(
        "{} {} candidates from {} tokens -> {}",
        "wordlist".green().bold(),
        report.candidates,
        report.tokens,
        report.output.display()
    );
    Ok(())
}

fn cmd_run(
    config: Option<PathBuf>,
    root: Option<PathBuf>,
    seeds: Option<PathBuf>,
    wordlist_alt: Option<PathBuf>,
    policy: Option<PolicyArg>,
) -> Result<()> {
    let overrides = Overrides {
        root,
        base_wordlist: wordlist_alt,
        policy: policy.map(Into::into),
        ..Overrides::default()
    };
    let cfg = AuditConfig::resolve(config.as_deref(), &overrides)?;

    // A missing engine is fatal before any invocation starts.
    let engine = HashcatEngine::locate(&cfg)?;
    if let Some(version) = engine.version() {
        println!("{} {}", "engine".cyan(), version);
    }

    let discovered = targets::discover(&cfg)?;
    if discovered.is_empty() {
        bail!("no targets found under {}", cfg.hashes_dir.display());
    }
    println!(
        "{} {} target(s) under {}",
        "discovered".cyan().bold(),
        discovered.len(),
        cfg.hashes_dir.display()
    );

    if let Some(seed_path) = seeds {
        let facts = load_facts_or_default(Some(&seed_path));
        for target in &discovered {
            let path = cfg.target_wordlist(&target.id);
            if path.is_file() {
                continue;
            }
            let report = wordlist::synthesize_to(&path, &facts, &cfg.policy)?;
            log_wordlist(&cfg, &report)?;
            println!(
                "{} {} candidates -> {}",
                "wordlist".green(),
                report.candidates,
                path.display()
            );
        }
    }

    let stage_log = JsonlLog::new(
        cfg.logs_dir
            .join(format!("stages-{}.jsonl", telemetry::run_id())),
    );
    let orchestrator = Orchestrator::new(&cfg, &engine, &engine, stage_log);
    let outcomes = orchestrator.run(&discovered)?;

    let summary_path = cfg.results_dir.join("summary.csv");
    telemetry::write_summary(&summary_path, &outcomes)?;
    telemetry::print_summary(&outcomes);
    println!("\nsummary written to {}", summary_path.display());
    Ok(())
}

fn cmd_show(config: Option<PathBuf>, root: Option<PathBuf>) -> Result<()> {
    let overrides = Overrides {
        root,
        ..Overrides::default()
    };
    let cfg = AuditConfig::resolve(config.as_deref(), &overrides)?;
    let engine = HashcatEngine::locate(&cfg)?;

    let discovered = targets::discover(&cfg)?;
    if discovered.is_empty() {
        bail!("no targets found under {}", cfg.hashes_dir.display());
    }

    for target in &discovered {
        match engine.query(target) {
            Ok(recovered) if recovered.is_empty() => {
                println!("{}: nothing recovered yet", target.label.dimmed());
            }
            Ok(recovered) => {
                println!("{}", target.label.green().bold());
                for plaintext in recovered {
                    println!("  {plaintext}");
                }
            }
            Err(err) => {
                eprintln!("{} {err}", "warning:".yellow().bold());
            }
        }
    }
    Ok(())
}

fn load_facts_or_default(path: Option<&std::path::Path>) -> Vec<SeedValue> {
    match path {
        Some(path) => {
            let (facts, warning) = seed::load_facts(path);
            if let Some(warning) = warning {
                eprintln!("{} {warning}", "warning:".yellow().bold());
            }
            facts
        }
        None => seed::default_facts(),
    }
}

fn log_wordlist(cfg: &AuditConfig, report: &SynthReport) -> Result<()> {
    let log = JsonlLog::new(cfg.logs_dir.join("wordlist.jsonl"));
    log.append(&WordlistRecord {
        ts: telemetry::now_rfc3339(),
        seeds: report.seeds,
        tokens: report.tokens,
        candidates: report.candidates,
        output: report.output.display().to_string(),
        sample: report.sample.clone(),
    })?;
    Ok(())
}
