//! Vision-HID Bridge control node: entry point.
//!
//! Types text into a target machine through the USB HID gadget and confirms
//! it through screen read-back.
//!
//! # Usage
//!
//! ```text
//! vision-hid-node [OPTIONS] <COMMAND>
//!
//! Commands:
//!   type           Type text, verifying it on screen unless --no-verify
//!   shortcut       Press a key chord such as CTRL+ALT+DELETE
//!   detect-layout  Probe the target's keyboard layout
//!   print-config   Print the effective configuration as TOML
//!
//! Options:
//!   --config <PATH>        Config file [default: ~/.config/vision-hid-bridge/config.toml]
//!   --device <PATH>        HID gadget device node
//!   --layout <auto|US|DE>  Startup layout, overriding the config file
//!   --vision-cmd <CMD>     Shell command printing the target's screen text
//!   --simulate <LAYOUT>    Drive an in-memory target with the given layout
//!   --drop-keystrokes <N>  Simulated target loses its next N keystrokes
//!   --json                 Machine-readable output
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable               | Flag            |
//! |------------------------|-----------------|
//! | `VISION_HID_CONFIG`    | `--config`      |
//! | `VISION_HID_DEVICE`    | `--device`      |
//! | `VISION_HID_LAYOUT`    | `--layout`      |
//! | `VISION_HID_VISION_CMD`| `--vision-cmd`  |
//! | `RUST_LOG`             | log filter      |
//!
//! # Exit status
//!
//! `0` on success, `2` when verified typing gave up after all attempts, `1`
//! for any other error.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use vision_hid_core::LayoutCode;
use vision_hid_node::application::control_node::{ControlNode, StartupLayout};
use vision_hid_node::application::inject_keys::{Clock, InjectionChannel};
use vision_hid_node::application::read_back::VisionSource;
use vision_hid_node::application::verify_injection::InjectionError;
use vision_hid_node::infrastructure::{
    clock::SystemClock,
    hid_gadget::HidGadgetChannel,
    simulation::SimulatedTarget,
    storage::config::{config_file_path, load_config_from, NodeConfig},
    vision::{CommandVision, UnavailableVision},
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Verified keystroke injection through a USB HID gadget.
#[derive(Debug, Parser)]
#[command(name = "vision-hid-node", version)]
struct Cli {
    /// Config file to load.
    #[arg(long, env = "VISION_HID_CONFIG")]
    config: Option<PathBuf>,

    /// HID gadget device node.
    #[arg(long, env = "VISION_HID_DEVICE")]
    device: Option<PathBuf>,

    /// Startup layout: `auto` probes the target, `US`/`DE` trust a fixed table.
    #[arg(long, env = "VISION_HID_LAYOUT")]
    layout: Option<StartupLayout>,

    /// Shell command printing the text currently on the target's screen.
    #[arg(long, env = "VISION_HID_VISION_CMD")]
    vision_cmd: Option<String>,

    /// Drive an in-memory target whose layout is LAYOUT instead of the gadget.
    #[arg(long, value_name = "LAYOUT")]
    simulate: Option<LayoutCode>,

    /// Make the simulated target lose its next N printable keystrokes.
    #[arg(long, value_name = "N", requires = "simulate")]
    drop_keystrokes: Option<usize>,

    /// Print results as JSON.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Type text, verifying it on screen.
    Type {
        text: String,
        /// Mean inter-key delay in milliseconds.
        #[arg(long)]
        delay_ms: Option<u64>,
        /// Type once without reading the screen back.
        #[arg(long)]
        no_verify: bool,
    },
    /// Press a key chord, e.g. `shortcut -m CTRL -m ALT DELETE`.
    Shortcut {
        /// Modifier: CTRL, ALT, SHIFT, GUI or RALT.  Repeatable.
        #[arg(short, long = "modifier")]
        modifiers: Vec<String>,
        /// Named key (ENTER, ESC, F5, ...) or a single character.
        key: String,
    },
    /// Probe the target's keyboard layout.
    DetectLayout {
        /// Switch to the detected layout and report it as active.
        #[arg(long)]
        apply: bool,
    },
    /// Print the effective configuration as TOML.
    PrintConfig,
}

impl Cli {
    /// Loads the config file and applies CLI overrides on top.
    fn resolve_config(&self) -> anyhow::Result<NodeConfig> {
        let path = match &self.config {
            Some(path) => path.clone(),
            None => config_file_path().context("no --config given and no default location")?,
        };
        let mut cfg = load_config_from(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?;

        if let Some(device) = &self.device {
            cfg.channel.device_path = device.clone();
        }
        if let Some(layout) = self.layout {
            cfg.layout.startup = layout;
        }
        if let Some(cmd) = &self.vision_cmd {
            cfg.vision.command = CommandVision::shell_argv(cmd);
        }
        Ok(cfg)
    }
}

fn build_node(cli: &Cli, cfg: &NodeConfig) -> ControlNode {
    let (channel, vision): (Arc<dyn InjectionChannel>, Arc<dyn VisionSource>) = match cli.simulate
    {
        Some(target_layout) => {
            info!(layout = %target_layout, "driving a simulated target");
            let target = Arc::new(SimulatedTarget::new(target_layout));
            if let Some(count) = cli.drop_keystrokes {
                target.drop_keystrokes(count);
            }
            (
                Arc::clone(&target) as Arc<dyn InjectionChannel>,
                target as Arc<dyn VisionSource>,
            )
        }
        None => {
            let channel = Arc::new(HidGadgetChannel::open(&cfg.channel.device_path));
            let vision: Arc<dyn VisionSource> = match CommandVision::from_argv(&cfg.vision.command) {
                Some(vision) => Arc::new(vision),
                None => Arc::new(UnavailableVision),
            };
            (channel as Arc<dyn InjectionChannel>, vision)
        }
    };
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    ControlNode::new(channel, vision, clock, cfg.node_settings())
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let cfg = cli.resolve_config()?;

    // Logs go to stderr so that stdout carries only results.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();
    debug!(?cfg, "effective configuration");

    if let Command::PrintConfig = cli.command {
        print!("{}", toml::to_string_pretty(&cfg).context("failed to render config")?);
        return Ok(ExitCode::SUCCESS);
    }

    let mut node = build_node(&cli, &cfg);

    match &cli.command {
        Command::Type {
            text,
            delay_ms,
            no_verify,
        } => {
            node.calibrate(cfg.layout.startup);
            run_type(&node, text, *delay_ms, !no_verify, cli.json)
        }
        Command::Shortcut { modifiers, key } => {
            node.calibrate(cfg.layout.startup);
            node.execute_shortcut(modifiers.as_slice(), key)
                .with_context(|| format!("shortcut {key} failed"))?;
            if cli.json {
                println!("{}", json!({ "status": "ok", "modifiers": modifiers, "key": key }));
            } else {
                println!("ok");
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::DetectLayout { apply } => {
            let detected = node.detect_layout();
            let active = if *apply {
                node.apply_layout(detected)
            } else {
                node.active_layout()
            };
            if cli.json {
                println!(
                    "{}",
                    json!({ "detected": detected.to_string(), "active": active.to_string() })
                );
            } else {
                println!("{detected}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::PrintConfig => Ok(ExitCode::SUCCESS),
    }
}

fn run_type(
    node: &ControlNode,
    text: &str,
    delay_ms: Option<u64>,
    verify: bool,
    as_json: bool,
) -> anyhow::Result<ExitCode> {
    match node.type_text(text, delay_ms, verify) {
        Ok(outcome) => {
            if as_json {
                println!(
                    "{}",
                    json!({
                        "status": "ok",
                        "outcome": outcome,
                        "layout": node.active_layout().to_string(),
                        "simulated": node.is_simulated(),
                    })
                );
            } else if outcome.verified {
                println!("verified after {} attempt(s)", outcome.attempts);
            } else {
                println!("typed {} character(s) without verification", outcome.characters);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(InjectionError::VerificationFailed { attempts, .. }) => {
            let audit = node.audit_trail();
            if as_json {
                println!(
                    "{}",
                    json!({ "status": "failed", "attempts": attempts, "audit": audit })
                );
            } else {
                println!("verification failed after {attempts} attempt(s)");
                for failure in &audit {
                    println!("  attempt {}: saw {:?}", failure.attempt, failure.observed.trim());
                }
            }
            Ok(ExitCode::from(2))
        }
        Err(e) => Err(e).context("type command failed"),
    }
}
