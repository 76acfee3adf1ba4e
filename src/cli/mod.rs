//! Command-line arguments and the panel's line commands

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::error::ColorError;
use crate::models::Rgb;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Control panel for addressable LED strip controllers",
    long_about = "Mirrors the configuration of an LED strip controller over its HTTP API,\n\
                  keeps it fresh by polling, and pushes mode, brightness, color and strip edits back."
)]
pub struct Args {
    /// Configuration file (defaults to config/default.*)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Device base URL, overrides the configuration
    #[arg(short, long)]
    pub device: Option<String>,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Interactive panel (default)
    Panel,
    /// Print device configuration and status once
    Status,
    /// Serve an emulated device
    Emulate {
        /// Listen port, overrides the configuration
        #[arg(short, long)]
        port: Option<u16>,
    },
}

/// One line typed into the interactive panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelCommand {
    Mode(u8),
    Brightness(u8),
    Color(Rgb),
    Led { strip: u8, led: u16, color: Rgb },
    Enable { index: usize, enabled: bool },
    Count { index: usize, count: u16 },
    Save,
    Reload,
    Show,
    Help,
    Quit,
}

pub const PANEL_HELP: &str = "\
Commands:
  mode <n>                    select a pattern (255 = manual)
  brightness <0-255>          set brightness
  color #rrggbb | <r> <g> <b> set the strip color
  led <strip> <led> #rrggbb   set one LED (manual mode only)
  enable <strip> on|off       toggle a strip card
  count <strip> <n>           edit a strip's LED count (0-300)
  save                        send strip cards to the device
  reload                      re-read the device configuration
  show                        print the panel again
  help | quit";

impl PanelCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((&name, args)) = parts.split_first() else {
            return Err("empty command".to_string());
        };

        match (name.to_lowercase().as_str(), args) {
            ("mode", [mode]) => Ok(PanelCommand::Mode(parse_num(mode, "mode")?)),
            ("brightness", [value]) => {
                Ok(PanelCommand::Brightness(parse_num(value, "brightness")?))
            }
            ("color", [hex]) => Ok(PanelCommand::Color(Rgb::from_hex(hex).map_err(|e| e.to_string())?)),
            ("color", [r, g, b]) => Ok(PanelCommand::Color(
                parse_rgb(r, g, b).map_err(|e| e.to_string())?,
            )),
            ("led", [strip, led, hex]) => Ok(PanelCommand::Led {
                strip: parse_num(strip, "strip")?,
                led: parse_num(led, "led")?,
                color: Rgb::from_hex(hex).map_err(|e| e.to_string())?,
            }),
            ("enable", [index, state]) => Ok(PanelCommand::Enable {
                index: parse_num(index, "strip")?,
                enabled: parse_switch(state)?,
            }),
            ("count", [index, count]) => Ok(PanelCommand::Count {
                index: parse_num(index, "strip")?,
                count: parse_num(count, "count")?,
            }),
            ("save", []) => Ok(PanelCommand::Save),
            ("reload", []) => Ok(PanelCommand::Reload),
            ("show", []) => Ok(PanelCommand::Show),
            ("help", []) | ("?", []) => Ok(PanelCommand::Help),
            ("quit", []) | ("exit", []) => Ok(PanelCommand::Quit),
            _ => Err(format!("unknown command: {}", line.trim())),
        }
    }
}

fn parse_num<T: std::str::FromStr>(value: &str, what: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("invalid {}: {}", what, value))
}

fn parse_switch(value: &str) -> Result<bool, String> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        _ => Err(format!("expected on/off, got {}", value)),
    }
}

pub fn parse_rgb(r: &str, g: &str, b: &str) -> Result<Rgb, ColorError> {
    let channel = |v: &str| {
        v.parse::<u8>()
            .map_err(|_| ColorError::InvalidChannel(v.to_string()))
    };
    Ok(Rgb::new(channel(r)?, channel(g)?, channel(b)?))
}
