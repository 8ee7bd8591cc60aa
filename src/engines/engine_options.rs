//! Runtime-configurable engine options.

use std::time::Duration;

use crate::engines::engine_messages::{OptionDescriptor, OptionKind};
use crate::errors::{EngineError, EngineResult};
use crate::search::iterative_deepening::DEFAULT_QUIESCENCE_DEPTH;

pub const OPTION_PONDER: &str = "Ponder";
pub const OPTION_QUIESCENCE_DEPTH: &str = "QuiescenceDepth";
pub const OPTION_MOVE_OVERHEAD: &str = "MoveOverheadMs";
pub const OPTION_DEBUG_LOG: &str = "Debug Log";

const MAX_QUIESCENCE_DEPTH: u32 = 32;
const MAX_MOVE_OVERHEAD_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Advertised so GUIs send `go ponder`; the engine ponders either way.
    pub ponder: bool,
    pub quiescence_depth: u32,
    pub move_overhead: Duration,
    pub debug_log: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            ponder: false,
            quiescence_depth: DEFAULT_QUIESCENCE_DEPTH,
            move_overhead: Duration::ZERO,
            debug_log: false,
        }
    }
}

impl EngineOptions {
    pub fn descriptors(&self) -> Vec<OptionDescriptor> {
        vec![
            OptionDescriptor {
                name: OPTION_PONDER,
                kind: OptionKind::Check { default: self.ponder },
            },
            OptionDescriptor {
                name: OPTION_QUIESCENCE_DEPTH,
                kind: OptionKind::Spin {
                    default: i64::from(self.quiescence_depth),
                    min: 0,
                    max: i64::from(MAX_QUIESCENCE_DEPTH),
                },
            },
            OptionDescriptor {
                name: OPTION_MOVE_OVERHEAD,
                kind: OptionKind::Spin {
                    default: self.move_overhead.as_millis() as i64,
                    min: 0,
                    max: MAX_MOVE_OVERHEAD_MS as i64,
                },
            },
            OptionDescriptor {
                name: OPTION_DEBUG_LOG,
                kind: OptionKind::Check {
                    default: self.debug_log,
                },
            },
        ]
    }

    /// Updates one option. Names are case-insensitive.
    pub fn set(&mut self, name: &str, value: &str) -> EngineResult<()> {
        let invalid = || EngineError::InvalidOptionValue {
            name: name.to_owned(),
            value: value.to_owned(),
        };

        if name.eq_ignore_ascii_case(OPTION_PONDER) {
            self.ponder = parse_bool(value).ok_or_else(invalid)?;
        } else if name.eq_ignore_ascii_case(OPTION_QUIESCENCE_DEPTH) {
            let depth = value.trim().parse::<u32>().map_err(|_| invalid())?;
            if depth > MAX_QUIESCENCE_DEPTH {
                return Err(invalid());
            }
            self.quiescence_depth = depth;
        } else if name.eq_ignore_ascii_case(OPTION_MOVE_OVERHEAD) {
            let ms = value.trim().parse::<u64>().map_err(|_| invalid())?;
            if ms > MAX_MOVE_OVERHEAD_MS {
                return Err(invalid());
            }
            self.move_overhead = Duration::from_millis(ms);
        } else if name.eq_ignore_ascii_case(OPTION_DEBUG_LOG) {
            self.debug_log = parse_bool(value).ok_or_else(invalid)?;
        } else {
            return Err(EngineError::UnknownOption(name.to_owned()));
        }

        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
