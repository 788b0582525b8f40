//! Output format of the run log.
//!
//! A run logs to standard error. CI pipelines and log shippers want one JSON
//! object per event; an operator at a terminal usually wants the compact
//! single-line form. The format is chosen with `--log-format` or
//! `FOUNDRY_LOG_FORMAT` and matched case-insensitively.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Rendering of run log events on standard error.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One flattened JSON object per event, carrying the plugin, component
    /// and tool fields as top-level keys.
    #[default]
    Json,
    /// One human-readable line per event.
    Compact,
}

/// Raised when `--log-format` names neither `json` nor `compact`.
pub type LogFormatParseError = strum::ParseError;
