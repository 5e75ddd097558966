//! Per-model modem drivers.
//!
//! A driver bundles what differs between device families: the login and
//! command prompts, and the statistic catalog with its query commands. The
//! reader and scheduler are generic over [`ModemDriver`], and the concrete
//! driver is picked once at startup from a [`ModemModel`].

mod vigor130;

pub use vigor130::Vigor130;

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::catalog::{CommandGroup, Extraction, StatCatalog};
use crate::session::Prompts;

/// Capability of one device family.
pub trait ModemDriver {
    /// Human-readable model name for log lines.
    fn model(&self) -> &'static str;

    /// Prompts printed by the device's management interface.
    fn prompts(&self) -> Prompts;

    /// The statistics this device reports, in report order.
    fn catalog(&self) -> &StatCatalog;

    /// Command groups in the order they are queried each cycle.
    fn query_groups(&self) -> &[CommandGroup] {
        self.catalog().groups()
    }

    /// Applies the rules of `group` to that command's response.
    fn parse(&self, group: &CommandGroup, response: &str) -> Vec<Extraction> {
        self.catalog().extract(group, response)
    }
}

/// Supported device models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModemModel {
    #[default]
    Vigor130,
}

impl ModemModel {
    pub const ALL: &'static [ModemModel] = &[ModemModel::Vigor130];

    pub fn name(self) -> &'static str {
        match self {
            ModemModel::Vigor130 => "vigor130",
        }
    }
}

impl fmt::Display for ModemModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown modem model '{0}' (supported: vigor130)")]
pub struct UnknownModel(String);

impl FromStr for ModemModel {
    type Err = UnknownModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModemModel::ALL
            .iter()
            .copied()
            .find(|m| m.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownModel(s.to_string()))
    }
}
