use serde::{Deserialize, Serialize};
use std::fmt;

/// Tokamak device a shot was recorded on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Machine {
    Jet,
    D3d,
    Nstx,
}

impl Machine {
    pub fn name(&self) -> &'static str {
        match self {
            Machine::Jet => "jet",
            Machine::D3d => "d3d",
            Machine::Nstx => "nstx",
        }
    }
}

impl fmt::Display for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Dimensionality of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    /// One scalar per time slice.
    ZeroD,
    /// A radial profile per time slice.
    Profile,
}

/// One measured time-series channel associated with a shot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signal {
    pub description: String,
    pub machines: Vec<Machine>,
    pub kind: SignalKind,
    pub num_channels: usize,
}

impl Signal {
    pub fn scalar(description: impl Into<String>, machines: &[Machine]) -> Self {
        Self {
            description: description.into(),
            machines: machines.to_vec(),
            kind: SignalKind::ZeroD,
            num_channels: 1,
        }
    }

    pub fn profile(description: impl Into<String>, machines: &[Machine], num_channels: usize) -> Self {
        Self {
            description: description.into(),
            machines: machines.to_vec(),
            kind: SignalKind::Profile,
            num_channels,
        }
    }

    pub fn is_defined_on(&self, machine: Machine) -> bool {
        self.machines.contains(&machine)
    }

    pub fn is_profile(&self) -> bool {
        self.kind == SignalKind::Profile
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

/// Sort signals by channel count so 1D profiles come last; the model
/// builder relies on this ordering. The sort is stable.
pub fn sort_by_channels(signals: &mut [Signal]) {
    signals.sort_by_key(|s| s.num_channels);
}
