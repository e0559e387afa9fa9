//! Signal catalog and the named signal groups datasets are built from.

use dp_types::{Machine, Signal, SignalKind};

/// Radial resolution of every profile signal.
pub const PROFILE_CHANNELS: usize = 128;

const JD: &[Machine] = &[Machine::Jet, Machine::D3d];
const D: &[Machine] = &[Machine::D3d];

/// Look up a signal definition by its catalog key.
pub fn signal(key: &str) -> Option<Signal> {
    let scalar = |description: &str, machines: &[Machine]| Some(Signal::scalar(description, machines));
    let profile = |description: &str, machines: &[Machine]| {
        Some(Signal::profile(description, machines, PROFILE_CHANNELS))
    };

    match key {
        "q95" => scalar("q95 safety factor", JD),
        "li" => scalar("internal inductance", JD),
        "ip" => scalar("plasma current", JD),
        "ipori" => scalar("plasma current (uncorrected)", D),
        "iptarget" => scalar("plasma current target", D),
        "iperr" => scalar("plasma current error", D),
        "ipdirect" => scalar("plasma current direction", D),
        "lm" => scalar("Locked mode amplitude", JD),
        "dens" => scalar("Plasma density", JD),
        "energy" => scalar("stored energy", JD),
        "pin" => scalar("Input Power (beam for d3d)", JD),
        "pradcore" => scalar("Radiated Power Core", JD),
        "pradedge" => scalar("Radiated Power Edge", JD),
        "betan" => scalar("Normalized Beta", JD),
        "torquein" => scalar("Input Beam Torque", D),
        "pechin" => scalar("ECH input power, not always on", D),
        "tmamp1" => scalar("Tearing Mode amplitude (rotating 2/1)", D),
        "tmamp2" => scalar("Tearing Mode amplitude (rotating 3/2)", D),
        "tmfreq1" => scalar("Tearing Mode frequency (rotating 2/1)", D),
        "tmfreq2" => scalar("Tearing Mode frequency (rotating 3/2)", D),
        "qmin" => scalar("Minimum safety factor", D),
        "n1_rms" => scalar("n1 finite frequency signals", D),
        "n1_rms_no_shift" => scalar("n1 finite frequency signals no shift", D),
        "q95_EFITRT1" => scalar("q95 safety factor in real time", D),

        "q95t" => scalar("q95 safety factor (gar18)", D),
        "lit" => scalar("internal inductance (gar18)", D),
        "ipt" => scalar("plasma current (gar18)", D),
        "lmt" => scalar("Locked mode amplitude (gar18)", D),
        "betant" => scalar("Normalized Beta (gar18)", D),
        "energyt" => scalar("stored energy (gar18)", D),
        "denst" => scalar("Plasma density (gar18)", D),
        "pradcoret" => scalar("Radiated Power Core (gar18)", D),
        "pradedget" => scalar("Radiated Power Edge (gar18)", D),
        "pint" => scalar("Input Power (gar18)", D),
        "torqueint" => scalar("Input Beam Torque (gar18)", D),
        "ipdirectt" => scalar("plasma current direction (gar18)", D),
        "iptargett" => scalar("plasma current target (gar18)", D),
        "iperrt" => scalar("plasma current error (gar18)", D),

        "etemp_profile" => profile("Electron temperature profile", JD),
        "edens_profile" => profile("Electron density profile", JD),
        "etemp_profilet" => profile("Electron temperature profile (gar18)", D),
        "edens_profilet" => profile("Electron density profile (gar18)", D),
        "etemp_profile_thomson" => profile("Electron temperature profile (Thomson)", D),
        "edens_profile_thomson" => profile("Electron density profile (Thomson)", D),
        "itemp_profile" => profile("Ion temperature profile", D),
        "zdens_profile" => profile("Impurity density profile", D),
        "trot_profile" => profile("Rotation profile", D),
        "pthm_profile" => profile("Thermal pressure profile", D),
        "neut_profile" => profile("Neutrals profile", D),
        "q_profile" => profile("Safety factor profile", D),
        "bootstrap_current_profile" => profile("Bootstrap current profile", D),
        "q_psi_profile" => profile("Safety factor profile (psi grid)", D),
        _ => None,
    }
}

/// Standard D3D training signals, in dictionary order.
pub const STANDARD_KEYS: &[&str] = &[
    "q95", "li", "ip", "lm", "betan", "energy", "dens", "pradcore", "pradedge", "pin",
    "torquein", "ipdirect", "iptarget", "iperr", "etemp_profile", "edens_profile",
];

const EXTRA_KEYS: &[&str] = &[
    "pechin", "tmamp1", "tmamp2", "tmfreq1", "tmfreq2", "itemp_profile", "zdens_profile",
    "trot_profile", "pthm_profile", "neut_profile", "q_profile", "bootstrap_current_profile",
    "q_psi_profile",
];

pub(crate) const GAR18_KEYS: &[&str] = &[
    "q95t", "lit", "ipt", "lmt", "betant", "energyt", "denst", "pradcoret", "pradedget", "pint",
    "torqueint", "ipdirectt", "iptargett", "iperrt", "etemp_profilet", "edens_profilet",
];

/// Named collections of signals. Every dataset hashes one of these to name
/// its normalization and preprocessing artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalGroup {
    All,
    Gar18,
    N1rms,
    N1rmsQmin,
    Thomson,
    RealTime,
    RealTime0D,
    Ori,
    Jet,
    Jet0D,
    Jet1D,
    D3d,
    FullyDefined,
    FullyDefined0D,
    FullyDefined1D,
}

impl SignalGroup {
    /// Catalog keys of the group, in dictionary order.
    pub fn keys(&self) -> Vec<&'static str> {
        let all = || STANDARD_KEYS.iter().chain(EXTRA_KEYS).copied();
        match self {
            SignalGroup::All => all().collect(),
            SignalGroup::Gar18 => GAR18_KEYS.to_vec(),
            SignalGroup::N1rms => STANDARD_KEYS
                .iter()
                .copied()
                .chain(["n1_rms", "n1_rms_no_shift"])
                .collect(),
            SignalGroup::N1rmsQmin => std::iter::once("q95")
                .chain(["qmin"])
                .chain(STANDARD_KEYS.iter().copied().skip(1))
                .chain(["n1_rms", "n1_rms_no_shift"])
                .collect(),
            SignalGroup::Thomson => STANDARD_KEYS[..14]
                .iter()
                .copied()
                .chain(["etemp_profile_thomson", "edens_profile_thomson"])
                .collect(),
            SignalGroup::RealTime => std::iter::once("q95_EFITRT1")
                .chain(STANDARD_KEYS.iter().copied().skip(1))
                .collect(),
            SignalGroup::RealTime0D => std::iter::once("q95_EFITRT1")
                .chain(
                    STANDARD_KEYS[1..14]
                        .iter()
                        .copied()
                        .filter(|k| !matches!(*k, "pradcore" | "pradedge")),
                )
                .collect(),
            SignalGroup::Ori => STANDARD_KEYS
                .iter()
                .map(|k| if *k == "ip" { "ipori" } else { *k })
                .collect(),
            SignalGroup::Jet => Self::filtered(all(), |s| s.is_defined_on(Machine::Jet)),
            SignalGroup::Jet0D => Self::filtered(all(), |s| {
                s.is_defined_on(Machine::Jet) && s.kind == SignalKind::ZeroD
            }),
            SignalGroup::Jet1D => Self::filtered(all(), |s| {
                s.is_defined_on(Machine::Jet) && s.kind == SignalKind::Profile
            }),
            SignalGroup::D3d => Self::filtered(all(), |s| s.is_defined_on(Machine::D3d)),
            SignalGroup::FullyDefined => Self::filtered(all(), is_fully_defined),
            SignalGroup::FullyDefined0D => Self::filtered(all(), |s| {
                is_fully_defined(s) && s.kind == SignalKind::ZeroD
            }),
            SignalGroup::FullyDefined1D => Self::filtered(all(), |s| {
                is_fully_defined(s) && s.kind == SignalKind::Profile
            }),
        }
    }

    /// `(key, signal)` pairs of the group.
    pub fn entries(&self) -> Vec<(String, Signal)> {
        self.keys()
            .into_iter()
            .filter_map(|k| signal(k).map(|s| (k.to_string(), s)))
            .collect()
    }

    pub fn signals(&self) -> Vec<Signal> {
        self.entries().into_iter().map(|(_, s)| s).collect()
    }

    fn filtered<I, F>(keys: I, keep: F) -> Vec<&'static str>
    where
        I: Iterator<Item = &'static str>,
        F: Fn(&Signal) -> bool,
    {
        keys.filter(|k| signal(k).map_or(false, |s| keep(&s)))
            .collect()
    }
}

/// Defined on every machine with training data (JET and D3D).
fn is_fully_defined(signal: &Signal) -> bool {
    signal.is_defined_on(Machine::Jet) && signal.is_defined_on(Machine::D3d)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GROUPS: [SignalGroup; 15] = [
        SignalGroup::All,
        SignalGroup::Gar18,
        SignalGroup::N1rms,
        SignalGroup::N1rmsQmin,
        SignalGroup::Thomson,
        SignalGroup::RealTime,
        SignalGroup::RealTime0D,
        SignalGroup::Ori,
        SignalGroup::Jet,
        SignalGroup::Jet0D,
        SignalGroup::Jet1D,
        SignalGroup::D3d,
        SignalGroup::FullyDefined,
        SignalGroup::FullyDefined0D,
        SignalGroup::FullyDefined1D,
    ];

    #[test]
    fn every_group_key_is_in_catalog() {
        for group in GROUPS {
            for key in group.keys() {
                assert!(signal(key).is_some(), "{group:?} references unknown signal {key}");
            }
            assert!(!group.keys().is_empty(), "{group:?} is empty");
        }
    }

    #[test]
    fn jet_groups_split_by_dimension() {
        let zero_d = SignalGroup::Jet0D.signals();
        let one_d = SignalGroup::Jet1D.signals();
        assert!(zero_d.iter().all(|s| !s.is_profile()));
        assert!(one_d.iter().all(|s| s.is_profile()));
        assert_eq!(zero_d.len() + one_d.len(), SignalGroup::Jet.keys().len());
    }

    #[test]
    fn fully_defined_signals_exist_on_both_machines() {
        for s in SignalGroup::FullyDefined.signals() {
            assert!(s.is_defined_on(Machine::Jet) && s.is_defined_on(Machine::D3d));
        }
        assert!(!SignalGroup::FullyDefined.keys().contains(&"torquein"));
    }

    #[test]
    fn derived_groups() {
        let qmin = SignalGroup::N1rmsQmin.keys();
        assert_eq!(&qmin[..3], &["q95", "qmin", "li"]);
        assert_eq!(qmin.len(), 19);

        let rt0 = SignalGroup::RealTime0D.keys();
        assert_eq!(rt0[0], "q95_EFITRT1");
        assert_eq!(rt0.len(), 12);
        assert!(!rt0.contains(&"pradcore"));

        let ori = SignalGroup::Ori.keys();
        assert!(ori.contains(&"ipori") && !ori.contains(&"ip"));
    }

    #[test]
    fn profiles_have_radial_channels() {
        let s = signal("etemp_profile").unwrap();
        assert_eq!(s.num_channels, PROFILE_CHANNELS);
        assert_eq!(signal("q95").unwrap().num_channels, 1);
        assert!(signal("not_a_signal").is_none());
    }
}
