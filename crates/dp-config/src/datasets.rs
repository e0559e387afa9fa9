//! Declarative dataset table.
//!
//! Every `paths.data` identifier maps to the signal group it is hashed under,
//! the signals used for training, and the shot-list sets for the training and
//! test splits.

use dp_types::{ConfigError, Signal};
use std::fmt;
use std::str::FromStr;

use crate::shots::ShotSet;
use crate::signals::{signal, SignalGroup, GAR18_KEYS, STANDARD_KEYS};

/// Signals selected for training, keyed by the name the model sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseSignals {
    Group(SignalGroup),
    Keys(&'static [&'static str]),
    /// `(name, catalog key)` pairs; names may differ from catalog keys.
    Aliased(&'static [(&'static str, &'static str)]),
}

impl UseSignals {
    pub fn entries(&self) -> Vec<(String, Signal)> {
        match self {
            UseSignals::Group(group) => group.entries(),
            UseSignals::Keys(keys) => keys
                .iter()
                .filter_map(|k| signal(k).map(|s| (k.to_string(), s)))
                .collect(),
            UseSignals::Aliased(pairs) => pairs
                .iter()
                .filter_map(|(name, k)| signal(k).map(|s| (name.to_string(), s)))
                .collect(),
        }
    }
}

/// Everything the resolver needs to know about one dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetSpec {
    pub all_signals: SignalGroup,
    pub use_signals: UseSignals,
    pub shot_files: &'static [ShotSet],
    pub shot_files_test: &'static [ShotSet],
}

const D3D_0D_KEYS: &[&str] = &[
    "q95", "li", "ip", "lm", "betan", "energy", "dens", "pradcore", "pradedge", "pin",
    "torquein", "ipdirect", "iptarget", "iperr",
];

const ORI_KEYS: &[&str] = &[
    "q95", "li", "ipori", "lm", "betan", "energy", "dens", "pradcore", "pradedge", "pin",
    "torquein", "ipdirect", "iptarget", "iperr", "etemp_profile", "edens_profile",
];

const THOMSON_SIGNALS: &[(&str, &str)] = &[
    ("q95t", "q95"),
    ("lit", "li"),
    ("ipt", "ip"),
    ("lmt", "lm"),
    ("betant", "betan"),
    ("energyt", "energy"),
    ("denst", "dens"),
    ("pradcoret", "pradcore"),
    ("pradedget", "pradedge"),
    ("pint", "pin"),
    ("torqueint", "torquein"),
    ("ipdirectt", "ipdirect"),
    ("iptargett", "iptarget"),
    ("iperrt", "iperr"),
    ("etemp_profile_thomson", "etemp_profile_thomson"),
    ("edens_profile_thomson", "edens_profile_thomson"),
];

const N1RMS_KEYS: &[&str] = &[
    "q95", "li", "ip", "lm", "betan", "energy", "dens", "pradcore", "pradedge", "pin",
    "torquein", "ipdirect", "iptarget", "iperr", "etemp_profile", "edens_profile", "n1_rms",
    "n1_rms_no_shift",
];

const N1RMS_QMIN_KEYS: &[&str] = &[
    "q95", "qmin", "li", "ip", "lm", "betan", "energy", "dens", "pradcore", "pradedge", "pin",
    "torquein", "ipdirect", "iptarget", "iperr", "etemp_profile", "edens_profile", "n1_rms",
    "n1_rms_no_shift",
];

const REAL_TIME_KEYS: &[&str] = &[
    "q95_EFITRT1", "li", "ip", "lm", "betan", "energy", "dens", "pradcore", "pradedge", "pin",
    "torquein", "ipdirect", "iptarget", "iperr", "etemp_profile", "edens_profile",
];

const REAL_TIME_0D_KEYS: &[&str] = &[
    "q95_EFITRT1", "li", "ip", "lm", "betan", "energy", "dens", "pin", "torquein", "ipdirect",
    "iptarget", "iperr",
];

const D3D_1D_KEYS: &[&str] = &["ipdirect", "etemp_profile", "edens_profile"];

const D3D_ALL_PROFILES_KEYS: &[&str] = &[
    "ipdirect", "etemp_profile", "edens_profile", "itemp_profile", "zdens_profile",
    "trot_profile", "pthm_profile", "neut_profile", "q_profile", "bootstrap_current_profile",
    "q_psi_profile",
];

macro_rules! datasets {
    ($($variant:ident => $id:literal),+ $(,)?) => {
        /// Every known dataset identifier.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Dataset {
            $($variant),+
        }

        impl Dataset {
            pub const ALL: &'static [Dataset] = &[$(Dataset::$variant),+];

            pub fn id(&self) -> &'static str {
                match self {
                    $(Dataset::$variant => $id),+
                }
            }
        }
    };
}

datasets! {
    JetData => "jet_data",
    JetData0D => "jet_data_0D",
    JetData1D => "jet_data_1D",
    JetDataLate => "jet_data_late",
    JetDataCarbonToLate0D => "jet_data_carbon_to_late_0D",
    JetDataTempProfile => "jet_data_temp_profile",
    JetDataDensProfile => "jet_data_dens_profile",
    JetCarbonData => "jet_carbon_data",
    JetMixedData => "jet_mixed_data",
    JenkinsJet => "jenkins_jet",
    JetDataFullyDefined => "jet_data_fully_defined",
    JetDataFullyDefined0D => "jet_data_fully_defined_0D",
    D3dDataOri => "d3d_data_ori",
    D3dData => "d3d_data",
    D3dDataGar18 => "d3d_data_gar18",
    D3dDataGarbage => "d3d_data_garbage",
    D3dDataThomson => "d3d_data_thomson",
    D3dDataN1rmsQmin => "d3d_data_n1rms_qmin",
    D3dDataN1rms => "d3d_data_n1rms",
    D3dDataNew => "d3d_data_new",
    D3dDataRealTime => "d3d_data_real_time",
    D3dDataRealTime0D => "d3d_data_real_time_0D",
    D3dData1D => "d3d_data_1D",
    D3dDataAllProfiles => "d3d_data_all_profiles",
    D3dData0D => "d3d_data_0D",
    D3dDataAll => "d3d_data_all",
    JenkinsD3d => "jenkins_d3d",
    D3dDataFullyDefined => "d3d_data_fully_defined",
    D3dDataFullyDefined0D => "d3d_data_fully_defined_0D",
    D3dDataTempProfile => "d3d_data_temp_profile",
    D3dDataDensProfile => "d3d_data_dens_profile",
    JetToD3dData => "jet_to_d3d_data",
    D3dToJetData => "d3d_to_jet_data",
    D3dToLateJetData => "d3d_to_late_jet_data",
    JetToD3dData0D => "jet_to_d3d_data_0D",
    D3dToJetData0D => "d3d_to_jet_data_0D",
    JetToD3dData1D => "jet_to_d3d_data_1D",
    D3dToJetData1D => "d3d_to_jet_data_1D",
}

impl Dataset {
    /// Signal group whose hash names the dataset's normalization and
    /// preprocessing artifacts.
    pub fn all_signals_group(&self) -> SignalGroup {
        match self {
            Dataset::D3dDataGar18 | Dataset::D3dDataGarbage => SignalGroup::Gar18,
            Dataset::D3dDataN1rms => SignalGroup::N1rms,
            Dataset::D3dDataN1rmsQmin => SignalGroup::N1rmsQmin,
            Dataset::D3dDataThomson => SignalGroup::Thomson,
            Dataset::D3dDataRealTime => SignalGroup::RealTime,
            Dataset::D3dDataRealTime0D => SignalGroup::RealTime0D,
            Dataset::D3dDataOri => SignalGroup::Ori,
            _ => SignalGroup::All,
        }
    }

    /// The garbage and ori variants use twice the hash of their signal
    /// group. The reason is unknown; kept so existing artifacts resolve.
    pub fn hash_multiplier(&self) -> u128 {
        match self {
            Dataset::D3dDataGarbage | Dataset::D3dDataOri => 2,
            _ => 1,
        }
    }

    pub fn spec(&self) -> DatasetSpec {
        use Dataset::*;
        use ShotSet::*;

        fn split(
            use_signals: UseSignals,
            shot_files: &'static [ShotSet],
            shot_files_test: &'static [ShotSet],
        ) -> (UseSignals, &'static [ShotSet], &'static [ShotSet]) {
            (use_signals, shot_files, shot_files_test)
        }

        let (use_signals, shot_files, shot_files_test) =
            match self {
                JetData => split(UseSignals::Group(SignalGroup::Jet), &[JetCarbonWall], &[JetIterlikeWall]),
                JetData0D => split(UseSignals::Group(SignalGroup::Jet0D), &[JetCarbonWall], &[JetIterlikeWall]),
                JetData1D => split(UseSignals::Group(SignalGroup::Jet1D), &[JetCarbonWall], &[JetIterlikeWall]),
                JetDataLate => split(UseSignals::Group(SignalGroup::Jet), &[JetIterlikeWallLate], &[]),
                JetDataCarbonToLate0D => split(
                    UseSignals::Group(SignalGroup::Jet0D),
                    &[JetCarbonWall],
                    &[JetIterlikeWallLate],
                ),
                JetDataTempProfile => split(UseSignals::Keys(&["etemp_profile"]), &[JetCarbonWall], &[JetIterlikeWall]),
                JetDataDensProfile => split(UseSignals::Keys(&["edens_profile"]), &[JetCarbonWall], &[JetIterlikeWall]),
                JetCarbonData => split(UseSignals::Group(SignalGroup::Jet), &[JetCarbonWall], &[]),
                JetMixedData => split(UseSignals::Group(SignalGroup::Jet), &[JetFull], &[]),
                JenkinsJet => split(
                    UseSignals::Group(SignalGroup::Jet),
                    &[JenkinsJetCarbonWall],
                    &[JenkinsJetIterlikeWall],
                ),
                JetDataFullyDefined => split(
                    UseSignals::Group(SignalGroup::FullyDefined),
                    &[JetCarbonWall],
                    &[JetIterlikeWall],
                ),
                JetDataFullyDefined0D => split(
                    UseSignals::Group(SignalGroup::FullyDefined0D),
                    &[JetCarbonWall],
                    &[JetIterlikeWall],
                ),
                D3dDataOri => split(UseSignals::Keys(ORI_KEYS), &[D3dFull], &[]),
                D3dData => split(UseSignals::Keys(STANDARD_KEYS), &[D3dFull], &[]),
                D3dDataGar18 | D3dDataGarbage => split(UseSignals::Keys(GAR18_KEYS), &[D3dFullNew], &[]),
                D3dDataThomson => split(UseSignals::Aliased(THOMSON_SIGNALS), &[D3dFullNew], &[]),
                D3dDataN1rmsQmin => split(UseSignals::Keys(N1RMS_QMIN_KEYS), &[D3dFullNew], &[]),
                D3dDataN1rms => split(UseSignals::Keys(N1RMS_KEYS), &[D3dFullNew], &[]),
                D3dDataNew => split(UseSignals::Keys(STANDARD_KEYS), &[D3dFullNew], &[]),
                D3dDataRealTime => split(UseSignals::Keys(REAL_TIME_KEYS), &[D3dFullNew], &[]),
                D3dDataRealTime0D => split(UseSignals::Keys(REAL_TIME_0D_KEYS), &[D3dFullNew], &[]),
                D3dData1D => split(UseSignals::Keys(D3D_1D_KEYS), &[D3dFull], &[]),
                D3dDataAllProfiles => split(UseSignals::Keys(D3D_ALL_PROFILES_KEYS), &[D3dFull], &[]),
                D3dData0D => split(UseSignals::Keys(D3D_0D_KEYS), &[D3dFull], &[]),
                D3dDataAll => split(UseSignals::Group(SignalGroup::D3d), &[D3dFull], &[]),
                JenkinsD3d => split(UseSignals::Keys(STANDARD_KEYS), &[D3dJenkins], &[]),
                D3dDataFullyDefined => split(UseSignals::Group(SignalGroup::FullyDefined), &[D3dFull], &[]),
                D3dDataFullyDefined0D => split(UseSignals::Group(SignalGroup::FullyDefined0D), &[D3dFull], &[]),
                D3dDataTempProfile => split(UseSignals::Keys(&["etemp_profile"]), &[D3dFull], &[]),
                D3dDataDensProfile => split(UseSignals::Keys(&["edens_profile"]), &[D3dFull], &[]),
                JetToD3dData => split(UseSignals::Group(SignalGroup::FullyDefined), &[JetFull], &[D3dFull]),
                D3dToJetData => split(UseSignals::Group(SignalGroup::FullyDefined), &[D3dFull], &[JetIterlikeWall]),
                D3dToLateJetData => split(
                    UseSignals::Group(SignalGroup::FullyDefined),
                    &[D3dFull],
                    &[JetIterlikeWallLate],
                ),
                JetToD3dData0D => split(UseSignals::Group(SignalGroup::FullyDefined0D), &[JetFull], &[D3dFull]),
                D3dToJetData0D => split(
                    UseSignals::Group(SignalGroup::FullyDefined0D),
                    &[D3dFull],
                    &[JetIterlikeWall],
                ),
                JetToD3dData1D => split(UseSignals::Group(SignalGroup::FullyDefined1D), &[JetFull], &[D3dFull]),
                D3dToJetData1D => split(
                    UseSignals::Group(SignalGroup::FullyDefined1D),
                    &[D3dFull],
                    &[JetIterlikeWall],
                ),
            };

        DatasetSpec {
            all_signals: self.all_signals_group(),
            use_signals,
            shot_files,
            shot_files_test,
        }
    }
}

impl FromStr for Dataset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dataset::ALL
            .iter()
            .copied()
            .find(|d| d.id() == s)
            .ok_or_else(|| ConfigError::UnknownDataset {
                dataset: s.to_string(),
            })
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn table_is_exhaustive_and_consistent() {
        let mut ids = HashSet::new();
        for dataset in Dataset::ALL {
            assert!(ids.insert(dataset.id()), "duplicate id {}", dataset.id());
            assert_eq!(dataset.id().parse::<Dataset>().unwrap(), *dataset);

            let spec = dataset.spec();
            assert!(!spec.shot_files.is_empty(), "{dataset} has no training shots");
            let entries = spec.use_signals.entries();
            assert!(!entries.is_empty(), "{dataset} selects no signals");
            let expected_len = match spec.use_signals {
                UseSignals::Group(g) => g.keys().len(),
                UseSignals::Keys(keys) => keys.len(),
                UseSignals::Aliased(pairs) => pairs.len(),
            };
            assert_eq!(entries.len(), expected_len, "{dataset} references unknown signals");
        }
        assert_eq!(Dataset::ALL.len(), 38);
    }

    #[test]
    fn unknown_identifier() {
        let err = "d3d_data_nope".parse::<Dataset>().unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownDataset {
                dataset: "d3d_data_nope".to_string()
            }
        );
    }

    #[test]
    fn doubled_hash_variants() {
        for dataset in Dataset::ALL {
            let expected = match dataset {
                Dataset::D3dDataGarbage | Dataset::D3dDataOri => 2,
                _ => 1,
            };
            assert_eq!(dataset.hash_multiplier(), expected);
        }
        assert_eq!(Dataset::D3dDataGarbage.all_signals_group(), SignalGroup::Gar18);
    }

    #[test]
    fn thomson_uses_aliases() {
        let entries = Dataset::D3dDataThomson.spec().use_signals.entries();
        let (name, sig) = &entries[0];
        assert_eq!(name, "q95t");
        assert_eq!(sig.description, "q95 safety factor");
    }

    #[test]
    fn cross_machine_splits() {
        let spec = Dataset::JetToD3dData.spec();
        assert_eq!(spec.shot_files, &[ShotSet::JetFull]);
        assert_eq!(spec.shot_files_test, &[ShotSet::D3dFull]);
    }
}
