//! Shot-list file sets. Reading the files themselves happens elsewhere; the
//! resolver only records which files make up each split.

use dp_types::Machine;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A group of shot-list files for one machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotListFiles {
    pub machine: Machine,
    pub prepath: String,
    pub paths: Vec<String>,
    pub description: String,
}

impl ShotListFiles {
    pub fn new(machine: Machine, prepath: &str, paths: &[&str], description: &str) -> Self {
        Self {
            machine,
            prepath: prepath.to_string(),
            paths: paths.iter().map(|p| p.to_string()).collect(),
            description: description.to_string(),
        }
    }

    /// Full file locations, `prepath` joined with each file name.
    pub fn full_paths(&self) -> Vec<PathBuf> {
        self.paths
            .iter()
            .map(|p| PathBuf::from(&self.prepath).join(p))
            .collect()
    }
}

/// The known shot-list sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShotSet {
    JetCarbonWall,
    JetIterlikeWall,
    JetIterlikeWallLate,
    JenkinsJetCarbonWall,
    JenkinsJetIterlikeWall,
    JetFull,
    D3dFull,
    D3dFullNew,
    D3dJenkins,
}

impl ShotSet {
    pub fn machine(&self) -> Machine {
        match self {
            ShotSet::D3dFull | ShotSet::D3dFullNew | ShotSet::D3dJenkins => Machine::D3d,
            _ => Machine::Jet,
        }
    }

    pub fn files(&self) -> &'static [&'static str] {
        match self {
            ShotSet::JetCarbonWall => &["CWall_clear.txt", "CFC_unint.txt"],
            ShotSet::JetIterlikeWall => &["ILW_unint.txt", "BeWall_clear.txt"],
            ShotSet::JetIterlikeWallLate => &["ILW_unint_late.txt", "ILW_clear_late.txt"],
            ShotSet::JenkinsJetCarbonWall => &["jenkins_CWall_clear.txt", "jenkins_CFC_unint.txt"],
            ShotSet::JenkinsJetIterlikeWall => {
                &["jenkins_ILW_unint.txt", "jenkins_BeWall_clear.txt"]
            }
            ShotSet::JetFull => &[
                "ILW_unint.txt",
                "BeWall_clear.txt",
                "CWall_clear.txt",
                "CFC_unint.txt",
            ],
            ShotSet::D3dFull => &["d3d_clear_data_avail.txt", "d3d_disrupt_data_avail.txt"],
            ShotSet::D3dFullNew => &["shots_since_2016_clear.txt", "shots_since_2016_disrupt.txt"],
            ShotSet::D3dJenkins => &["jenkins_d3d_clear.txt", "jenkins_d3d_disrupt.txt"],
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ShotSet::JetCarbonWall => "jet carbon wall data",
            ShotSet::JetIterlikeWall => "jet iter like wall data",
            ShotSet::JetIterlikeWallLate => "Late jet iter like wall data",
            ShotSet::JenkinsJetCarbonWall => "Subset of jet carbon wall data for Jenkins tests",
            ShotSet::JenkinsJetIterlikeWall => "Subset of jet iter like wall data for Jenkins tests",
            ShotSet::JetFull => "jet full data",
            ShotSet::D3dFull | ShotSet::D3dFullNew => "d3d data since shot 125500",
            ShotSet::D3dJenkins => "Subset of d3d data for Jenkins test",
        }
    }

    pub fn in_dir(&self, shot_list_dir: &str) -> ShotListFiles {
        ShotListFiles::new(self.machine(), shot_list_dir, self.files(), self.description())
    }
}
