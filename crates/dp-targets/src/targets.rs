//! Target strategies.

use dp_types::{ConfigError, TargetError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::grid::{linspace, logspace};
use crate::losses::{binary_crossentropy_np, hinge_np, mse_np};

/// Offset keeping the inverse-time label finite at the disruption itself.
pub const TTD_INV_EPS: f64 = 1e-4;

/// Output activation of the final model layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Linear,
    Sigmoid,
}

/// Training loss paired with a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Loss {
    Mse,
    BinaryCrossentropy,
    Hinge,
}

impl fmt::Display for Loss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Loss::Mse => "mse",
            Loss::BinaryCrossentropy => "binary_crossentropy",
            Loss::Hinge => "hinge",
        })
    }
}

/// How raw time-to-disruption is turned into a training label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// +1 inside the warning window, -1 outside.
    Hinge,
    /// 1 inside the warning window, 0 outside.
    Binary,
    /// Negated log10 time-to-disruption, saturated outside the window.
    Ttd,
    /// Inverse linear time-to-disruption, saturated outside the window.
    TtdInv,
    /// Remaining time in the warning window, 0 outside.
    TtdLinear,
}

impl Target {
    pub const ALL: [Target; 5] = [
        Target::Hinge,
        Target::Binary,
        Target::Ttd,
        Target::TtdInv,
        Target::TtdLinear,
    ];

    /// Pick the target for a configuration. Shallow models are trained
    /// against +1/-1 labels whatever `target` says.
    pub fn select(target: &str, shallow: bool) -> Result<Self, ConfigError> {
        if shallow {
            debug!("Shallow model requested, using hinge target");
            return Ok(Target::Hinge);
        }
        target.parse()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Target::Hinge => "hinge",
            Target::Binary => "binary",
            Target::Ttd => "ttd",
            Target::TtdInv => "ttdinv",
            Target::TtdLinear => "ttdlinear",
        }
    }

    pub fn activation(&self) -> Activation {
        match self {
            Target::Binary => Activation::Sigmoid,
            _ => Activation::Linear,
        }
    }

    pub fn loss(&self) -> Loss {
        match self {
            Target::Hinge => Loss::Hinge,
            Target::Binary => Loss::BinaryCrossentropy,
            Target::Ttd | Target::TtdInv | Target::TtdLinear => Loss::Mse,
        }
    }

    /// Map log10 time-to-disruption values to labels. The output has the
    /// same length as `ttd`.
    pub fn remapper(&self, ttd: &[f64], t_warning: f64) -> Result<Vec<f64>, TargetError> {
        let mut labels = ttd.to_vec();
        self.remap_in_place(&mut labels, t_warning)?;
        Ok(labels)
    }

    pub fn remap_in_place(&self, ttd: &mut [f64], t_warning: f64) -> Result<(), TargetError> {
        if !(t_warning > 0.0) {
            return Err(TargetError::NonPositiveWarning { t_warning });
        }
        let log_warning = t_warning.log10();

        // Comparisons are written `x < threshold` so NaN falls in the
        // not-imminent branch, matching a boolean mask and its complement.
        let f: Box<dyn Fn(f64) -> f64> = match self {
            Target::Binary => Box::new(move |x| if x < log_warning { 1.0 } else { 0.0 }),
            Target::Hinge => Box::new(move |x| if x < log_warning { 1.0 } else { -1.0 }),
            Target::Ttd => Box::new(move |x| if x < log_warning { -x } else { -log_warning }),
            Target::TtdInv => Box::new(move |x| {
                let linear = 10f64.powf(x);
                let clipped = if linear < t_warning { linear } else { t_warning };
                1.0 / (clipped + TTD_INV_EPS)
            }),
            Target::TtdLinear => Box::new(move |x| {
                let linear = 10f64.powf(x);
                if linear < t_warning {
                    t_warning - linear
                } else {
                    0.0
                }
            }),
        };

        for value in ttd.iter_mut() {
            *value = f(*value);
        }
        Ok(())
    }

    /// Candidate decision thresholds on this target's label scale.
    pub fn threshold_range(&self, t_warning: f64) -> Vec<f64> {
        match self {
            Target::Binary => logspace(-6.0, 0.0, 100),
            Target::Hinge => {
                let mut range = linspace(-2.0, -1.06, 100);
                range.extend(linspace(-1.06, -0.96, 100));
                range.extend(linspace(-0.96, 2.0, 50));
                range
            }
            Target::Ttd => linspace(-t_warning.log10(), 6.0, 100),
            Target::TtdInv | Target::TtdLinear => logspace(-6.0, t_warning.log10(), 100),
        }
    }

    /// Offline loss scaled by `loss_scale_factor`. The inverse-time target
    /// reports raw mse.
    pub fn loss_np(
        &self,
        y_true: &[f64],
        y_pred: &[f64],
        loss_scale_factor: f64,
    ) -> Result<f64, TargetError> {
        let raw = match self.loss() {
            Loss::Mse => mse_np(y_true, y_pred)?,
            Loss::BinaryCrossentropy => binary_crossentropy_np(y_true, y_pred)?,
            Loss::Hinge => hinge_np(y_true, y_pred)?,
        };
        Ok(match self {
            Target::TtdInv => raw,
            _ => loss_scale_factor * raw,
        })
    }
}

impl FromStr for Target {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Target::ALL
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| ConfigError::UnknownTarget {
                target: s.to_string(),
            })
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T_WARNING: f64 = 1.024;

    fn approaching_disruption() -> Vec<f64> {
        // log10 seconds, strictly decreasing: 1000 s down to 1 ms
        linspace(3.0, -3.0, 61)
    }

    #[test]
    fn labels_grow_as_disruption_approaches() {
        let ttd = approaching_disruption();
        for target in Target::ALL {
            let labels = target.remapper(&ttd, T_WARNING).unwrap();
            assert_eq!(labels.len(), ttd.len());
            for pair in labels.windows(2) {
                assert!(
                    pair[1] >= pair[0],
                    "{target} labels decreased: {} -> {}",
                    pair[0],
                    pair[1]
                );
            }
        }
    }

    #[test]
    fn binary_and_hinge_label_sets() {
        let ttd = approaching_disruption();
        let binary = Target::Binary.remapper(&ttd, T_WARNING).unwrap();
        assert!(binary.iter().all(|&v| v == 0.0 || v == 1.0));
        assert!(binary.contains(&0.0) && binary.contains(&1.0));

        let hinge = Target::Hinge.remapper(&ttd, T_WARNING).unwrap();
        assert!(hinge.iter().all(|&v| v == -1.0 || v == 1.0));
        assert!(hinge.contains(&-1.0) && hinge.contains(&1.0));
    }

    #[test]
    fn boundary_is_not_imminent() {
        let t_warning: f64 = 10.0;
        let boundary = [t_warning.log10()];
        assert_eq!(Target::Binary.remapper(&boundary, t_warning).unwrap(), vec![0.0]);
        assert_eq!(Target::Hinge.remapper(&boundary, t_warning).unwrap(), vec![-1.0]);
        assert_eq!(Target::TtdLinear.remapper(&boundary, t_warning).unwrap(), vec![0.0]);
    }

    #[test]
    fn ttd_saturates_outside_window() {
        let t_warning = 100.0; // log10 = 2
        let labels = Target::Ttd.remapper(&[5.0, 2.0, 1.0, -1.0], t_warning).unwrap();
        assert_eq!(labels, vec![-2.0, -2.0, -1.0, 1.0]);
    }

    #[test]
    fn ttd_inv_is_finite_at_disruption() {
        let t_warning = 1.0;
        let labels = Target::TtdInv
            .remapper(&[3.0, f64::NEG_INFINITY], t_warning)
            .unwrap();
        assert!((labels[0] - 1.0 / (1.0 + TTD_INV_EPS)).abs() < 1e-12);
        assert!((labels[1] - 1.0 / TTD_INV_EPS).abs() < 1e-6);
    }

    #[test]
    fn ttd_linear_counts_remaining_window() {
        let t_warning = 1.0;
        let labels = Target::TtdLinear
            .remapper(&[1.0, (0.25f64).log10()], t_warning)
            .unwrap();
        assert_eq!(labels[0], 0.0);
        assert!((labels[1] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn remap_in_place_matches_remapper() {
        let ttd = approaching_disruption();
        let mut buffer = ttd.clone();
        Target::TtdInv.remap_in_place(&mut buffer, T_WARNING).unwrap();
        assert_eq!(buffer, Target::TtdInv.remapper(&ttd, T_WARNING).unwrap());
    }

    #[test]
    fn non_positive_warning_window_rejected() {
        for t_warning in [0.0, -1.0, f64::NAN] {
            assert!(Target::Binary.remapper(&[0.0], t_warning).is_err());
        }
    }

    #[test]
    fn selection_by_name() {
        assert_eq!(Target::select("binary", false).unwrap(), Target::Binary);
        assert_eq!(Target::select("ttdinv", false).unwrap(), Target::TtdInv);
        assert_eq!(Target::select("ttdlinear", false).unwrap(), Target::TtdLinear);
        assert_eq!(Target::select("ttd", false).unwrap(), Target::Ttd);
        assert_eq!(Target::select("hinge", false).unwrap(), Target::Hinge);
    }

    #[test]
    fn shallow_model_forces_hinge() {
        assert_eq!(Target::select("ttd", true).unwrap(), Target::Hinge);
        assert_eq!(Target::select("whatever", true).unwrap(), Target::Hinge);
    }

    #[test]
    fn unknown_target_is_an_error() {
        let err = Target::select("maxhinge", false).unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownTarget {
                target: "maxhinge".to_string()
            }
        );
    }

    #[test]
    fn activation_and_loss_pairs() {
        assert_eq!(Target::Binary.activation(), Activation::Sigmoid);
        assert_eq!(Target::Binary.loss(), Loss::BinaryCrossentropy);
        assert_eq!(Target::Hinge.activation(), Activation::Linear);
        assert_eq!(Target::Hinge.loss(), Loss::Hinge);
        assert_eq!(Target::TtdLinear.loss().to_string(), "mse");
    }

    #[test]
    fn threshold_ranges() {
        let binary = Target::Binary.threshold_range(T_WARNING);
        assert_eq!(binary.len(), 100);
        assert_eq!(*binary.last().unwrap(), 1.0);

        let hinge = Target::Hinge.threshold_range(T_WARNING);
        assert_eq!(hinge.len(), 250);
        assert_eq!(hinge[0], -2.0);
        assert_eq!(*hinge.last().unwrap(), 2.0);

        let ttd = Target::Ttd.threshold_range(100.0);
        assert_eq!(ttd[0], -2.0);
        assert_eq!(*ttd.last().unwrap(), 6.0);

        let inv = Target::TtdInv.threshold_range(100.0);
        assert!((inv.last().unwrap() - 100.0).abs() < 1e-9);
        assert!(inv.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn loss_scaling() {
        let y_true = [1.0, 0.0];
        let y_pred = [0.0, 0.0];
        let scaled = Target::Ttd.loss_np(&y_true, &y_pred, 2.0).unwrap();
        assert!((scaled - 1.0).abs() < 1e-12);

        let unscaled = Target::TtdInv.loss_np(&y_true, &y_pred, 2.0).unwrap();
        assert!((unscaled - 0.5).abs() < 1e-12);

        let hinge = Target::Hinge.loss_np(&[1.0, -1.0], &[1.0, -1.0], 3.0).unwrap();
        assert_eq!(hinge, 0.0);
    }

    #[test]
    fn serde_names_match_config_strings() {
        let json = serde_json::to_string(&Target::TtdLinear).unwrap();
        assert_eq!(json, "\"ttdlinear\"");
        let loss = serde_json::to_string(&Loss::BinaryCrossentropy).unwrap();
        assert_eq!(loss, "\"binary_crossentropy\"");
    }
}
