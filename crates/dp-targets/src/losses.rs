//! Loss functions evaluated outside the training framework, used for
//! offline evaluation of saved predictions.

use dp_types::TargetError;

/// Predictions are clipped away from 0 and 1 before taking logarithms.
const CLIP_EPS: f64 = 1e-7;

fn check_lengths(y_true: &[f64], y_pred: &[f64]) -> Result<(), TargetError> {
    if y_true.len() != y_pred.len() {
        return Err(TargetError::LengthMismatch {
            expected: y_true.len(),
            actual: y_pred.len(),
        });
    }
    Ok(())
}

fn mean_of<F>(y_true: &[f64], y_pred: &[f64], f: F) -> Result<f64, TargetError>
where
    F: Fn(f64, f64) -> f64,
{
    check_lengths(y_true, y_pred)?;
    if y_true.is_empty() {
        return Ok(0.0);
    }
    let total: f64 = y_true.iter().zip(y_pred).map(|(&t, &p)| f(t, p)).sum();
    Ok(total / y_true.len() as f64)
}

pub fn mse_np(y_true: &[f64], y_pred: &[f64]) -> Result<f64, TargetError> {
    mean_of(y_true, y_pred, |t, p| (t - p).powi(2))
}

pub fn binary_crossentropy_np(y_true: &[f64], y_pred: &[f64]) -> Result<f64, TargetError> {
    mean_of(y_true, y_pred, |t, p| {
        let p = p.clamp(CLIP_EPS, 1.0 - CLIP_EPS);
        -(t * p.ln() + (1.0 - t) * (1.0 - p).ln())
    })
}

/// Labels are expected in {-1, 1}.
pub fn hinge_np(y_true: &[f64], y_pred: &[f64]) -> Result<f64, TargetError> {
    mean_of(y_true, y_pred, |t, p| (1.0 - t * p).max(0.0))
}

pub fn squared_hinge_np(y_true: &[f64], y_pred: &[f64]) -> Result<f64, TargetError> {
    mean_of(y_true, y_pred, |t, p| (1.0 - t * p).max(0.0).powi(2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mse_of_known_values() {
        let loss = mse_np(&[1.0, 2.0, 3.0], &[1.0, 2.0, 5.0]).unwrap();
        assert!((loss - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn crossentropy_is_small_for_confident_correct_predictions() {
        let good = binary_crossentropy_np(&[1.0, 0.0], &[0.99, 0.01]).unwrap();
        let bad = binary_crossentropy_np(&[1.0, 0.0], &[0.01, 0.99]).unwrap();
        assert!(good < 0.02);
        assert!(bad > 4.0);
    }

    #[test]
    fn crossentropy_clips_saturated_predictions() {
        let loss = binary_crossentropy_np(&[1.0], &[0.0]).unwrap();
        assert!(loss.is_finite());
        assert!((loss - (-(CLIP_EPS.ln()))).abs() < 1e-9);
    }

    #[test]
    fn hinge_ignores_margins_beyond_one() {
        let loss = hinge_np(&[1.0, -1.0], &[2.0, -3.0]).unwrap();
        assert_eq!(loss, 0.0);

        let loss = hinge_np(&[1.0, -1.0], &[0.0, 0.5]).unwrap();
        assert!((loss - 1.25).abs() < 1e-12);

        let loss = squared_hinge_np(&[1.0, -1.0], &[0.0, 0.5]).unwrap();
        assert!((loss - (1.0 + 2.25) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn empty_inputs_have_zero_loss() {
        assert_eq!(mse_np(&[], &[]).unwrap(), 0.0);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let err = mse_np(&[1.0, 2.0], &[1.0]).unwrap_err();
        assert_eq!(err, TargetError::LengthMismatch { expected: 2, actual: 1 });
    }
}
