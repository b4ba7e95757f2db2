//! Monte Carlo expected value over lognormal terminal prices.
//!
//! Draws are independent and seeded, so a given (paths, seed) pair always
//! reproduces the same estimate.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

use super::probability::Lognormal;

/// Sample mean of a payoff with its standard error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvEstimate {
    /// Mean payoff across paths.
    pub mean: f64,
    /// Standard error of the mean.
    pub std_error: f64,
    /// Paths drawn.
    pub paths: u32,
}

/// Estimate E[payoff(S_T)] from `paths` seeded draws.
///
/// Uses Welford's running variance so large path counts stay numerically stable.
pub fn expected_value<F>(dist: &Lognormal, paths: u32, seed: u64, payoff: F) -> EvEstimate
where
    F: Fn(f64) -> f64,
{
    if paths == 0 {
        return EvEstimate {
            mean: 0.0,
            std_error: 0.0,
            paths,
        };
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut mean = 0.0;
    let mut m2 = 0.0;

    for i in 1..=paths {
        let z: f64 = StandardNormal.sample(&mut rng);
        let value = payoff(dist.terminal(z));
        let delta = value - mean;
        mean += delta / f64::from(i);
        m2 += delta * (value - mean);
    }

    let n = f64::from(paths);
    let std_error = if paths > 1 {
        (m2 / (n - 1.0)).sqrt() / n.sqrt()
    } else {
        0.0
    };

    EvEstimate {
        mean,
        std_error,
        paths,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OptionType;
    use crate::domain::fixtures::condor;

    fn dist() -> Lognormal {
        Lognormal {
            spot: 150.0,
            rate: 0.05,
            volatility: 0.25,
            time: 30.0 / 365.0,
        }
    }

    #[test]
    fn test_vanilla_within_one_percent_at_10k_paths() {
        let d = dist();
        let analytic = 100.0 * d.expected_intrinsic(OptionType::Call, 100.0);
        let est = expected_value(&d, 10_000, 42, |s| 100.0 * OptionType::Call.intrinsic(s, 100.0));
        assert!(
            (est.mean - analytic).abs() / analytic < 0.01,
            "mc {} vs analytic {analytic}",
            est.mean
        );
    }

    #[test]
    fn test_atm_within_standard_error() {
        let d = dist();
        let analytic = d.expected_intrinsic(OptionType::Put, 150.0);
        let est = expected_value(&d, 20_000, 7, |s| OptionType::Put.intrinsic(s, 150.0));
        assert!(est.std_error > 0.0);
        assert!(
            (est.mean - analytic).abs() < 4.0 * est.std_error,
            "mc {} ± {} vs analytic {analytic}",
            est.mean,
            est.std_error
        );
    }

    #[test]
    fn test_seed_reproducible() {
        let s = condor();
        let a = expected_value(&dist(), 5_000, 42, |x| s.payoff(x));
        let b = expected_value(&dist(), 5_000, 42, |x| s.payoff(x));
        let c = expected_value(&dist(), 5_000, 43, |x| s.payoff(x));
        assert_eq!(a, b);
        assert_ne!(a.mean, c.mean);
    }

    #[test]
    fn test_zero_paths() {
        let est = expected_value(&dist(), 0, 1, |x| x);
        assert_eq!(est.mean, 0.0);
        assert_eq!(est.paths, 0);
    }

    #[test]
    fn test_expired_distribution_is_constant() {
        let d = Lognormal { time: 0.0, ..dist() };
        let est = expected_value(&d, 100, 1, |x| x);
        assert!((est.mean - 150.0).abs() < 1e-9);
        assert!(est.std_error.abs() < 1e-9);
    }
}
