use num_traits::Zero;
use std::ops::AddAssign;

/// Cumulative sum of `xs`
///
/// # Example
///
/// ```rust
/// # use ibp::misc::cumsum;
/// let xs: Vec<f64> = vec![1.0, 0.5, 0.25];
/// assert_eq!(cumsum(&xs), vec![1.0, 1.5, 1.75]);
/// ```
pub fn cumsum<T>(xs: &[T]) -> Vec<T>
where
    T: AddAssign + Copy + Zero,
{
    xs.iter()
        .scan(T::zero(), |acc, &x| {
            *acc += x;
            Some(*acc)
        })
        .collect()
}

/// Cumulative product of `xs`
///
/// # Example
///
/// ```rust
/// # use ibp::misc::cumprod;
/// let sticks: Vec<f64> = vec![0.5, 0.5, 0.5];
/// assert_eq!(cumprod(&sticks), vec![0.5, 0.25, 0.125]);
/// ```
pub fn cumprod(xs: &[f64]) -> Vec<f64> {
    xs.iter()
        .scan(1.0, |acc, &x| {
            *acc *= x;
            Some(*acc)
        })
        .collect()
}

/// Safely compute `log(sum(exp(xs))`
///
/// Returns `None` if `xs` is empty.
pub fn logsumexp(xs: &[f64]) -> Option<f64> {
    match xs.len() {
        0 => None,
        1 => Some(xs[0]),
        _ => {
            let maxval = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            if maxval == f64::NEG_INFINITY {
                return Some(f64::NEG_INFINITY);
            }
            let sum = xs.iter().fold(0.0, |acc, x| acc + (x - maxval).exp());
            Some(sum.ln() + maxval)
        }
    }
}

/// Mean and population (ddof = 0) standard deviation of `xs`
///
/// Returns `None` if `xs` is empty.
///
/// # Example
///
/// ```rust
/// # use ibp::misc::mean_and_std;
/// let (mean, std) = mean_and_std(&[1.0, 3.0]).unwrap();
/// assert_eq!(mean, 2.0);
/// assert_eq!(std, 1.0);
/// ```
pub fn mean_and_std(xs: &[f64]) -> Option<(f64, f64)> {
    if xs.is_empty() {
        return None;
    }
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    Some((mean, var.sqrt()))
}

/// Mean and standard error of the mean of `xs`.
///
/// The standard error uses the sample (ddof = 1) standard deviation. A single
/// observation has a standard error of zero. Returns `None` if `xs` is empty.
pub fn mean_and_sem(xs: &[f64]) -> Option<(f64, f64)> {
    if xs.is_empty() {
        return None;
    }
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    if xs.len() == 1 {
        return Some((mean, 0.0));
    }
    let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some((mean, (var / n).sqrt()))
}

/// Sum of squared differences between `xs` and `ys`, treating missing
/// trailing entries of the shorter slice as zero.
pub fn padded_sq_err(xs: &[f64], ys: &[f64]) -> f64 {
    use itertools::EitherOrBoth::{Both, Left, Right};
    use itertools::Itertools;

    xs.iter()
        .zip_longest(ys.iter())
        .map(|pair| match pair {
            Both(x, y) => (x - y).powi(2),
            Left(x) | Right(x) => x.powi(2),
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1E-12;

    #[test]
    fn cumsum_of_empty_is_empty() {
        let xs: Vec<f64> = vec![];
        assert!(cumsum(&xs).is_empty());
    }

    #[test]
    fn cumprod_of_ones_is_ones() {
        assert_eq!(cumprod(&[1.0; 4]), vec![1.0; 4]);
    }

    #[test]
    fn logsumexp_on_vector_of_zeros() {
        let xs: Vec<f64> = vec![0.0; 5];
        // should be about log(5)
        assert::close(logsumexp(&xs).unwrap(), 1.609_437_912_434_100_3, TOL);
    }

    #[test]
    fn logsumexp_on_random_values() {
        let xs: Vec<f64> = vec![
            0.30415386,
            -0.07072296,
            -1.04287019,
            0.27855407,
            -0.81896765,
        ];
        assert::close(logsumexp(&xs).unwrap(), 1.482_000_789_426_305_9, TOL);
    }

    #[test]
    fn logsumexp_empty_is_none() {
        assert!(logsumexp(&[]).is_none());
    }

    #[test]
    fn logsumexp_all_neg_inf() {
        let xs = [f64::NEG_INFINITY, f64::NEG_INFINITY];
        assert_eq!(logsumexp(&xs), Some(f64::NEG_INFINITY));
    }

    #[test]
    fn mean_and_std_known_values() {
        let (mean, std) = mean_and_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert::close(mean, 5.0, TOL);
        assert::close(std, 2.0, TOL);
    }

    #[test]
    fn sem_uses_sample_std() {
        let (mean, sem) = mean_and_sem(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert::close(mean, 2.5, TOL);
        // sample var = 5/3, sem = sqrt(5/3 / 4)
        assert::close(sem, (5.0_f64 / 12.0).sqrt(), TOL);
    }

    #[test]
    fn sem_of_single_value_is_zero() {
        assert_eq!(mean_and_sem(&[3.2]), Some((3.2, 0.0)));
    }

    #[test]
    fn padded_sq_err_pads_with_zeros() {
        let xs = [1.0, 0.5];
        let ys = [1.0, 0.0, 0.25];
        assert::close(padded_sq_err(&xs, &ys), 0.25 + 0.0625, TOL);
        assert::close(padded_sq_err(&ys, &xs), 0.25 + 0.0625, TOL);
    }
}
