use rand::Rng;

use super::{AllocationMatrix, IbpError, IbpParams};
use crate::dist::{Poisson, PoissonError};
use crate::traits::Sampleable;

/// The IBP generative process for a fixed number of customers.
///
/// Draws are [`AllocationMatrix`] realizations. The per-customer Poisson
/// arrival distributions are built (and validated) once at construction.
///
/// # Example
///
/// ```
/// use ibp::prior::{AllocationMatrix, Ibp, IbpParams};
/// use ibp::traits::*;
///
/// let ibp = Ibp::new(IbpParams::new(2.0, 1.5).unwrap(), 10).unwrap();
///
/// let mut rng = rand::thread_rng();
/// let z: AllocationMatrix = ibp.draw(&mut rng);
/// assert_eq!(z.n_customers(), 10);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Ibp {
    params: IbpParams,
    arrivals: Vec<Poisson>,
}

impl Ibp {
    pub fn new(params: IbpParams, n_customers: usize) -> Result<Self, IbpError> {
        let arrivals = (1..=n_customers)
            .map(|t| {
                let rate = params.new_dish_rate(t);
                Poisson::new(rate).map_err(|err| match err {
                    PoissonError::RateTooLow { .. } => {
                        IbpError::RateUnderflow { customer: t }
                    }
                    PoissonError::RateNotFinite { .. } => {
                        IbpError::RateNotFinite { customer: t, rate }
                    }
                })
            })
            .collect::<Result<Vec<Poisson>, IbpError>>()?;
        Ok(Ibp { params, arrivals })
    }

    #[inline]
    pub fn params(&self) -> &IbpParams {
        &self.params
    }

    #[inline]
    pub fn n_customers(&self) -> usize {
        self.arrivals.len()
    }
}

impl Sampleable<AllocationMatrix> for Ibp {
    fn draw<R: Rng>(&self, rng: &mut R) -> AllocationMatrix {
        let n = self.n_customers();
        let mut z = AllocationMatrix::new(n);
        // number of customers that took each dish so far
        let mut counts: Vec<u32> = Vec::new();

        for (ix, arrivals) in self.arrivals.iter().enumerate() {
            let t = ix + 1;
            for (k, m_k) in counts.iter_mut().enumerate() {
                let p = self.params.stick_update(f64::from(*m_k), t);
                if rng.gen::<f64>() < p {
                    z.set(ix, k);
                    *m_k += 1;
                }
            }

            let n_new: u32 = arrivals.draw(rng);
            for _ in 0..n_new {
                z.push_dish(ix);
                counts.push(1);
            }
        }
        z
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{Classify, ErrorKind};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    crate::test_basic_impls!(Ibp::new(IbpParams::new(1.0, 1.0).unwrap(), 3).unwrap());

    #[test]
    fn new_reports_underflowing_rate() {
        // α β / (t - 1 + β) rounds to zero from the second customer on
        let params = IbpParams::new(1E-300, 1E-300).unwrap();
        let err = Ibp::new(params, 3).unwrap_err();
        assert_eq!(err, IbpError::RateUnderflow { customer: 2 });
        assert_eq!(err.kind(), ErrorKind::NumericalInstability);
        assert!(err.to_string().contains("underflowed"));
    }

    #[test]
    fn no_customers_no_dishes() {
        let mut rng = Xoshiro256Plus::seed_from_u64(1);
        let ibp = Ibp::new(IbpParams::new(3.0, 1.0).unwrap(), 0).unwrap();
        let z: AllocationMatrix = ibp.draw(&mut rng);
        assert_eq!(z.n_customers(), 0);
        assert_eq!(z.n_dishes(), 0);
    }

    #[test]
    fn every_dish_is_taken_by_its_first_customer() {
        let mut rng = Xoshiro256Plus::seed_from_u64(2);
        let ibp = Ibp::new(IbpParams::new(3.0, 0.5).unwrap(), 12).unwrap();
        for _ in 0..20 {
            let z: AllocationMatrix = ibp.draw(&mut rng);
            assert!(z.dish_counts().iter().all(|&m| m >= 1));
        }
    }

    #[test]
    fn customers_take_alpha_dishes_on_average() {
        // Marginally every customer takes Poisson(α) dishes
        let mut rng = Xoshiro256Plus::seed_from_u64(3);
        let alpha = 2.5;
        let ibp = Ibp::new(IbpParams::new(alpha, 2.0).unwrap(), 6).unwrap();
        let n_draws = 20_000;
        let mut totals = vec![0_usize; 6];
        for _ in 0..n_draws {
            let z: AllocationMatrix = ibp.draw(&mut rng);
            for (t, total) in totals.iter_mut().enumerate() {
                *total += z.n_taken(t);
            }
        }
        for total in totals {
            let mean = total as f64 / n_draws as f64;
            assert!((mean - alpha).abs() < 0.1, "mean = {mean}");
        }
    }
}
