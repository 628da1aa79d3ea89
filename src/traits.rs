//! Trait definitions
use rand::Rng;

/// An object with a density or mass function over `X`
pub trait HasDensity<X> {
    /// Probability function
    ///
    /// # Example
    ///
    /// ```
    /// use ibp::dist::Poisson;
    /// use ibp::traits::*;
    ///
    /// let pois = Poisson::new(2.0).unwrap();
    /// assert!(pois.f(&2_u32) > pois.f(&6_u32));
    /// ```
    fn f(&self, x: &X) -> f64 {
        self.ln_f(x).exp()
    }

    /// Log probability function
    fn ln_f(&self, x: &X) -> f64;
}

/// An object that can be drawn from
pub trait Sampleable<X> {
    /// Single draw
    fn draw<R: Rng>(&self, rng: &mut R) -> X;

    /// Multiple draws
    ///
    /// # Example
    ///
    /// ```
    /// use ibp::dist::Poisson;
    /// use ibp::traits::*;
    ///
    /// let pois = Poisson::new(3.0).unwrap();
    /// let mut rng = rand::thread_rng();
    /// let xs: Vec<u32> = pois.sample(22, &mut rng);
    ///
    /// assert_eq!(xs.len(), 22);
    /// ```
    fn sample<R: Rng>(&self, n: usize, mut rng: &mut R) -> Vec<X> {
        (0..n).map(|_| self.draw(&mut rng)).collect()
    }

    /// Create a never-ending iterator of samples
    fn sample_stream<'r, R: Rng>(
        &'r self,
        mut rng: &'r mut R,
    ) -> Box<dyn Iterator<Item = X> + 'r> {
        Box::new(std::iter::repeat_with(move || self.draw(&mut rng)))
    }
}

/// Cumulative distribution function
pub trait Cdf<X>: HasDensity<X> {
    /// The value of the Cumulative Density Function at `x`
    fn cdf(&self, x: &X) -> f64;

    /// Survival function, `1 - CDF(x)`
    fn sf(&self, x: &X) -> f64 {
        1.0 - self.cdf(x)
    }
}

pub trait Mean<X> {
    /// Returns `None` if the mean is undefined
    fn mean(&self) -> Option<X>;
}

pub trait Variance<X> {
    /// Returns `None` if the variance is undefined
    fn variance(&self) -> Option<X>;
}
