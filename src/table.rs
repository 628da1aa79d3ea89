//! Customer-by-dish activation probability tables
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use nalgebra::DMatrix;

use crate::misc::padded_sq_err;

/// `P[t, k]`: the probability that customer `t` takes dish `k`.
///
/// Produced exactly by [`PriorRecursion`](crate::recursion::PriorRecursion)
/// and empirically by the [Monte Carlo simulator](crate::monte_carlo). Rows are
/// customers, columns dishes in arrival order. Dishes that have not arrived
/// yet for a given customer hold zero.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct ActivationTable {
    probs: DMatrix<f64>,
}

impl ActivationTable {
    /// Build from a matrix of probabilities. Returns `None` if any entry lies
    /// outside [0, 1].
    pub fn new(probs: DMatrix<f64>) -> Option<Self> {
        if probs.iter().all(|p| (0.0..=1.0).contains(p)) {
            Some(ActivationTable { probs })
        } else {
            None
        }
    }

    pub(crate) fn new_unchecked(probs: DMatrix<f64>) -> Self {
        ActivationTable { probs }
    }

    /// Build from ragged rows, padding short rows with zeros on the right
    pub(crate) fn from_ragged_rows(rows: &[Vec<f64>]) -> Self {
        let n_dishes = rows.iter().map(|row| row.len()).max().unwrap_or(0);
        let probs = DMatrix::from_fn(rows.len(), n_dishes, |t, k| {
            rows[t].get(k).copied().unwrap_or(0.0)
        });
        ActivationTable { probs }
    }

    /// An all-zero table
    pub fn zeros(n_customers: usize, n_dishes: usize) -> Self {
        ActivationTable {
            probs: DMatrix::zeros(n_customers, n_dishes),
        }
    }

    #[inline]
    pub fn n_customers(&self) -> usize {
        self.probs.nrows()
    }

    #[inline]
    pub fn n_dishes(&self) -> usize {
        self.probs.ncols()
    }

    /// `P[customer, dish]` (zero-based). Dishes past the table width have
    /// probability zero.
    pub fn get(&self, customer: usize, dish: usize) -> f64 {
        if dish < self.n_dishes() {
            self.probs[(customer, dish)]
        } else {
            0.0
        }
    }

    /// The probabilities for one customer
    pub fn row(&self, customer: usize) -> Vec<f64> {
        self.probs.row(customer).iter().copied().collect()
    }

    #[inline]
    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.probs
    }

    /// One past the last dish that any customer takes with non-zero
    /// probability.
    pub fn n_active_dishes(&self) -> usize {
        (0..self.n_dishes())
            .rev()
            .find(|&k| self.probs.column(k).iter().any(|&p| p > 0.0))
            .map_or(0, |k| k + 1)
    }

    /// Expected number of dishes each customer takes
    pub fn row_sums(&self) -> Vec<f64> {
        self.probs.row_iter().map(|row| row.sum()).collect()
    }

    /// `Σ_{t' < t} P[t', k]` for each customer `t`: the expected number of
    /// earlier customers that took dish `k`.
    pub fn running_mass(&self) -> DMatrix<f64> {
        let mut out = DMatrix::zeros(self.n_customers(), self.n_dishes());
        for t in 1..self.n_customers() {
            for k in 0..self.n_dishes() {
                out[(t, k)] = out[(t - 1, k)] + self.probs[(t - 1, k)];
            }
        }
        out
    }

    /// Squared error against `other`, summed over dishes and averaged over
    /// customers. The narrower table is padded with zeros.
    ///
    /// Returns `None` if the tables cover different numbers of customers.
    ///
    /// # Example
    ///
    /// ```
    /// use nalgebra::DMatrix;
    /// use ibp::table::ActivationTable;
    ///
    /// let a = ActivationTable::new(DMatrix::from_row_slice(2, 1, &[1.0, 0.5])).unwrap();
    /// let b = ActivationTable::new(DMatrix::from_row_slice(2, 2, &[1.0, 0.5, 0.5, 0.0])).unwrap();
    ///
    /// // row 0: 0.5^2, row 1: 0
    /// assert_eq!(a.sq_err(&b), Some(0.125));
    /// ```
    pub fn sq_err(&self, other: &ActivationTable) -> Option<f64> {
        if self.n_customers() != other.n_customers() {
            return None;
        }
        if self.n_customers() == 0 {
            return Some(0.0);
        }
        let total: f64 = (0..self.n_customers())
            .map(|t| padded_sq_err(&self.row(t), &other.row(t)))
            .sum();
        Some(total / self.n_customers() as f64)
    }
}
