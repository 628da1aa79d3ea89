//! Binary customer-by-dish allocation matrix
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use nalgebra::DMatrix;

/// A realization of the buffet: which customer took which dish.
///
/// Dishes are stored in the order they were first served. Columns are only
/// ever appended; a dish nobody takes any more is still kept.
///
/// # Example
///
/// ```
/// use ibp::prior::AllocationMatrix;
///
/// let mut z = AllocationMatrix::new(3);
/// let k = z.push_dish(0);
/// z.set(2, k);
/// z.push_dish(1);
///
/// assert_eq!(z.n_dishes(), 2);
/// assert!(z.get(0, 0) && !z.get(1, 0) && z.get(2, 0));
/// assert_eq!(z.dish_counts(), vec![2, 1]);
/// assert_eq!(z.n_dishes_after(0), 1);
/// assert_eq!(z.n_dishes_after(2), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct AllocationMatrix {
    n_customers: usize,
    /// `dishes[k][t]` is true iff customer `t` took dish `k`
    dishes: Vec<Vec<bool>>,
    /// The customer that first took each dish
    first_customer: Vec<usize>,
}

impl AllocationMatrix {
    /// An empty buffet for `n_customers` customers
    pub fn new(n_customers: usize) -> Self {
        AllocationMatrix {
            n_customers,
            dishes: Vec::new(),
            first_customer: Vec::new(),
        }
    }

    /// Build from rows of booleans. Returns `None` if the rows are ragged.
    ///
    /// The first customer to take a dish is recorded as its arrival; columns
    /// nobody took are recorded as arriving after the last customer.
    pub fn from_rows(rows: &[Vec<bool>]) -> Option<Self> {
        let n_customers = rows.len();
        let n_dishes = rows.first().map_or(0, |row| row.len());
        if rows.iter().any(|row| row.len() != n_dishes) {
            return None;
        }
        let dishes: Vec<Vec<bool>> = (0..n_dishes)
            .map(|k| rows.iter().map(|row| row[k]).collect())
            .collect();
        let first_customer = dishes
            .iter()
            .map(|col: &Vec<bool>| {
                col.iter().position(|&z| z).unwrap_or(n_customers)
            })
            .collect();
        Some(AllocationMatrix {
            n_customers,
            dishes,
            first_customer,
        })
    }

    #[inline]
    pub fn n_customers(&self) -> usize {
        self.n_customers
    }

    #[inline]
    pub fn n_dishes(&self) -> usize {
        self.dishes.len()
    }

    /// Append a new dish first served to `customer` and return its index
    pub fn push_dish(&mut self, customer: usize) -> usize {
        debug_assert!(customer < self.n_customers);
        let mut col = vec![false; self.n_customers];
        col[customer] = true;
        self.dishes.push(col);
        self.first_customer.push(customer);
        self.dishes.len() - 1
    }

    /// Append a dish nobody has taken yet and return its index. It counts as
    /// served once some customer takes it.
    pub fn push_empty_dish(&mut self) -> usize {
        self.dishes.push(vec![false; self.n_customers]);
        self.first_customer.push(self.n_customers);
        self.dishes.len() - 1
    }

    /// Record that `customer` took `dish`
    #[inline]
    pub fn set(&mut self, customer: usize, dish: usize) {
        self.dishes[dish][customer] = true;
        if customer < self.first_customer[dish] {
            self.first_customer[dish] = customer;
        }
    }

    /// Whether `customer` took `dish`. Out-of-range dishes were never taken.
    #[inline]
    pub fn get(&self, customer: usize, dish: usize) -> bool {
        self.dishes
            .get(dish)
            .map_or(false, |col| col[customer])
    }

    /// Number of customers that took each dish
    pub fn dish_counts(&self) -> Vec<usize> {
        self.dishes
            .iter()
            .map(|col| col.iter().filter(|&&z| z).count())
            .collect()
    }

    /// Number of dishes the customer took
    pub fn n_taken(&self, customer: usize) -> usize {
        self.dishes.iter().filter(|col| col[customer]).count()
    }

    /// Number of dishes served to customers `0..=customer`
    pub fn n_dishes_after(&self, customer: usize) -> usize {
        self.first_customer
            .iter()
            .filter(|&&first| first <= customer)
            .count()
    }

    /// The allocation as a real `n_customers x n_dishes` matrix of 0s and 1s
    pub fn to_dmatrix(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.n_customers, self.n_dishes(), |t, k| {
            if self.dishes[k][t] {
                1.0
            } else {
                0.0
            }
        })
    }
}
