//! Finite mixtures of Galton-Watson processes.
//!
//! Each individual draws its offspring law from a fixed set of component
//! processes with the given probabilities. Differentiation is linear, so
//! the mixture PGF and all of its derivatives are the weighted sums of the
//! component ones.
//!
//! Components are merged by identity: passing the same `Arc` twice sums its
//! weights into one entry, while two separately built processes with equal
//! parameters stay distinct entries.

use std::sync::Arc;

use super::branching::BranchingProcess;
use super::stable::{is_close, DEFAULT_REL_TOL};
use crate::error::{Error, Result};

/// One weighted component of a mixture.
#[derive(Debug, Clone)]
pub struct MixtureComponent {
    pub process: Arc<BranchingProcess>,
    pub weight: f64,
}

/// Weighted mixture of branching processes.
#[derive(Debug, Clone)]
pub struct Mixture {
    components: Vec<MixtureComponent>,
}

impl Mixture {
    pub const NAME: &'static str = "Galton_Watson_Process_Mixture";

    /// Create a mixture from `(component, weight)` pairs.
    ///
    /// Every weight must be finite and strictly positive, and the weights
    /// must sum to 1 within the default relative tolerance.
    pub fn new<I>(components: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Arc<BranchingProcess>, f64)>,
    {
        let mut merged: Vec<MixtureComponent> = Vec::new();
        let mut total = 0.0;
        for (process, weight) in components {
            if !weight.is_finite() || weight <= 0.0 {
                return Err(Error::invalid("weight", weight, "must be finite and > 0"));
            }
            total += weight;
            match merged
                .iter_mut()
                .find(|c| Arc::ptr_eq(&c.process, &process))
            {
                Some(existing) => existing.weight += weight,
                None => merged.push(MixtureComponent { process, weight }),
            }
        }
        if merged.is_empty() {
            return Err(Error::invalid(
                "weights",
                0.0,
                "a mixture needs at least one component",
            ));
        }
        if !is_close(total, 1.0, DEFAULT_REL_TOL, 0.0) {
            return Err(Error::invalid("weights", total, "must sum to 1"));
        }
        Ok(Self { components: merged })
    }

    /// Components after merging, in first-appearance order.
    pub fn components(&self) -> &[MixtureComponent] {
        &self.components
    }

    /// `n`-th derivative of the mixture PGF at `s`.
    pub fn pgf(&self, s: f64, n: u32) -> f64 {
        self.components
            .iter()
            .map(|c| c.weight * c.process.pgf(s, n))
            .sum()
    }

    /// Weighted mean of the component means.
    pub fn mean(&self) -> f64 {
        self.components
            .iter()
            .map(|c| c.weight * c.process.expected_number_of_offspring())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::branching::BranchingProcessFactory;

    fn nb(r0: f64, k: f64) -> Arc<BranchingProcess> {
        Arc::new(BranchingProcessFactory::build(r0, Some(k)).unwrap())
    }

    #[test]
    fn repeated_component_weights_are_summed() {
        let bp0 = nb(2.0, 1.0);
        let mixture = Mixture::new([(Arc::clone(&bp0), 0.3), (Arc::clone(&bp0), 0.7)]).unwrap();
        assert_eq!(mixture.components().len(), 1);
        assert!((mixture.components()[0].weight - 1.0).abs() < 1e-15);
    }

    #[test]
    fn equal_parameters_are_not_merged() {
        let mixture = Mixture::new([(nb(2.0, 1.0), 0.5), (nb(2.0, 1.0), 0.5)]).unwrap();
        assert_eq!(mixture.components().len(), 2);
    }

    #[test]
    fn weights_must_sum_to_one() {
        for weights in [[0.25, 0.74], [0.25, 0.76]] {
            let err = Mixture::new([(nb(2.0, 1.0), weights[0]), (nb(1.5, 0.4), weights[1])])
                .unwrap_err();
            assert!(matches!(err, Error::InvalidParameter { name: "weights", .. }));
        }
    }

    #[test]
    fn weights_must_be_positive() {
        let err = Mixture::new([(nb(2.0, 1.0), 1.5), (nb(1.5, 0.4), -0.5)]).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "weight", .. }));
        let err = Mixture::new([(nb(2.0, 1.0), 1.0), (nb(1.5, 0.4), 0.0)]).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "weight", .. }));
    }

    #[test]
    fn empty_mixture_is_rejected() {
        let empty: Vec<(Arc<BranchingProcess>, f64)> = Vec::new();
        assert!(Mixture::new(empty).is_err());
    }

    #[test]
    fn pgf_is_weighted_sum() {
        let a = nb(2.0, 1.0);
        let b = nb(1.5, 0.4);
        let mixture = Mixture::new([(Arc::clone(&a), 0.25), (Arc::clone(&b), 0.75)]).unwrap();
        for n in 0..3 {
            let expected = 0.25 * a.pgf(0.5, n) + 0.75 * b.pgf(0.5, n);
            assert_eq!(mixture.pgf(0.5, n), expected);
        }
        assert!((mixture.mean() - 1.625).abs() < 1e-12);
    }
}
