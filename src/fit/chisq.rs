//! Fit-quality accumulator.

/// Chi-squared sum with its degree-of-freedom count.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Chisq {
    chisq: f64,
    ndof: i32,
}

impl Chisq {
    pub fn new(chisq: f64, ndof: i32) -> Self {
        Self { chisq, ndof }
    }

    pub fn chisq(&self) -> f64 {
        self.chisq
    }

    pub fn ndof(&self) -> i32 {
        self.ndof
    }

    pub fn chisq_per_ndof(&self) -> f64 {
        self.chisq / self.ndof.max(1) as f64
    }

    /// Account for fitted parameters by reducing the degree count.
    pub fn with_constrained(self, nparams: usize) -> Self {
        Self { chisq: self.chisq, ndof: self.ndof - nparams as i32 }
    }
}

impl std::ops::AddAssign<Chisq> for Chisq {
    fn add_assign(&mut self, other: Chisq) {
        self.chisq += other.chisq;
        self.ndof += other.ndof;
    }
}
