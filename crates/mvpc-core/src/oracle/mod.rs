//! Conditional-independence oracles.
//!
//! Every discovery stage asks questions of the form "is `x` independent of `y`
//! given `z`, according to `data`?" through the [`IndependenceTest`] trait. The
//! stages never inspect how the answer is produced, so statistical tests,
//! known-answer oracles and plain closures are interchangeable.
//!
//! Two implementations ship with the crate:
//!
//! - [`GTest`]: an entropy-based likelihood-ratio test over test-wise-deleted
//!   rows, see [`information`].
//! - [`DSeparation`]: answers by d-separation in a known DAG, ignoring cell
//!   values. Used to exercise the pipeline with perfect answers.
pub mod dseparation;
pub mod information;

pub use dseparation::DSeparation;
pub use information::{GTest, conditional_entropy, conditional_mutual_information, entropy};

use crate::error::TestError;
use crate::table::Table;

/// A conditional-independence oracle.
///
/// Implementations must be shareable across threads: the skeleton search may
/// evaluate the tests of one depth round on a rayon pool.
///
/// Callers guarantee that `x`, `y` and `z` are pairwise disjoint.
pub trait IndependenceTest: Send + Sync {
    /// Returns `true` if `x` and `y` are judged independent given `z`.
    ///
    /// # Errors
    ///
    /// Returns [`TestError`] if a variable is unknown to the oracle or the
    /// test cannot be carried out.
    fn is_independent(
        &self,
        data: &Table,
        x: &[&str],
        y: &[&str],
        z: &[&str],
    ) -> Result<bool, TestError>;
}

impl<F> IndependenceTest for F
where
    F: Fn(&Table, &[&str], &[&str], &[&str]) -> bool + Send + Sync,
{
    fn is_independent(
        &self,
        data: &Table,
        x: &[&str],
        y: &[&str],
        z: &[&str],
    ) -> Result<bool, TestError> {
        Ok(self(data, x, y, z))
    }
}
