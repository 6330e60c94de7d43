/// Global stiffness assembly and the boundary / interior partition
pub mod assembly;
/// Dense direct solve of the interior system with Nalgebra's LU decomposition
pub mod nalgebra_solve;

use thiserror::Error;

/// Error type for assembly and the interior solve
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LinalgError {
    #[error("Interior stiffness block is singular; cannot solve for interior coordinates!")]
    SingularSystem,
    #[error(
        "Interior system ({size}x{size}) exceeds the maximum dense size ({max}x{max}); \
         cannot solve!"
    )]
    ProblemTooLarge { size: usize, max: usize },
    #[error("Matrix dimensions do not agree: expected {expected:?}, found {found:?}!")]
    DimensionMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
}
