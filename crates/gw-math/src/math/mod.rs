//! Core math modules.

pub mod stable;
pub mod offspring;
pub mod branching;
pub mod mixture;
pub mod harris_sevastyanov;
pub mod laplace;
pub mod growth_rate;
pub mod skeleton;
pub mod fecundity;
