pub(crate) mod constraint;
pub(crate) mod solver;
