pub(crate) mod action;
pub(crate) mod ease;
pub(crate) mod run;
pub(crate) mod scheduler;
