pub(crate) mod driver;
pub(crate) mod snapshot;
pub(crate) mod stage;
pub(crate) mod transition;
