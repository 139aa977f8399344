pub(crate) mod id;
pub(crate) mod kind;
pub(crate) mod store;
pub(crate) mod traverse;
