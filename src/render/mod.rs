pub(crate) mod backend;
pub(crate) mod draw;
