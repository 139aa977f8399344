pub(crate) mod dispatch;
pub(crate) mod event;
pub(crate) mod handlers;
