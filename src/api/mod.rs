pub(crate) mod admin;
pub(crate) mod auth;
pub(crate) mod classify;
pub(crate) mod complaints;
pub(crate) mod drafts;
pub(crate) mod errors;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod pagination;
pub(crate) mod router;
pub(crate) mod users;
pub(crate) mod validation;
