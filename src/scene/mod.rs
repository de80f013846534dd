pub(crate) mod build;
pub(crate) mod layout;
pub(crate) mod source;
