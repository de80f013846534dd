pub(crate) mod normalize;
pub(crate) mod store;
pub(crate) mod theme;
