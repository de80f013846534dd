pub(crate) mod loop_search;
pub(crate) mod wave;
