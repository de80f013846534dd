pub(crate) mod capture;
pub(crate) mod pipeline;
pub(crate) mod progress;
