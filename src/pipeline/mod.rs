// Pipeline: orchestrates one clustering run from stored documents to a
// committed analysis.

pub mod analysis;
pub mod materialize;
