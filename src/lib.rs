// Newscluster: groups related news articles published in the same window.
//
// This is the library root. Each module corresponds to one stage of the
// pipeline (text -> corpus -> cluster -> pipeline -> output) or to the
// storage and configuration around it.

pub mod cluster;
pub mod config;
pub mod corpus;
pub mod db;
pub mod ingest;
pub mod output;
pub mod pipeline;
pub mod status;
pub mod text;
