// Text processing: HTML stripping, language resources, and feature extraction.

pub mod features;
pub mod html;
pub mod language;
pub mod traits;
