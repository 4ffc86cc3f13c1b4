//! Pure rating, scheduling and selection engine. Nothing here touches storage.

pub mod config;
pub mod estimate;
pub mod random;
pub mod rating;
pub mod repetition;
pub mod scoring;
pub mod selector;
pub mod session;
pub mod skills;
pub mod types;
