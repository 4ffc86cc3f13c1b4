pub mod profiles;
pub mod questions;
pub mod responses;
pub mod sessions;
