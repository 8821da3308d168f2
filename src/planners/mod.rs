pub mod decoupled;
pub mod search;
