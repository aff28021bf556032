pub mod native;

// Re-export common types/functions for ergonomic imports
pub use native::*;
