//! Small filesystem helpers shared by resources and tasks.
pub mod fs;
