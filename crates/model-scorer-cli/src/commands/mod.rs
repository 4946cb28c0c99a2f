pub mod predict;
pub mod versions;
