pub mod config;
pub mod vector_math;
