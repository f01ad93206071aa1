pub mod builtin;
pub mod sample_loader;
