pub mod response;
pub mod text;
pub mod tracing_init;
