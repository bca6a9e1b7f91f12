pub mod category;
pub mod prompt;
