pub mod history;
pub mod text_tool;
pub mod tools;
