pub mod compositor;
pub mod fill;
pub mod shapes;
pub mod text;
