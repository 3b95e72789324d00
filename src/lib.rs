#![allow(clippy::too_many_arguments)]

pub mod logger;

pub mod app;
pub mod canvas;
pub mod cli;
pub mod components;
pub mod error;
pub mod io;
pub mod ops;
pub mod project;
pub mod replay;
pub mod settings;

pub use app::{GesturePhase, InputEvent, KeyAction, PaintApp};
pub use canvas::{Color, PixelBuffer, PixelRect};
pub use components::tools::{PointerButton, Tool, ToolState};
pub use error::{PaintError, PaintResult};
