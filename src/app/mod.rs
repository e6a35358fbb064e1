pub mod export;

pub use export::{render, render_materials, OutputFormat};
