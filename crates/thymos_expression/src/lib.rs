mod render;

pub use render::{format_timestamp, intensity_word, render, RenderOptions};
