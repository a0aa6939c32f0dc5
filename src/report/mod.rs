//! Report generation (JSON export/load, HTML rendering)

pub mod html;
pub mod json;
