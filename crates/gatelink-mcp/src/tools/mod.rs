//! MCP tools for gatelink

pub mod image;
pub mod ocr;
pub mod read;
pub mod search;

pub use image::{GenerateParams, ImageSize, UnderstandParams, handle_generate, handle_understand};
pub use ocr::{OcrParams, handle_ocr};
pub use read::{ReadParams, handle_read};
pub use search::{SearchParams, handle_search};

/// Names of every tool the server exposes, in listing order
pub const TOOL_NAMES: &[&str] = &[
    search::SEARCH_TOOL_NAME,
    read::READ_TOOL_NAME,
    image::UNDERSTAND_TOOL_NAME,
    image::GENERATE_TOOL_NAME,
    ocr::OCR_TOOL_NAME,
];
