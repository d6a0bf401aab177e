pub mod epub_parser;
pub mod errors;
pub mod image_parser;
pub mod manifest;
pub mod models;
pub mod parser_trait;
pub mod sequence;
pub mod template;
pub mod utils;

pub use epub_parser::EpubParser;
pub use errors::ParseError;
pub use image_parser::{ImageSequenceOptions, ImageSequenceParser};
pub use manifest::ManifestExpander;
pub use parser_trait::Parser;
pub use sequence::SequenceDiscoverer;
pub use template::UrlTemplate;
