//! Descriptor document configuration: schema and parsing.

pub mod parser;
pub mod schema;

pub use parser::{load_descriptor_document, parse_descriptor_document};
pub use schema::{AuthSpec, COMMON_BUCKET, DescriptorDocument, ServerDescriptor};
