//! Converts note archives into Org-mode documents.
//!
//! Each note's HTML content is tokenized, translated into Org markup and
//! written next to a directory holding its decoded attachments.

pub mod archive;
pub mod attachments;
pub mod note;
pub mod properties;
pub mod sanitize;
pub mod tokens;
pub mod translate;

pub use archive::{convert_archive, convert_note, output_dir_for, Summary};
pub use attachments::AttachmentResolver;
pub use note::{parse_archive, Note, Resource};
pub use tokens::{tokenize, TagName, Token};
pub use translate::translate;
