//! Word (.docx) templating
//!
//! - `package`: the zip container and its parts
//! - `xml`: owned XML tree used to edit parts
//! - `scanner`: `${name}` detection across runs
//! - `template`: placeholder replacement, tables, images and page size

pub mod package;
pub mod scanner;
mod template;
pub mod xml;

pub use package::DocxPackage;
pub use scanner::{find_placeholders, PlaceholderSpan};
pub use template::{
    DocxDocument, DocxImage, ImageType, InsertContext, InsertFn, Replacement, Replacements,
    A4_HEIGHT, A4_WIDTH,
};
pub use xml::{XmlElement, XmlNode};
