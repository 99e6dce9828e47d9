//! Comment-preserving JSONC file format.
//!
//! # Data Flow
//! ```text
//! raw file text
//!     → parser.rs (strip comments, record trailing-comment ownership,
//!       drop trailing commas)
//!     → serde_json (structural parse)
//!     → Value adopted by the owning container
//!
//! On save:
//!     Value
//!     → serde_json pretty printer
//!     → writer.rs (header/footer blocks, comment reinsertion)
//!     → raw file text
//! ```
//!
//! # Design Decisions
//! - The parser is a character scanner, not a grammar: it only knows about
//!   strings, `//` and `/* */` comments, and trailing commas. Everything
//!   structural is serde_json's job.
//! - Comments are keyed by the property name they trail; the map is rebuilt
//!   wholesale on every successful parse.

pub mod parser;
pub mod writer;

pub use self::parser::ParsedDocument;
