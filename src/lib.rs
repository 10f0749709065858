//! xlbridge - Round-trip translation of Excel workbooks through plain text
//!
//! This crate extracts translatable text (cells, floating shapes and cell notes) from
//! an XLSX workbook into a line-oriented text file, and injects translated text back
//! into a copy of the original workbook. Only the XML parts that receive an edit are
//! rewritten; every other part of the package is copied byte-for-byte, so formatting,
//! formulas and embedded objects survive untouched.
//!
//! # Interchange Format
//!
//! ```text
//! # XlBridge Export
//! # Source: report.xlsx
//! # Date: 2024-05-01
//! # Encoding: UTF-8
//! # Cells: 2  Shapes: 1  Notes: 1
//!
//! [Sheet1]!A1|売上報告|Sales report|Báo cáo doanh thu
//! [Sheet1]!B2|1行目\n2行目
//! # -- shapes: Sheet1 --
//! [Sheet1]!shape:TextBox 1|注意事項
//! # -- notes: Sheet1 --
//! [Sheet1]!note:A1|確認済み
//! ```
//!
//! Column 1 is the original text, columns 2 and 3 are the optional English and
//! Vietnamese translations.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use xlbridge::{ExtractorBuilder, InjectorBuilder};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Extract every sheet, including shapes and notes
//!     let extractor = ExtractorBuilder::new().build()?;
//!     extractor.extract(Path::new("report.xlsx"), Path::new("report.txt"))?;
//!
//!     // ... translate report.txt ...
//!
//!     // Inject the English column into report_en.xlsx
//!     let injector = InjectorBuilder::new().with_language("en").build()?;
//!     let report = injector.inject(Path::new("report.xlsx"), Path::new("report.txt"))?;
//!     println!("{} entries applied", report.summary.applied);
//!
//!     Ok(())
//! }
//! ```
//!
//! # In-Memory Processing
//!
//! ```rust,no_run
//! use xlbridge::{interchange, ExtractorBuilder, InjectorBuilder};
//!
//! # fn main() -> Result<(), xlbridge::XlBridgeError> {
//! let workbook: Vec<u8> = std::fs::read("report.xlsx")?;
//!
//! let extraction = ExtractorBuilder::new()
//!     .with_sheets(vec!["Sheet1".to_string()])
//!     .include_notes(false)
//!     .build()?
//!     .extract_from_bytes("report.xlsx", workbook.clone())?;
//!
//! let parsed = interchange::parse_str(&extraction.lines.join("\n"));
//! let (patched, summary) = InjectorBuilder::new()
//!     .build()?
//!     .inject_entries(workbook, &parsed.entries)?;
//! assert_eq!(summary.applied, parsed.entries.len());
//! # let _ = patched;
//! # Ok(())
//! # }
//! ```

mod address;
mod api;
mod builder;
mod error;
mod extractor;
mod formatter;
mod injector;
pub mod interchange;
mod security;
mod selector;
mod summary;
mod types;
mod xlsx;

// 公開API
pub use address::parse_address;
pub use api::{Language, SheetSelector};
pub use builder::{ExtractorBuilder, InjectorBuilder};
pub use error::XlBridgeError;
pub use extractor::{Extraction, Extractor};
pub use injector::{default_output_path, InjectReport, Injector};
pub use selector::{select_value, Selection};
pub use summary::{ExtractSummary, InjectSummary, ParseStats};
pub use types::{Address, AddressKind, CellRef, Entry};
