//! Interchange Format Module
//!
//! 翻訳用テキストファイル（UTF-8、1行1エントリ）の解析と書き出しを提供するモジュール。
//!
//! ```text
//! [SheetName]!A1|value               ← セル
//! [SheetName]!shape:TextBox 1|text   ← 図形 / テキストボックス
//! [SheetName]!note:A1|comment text   ← セルのメモ
//! [SheetName]!A1|原文|English|Tiếng Việt
//! ```
//!
//! 列区切りの `|` はエスケープされません。値の中の改行は `\n` の2文字で表現します。

mod parser;
mod writer;

pub use parser::{parse_file, parse_line, parse_str, LineOutcome, ParsedEntries};
pub use writer::{escape, format_entry_line, unescape, ExportHeader};
