//! Address Grammar Module
//!
//! 翻訳ファイルのデータ行 `[<sheet>]!<address>|<rest>` の文法と、
//! 3種類のアドレス（セル / 図形 / メモ）の判別を提供するモジュール。
//!
//! シート名は `[` から最初の `]!` までの最短一致です。
//! そのため `]!` を含むシート名はサポートされません（既知の制限）。

use std::sync::OnceLock;

use regex::Regex;

use crate::types::{Address, CellRef};

/// セルアドレス（例: `A1`, `BZ100`）
const CELL_ADDR: &str = r"[A-Za-z]+[0-9]+";

/// 図形アドレス（例: `shape:TextBox 1`）
const SHAPE_ADDR: &str = r"shape:[^|\r\n]+";

/// メモアドレス（例: `note:A1`）
const NOTE_ADDR: &str = r"note:[A-Za-z]+[0-9]+";

const SHAPE_PREFIX: &str = "shape:";
const NOTE_PREFIX: &str = "note:";

/// データ行の正規表現（両端アンカー）
fn line_pattern() -> &'static Regex {
    static LINE_RE: OnceLock<Regex> = OnceLock::new();
    LINE_RE.get_or_init(|| {
        Regex::new(&format!(
            r"^\[(.+?)\]!({}|{}|{})\|(.+)$",
            CELL_ADDR, SHAPE_ADDR, NOTE_ADDR
        ))
        .expect("valid line regex")
    })
}

/// データ行を分解した結果（エスケープ解除前）
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawLine<'a> {
    pub sheet: &'a str,
    pub address: Address,
    pub rest: &'a str,
}

/// データ行を `シート名` / `アドレス` / `残り` に分解する
///
/// # 戻り値
///
/// * `Some(RawLine)` - 行が文法に一致し、アドレスが有効な場合
/// * `None` - 文法不一致、またはアドレスがExcelのグリッド外の場合
pub(crate) fn split_line(line: &str) -> Option<RawLine<'_>> {
    let captures = line_pattern().captures(line)?;
    let sheet = captures.get(1)?.as_str();
    let address = parse_address(captures.get(2)?.as_str())?;
    let rest = captures.get(3)?.as_str();
    Some(RawLine {
        sheet,
        address,
        rest,
    })
}

/// アドレス文字列を判別する
///
/// * `shape:<name>` → `Address::Shape`
/// * `note:<A1>` → `Address::Note`
/// * `<A1>` → `Address::Cell`
///
/// いずれにも当てはまらない場合は`None`。
pub fn parse_address(text: &str) -> Option<Address> {
    if let Some(name) = text.strip_prefix(SHAPE_PREFIX) {
        if name.is_empty() || name.contains(['|', '\r', '\n']) {
            return None;
        }
        return Some(Address::Shape(name.to_string()));
    }
    if let Some(cell) = text.strip_prefix(NOTE_PREFIX) {
        return CellRef::parse(cell).map(Address::Note);
    }
    CellRef::parse(text).map(Address::Cell)
}
