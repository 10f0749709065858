//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。

use std::fmt;

use serde::Serialize;

/// Excelの最大行数（1始まり）
pub(crate) const MAX_ROW: u32 = 1_048_576;

/// Excelの最大列数（`XFD`）
pub(crate) const MAX_COL: u32 = 16_384;

/// セル座標（0始まり）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct CellCoord {
    pub row: u32,
    pub col: u32,
}

impl CellCoord {
    /// 新しい座標を生成
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// A1形式の参照に変換（例: (0, 0) -> "A1"）
    pub fn to_cell_ref(self) -> CellRef {
        CellRef {
            column: col_index_to_letters(self.col),
            row: self.row + 1,
        }
    }
}

/// 列インデックスを文字列に変換（0 -> "A", 25 -> "Z", 26 -> "AA"）
pub(crate) fn col_index_to_letters(mut col: u32) -> String {
    let mut result = String::new();
    loop {
        let remainder = col % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    result
}

/// 列文字列をインデックスに変換（"A" -> 0, "AA" -> 26）
///
/// 英字以外を含む場合、または`XFD`を超える場合は`None`。
pub(crate) fn letters_to_col_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    let mut value: u32 = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let digit = (ch.to_ascii_uppercase() as u32) - ('A' as u32) + 1;
        value = value.checked_mul(26)?.checked_add(digit)?;
        if value > MAX_COL {
            return None;
        }
    }
    Some(value - 1)
}

/// A1形式のセル参照（列文字 + 行番号）
///
/// 列文字は常に大文字で保持します。行番号は1始まりです。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellRef {
    /// 列文字（例: `"A"`, `"BZ"`）
    pub column: String,
    /// 行番号（1始まり）
    pub row: u32,
}

impl CellRef {
    /// `"A1"`形式の文字列を解析
    ///
    /// 列文字は大文字・小文字を区別しません。Excelのグリッド外
    /// （行0、1,048,576行超、`XFD`列超）の参照は`None`になります。
    pub fn parse(a1: &str) -> Option<Self> {
        let split = a1.find(|c: char| c.is_ascii_digit())?;
        let (letters, digits) = a1.split_at(split);
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        letters_to_col_index(letters)?;
        let row: u32 = digits.parse().ok()?;
        if row == 0 || row > MAX_ROW {
            return None;
        }
        Some(Self {
            column: letters.to_ascii_uppercase(),
            row,
        })
    }

    /// 0始まりの座標に変換
    pub(crate) fn coord(&self) -> CellCoord {
        // parse()で検証済みのため列変換は失敗しない
        let col = letters_to_col_index(&self.column).unwrap_or(0);
        CellCoord::new(self.row - 1, col)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.column, self.row)
    }
}

/// アドレスの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressKind {
    /// セル
    Cell,
    /// 図形（テキストボックス等）
    Shape,
    /// セルのメモ（コメント）
    Note,
}

/// 翻訳ファイルの1行が指す注入先
///
/// 3種類のアドレスは1つの行文法を共有し、接頭辞で区別されます。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Address {
    /// `A1`: セル
    Cell(CellRef),
    /// `shape:TextBox 1`: 図形名
    Shape(String),
    /// `note:A1`: セルに付いたメモ
    Note(CellRef),
}

impl Address {
    /// アドレスの種類を取得
    pub fn kind(&self) -> AddressKind {
        match self {
            Address::Cell(_) => AddressKind::Cell,
            Address::Shape(_) => AddressKind::Shape,
            Address::Note(_) => AddressKind::Note,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Cell(cell) => write!(f, "{}", cell),
            Address::Shape(name) => write!(f, "shape:{}", name),
            Address::Note(cell) => write!(f, "note:{}", cell),
        }
    }
}

/// 翻訳ファイルの1エントリ
///
/// 解析のたびに新しく生成され、生成後に変更されることはありません。
/// `english` / `vietnamese` はそれぞれ独立に省略可能です。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// シート名
    pub sheet: String,
    /// 注入先
    pub address: Address,
    /// 原文（第1列、改行は復元済み）
    pub original: String,
    /// 英語訳（第2列が存在し空でない場合のみ）
    pub english: Option<String>,
    /// ベトナム語訳（第3列が存在し空でない場合のみ）
    pub vietnamese: Option<String>,
}

impl Entry {
    /// 原文のみのエントリを生成
    pub fn new(sheet: impl Into<String>, address: Address, original: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            address,
            original: original.into(),
            english: None,
            vietnamese: None,
        }
    }
}

/// セル範囲
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CellRange {
    pub start: CellCoord,
    pub end: CellCoord,
}

impl CellRange {
    /// 新しい範囲を生成
    pub fn new(start: CellCoord, end: CellCoord) -> Self {
        Self { start, end }
    }

    /// 指定された座標が範囲内にあるかを判定
    pub fn contains(&self, coord: CellCoord) -> bool {
        coord.row >= self.start.row
            && coord.row <= self.end.row
            && coord.col >= self.start.col
            && coord.col <= self.end.col
    }
}

/// セル結合範囲の情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MergedRegion {
    /// 結合範囲
    pub range: CellRange,

    /// 親セル（左上セル）の座標
    pub parent: CellCoord,
}

impl MergedRegion {
    /// 新しい結合範囲を生成
    pub fn new(range: CellRange) -> Self {
        Self {
            parent: range.start,
            range,
        }
    }

    /// 結合範囲に含まれ、かつ親セルではない座標かを判定
    pub fn is_slave(&self, coord: CellCoord) -> bool {
        self.range.contains(coord) && coord != self.parent
    }
}
