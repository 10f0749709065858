//! 翻訳ファイルの書き出し
//!
//! 改行のエスケープ、データ行の整形、ヘッダーブロックの生成を行います。

use std::fmt::Write as _;

use chrono::NaiveDate;

use crate::types::Address;

/// 改行を `\n` の2文字に置換する
///
/// `|` はエスケープしません。値に `|` が含まれる場合、
/// 再読み込み時に列境界として扱われます（形式上の既知の制限）。
pub fn escape(value: &str) -> String {
    value.replace('\n', "\\n")
}

/// `\n` の2文字を改行に戻す
pub fn unescape(value: &str) -> String {
    value.replace("\\n", "\n")
}

/// データ行 `[<sheet>]!<address>|<escaped value>` を生成する
pub fn format_entry_line(sheet: &str, address: &Address, value: &str) -> String {
    format!("[{}]!{}|{}", sheet, address, escape(value))
}

/// エクスポートファイル先頭のコメントブロック
///
/// 情報表示のみを目的としており、解析時には読み戻されません。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportHeader {
    /// 元ファイル名
    pub source: String,
    /// 生成日
    pub date: NaiveDate,
    /// セル行数
    pub cells: usize,
    /// 図形行数（図形抽出が無効な場合は`None`）
    pub shapes: Option<usize>,
    /// メモ行数（メモ抽出が無効な場合は`None`）
    pub notes: Option<usize>,
}

impl ExportHeader {
    /// ヘッダーブロックを文字列として生成（末尾の空行を含む）
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("# XlBridge Export\n");
        let _ = writeln!(out, "# Source: {}", self.source);
        let _ = writeln!(out, "# Date: {}", self.date.format("%Y-%m-%d"));
        out.push_str("# Encoding: UTF-8\n");
        let _ = write!(out, "# Cells: {}", self.cells);
        if let Some(shapes) = self.shapes {
            let _ = write!(out, "  Shapes: {}", shapes);
        }
        if let Some(notes) = self.notes {
            let _ = write!(out, "  Notes: {}", notes);
        }
        out.push('\n');
        out.push('\n');
        out
    }
}
