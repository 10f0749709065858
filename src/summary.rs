//! Summary Module
//!
//! 解析・抽出・注入の集計値を保持する構造体。
//! ログ出力とは独立した戻り値として呼び出し側に渡されるため、
//! ログをキャプチャせずにテストできます。

use serde::Serialize;

/// 翻訳ファイル解析の集計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    /// 解析に成功したエントリ数
    pub total: usize,
    /// セルエントリ数
    pub cells: usize,
    /// 図形エントリ数
    pub shapes: usize,
    /// メモエントリ数
    pub notes: usize,
    /// 英語列を持つエントリ数
    pub english: usize,
    /// ベトナム語列を持つエントリ数
    pub vietnamese: usize,
    /// 文法に一致せずスキップした行数
    pub invalid_lines: usize,
}

/// 抽出処理の集計
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractSummary {
    /// 出力したセル行の数
    pub cells: usize,
    /// 出力した図形行の数
    pub shapes: usize,
    /// 出力したメモ行の数
    pub notes: usize,
    /// 抽出したシート名（処理順）
    pub sheets: Vec<String>,
    /// 要求されたがワークブックに存在しなかったシート名
    pub missing_sheets: Vec<String>,
}

impl ExtractSummary {
    /// 出力したデータ行の総数
    pub fn total(&self) -> usize {
        self.cells + self.shapes + self.notes
    }
}

/// 注入処理の集計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InjectSummary {
    /// 処理対象のエントリ数
    pub total: usize,
    /// 適用したエントリ数
    pub applied: usize,
    /// シートが存在せずスキップしたエントリ数
    pub skipped_sheet: usize,
    /// 図形が見つからずスキップしたエントリ数
    pub skipped_shape: usize,
    /// メモパーツを編集できずスキップしたエントリ数
    pub skipped_note: usize,
    /// 翻訳列がなく原文で代替したエントリ数
    pub fallback: usize,
}
