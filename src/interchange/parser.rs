//! 翻訳ファイルの解析
//!
//! 1行ずつ`Entry`に変換します。不正な行は警告ログを出してスキップし、
//! 解析全体は継続します。2列形式と4列形式の行は同じファイル内に混在できます。

use std::fs;
use std::path::Path;

use crate::address::split_line;
use crate::error::XlBridgeError;
use crate::interchange::writer::unescape;
use crate::summary::ParseStats;
use crate::types::{AddressKind, Entry};

/// 列区切り文字
const COLUMN_SEPARATOR: char = '|';

/// 1行の解析結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// 有効なデータ行
    Entry(Entry),
    /// 空行またはコメント行（黙ってスキップ）
    Skip,
    /// 文法に一致しない行（警告してスキップ）
    Invalid,
}

/// ファイル全体の解析結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedEntries {
    /// ファイル順のエントリ
    pub entries: Vec<Entry>,
    /// 集計
    pub stats: ParseStats,
}

/// 1行を解析する
///
/// # 処理
///
/// 1. 行末の `\n`、続いて `\r` を取り除く
/// 2. 空行・`#`で始まる行は`Skip`
/// 3. `[<sheet>]!<address>|<rest>` に一致しなければ`Invalid`
/// 4. `rest` を `|` で（上限なしに）分割し、位置で列を割り当てる
///
/// 第2列・第3列は空でない場合のみ値を持ちます。空の列は「なし」と同じ扱いです。
pub fn parse_line(raw_line: &str) -> LineOutcome {
    let line = raw_line.strip_suffix('\n').unwrap_or(raw_line);
    let line = line.strip_suffix('\r').unwrap_or(line);

    if line.is_empty() || line.starts_with('#') {
        return LineOutcome::Skip;
    }

    let Some(raw) = split_line(line) else {
        return LineOutcome::Invalid;
    };

    let mut columns = raw.rest.split(COLUMN_SEPARATOR);
    let original = unescape(columns.next().unwrap_or_default());
    let english = non_empty_column(columns.next());
    let vietnamese = non_empty_column(columns.next());

    LineOutcome::Entry(Entry {
        sheet: raw.sheet.to_string(),
        address: raw.address,
        original,
        english,
        vietnamese,
    })
}

fn non_empty_column(column: Option<&str>) -> Option<String> {
    column.filter(|c| !c.is_empty()).map(unescape)
}

/// 文字列全体を解析する
///
/// 先頭のUTF-8 BOMは無視します。改行コードは`\n`・`\r\n`・`\r`が混在していても構いません。
pub fn parse_str(content: &str) -> ParsedEntries {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut parsed = ParsedEntries::default();

    for (index, line) in split_lines(content).enumerate() {
        match parse_line(line) {
            LineOutcome::Entry(entry) => parsed.entries.push(entry),
            LineOutcome::Skip => {}
            LineOutcome::Invalid => {
                log::warn!("Line {}: invalid format, skipping: {}", index + 1, line);
                parsed.stats.invalid_lines += 1;
            }
        }
    }

    let invalid_lines = parsed.stats.invalid_lines;
    parsed.stats = count_entries(&parsed.entries);
    parsed.stats.invalid_lines = invalid_lines;
    parsed
}

/// 行に分割する（`\n`・`\r\n`・単独の`\r`のいずれも行末として扱う）
fn split_lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .split('\n')
        .flat_map(|line| line.strip_suffix('\r').unwrap_or(line).split('\r'))
}

/// 翻訳ファイルを読み込んで解析する
///
/// # 戻り値
///
/// * `Ok(ParsedEntries)` - 解析結果（不正な行はスキップ済み）
/// * `Err(XlBridgeError::Io)` - ファイルの読み込みに失敗した場合
pub fn parse_file(path: &Path) -> Result<ParsedEntries, XlBridgeError> {
    let bytes = fs::read(path)?;
    let content = std::str::from_utf8(&bytes)?;
    let parsed = parse_str(content);

    let stats = &parsed.stats;
    log::info!(
        "Parsed {} entries from {}  (cells={}, shapes={}, notes={}, en={}, vi={})",
        stats.total,
        path.display(),
        stats.cells,
        stats.shapes,
        stats.notes,
        stats.english,
        stats.vietnamese
    );
    Ok(parsed)
}

fn count_entries(entries: &[Entry]) -> ParseStats {
    let mut stats = ParseStats {
        total: entries.len(),
        ..Default::default()
    };
    for entry in entries {
        match entry.address.kind() {
            AddressKind::Cell => stats.cells += 1,
            AddressKind::Shape => stats.shapes += 1,
            AddressKind::Note => stats.notes += 1,
        }
        if entry.english.is_some() {
            stats.english += 1;
        }
        if entry.vietnamese.is_some() {
            stats.vietnamese += 1;
        }
    }
    stats
}
