//! Extractor Module
//!
//! ワークブックから翻訳対象のテキスト（セル・図形・メモ）を読み取り、
//! 翻訳ファイルの行として出力する。

use std::fs;
use std::path::Path;

use chrono::{Local, NaiveDate};

use crate::api::SheetSelector;
use crate::builder::ExtractConfig;
use crate::error::XlBridgeError;
use crate::formatter::CellFormatter;
use crate::interchange::{format_entry_line, ExportHeader};
use crate::summary::ExtractSummary;
use crate::types::Address;
use crate::xlsx::cells::CellReader;
use crate::xlsx::comments::read_notes;
use crate::xlsx::drawing::read_shapes;
use crate::xlsx::package::XlsxPackage;
use crate::xlsx::workbook::{SheetInfo, SheetParts, WorkbookIndex};

/// 抽出結果
///
/// ヘッダーを除いたデータ行と区切りコメント行を出力順に保持します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// ヘッダーに記載する元ファイル名
    pub source_name: String,
    /// 出力する行（改行なし）
    pub lines: Vec<String>,
    /// 集計
    pub summary: ExtractSummary,
    include_shapes: bool,
    include_notes: bool,
}

impl Extraction {
    /// ヘッダーブロックを付けて翻訳ファイルの内容を生成
    ///
    /// # 引数
    ///
    /// * `date` - ヘッダーに記載する生成日
    pub fn render(&self, date: NaiveDate) -> String {
        let header = ExportHeader {
            source: self.source_name.clone(),
            date,
            cells: self.summary.cells,
            shapes: self.include_shapes.then_some(self.summary.shapes),
            notes: self.include_notes.then_some(self.summary.notes),
        };
        let mut out = header.render();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// 抽出処理のファサード
///
/// `ExtractorBuilder`で構築します。
///
/// # 使用例
///
/// ```rust,no_run
/// use std::path::Path;
/// use xlbridge::ExtractorBuilder;
///
/// # fn main() -> Result<(), xlbridge::XlBridgeError> {
/// let extractor = ExtractorBuilder::new().build()?;
/// let summary = extractor.extract(Path::new("report.xlsx"), Path::new("report.txt"))?;
/// println!("{} lines", summary.total());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Extractor {
    config: ExtractConfig,
}

impl Extractor {
    pub(crate) fn new(config: ExtractConfig) -> Self {
        Self { config }
    }

    /// ワークブックを読み込み、翻訳ファイルに書き出す
    ///
    /// # 引数
    ///
    /// * `input` - 入力ワークブックのパス
    /// * `output` - 出力する翻訳ファイルのパス
    ///
    /// # 戻り値
    ///
    /// * `Ok(ExtractSummary)` - 出力した行数の集計
    /// * `Err(XlBridgeError)` - 入力の読み込み・解析、出力の書き込みに失敗した場合
    pub fn extract(&self, input: &Path, output: &Path) -> Result<ExtractSummary, XlBridgeError> {
        let bytes = fs::read(input)?;
        let source_name = input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.display().to_string());

        let extraction = self.extract_from_bytes(&source_name, bytes)?;
        fs::write(output, extraction.render(Local::now().date_naive()))?;
        log::info!(
            "Extracted {} lines to {}",
            extraction.summary.total(),
            output.display()
        );
        Ok(extraction.summary)
    }

    /// メモリ上のワークブックから抽出する
    ///
    /// # 引数
    ///
    /// * `source_name` - ヘッダーに記載する元ファイル名
    /// * `bytes` - ワークブックのバイト列
    ///
    /// # 処理フロー
    ///
    /// 1. パッケージを開き、シートとパーツの対応を解決
    /// 2. calamineでセル値（数式はキャッシュ値）と結合セル範囲を読み込む
    /// 3. シートごとに、セル → 図形 → メモの順に行を生成
    pub fn extract_from_bytes(
        &self,
        source_name: &str,
        bytes: Vec<u8>,
    ) -> Result<Extraction, XlBridgeError> {
        let mut package = XlsxPackage::open(bytes.clone())?;
        let index = WorkbookIndex::load(&mut package)?;
        let mut reader = CellReader::open(bytes)?;
        let formatter = CellFormatter::new(index.is_1904);

        let mut summary = ExtractSummary::default();
        let mut lines = Vec::new();

        for sheet in self.select_sheets(&index, &mut summary) {
            self.extract_cells(&mut reader, &formatter, sheet, &mut lines, &mut summary)?;

            if !self.config.include_shapes && !self.config.include_notes {
                summary.sheets.push(sheet.name.clone());
                continue;
            }
            let parts = match SheetParts::load(&mut package, &sheet.part) {
                Ok(parts) => parts,
                Err(e) => {
                    log::debug!("{}: relationships unreadable, no shapes or notes: {}", sheet.name, e);
                    SheetParts::default()
                }
            };
            if self.config.include_shapes {
                extract_shapes(&mut package, sheet, &parts, &mut lines, &mut summary)?;
            }
            if self.config.include_notes {
                extract_notes(&mut package, sheet, &parts, &mut lines, &mut summary)?;
            }
            summary.sheets.push(sheet.name.clone());
        }

        log::info!(
            "Extraction complete: {} cells, {} shapes, {} notes",
            summary.cells,
            summary.shapes,
            summary.notes
        );

        Ok(Extraction {
            source_name: source_name.to_string(),
            lines,
            summary,
            include_shapes: self.config.include_shapes,
            include_notes: self.config.include_notes,
        })
    }

    /// 抽出対象のシートを選択する
    ///
    /// 名前指定の場合は指定順に並べ、存在しない名前は警告を出してスキップします。
    fn select_sheets<'a>(
        &self,
        index: &'a WorkbookIndex,
        summary: &mut ExtractSummary,
    ) -> Vec<&'a SheetInfo> {
        match &self.config.sheet_selector {
            SheetSelector::All => index.sheets.iter().collect(),
            SheetSelector::Names(names) => names
                .iter()
                .filter_map(|name| {
                    let sheet = index.sheet(name);
                    if sheet.is_none() {
                        log::warn!("Sheet '{}' not found in workbook, skipped", name);
                        summary.missing_sheets.push(name.clone());
                    }
                    sheet
                })
                .collect(),
        }
    }

    fn extract_cells(
        &self,
        reader: &mut CellReader,
        formatter: &CellFormatter,
        sheet: &SheetInfo,
        lines: &mut Vec<String>,
        summary: &mut ExtractSummary,
    ) -> Result<(), XlBridgeError> {
        let sheet_cells = reader.read_sheet(&sheet.name)?;
        for (coord, value) in &sheet_cells.cells {
            if sheet_cells.is_merge_slave(*coord) {
                continue;
            }
            let Some(text) = formatter.format(value) else {
                continue;
            };
            if text.trim().is_empty() {
                continue;
            }
            lines.push(format_entry_line(
                &sheet.name,
                &Address::Cell(coord.to_cell_ref()),
                &text,
            ));
            summary.cells += 1;
        }
        Ok(())
    }
}

/// シートの描画パーツから図形のテキストを抽出する
///
/// 解析できない描画パーツやテキストを復号できない図形はdebugログを出してスキップします。
fn extract_shapes(
    package: &mut XlsxPackage,
    sheet: &SheetInfo,
    parts: &SheetParts,
    lines: &mut Vec<String>,
    summary: &mut ExtractSummary,
) -> Result<(), XlBridgeError> {
    let mut header_written = false;
    for drawing_part in &parts.drawings {
        let Some(xml) = package.read_part(drawing_part)? else {
            log::debug!("{}: drawing part {} is missing", sheet.name, drawing_part);
            continue;
        };
        let shapes = match read_shapes(&xml, drawing_part) {
            Ok(shapes) => shapes,
            Err(e) => {
                log::debug!("{}: skipping drawing: {}", sheet.name, e);
                continue;
            }
        };
        for shape in shapes {
            let shape = match shape {
                Ok(shape) => shape,
                Err(e) => {
                    log::debug!("{}: skipping shape: {}", sheet.name, e);
                    continue;
                }
            };
            if shape.text.is_empty() {
                continue;
            }
            if !header_written {
                lines.push(format!("# -- shapes: {} --", sheet.name));
                header_written = true;
            }
            lines.push(format_entry_line(
                &sheet.name,
                &Address::Shape(shape.name),
                &shape.text,
            ));
            summary.shapes += 1;
        }
    }
    Ok(())
}

/// シートのコメントパーツからメモのテキストを抽出する（行優先順）
fn extract_notes(
    package: &mut XlsxPackage,
    sheet: &SheetInfo,
    parts: &SheetParts,
    lines: &mut Vec<String>,
    summary: &mut ExtractSummary,
) -> Result<(), XlBridgeError> {
    let Some(comments_part) = &parts.comments else {
        return Ok(());
    };
    let Some(xml) = package.read_part(comments_part)? else {
        log::debug!("{}: comments part {} is missing", sheet.name, comments_part);
        return Ok(());
    };
    let notes = match read_notes(&xml, comments_part) {
        Ok(notes) => notes,
        Err(e) => {
            log::debug!("{}: skipping notes: {}", sheet.name, e);
            return Ok(());
        }
    };

    let mut header_written = false;
    for note in notes {
        let text = note.text.trim();
        if text.is_empty() {
            continue;
        }
        if !header_written {
            lines.push(format!("# -- notes: {} --", sheet.name));
            header_written = true;
        }
        lines.push(format_entry_line(
            &sheet.name,
            &Address::Note(note.coord.to_cell_ref()),
            text,
        ));
        summary.notes += 1;
    }
    Ok(())
}
