//! Worksheet Patch Module
//!
//! ワークシートXMLをストリーミングで書き換え、指定セルの値を
//! インライン文字列に置き換えます。
//!
//! - 既存セルはスタイル（`s`属性）を含む属性を保持し、`t`・`cm`・`vm`のみ置き換える
//! - 数式（`<f>`）や既存の値は削除する
//! - 存在しない行・セルは行番号・列番号の順序を保って作成する
//! - 必要に応じて`<legacyDrawing>`要素をスキーマ上の正しい位置に挿入する

use std::collections::BTreeMap;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::XlBridgeError;
use crate::types::{CellCoord, CellRef};
use crate::xlsx::xml::{attr_text, encode_excel_text};

const RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// `<legacyDrawing>`より後ろに現れるワークシートの子要素
const AFTER_LEGACY_DRAWING: &[&[u8]] = &[
    b"legacyDrawingHF",
    b"drawingHF",
    b"picture",
    b"oleObjects",
    b"controls",
    b"webPublishItems",
    b"tableParts",
    b"extLst",
];

/// 書き換えで置き換えるセル属性
const REPLACED_CELL_ATTRS: &[&[u8]] = &[b"r", b"t", b"cm", b"vm"];

/// ワークシートへの変更内容
#[derive(Debug, Clone, Default)]
pub(crate) struct WorksheetPatch {
    /// セル座標 → 書き込む文字列（行優先順）
    pub cells: BTreeMap<CellCoord, String>,
    /// 挿入する`<legacyDrawing>`のリレーションシップID
    pub legacy_drawing: Option<String>,
}

impl WorksheetPatch {
    /// 変更がないかどうか
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.legacy_drawing.is_none()
    }
}

/// 書き換えの結果
#[derive(Debug)]
pub(crate) struct PatchOutcome {
    /// 書き換え後のXML
    pub xml: Vec<u8>,
    /// 数式を持つセルを上書きしたかどうか
    pub formula_removed: bool,
}

/// ワークシートXMLに変更を適用する
///
/// # 引数
///
/// * `xml` - 元のワークシートXML
/// * `part` - パーツ名（エラーメッセージ用）
/// * `patch` - 変更内容
pub(crate) fn patch_worksheet(
    xml: &[u8],
    part: &str,
    patch: &WorksheetPatch,
) -> Result<PatchOutcome, XlBridgeError> {
    let mut rows: BTreeMap<u32, BTreeMap<u32, &str>> = BTreeMap::new();
    for (coord, value) in &patch.cells {
        rows.entry(coord.row)
            .or_default()
            .insert(coord.col, value.as_str());
    }

    let mut patcher = Patcher {
        writer: Writer::new(Vec::with_capacity(xml.len() + 256)),
        part,
        prefix: String::new(),
        rows,
        current_row: None,
        legacy_drawing: patch.legacy_drawing.as_deref(),
        formula_removed: false,
    };
    patcher.run(xml)?;

    Ok(PatchOutcome {
        xml: patcher.writer.into_inner(),
        formula_removed: patcher.formula_removed,
    })
}

/// ワークシートの`<legacyDrawing>`が参照するリレーションシップID
///
/// # 戻り値
///
/// * `Ok(None)` - `<legacyDrawing>`がない場合
pub(crate) fn legacy_drawing_id(xml: &[u8], part: &str) -> Result<Option<String>, XlBridgeError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut depth = 0usize;
    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| XlBridgeError::xml(part, e))?;
        match &event {
            Event::Start(e) | Event::Empty(e)
                if depth == 1 && e.local_name().as_ref() == b"legacyDrawing" =>
            {
                return Ok(e
                    .attributes()
                    .flatten()
                    .find(|a| a.key.local_name().as_ref() == b"id")
                    .and_then(|a| attr_text(&a)));
            }
            Event::Start(_) => depth += 1,
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

/// 書き換え中の行の状態
struct RowState<'v> {
    /// 1始まりの行番号
    number: u32,
    /// 直前のセルの列（0始まり）。`r`属性のないセルの位置決めに使う
    last_col: Option<u32>,
    /// まだ書き込んでいないセル（列 → 値）
    pending: BTreeMap<u32, &'v str>,
}

struct Patcher<'p, 'v> {
    writer: Writer<Vec<u8>>,
    part: &'p str,
    /// ルート要素の名前空間接頭辞（`x:`など）
    prefix: String,
    /// まだ書き込んでいない行（0始まりの行 → 列 → 値）
    rows: BTreeMap<u32, BTreeMap<u32, &'v str>>,
    current_row: Option<RowState<'v>>,
    legacy_drawing: Option<&'v str>,
    formula_removed: bool,
}

impl<'p, 'v> Patcher<'p, 'v> {
    fn run(&mut self, xml: &[u8]) -> Result<(), XlBridgeError> {
        let mut reader = Reader::from_reader(xml);
        reader.trim_text(false);

        let mut buf = Vec::new();
        let mut depth = 0usize;
        let mut in_sheet_data = false;
        let mut last_row_number = 0u32;
        // 置き換えたセルの中身を読み飛ばしている間の深さ
        let mut skip_depth = 0usize;

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| XlBridgeError::xml(self.part, e))?;

            if skip_depth > 0 {
                match &event {
                    Event::Start(e) => {
                        if e.local_name().as_ref() == b"f" {
                            self.formula_removed = true;
                        }
                        skip_depth += 1;
                        depth += 1;
                    }
                    Event::Empty(e) => {
                        if e.local_name().as_ref() == b"f" {
                            self.formula_removed = true;
                        }
                    }
                    Event::End(_) => {
                        skip_depth -= 1;
                        depth -= 1;
                    }
                    Event::Eof => {
                        return Err(XlBridgeError::xml(self.part, "unexpected end of document"))
                    }
                    _ => {}
                }
                buf.clear();
                continue;
            }

            match event {
                Event::Start(e) => {
                    let local = e.local_name().as_ref().to_vec();
                    if depth == 0 {
                        self.prefix = prefix_of(e.name().as_ref());
                        let start = self.root_start(&e);
                        self.emit(Event::Start(start))?;
                    } else if depth == 1 {
                        self.before_root_child(&local)?;
                        if local == b"sheetData" {
                            in_sheet_data = true;
                        }
                        self.emit(Event::Start(e))?;
                    } else if in_sheet_data && depth == 2 && local == b"row" {
                        let number = row_number(&e).unwrap_or(last_row_number + 1);
                        last_row_number = number;
                        self.flush_rows_before(number)?;
                        self.current_row = Some(RowState {
                            number,
                            last_col: None,
                            pending: self.rows.remove(&(number - 1)).unwrap_or_default(),
                        });
                        self.emit(Event::Start(e))?;
                    } else if in_sheet_data && depth == 3 && local == b"c" {
                        if self.cell(&e)? {
                            skip_depth = 1;
                        } else {
                            self.emit(Event::Start(e))?;
                        }
                    } else {
                        self.emit(Event::Start(e))?;
                    }
                    depth += 1;
                }
                Event::Empty(e) => {
                    let local = e.local_name().as_ref().to_vec();
                    if depth == 0 {
                        self.emit(Event::Empty(e))?;
                    } else if depth == 1 && local == b"sheetData" {
                        self.before_root_child(&local)?;
                        if self.rows.is_empty() {
                            self.emit(Event::Empty(e))?;
                        } else {
                            self.emit(Event::Start(e.borrow()))?;
                            self.flush_rows_before(u32::MAX)?;
                            self.emit(Event::End(e.to_end()))?;
                        }
                    } else if depth == 1 {
                        self.before_root_child(&local)?;
                        self.emit(Event::Empty(e))?;
                    } else if in_sheet_data && depth == 2 && local == b"row" {
                        let number = row_number(&e).unwrap_or(last_row_number + 1);
                        last_row_number = number;
                        self.flush_rows_before(number)?;
                        match self.rows.remove(&(number - 1)) {
                            Some(cells) => {
                                self.emit(Event::Start(e.borrow()))?;
                                self.write_cells(number, &cells)?;
                                self.emit(Event::End(e.to_end()))?;
                            }
                            None => self.emit(Event::Empty(e))?,
                        }
                    } else if in_sheet_data && depth == 3 && local == b"c" {
                        if !self.cell(&e)? {
                            self.emit(Event::Empty(e))?;
                        }
                    } else {
                        self.emit(Event::Empty(e))?;
                    }
                }
                Event::End(e) => {
                    depth -= 1;
                    let local = e.local_name().as_ref().to_vec();
                    if depth == 0 {
                        self.insert_legacy_drawing()?;
                    } else if depth == 1 && local == b"sheetData" {
                        self.flush_rows_before(u32::MAX)?;
                        in_sheet_data = false;
                    } else if in_sheet_data && depth == 2 && local == b"row" {
                        if let Some(row) = self.current_row.take() {
                            self.write_cells(row.number, &row.pending)?;
                        }
                    }
                    self.emit(Event::End(e))?;
                }
                Event::Eof => break,
                other => self.emit(other)?,
            }
            buf.clear();
        }
        Ok(())
    }

    /// セル要素を処理する。置き換えた場合は`true`（中身は呼び出し側で読み飛ばす）
    fn cell(&mut self, start: &BytesStart<'_>) -> Result<bool, XlBridgeError> {
        let Some(mut row) = self.current_row.take() else {
            return Ok(false);
        };

        let col = cell_column(start)
            .unwrap_or_else(|| row.last_col.map_or(0, |c| c + 1));
        row.last_col = Some(col);

        // この列より左に作成すべきセルを先に書き込む
        let before: Vec<(u32, &str)> = row
            .pending
            .range(..col)
            .map(|(c, v)| (*c, *v))
            .collect();
        for (c, value) in &before {
            row.pending.remove(c);
            self.write_cell(None, CellCoord::new(row.number - 1, *c), value)?;
        }

        let replaced = match row.pending.remove(&col) {
            Some(value) => {
                self.write_cell(Some(start), CellCoord::new(row.number - 1, col), value)?;
                true
            }
            None => false,
        };

        self.current_row = Some(row);
        Ok(replaced)
    }

    /// 指定行番号（1始まり）より前の未処理の行を作成する
    fn flush_rows_before(&mut self, number: u32) -> Result<(), XlBridgeError> {
        let row_index = number.saturating_sub(1);
        let keys: Vec<u32> = self.rows.range(..row_index).map(|(r, _)| *r).collect();
        for key in keys {
            if let Some(cells) = self.rows.remove(&key) {
                let mut start = BytesStart::new(format!("{}row", self.prefix));
                start.push_attribute(("r", (key + 1).to_string().as_str()));
                let end = BytesEnd::new(format!("{}row", self.prefix));
                self.emit(Event::Start(start))?;
                self.write_cells(key + 1, &cells)?;
                self.emit(Event::End(end))?;
            }
        }
        Ok(())
    }

    fn write_cells(&mut self, number: u32, cells: &BTreeMap<u32, &str>) -> Result<(), XlBridgeError> {
        for (col, value) in cells {
            self.write_cell(None, CellCoord::new(number - 1, *col), value)?;
        }
        Ok(())
    }

    /// インライン文字列セルを書き込む
    ///
    /// `template`がある場合、`r`・`t`・`cm`・`vm`以外の属性をそのまま引き継ぎます。
    fn write_cell(
        &mut self,
        template: Option<&BytesStart<'_>>,
        coord: CellCoord,
        value: &str,
    ) -> Result<(), XlBridgeError> {
        let prefix = self.prefix.clone();
        let mut start = BytesStart::new(format!("{}c", prefix));
        start.push_attribute(("r", coord.to_cell_ref().to_string().as_str()));
        if let Some(template) = template {
            for attr in template.attributes() {
                let attr = attr.map_err(|e| XlBridgeError::xml(self.part, e))?;
                if !REPLACED_CELL_ATTRS.contains(&attr.key.as_ref()) {
                    start.push_attribute(attr);
                }
            }
        }
        start.push_attribute(("t", "inlineStr"));

        let is = format!("{}is", prefix);
        let t = format!("{}t", prefix);
        let mut t_start = BytesStart::new(t.as_str());
        if value.starts_with(char::is_whitespace) || value.ends_with(char::is_whitespace) {
            t_start.push_attribute(("xml:space", "preserve"));
        }

        self.emit(Event::Start(start))?;
        self.emit(Event::Start(BytesStart::new(is.as_str())))?;
        self.emit(Event::Start(t_start))?;
        self.emit(Event::Text(BytesText::new(&encode_excel_text(value))))?;
        self.emit(Event::End(BytesEnd::new(t.as_str())))?;
        self.emit(Event::End(BytesEnd::new(is.as_str())))?;
        self.emit(Event::End(BytesEnd::new(format!("{}c", prefix))))?;
        Ok(())
    }

    /// ルート要素の開始タグ（`legacyDrawing`挿入時は`xmlns:r`を補う）
    fn root_start<'e>(&self, start: &BytesStart<'e>) -> BytesStart<'e> {
        let mut start = start.clone();
        if self.legacy_drawing.is_some() {
            let declared = start
                .attributes()
                .flatten()
                .any(|a| a.key.as_ref() == b"xmlns:r");
            if !declared {
                start.push_attribute(("xmlns:r", RELATIONSHIPS_NS));
            }
        }
        start
    }

    /// ルート直下の子要素の直前に必要な挿入を行う
    fn before_root_child(&mut self, local: &[u8]) -> Result<(), XlBridgeError> {
        if AFTER_LEGACY_DRAWING.contains(&local) {
            self.insert_legacy_drawing()?;
        }
        Ok(())
    }

    fn insert_legacy_drawing(&mut self) -> Result<(), XlBridgeError> {
        if let Some(id) = self.legacy_drawing.take() {
            let mut el = BytesStart::new(format!("{}legacyDrawing", self.prefix));
            el.push_attribute(("r:id", id));
            self.emit(Event::Empty(el))?;
        }
        Ok(())
    }

    fn emit(&mut self, event: Event<'_>) -> Result<(), XlBridgeError> {
        self.writer
            .write_event(event)
            .map_err(|e| XlBridgeError::xml(self.part, e))
    }
}

fn prefix_of(name: &[u8]) -> String {
    let name = String::from_utf8_lossy(name);
    match name.split_once(':') {
        Some((prefix, _)) => format!("{}:", prefix),
        None => String::new(),
    }
}

fn attr_value(start: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    start
        .attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| attr_text(&a))
}

/// `<row r="…">`の行番号（1始まり）
fn row_number(start: &BytesStart<'_>) -> Option<u32> {
    attr_value(start, b"r")?
        .parse()
        .ok()
        .filter(|n| *n >= 1)
}

/// `<c r="…">`の列（0始まり）
fn cell_column(start: &BytesStart<'_>) -> Option<u32> {
    Some(CellRef::parse(&attr_value(start, b"r")?)?.coord().col)
}
