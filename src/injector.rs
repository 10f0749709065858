//! Injector Module
//!
//! 翻訳ファイルのエントリを、元のワークブックのコピーに書き戻す。
//! 書き換えるのはエントリの対象となったパーツ（ワークシート・描画・メモ）と
//! それに付随するリレーションシップ・コンテンツタイプのみで、
//! 他のパーツは圧縮済みデータのままコピーされます。

use std::collections::btree_map::Entry as MapEntry;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::Language;
use crate::builder::InjectConfig;
use crate::error::XlBridgeError;
use crate::interchange::parse_file;
use crate::selector::select_value;
use crate::summary::InjectSummary;
use crate::types::{Address, CellCoord, Entry};
use crate::xlsx::comments::{apply_notes, new_comments_part};
use crate::xlsx::content_types::{
    ensure_default, ensure_override, CONTENT_TYPES_PART, CT_COMMENTS, CT_VML_DRAWING,
};
use crate::xlsx::drawing::replace_shape_text;
use crate::xlsx::package::XlsxPackage;
use crate::xlsx::relationships::{
    add_relationship, relative_target, REL_COMMENTS, REL_VML_DRAWING,
};
use crate::xlsx::vml::{add_note_anchors, new_vml_drawing};
use crate::xlsx::workbook::{SheetInfo, SheetParts, WorkbookIndex};
use crate::xlsx::worksheet::{legacy_drawing_id, patch_worksheet, WorksheetPatch};
use crate::xlsx::xml::XmlDocument;

/// 言語指定がない場合の出力ファイル名の接尾辞
const UNTRANSLATED_SUFFIX: &str = "translated";

/// 注入処理の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectReport {
    /// 書き出したワークブックのパス
    pub output: PathBuf,
    /// 集計
    pub summary: InjectSummary,
}

/// 注入処理のファサード
///
/// `InjectorBuilder`で構築します。
///
/// # 使用例
///
/// ```rust,no_run
/// use std::path::Path;
/// use xlbridge::InjectorBuilder;
///
/// # fn main() -> Result<(), xlbridge::XlBridgeError> {
/// let injector = InjectorBuilder::new().with_language("vi").build()?;
/// let report = injector.inject(Path::new("report.xlsx"), Path::new("report.txt"))?;
/// println!("Output written to: {}", report.output.display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Injector {
    config: InjectConfig,
}

impl Injector {
    pub(crate) fn new(config: InjectConfig) -> Self {
        Self { config }
    }

    /// 注入する翻訳言語
    pub fn language(&self) -> Option<Language> {
        self.config.language
    }

    /// 入力ファイルに対する出力先のパス
    pub fn output_path(&self, input: &Path) -> PathBuf {
        self.config
            .output
            .clone()
            .unwrap_or_else(|| default_output_path(input, self.config.language))
    }

    /// 翻訳ファイルをワークブックのコピーに注入する
    ///
    /// # 引数
    ///
    /// * `input` - 元のワークブック（読み取りのみ）
    /// * `translation` - 翻訳ファイル
    ///
    /// # 処理フロー
    ///
    /// 1. 出力先が入力・翻訳ファイルと同じファイルでないことを確認
    ///    （同じ場合は`XlBridgeError::Config`、どのファイルにも書き込まない）
    /// 2. 元のワークブックを出力先にバイトコピー
    /// 3. 翻訳ファイルを解析
    /// 4. コピーを開き、エントリをファイル順に適用
    /// 5. 出力先に書き戻す
    pub fn inject(&self, input: &Path, translation: &Path) -> Result<InjectReport, XlBridgeError> {
        let output = self.output_path(input);
        ensure_distinct(input, &output)?;
        ensure_distinct(translation, &output)?;
        fs::copy(input, &output)?;

        let parsed = parse_file(translation)?;
        let bytes = fs::read(&output)?;
        let (patched, summary) = self.inject_entries(bytes, &parsed.entries)?;
        fs::write(&output, patched)?;

        log::info!("Saved translated workbook {}", output.display());
        Ok(InjectReport { output, summary })
    }

    /// メモリ上のワークブックにエントリを適用する
    ///
    /// # 引数
    ///
    /// * `bytes` - ワークブックのバイト列
    /// * `entries` - 適用するエントリ（同じ対象への後のエントリが優先）
    ///
    /// # 戻り値
    ///
    /// * `Ok((Vec<u8>, InjectSummary))` - 書き換え後のワークブックと集計
    /// * `Err(XlBridgeError)` - パッケージやワークシートが壊れている場合
    pub fn inject_entries(
        &self,
        bytes: Vec<u8>,
        entries: &[Entry],
    ) -> Result<(Vec<u8>, InjectSummary), XlBridgeError> {
        let mut package = XlsxPackage::open(bytes)?;
        let index = WorkbookIndex::load(&mut package)?;

        let mut summary = InjectSummary {
            total: entries.len(),
            ..Default::default()
        };
        // ワークブック内のシート位置 → 編集内容
        let mut sessions: BTreeMap<usize, SheetSession> = BTreeMap::new();

        for entry in entries {
            let Some(position) = index.sheets.iter().position(|s| s.name == entry.sheet) else {
                log::warn!("Sheet '{}' not found, skipping {}", entry.sheet, entry.address);
                summary.skipped_sheet += 1;
                continue;
            };

            let selection = select_value(entry, self.config.language);
            if selection.used_fallback {
                summary.fallback += 1;
            }

            let session = match sessions.entry(position) {
                MapEntry::Occupied(occupied) => occupied.into_mut(),
                MapEntry::Vacant(vacant) => {
                    vacant.insert(SheetSession::load(&mut package, &index.sheets[position])?)
                }
            };

            match &entry.address {
                Address::Cell(cell) => {
                    session.cells.insert(cell.coord(), selection.text.to_string());
                    summary.applied += 1;
                }
                Address::Shape(name) => {
                    if session.replace_shape(&mut package, name, selection.text)? {
                        summary.applied += 1;
                    } else {
                        log::warn!("Shape '{}' not found on sheet '{}'", name, entry.sheet);
                        summary.skipped_shape += 1;
                    }
                }
                Address::Note(cell) => {
                    session.notes.insert(cell.coord(), selection.text.to_string());
                    session.note_entries += 1;
                    summary.applied += 1;
                }
            }
        }

        let mut formula_removed = false;
        for (position, session) in sessions {
            formula_removed |= session.finish(&mut package, &index.sheets[position], &mut summary)?;
        }
        if formula_removed {
            index.drop_calc_chain(&mut package)?;
        }

        log::info!(
            "Injection complete: {} applied, {} sheet-skipped, {} shape-skipped, {} note-skipped, {} fallback (of {})",
            summary.applied,
            summary.skipped_sheet,
            summary.skipped_shape,
            summary.skipped_note,
            summary.fallback,
            summary.total
        );

        Ok((package.to_bytes()?, summary))
    }
}

/// 出力先が既存の入力ファイルと同じファイルを指していないことを確認する
///
/// シンボリックリンクや相対パスは解決してから比較します。
/// 出力先がまだ存在しない場合は別のファイルです。
fn ensure_distinct(input: &Path, output: &Path) -> Result<(), XlBridgeError> {
    let source = fs::canonicalize(input)?;
    match fs::canonicalize(output) {
        Ok(target) if target == source => Err(XlBridgeError::Config(format!(
            "Output {} is the same file as input {}",
            output.display(),
            input.display()
        ))),
        _ => Ok(()),
    }
}

/// デフォルトの出力先パス
///
/// 入力ファイルと同じディレクトリに`<stem>_<言語コード><ext>`、
/// 言語指定がなければ`<stem>_translated<ext>`を生成します。
///
/// # 使用例
///
/// ```rust
/// use std::path::{Path, PathBuf};
/// use xlbridge::{default_output_path, Language};
///
/// assert_eq!(
///     default_output_path(Path::new("docs/report.xlsx"), Some(Language::English)),
///     PathBuf::from("docs/report_en.xlsx")
/// );
/// ```
pub fn default_output_path(input: &Path, language: Option<Language>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = language.map_or(UNTRANSLATED_SUFFIX, Language::code);
    let file_name = match input.extension() {
        Some(ext) => format!("{}_{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}_{}", stem, suffix),
    };
    input.with_file_name(file_name)
}

/// 読み込んだ描画パーツ
struct LoadedDrawing {
    part: String,
    doc: XmlDocument,
    dirty: bool,
}

/// 1枚のシートに対する編集内容
struct SheetSession {
    parts: SheetParts,
    /// 描画パーツ（最初の図形エントリで読み込む）
    drawings: Option<Vec<LoadedDrawing>>,
    cells: BTreeMap<CellCoord, String>,
    notes: BTreeMap<CellCoord, String>,
    /// メモを対象としたエントリ数（同じセルへの重複を含む）
    note_entries: usize,
}

impl SheetSession {
    fn load(package: &mut XlsxPackage, sheet: &SheetInfo) -> Result<Self, XlBridgeError> {
        Ok(Self {
            parts: SheetParts::load(package, &sheet.part)?,
            drawings: None,
            cells: BTreeMap::new(),
            notes: BTreeMap::new(),
            note_entries: 0,
        })
    }

    /// 名前が一致する最初の図形のテキストを置き換える
    fn replace_shape(
        &mut self,
        package: &mut XlsxPackage,
        name: &str,
        value: &str,
    ) -> Result<bool, XlBridgeError> {
        if self.drawings.is_none() {
            self.drawings = Some(load_drawings(package, &self.parts)?);
        }
        let Some(drawings) = self.drawings.as_mut() else {
            return Ok(false);
        };
        for drawing in drawings.iter_mut() {
            if replace_shape_text(&mut drawing.doc, name, value) {
                drawing.dirty = true;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// 編集内容をパッケージに書き込む
    ///
    /// # 戻り値
    ///
    /// * `Ok(true)` - 数式を持つセルを上書きした場合
    fn finish(
        self,
        package: &mut XlsxPackage,
        sheet: &SheetInfo,
        summary: &mut InjectSummary,
    ) -> Result<bool, XlBridgeError> {
        for drawing in self.drawings.into_iter().flatten() {
            if drawing.dirty {
                package.set_part(&drawing.part, drawing.doc.to_bytes(&drawing.part)?);
            }
        }

        let worksheet_xml = package.part(&sheet.part)?;
        let mut patch = WorksheetPatch {
            cells: self.cells,
            legacy_drawing: None,
        };

        if !self.notes.is_empty() {
            match plan_notes(package, sheet, &self.parts, &worksheet_xml, &self.notes) {
                Ok(plan) => {
                    for (part, bytes) in plan.parts {
                        package.set_part(&part, bytes);
                    }
                    patch.legacy_drawing = plan.legacy_drawing;
                }
                Err(e) => {
                    log::warn!("Cannot update notes on sheet '{}': {}", sheet.name, e);
                    summary.applied -= self.note_entries;
                    summary.skipped_note += self.note_entries;
                }
            }
        }

        if patch.is_empty() {
            return Ok(false);
        }
        let outcome = patch_worksheet(&worksheet_xml, &sheet.part, &patch)?;
        package.set_part(&sheet.part, outcome.xml);
        Ok(outcome.formula_removed)
    }
}

/// シートの描画パーツをすべて読み込む（解析できないパーツは警告を出して除外）
fn load_drawings(
    package: &mut XlsxPackage,
    parts: &SheetParts,
) -> Result<Vec<LoadedDrawing>, XlBridgeError> {
    let mut drawings = Vec::with_capacity(parts.drawings.len());
    for part in &parts.drawings {
        let Some(xml) = package.read_part(part)? else {
            log::warn!("Drawing part {} is missing", part);
            continue;
        };
        match XmlDocument::parse(&xml, part) {
            Ok(doc) => drawings.push(LoadedDrawing {
                part: part.clone(),
                doc,
                dirty: false,
            }),
            Err(e) => log::warn!("Skipping unreadable drawing: {}", e),
        }
    }
    Ok(drawings)
}

/// メモの書き込みで変更するパーツ
#[derive(Debug, Default)]
struct NotePlan {
    /// 書き込むパーツ（パーツ名, 内容）
    parts: Vec<(String, Vec<u8>)>,
    /// ワークシートに挿入する`<legacyDrawing>`のリレーションシップID
    legacy_drawing: Option<String>,
}

/// メモの書き込みに必要なパーツの変更をまとめて計算する
///
/// パッケージには書き込まないため、途中で失敗してもワークブックは一貫した状態に保たれます。
fn plan_notes(
    package: &mut XlsxPackage,
    sheet: &SheetInfo,
    parts: &SheetParts,
    worksheet_xml: &[u8],
    notes: &BTreeMap<CellCoord, String>,
) -> Result<NotePlan, XlBridgeError> {
    let mut plan = NotePlan::default();
    let mut rels = package.read_part(&parts.rels_part)?;
    let mut types = package.part(CONTENT_TYPES_PART)?;
    let mut rels_changed = false;

    let created = match &parts.comments {
        Some(comments_part) => {
            let xml = package.part(comments_part)?;
            let (xml, created) = apply_notes(&xml, comments_part, notes)?;
            plan.parts.push((comments_part.clone(), xml));
            created
        }
        None => {
            let (comments_part, _) = package.next_free_name("xl/comments", ".xml");
            plan.parts
                .push((comments_part.clone(), new_comments_part(&comments_part, notes)?));
            types = ensure_override(&types, &comments_part, CT_COMMENTS)?;
            let (updated, _) = add_relationship(
                rels.as_deref(),
                &parts.rels_part,
                REL_COMMENTS,
                &relative_target(&sheet.part, &comments_part),
            )?;
            rels = Some(updated);
            rels_changed = true;
            notes.keys().copied().collect()
        }
    };

    if !created.is_empty() {
        match legacy_drawing_id(worksheet_xml, &sheet.part)? {
            Some(rel_id) => {
                let vml_part = parts.vml_drawing(&rel_id).ok_or_else(|| {
                    XlBridgeError::MissingPart(format!(
                        "legacy drawing {} of {}",
                        rel_id, sheet.part
                    ))
                })?;
                let vml = package.part(vml_part)?;
                let vml = String::from_utf8_lossy(&vml);
                let updated = add_note_anchors(&vml, vml_part, &created)?;
                plan.parts.push((vml_part.to_string(), updated.into_bytes()));
            }
            None => {
                let (vml_part, id_block) =
                    package.next_free_name("xl/drawings/vmlDrawing", ".vml");
                plan.parts
                    .push((vml_part.clone(), new_vml_drawing(id_block, &created).into_bytes()));
                types = ensure_default(&types, "vml", CT_VML_DRAWING)?;
                let (updated, rel_id) = add_relationship(
                    rels.as_deref(),
                    &parts.rels_part,
                    REL_VML_DRAWING,
                    &relative_target(&sheet.part, &vml_part),
                )?;
                rels = Some(updated);
                rels_changed = true;
                plan.legacy_drawing = Some(rel_id);
            }
        }
    }

    if rels_changed {
        if let Some(rels) = rels {
            plan.parts.push((parts.rels_part.clone(), rels));
        }
        plan.parts.push((CONTENT_TYPES_PART.to_string(), types));
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::InjectorBuilder;
    use crate::types::CellRef;
    use crate::xlsx::comments::read_notes;
    use crate::xlsx::package::tests::build_zip;
    use crate::xlsx::vml::note_cells;

    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/calcChain.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.calcChain+xml"/></Types>"#;

    const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

    const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#;

    const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/calcChain" Target="calcChain.xml"/></Relationships>"#;

    const SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData><row r="1"><c r="A1" s="3" t="s"><v>0</v></c><c r="B1"><f>1+1</f><v>2</v></c></row></sheetData><pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/></worksheet>"#;

    fn workbook() -> Vec<u8> {
        build_zip(&[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", ROOT_RELS),
            ("xl/workbook.xml", WORKBOOK),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
            ("xl/worksheets/sheet1.xml", SHEET),
            ("xl/calcChain.xml", r#"<calcChain><c r="B1" i="1"/></calcChain>"#),
        ])
    }

    fn entry(sheet: &str, address: Address, original: &str, english: Option<&str>) -> Entry {
        let mut entry = Entry::new(sheet, address, original);
        entry.english = english.map(str::to_string);
        entry
    }

    fn cell(a1: &str) -> CellRef {
        CellRef::parse(a1).unwrap()
    }

    fn read(bytes: Vec<u8>, part: &str) -> String {
        let mut package = XlsxPackage::open(bytes).unwrap();
        String::from_utf8(package.part(part).unwrap()).unwrap()
    }

    #[test]
    fn test_default_output_path() {
        let input = Path::new("/data/book.xlsx");
        assert_eq!(
            default_output_path(input, None),
            PathBuf::from("/data/book_translated.xlsx")
        );
        assert_eq!(
            default_output_path(input, Some(Language::English)),
            PathBuf::from("/data/book_en.xlsx")
        );
        assert_eq!(
            default_output_path(input, Some(Language::Vietnamese)),
            PathBuf::from("/data/book_vi.xlsx")
        );
        assert_eq!(
            default_output_path(Path::new("book"), None),
            PathBuf::from("book_translated")
        );
    }

    #[test]
    fn test_cell_entry_keeps_style_and_counts() {
        let injector = InjectorBuilder::new().with_language("en").build().unwrap();
        let entries = [
            entry("Sheet1", Address::Cell(cell("A1")), "原文", Some("Hello")),
            entry("Sheet1", Address::Cell(cell("C2")), "未訳", None),
            entry("Missing", Address::Cell(cell("A1")), "x", Some("x")),
        ];
        let (bytes, summary) = injector.inject_entries(workbook(), &entries).unwrap();
        assert_eq!(
            summary,
            InjectSummary {
                total: 3,
                applied: 2,
                skipped_sheet: 1,
                skipped_shape: 0,
                skipped_note: 0,
                fallback: 1,
            }
        );

        let sheet = read(bytes.clone(), "xl/worksheets/sheet1.xml");
        assert!(sheet.contains(r#"<c r="A1" s="3" t="inlineStr"><is><t>Hello</t></is></c>"#));
        assert!(sheet.contains(r#"<row r="2"><c r="C2" t="inlineStr"><is><t>未訳</t></is></c></row>"#));
        // 数式セルは変更していないので計算チェーンは残る
        let mut package = XlsxPackage::open(bytes).unwrap();
        assert!(package.has_part("xl/calcChain.xml"));
        assert!(package.part("[Content_Types].xml").is_ok());
    }

    #[test]
    fn test_overwriting_formula_drops_calc_chain() {
        let injector = InjectorBuilder::new().build().unwrap();
        let entries = [entry("Sheet1", Address::Cell(cell("B1")), "text", None)];
        let (bytes, summary) = injector.inject_entries(workbook(), &entries).unwrap();
        assert_eq!(summary.applied, 1);

        let mut package = XlsxPackage::open(bytes).unwrap();
        assert!(!package.has_part("xl/calcChain.xml"));
        let types = String::from_utf8(package.part("[Content_Types].xml").unwrap()).unwrap();
        assert!(!types.contains("calcChain"));
        let sheet = String::from_utf8(package.part("xl/worksheets/sheet1.xml").unwrap()).unwrap();
        assert!(!sheet.contains("<f>"));
    }

    #[test]
    fn test_later_entry_wins() {
        let injector = InjectorBuilder::new().build().unwrap();
        let entries = [
            entry("Sheet1", Address::Cell(cell("A1")), "first", None),
            entry("Sheet1", Address::Cell(cell("a1")), "second", None),
        ];
        let (bytes, summary) = injector.inject_entries(workbook(), &entries).unwrap();
        assert_eq!(summary.applied, 2);
        let sheet = read(bytes, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains("<t>second</t>"));
        assert!(!sheet.contains("first"));
    }

    #[test]
    fn test_note_creates_comments_and_vml_parts() {
        let injector = InjectorBuilder::new().build().unwrap();
        let entries = [
            entry("Sheet1", Address::Note(cell("B2")), "確認してください", None),
            entry("Sheet1", Address::Note(cell("A1")), "first", None),
        ];
        let (bytes, summary) = injector.inject_entries(workbook(), &entries).unwrap();
        assert_eq!(summary.applied, 2);
        assert_eq!(summary.skipped_note, 0);

        let mut package = XlsxPackage::open(bytes).unwrap();
        let comments = package.part("xl/comments1.xml").unwrap();
        let notes = read_notes(&comments, "xl/comments1.xml").unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].text, "first");
        assert_eq!(notes[1].text, "確認してください");

        let vml = String::from_utf8(package.part("xl/drawings/vmlDrawing1.vml").unwrap()).unwrap();
        assert_eq!(note_cells(&vml), [CellCoord::new(0, 0), CellCoord::new(1, 1)]);

        let rels = String::from_utf8(package.part("xl/worksheets/_rels/sheet1.xml.rels").unwrap())
            .unwrap();
        assert!(rels.contains(r#"Target="../comments1.xml""#));
        assert!(rels.contains(r#"Target="../drawings/vmlDrawing1.vml""#));

        let sheet = String::from_utf8(package.part("xl/worksheets/sheet1.xml").unwrap()).unwrap();
        assert!(sheet.contains(r#"<legacyDrawing r:id="rId2"/></worksheet>"#));
        assert!(sheet.contains("xmlns:r="));

        let types = String::from_utf8(package.part("[Content_Types].xml").unwrap()).unwrap();
        assert!(types.contains(r#"<Override PartName="/xl/comments1.xml""#));
        assert!(types.contains(r#"<Default Extension="vml""#));
    }

    #[test]
    fn test_unreadable_comments_are_skipped() {
        let sheet_rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments" Target="../comments1.xml"/></Relationships>"#;
        let bytes = build_zip(&[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", ROOT_RELS),
            ("xl/workbook.xml", WORKBOOK),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
            ("xl/worksheets/sheet1.xml", SHEET),
            ("xl/worksheets/_rels/sheet1.xml.rels", sheet_rels),
            ("xl/comments1.xml", "<comments><commentList>"),
        ]);
        let injector = InjectorBuilder::new().build().unwrap();
        let entries = [
            entry("Sheet1", Address::Note(cell("A1")), "note", None),
            entry("Sheet1", Address::Cell(cell("A1")), "cell", None),
        ];
        let (bytes, summary) = injector.inject_entries(bytes, &entries).unwrap();
        assert_eq!(summary.applied, 1);
        assert_eq!(summary.skipped_note, 1);
        assert_eq!(read(bytes.clone(), "xl/comments1.xml"), "<comments><commentList>");
        assert!(read(bytes, "xl/worksheets/sheet1.xml").contains("<t>cell</t>"));
    }

    #[test]
    fn test_missing_shape_is_skipped() {
        let injector = InjectorBuilder::new().build().unwrap();
        let entries = [entry("Sheet1", Address::Shape("TextBox 1".to_string()), "x", None)];
        let (_, summary) = injector.inject_entries(workbook(), &entries).unwrap();
        assert_eq!(summary.applied, 0);
        assert_eq!(summary.skipped_shape, 1);
    }
}
