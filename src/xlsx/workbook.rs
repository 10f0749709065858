//! Workbook Structure Module
//!
//! `xl/workbook.xml`とリレーションシップをたどり、シート名から
//! ワークシートパーツ、さらに図形・メモ関連のパーツを解決します。

use crate::error::XlBridgeError;
use crate::xlsx::content_types::{self, CONTENT_TYPES_PART};
use crate::xlsx::package::XlsxPackage;
use crate::xlsx::relationships::{
    parse_relationships, rels_for_part, remove_relationships, resolve_target, Relationship,
    REL_CALC_CHAIN, REL_COMMENTS, REL_DRAWING, REL_OFFICE_DOCUMENT, REL_VML_DRAWING,
    REL_WORKSHEET,
};
use crate::xlsx::xml::XmlDocument;

const ROOT_RELS_PART: &str = "_rels/.rels";
const DEFAULT_WORKBOOK_PART: &str = "xl/workbook.xml";

/// ワークシート1枚の情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SheetInfo {
    /// シート名
    pub name: String,
    /// ワークシートパーツ名（例: `xl/worksheets/sheet1.xml`）
    pub part: String,
}

/// ワークブックの構造
#[derive(Debug, Clone)]
pub(crate) struct WorkbookIndex {
    /// ワークブックパーツ名
    pub workbook_part: String,
    /// ワークシート（ワークブック内の順序）
    pub sheets: Vec<SheetInfo>,
    /// 1904年エポックを使用するかどうか
    pub is_1904: bool,
}

impl WorkbookIndex {
    /// パッケージからワークブックの構造を読み込む
    ///
    /// グラフシートなどワークシート以外のシートは含まれません。
    ///
    /// # 戻り値
    ///
    /// * `Err(XlBridgeError::MissingPart)` - ワークブックパーツが存在しない場合
    /// * `Err(XlBridgeError::Xml)` - `workbook.xml`やリレーションシップが壊れている場合
    pub fn load(package: &mut XlsxPackage) -> Result<Self, XlBridgeError> {
        let workbook_part = Self::find_workbook_part(package)?;
        let workbook_xml = package.part(&workbook_part)?;
        let doc = XmlDocument::parse(&workbook_xml, &workbook_part)?;
        let root = doc
            .root()
            .ok_or_else(|| XlBridgeError::xml(&workbook_part, "missing workbook element"))?;

        let is_1904 = root
            .find_child(b"workbookPr")
            .and_then(|pr| pr.attr(b"date1904"))
            .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));

        let rels_part = rels_for_part(&workbook_part);
        let rels = match package.read_part(&rels_part)? {
            Some(bytes) => parse_relationships(&bytes, &rels_part)?,
            None => Vec::new(),
        };

        let mut sheets = Vec::new();
        if let Some(sheets_el) = root.find_child(b"sheets") {
            for sheet in sheets_el.child_elements().filter(|el| el.local_name() == b"sheet") {
                let (Some(name), Some(rel_id)) = (sheet.attr(b"name"), sheet.attr(b"id")) else {
                    continue;
                };
                let Some(rel) = rels.iter().find(|r| r.id == rel_id) else {
                    log::debug!("Sheet '{}' has no relationship {}, ignored", name, rel_id);
                    continue;
                };
                if !rel.is_type(REL_WORKSHEET) {
                    continue;
                }
                sheets.push(SheetInfo {
                    name,
                    part: resolve_target(&workbook_part, &rel.target),
                });
            }
        }

        Ok(Self {
            workbook_part,
            sheets,
            is_1904,
        })
    }

    fn find_workbook_part(package: &mut XlsxPackage) -> Result<String, XlBridgeError> {
        let Some(bytes) = package.read_part(ROOT_RELS_PART)? else {
            return Ok(DEFAULT_WORKBOOK_PART.to_string());
        };
        let rels = parse_relationships(&bytes, ROOT_RELS_PART)?;
        Ok(rels
            .iter()
            .find(|r| r.is_type(REL_OFFICE_DOCUMENT))
            .map(|r| resolve_target("", &r.target))
            .unwrap_or_else(|| DEFAULT_WORKBOOK_PART.to_string()))
    }

    /// シート名で検索（大文字・小文字を区別）
    pub fn sheet(&self, name: &str) -> Option<&SheetInfo> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// シート名の一覧
    #[cfg(test)]
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    /// 計算チェーン（`calcChain.xml`）を削除する
    ///
    /// パーツ本体、ワークブックのリレーションシップ、コンテンツタイプの
    /// `Override`をまとめて削除します。計算チェーンがない場合は何もしません。
    ///
    /// # 戻り値
    ///
    /// * `Ok(true)` - 削除した場合
    pub fn drop_calc_chain(&self, package: &mut XlsxPackage) -> Result<bool, XlBridgeError> {
        let rels_part = rels_for_part(&self.workbook_part);
        let Some(rels_bytes) = package.read_part(&rels_part)? else {
            return Ok(false);
        };
        let rels = parse_relationships(&rels_bytes, &rels_part)?;
        let Some(calc_chain) = rels.iter().find(|r| r.is_type(REL_CALC_CHAIN)) else {
            return Ok(false);
        };
        let calc_chain_part = resolve_target(&self.workbook_part, &calc_chain.target);

        package.remove_part(&calc_chain_part);
        package.set_part(
            &rels_part,
            remove_relationships(&rels_bytes, &rels_part, REL_CALC_CHAIN)?,
        );
        if let Some(types) = package.read_part(CONTENT_TYPES_PART)? {
            package.set_part(
                CONTENT_TYPES_PART,
                content_types::remove_override(&types, &calc_chain_part)?,
            );
        }
        log::debug!("Removed {} (formula cells were overwritten)", calc_chain_part);
        Ok(true)
    }
}

/// ワークシートに関連付けられたパーツ
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SheetParts {
    /// ワークシートの`.rels`パーツ名
    pub rels_part: String,
    /// 図形を含む描画パーツ（DrawingML）
    pub drawings: Vec<String>,
    /// メモ（従来のコメント）パーツ
    pub comments: Option<String>,
    /// VML描画パーツ（リレーションシップID, パーツ名）
    ///
    /// メモのアンカー用（`legacyDrawing`）とヘッダー・フッター画像用（`legacyDrawingHF`）が
    /// 同じ種類のため、ワークシートの`legacyDrawing`のIDで区別します。
    pub vml_drawings: Vec<(String, String)>,
}

impl SheetParts {
    /// ワークシートのリレーションシップから関連パーツを解決
    pub fn load(package: &mut XlsxPackage, sheet_part: &str) -> Result<Self, XlBridgeError> {
        let rels_part = rels_for_part(sheet_part);
        let rels: Vec<Relationship> = match package.read_part(&rels_part)? {
            Some(bytes) => parse_relationships(&bytes, &rels_part)?,
            None => Vec::new(),
        };

        let mut parts = SheetParts {
            rels_part,
            ..Default::default()
        };
        for rel in rels.iter().filter(|r| !r.external) {
            let target = resolve_target(sheet_part, &rel.target);
            if rel.is_type(REL_DRAWING) {
                parts.drawings.push(target);
            } else if rel.is_type(REL_COMMENTS) && parts.comments.is_none() {
                parts.comments = Some(target);
            } else if rel.is_type(REL_VML_DRAWING) {
                parts.vml_drawings.push((rel.id.clone(), target));
            }
        }
        Ok(parts)
    }

    /// リレーションシップIDに対応するVML描画パーツ
    pub fn vml_drawing(&self, rel_id: &str) -> Option<&str> {
        self.vml_drawings
            .iter()
            .find(|(id, _)| id == rel_id)
            .map(|(_, part)| part.as_str())
    }
}
