//! VML Note Anchor Module
//!
//! メモの表示位置はVML描画パーツ（`xl/drawings/vmlDrawingN.vml`）の
//! `<x:ClientData ObjectType="Note">`図形で保持されます。
//! VMLは整形式でないHTML風の記述を含むことがあるため、XMLとして解析せず
//! 文字列として走査・挿入します。

use std::fmt::Write as _;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::XlBridgeError;
use crate::types::CellCoord;

/// メモ用の図形種別ID
const NOTE_SHAPE_TYPE: &str = "_x0000_t202";

/// 図形IDの採番ブロック（`o:idmap`1つにつき1024個）
const SHAPE_ID_BLOCK: u32 = 1024;

const NOTE_SHAPE_TYPE_XML: &str = concat!(
    r#"<v:shapetype id="_x0000_t202" coordsize="21600,21600" o:spt="202" path="m,l,21600r21600,l21600,xe">"#,
    r#"<v:stroke joinstyle="miter"/><v:path gradientshapeok="t" o:connecttype="rect"/>"#,
    r#"</v:shapetype>"#,
);

fn shape_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_x0000_s(\d+)").expect("valid regex"))
}

fn client_data_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?s)<x:ClientData\s+ObjectType="Note"\s*>(.*?)</x:ClientData>"#,
        )
        .expect("valid regex")
    })
}

fn row_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<x:Row>\s*(\d+)\s*</x:Row>").expect("valid regex"))
}

fn column_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<x:Column>\s*(\d+)\s*</x:Column>").expect("valid regex"))
}

/// メモのアンカーが存在するセルの一覧
pub(crate) fn note_cells(vml: &str) -> Vec<CellCoord> {
    client_data_pattern()
        .captures_iter(vml)
        .filter_map(|caps| {
            let body = caps.get(1)?.as_str();
            let row = row_pattern().captures(body)?.get(1)?.as_str().parse().ok()?;
            let col = column_pattern().captures(body)?.get(1)?.as_str().parse().ok()?;
            Some(CellCoord::new(row, col))
        })
        .collect()
}

/// 既存のVML描画にメモのアンカーを追加する
///
/// 既にアンカーがあるセルは追加しません。メモ用の図形種別がない場合は追加します。
///
/// # 戻り値
///
/// * `Err(XlBridgeError::Xml)` - 終端の`</xml>`が見つからない場合
pub(crate) fn add_note_anchors(
    vml: &str,
    part: &str,
    cells: &[CellCoord],
) -> Result<String, XlBridgeError> {
    let existing = note_cells(vml);
    let missing: Vec<CellCoord> = cells
        .iter()
        .copied()
        .filter(|c| !existing.contains(c))
        .collect();
    if missing.is_empty() {
        return Ok(vml.to_string());
    }

    let end = vml
        .rfind("</xml>")
        .ok_or_else(|| XlBridgeError::xml(part, "missing </xml> end tag"))?;

    let mut next_id = shape_id_pattern()
        .captures_iter(vml)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
        .max()
        .map_or(SHAPE_ID_BLOCK + 1, |max| max + 1);

    let mut insert = String::new();
    if !vml.contains(&format!("id=\"{}\"", NOTE_SHAPE_TYPE)) {
        insert.push_str(NOTE_SHAPE_TYPE_XML);
    }
    for coord in missing {
        push_note_shape(&mut insert, next_id, coord);
        next_id += 1;
    }

    let mut out = String::with_capacity(vml.len() + insert.len());
    out.push_str(&vml[..end]);
    out.push_str(&insert);
    out.push_str(&vml[end..]);
    Ok(out)
}

/// メモのアンカーのみを含む新しいVML描画を作成する
///
/// # 引数
///
/// * `id_block` - `o:idmap`の値（1始まり）。図形IDは`id_block * 1024 + 1`から採番
/// * `cells` - アンカーを置くセル
pub(crate) fn new_vml_drawing(id_block: u32, cells: &[CellCoord]) -> String {
    let mut xml = String::with_capacity(1024 + cells.len() * 512);
    xml.push_str(r#"<xml xmlns:v="urn:schemas-microsoft-com:vml""#);
    xml.push_str(r#" xmlns:o="urn:schemas-microsoft-com:office:office""#);
    xml.push_str(r#" xmlns:x="urn:schemas-microsoft-com:office:excel">"#);
    let _ = write!(
        xml,
        r#"<o:shapelayout v:ext="edit"><o:idmap v:ext="edit" data="{}"/></o:shapelayout>"#,
        id_block
    );
    xml.push_str(NOTE_SHAPE_TYPE_XML);

    let mut next_id = id_block * SHAPE_ID_BLOCK + 1;
    for coord in cells {
        push_note_shape(&mut xml, next_id, *coord);
        next_id += 1;
    }
    xml.push_str("</xml>");
    xml
}

/// 非表示のメモ図形を1つ書き込む
fn push_note_shape(xml: &mut String, id: u32, coord: CellCoord) {
    let _ = write!(
        xml,
        r##"<v:shape id="_x0000_s{}" type="#{}" style="position:absolute;margin-left:59.25pt;margin-top:1.5pt;width:108pt;height:59.25pt;z-index:{};visibility:hidden" fillcolor="#ffffe1" o:insetmode="auto">"##,
        id, NOTE_SHAPE_TYPE, id
    );
    xml.push_str(r##"<v:fill color2="#ffffe1"/>"##);
    xml.push_str(r#"<v:shadow on="t" color="black" obscured="t"/>"#);
    xml.push_str(r#"<v:path o:connecttype="none"/>"#);
    xml.push_str(r#"<v:textbox style="mso-direction-alt:auto"><div style="text-align:left"></div></v:textbox>"#);
    let _ = write!(
        xml,
        r#"<x:ClientData ObjectType="Note"><x:MoveWithCells/><x:SizeWithCells/><x:Anchor>{}, 15, {}, 10, {}, 15, {}, 4</x:Anchor>"#,
        coord.col + 1,
        coord.row.saturating_sub(1),
        coord.col + 3,
        coord.row + 3
    );
    xml.push_str("<x:AutoFill>False</x:AutoFill>");
    let _ = write!(xml, "<x:Row>{}</x:Row>", coord.row);
    let _ = write!(xml, "<x:Column>{}</x:Column>", coord.col);
    xml.push_str("</x:ClientData></v:shape>");
}
