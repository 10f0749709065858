//! Comments Module
//!
//! 従来形式のコメント（メモ）パーツ`xl/commentsN.xml`の読み取りと書き換え。

use std::collections::BTreeMap;

use crate::error::XlBridgeError;
use crate::types::{CellCoord, CellRef};
use crate::xlsx::xml::{decode_excel_text, encode_excel_text, XmlDocument, XmlElement, XmlNode};

/// 新規作成するコメントパーツの骨格
const EMPTY_COMMENTS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
<comments xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\"><authors/><commentList/></comments>";

/// 新規作成するメモの作成者
const NEW_NOTE_AUTHOR: &str = "";

/// メモ1件
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Note {
    /// 対象セル
    pub coord: CellCoord,
    /// 本文（ふりがなを除くテキストランの連結、前後の空白は除去しない）
    pub text: String,
}

/// コメントパーツからメモを読み取る（行優先順）
pub(crate) fn read_notes(xml: &[u8], part: &str) -> Result<Vec<Note>, XlBridgeError> {
    let doc = XmlDocument::parse(xml, part)?;
    let Some(root) = doc.root() else {
        return Ok(Vec::new());
    };
    let Some(list) = root.find_child(b"commentList") else {
        return Ok(Vec::new());
    };

    let mut notes = Vec::new();
    for comment in list.child_elements().filter(|el| el.local_name() == b"comment") {
        let Some(coord) = comment_coord(comment) else {
            log::debug!("{}: comment without a valid ref, ignored", part);
            continue;
        };
        let mut text = String::new();
        if let Some(body) = comment.find_child(b"text") {
            collect_text(body, &mut text).map_err(|e| XlBridgeError::xml(part, e))?;
        }
        notes.push(Note { coord, text });
    }
    notes.sort_by_key(|note| note.coord);
    Ok(notes)
}

fn comment_coord(comment: &XmlElement) -> Option<CellCoord> {
    Some(CellRef::parse(&comment.attr(b"ref")?)?.coord())
}

/// `t`要素のテキストを連結する（ふりがな`rPh`は除外、`_xHHHH_`は復号）
fn collect_text(el: &XmlElement, out: &mut String) -> Result<(), quick_xml::Error> {
    for child in el.child_elements() {
        match child.local_name() {
            b"rPh" => {}
            b"t" => out.push_str(&decode_excel_text(&child.text()?)),
            _ => collect_text(child, out)?,
        }
    }
    Ok(())
}

/// 既存のコメントパーツにメモを書き込む
///
/// 既存のメモは本文のみを置き換え、作成者は変更しません。
/// 存在しないメモは空の作成者で追加します。
///
/// # 戻り値
///
/// * `(Vec<u8>, Vec<CellCoord>)` - 書き換え後のXMLと、新規に追加したメモのセル
pub(crate) fn apply_notes(
    xml: &[u8],
    part: &str,
    notes: &BTreeMap<CellCoord, String>,
) -> Result<(Vec<u8>, Vec<CellCoord>), XlBridgeError> {
    let mut doc = XmlDocument::parse(xml, part)?;
    let root = doc
        .root_mut()
        .ok_or_else(|| XlBridgeError::xml(part, "missing comments element"))?;
    let prefix = root.prefix();
    ensure_child(root, &prefix, b"authors");
    ensure_child(root, &prefix, b"commentList");

    let mut created = Vec::new();
    for (coord, value) in notes {
        let existing = root.find_child_mut(b"commentList").and_then(|list| {
            list.child_elements_mut()
                .find(|c| c.local_name() == b"comment" && comment_coord(c) == Some(*coord))
        });
        if let Some(comment) = existing {
            set_comment_text(comment, &prefix, value);
            continue;
        }

        let author_id = author_index(root, &prefix, NEW_NOTE_AUTHOR)
            .ok_or_else(|| XlBridgeError::xml(part, "missing authors element"))?;
        let mut comment = XmlElement::new(format!("{}comment", prefix))
            .with_attr("ref", &coord.to_cell_ref().to_string())
            .with_attr("authorId", &author_id.to_string());
        set_comment_text(&mut comment, &prefix, value);

        let list = root
            .find_child_mut(b"commentList")
            .ok_or_else(|| XlBridgeError::xml(part, "missing commentList element"))?;
        list.children.push(XmlNode::Element(comment));
        list.empty = false;
        created.push(*coord);
    }

    Ok((doc.to_bytes(part)?, created))
}

/// メモだけを含む新しいコメントパーツを作成する
pub(crate) fn new_comments_part(
    part: &str,
    notes: &BTreeMap<CellCoord, String>,
) -> Result<Vec<u8>, XlBridgeError> {
    let (xml, _) = apply_notes(EMPTY_COMMENTS.as_bytes(), part, notes)?;
    Ok(xml)
}

/// `text`要素を単一の`t`要素に置き換える
fn set_comment_text(comment: &mut XmlElement, prefix: &str, value: &str) {
    let t = XmlElement::new(format!("{}t", prefix))
        .with_attr("xml:space", "preserve")
        .with_text(&encode_excel_text(value));
    let body = XmlElement::new(format!("{}text", prefix)).with_child(t);

    let position = comment
        .children
        .iter()
        .position(|node| matches!(node, XmlNode::Element(el) if el.local_name() == b"text"));
    match position {
        Some(index) => comment.children[index] = XmlNode::Element(body),
        None => comment.children.insert(0, XmlNode::Element(body)),
    }
    comment.empty = false;
}

/// 作成者の番号を取得（存在しなければ`authors`に追加）
fn author_index(root: &mut XmlElement, prefix: &str, author: &str) -> Option<usize> {
    let authors = root.find_child_mut(b"authors")?;
    let position = authors
        .child_elements()
        .filter(|el| el.local_name() == b"author")
        .position(|el| el.text().is_ok_and(|t| t == author));
    if position.is_some() {
        return position;
    }

    let index = authors
        .child_elements()
        .filter(|el| el.local_name() == b"author")
        .count();
    let mut el = XmlElement::new(format!("{}author", prefix));
    if author.is_empty() {
        el.empty = false;
    } else {
        el.set_text(author);
    }
    authors.children.push(XmlNode::Element(el));
    authors.empty = false;
    Some(index)
}

/// 子要素がなければ作成する。`authors`は先頭、`commentList`は`extLst`の前に置く
fn ensure_child(root: &mut XmlElement, prefix: &str, local: &[u8]) {
    if root.find_child(local).is_some() {
        return;
    }
    let name = format!("{}{}", prefix, String::from_utf8_lossy(local));
    let position = if local == b"authors" {
        0
    } else {
        root.children
            .iter()
            .position(|node| matches!(node, XmlNode::Element(el) if el.local_name() == b"extLst"))
            .unwrap_or(root.children.len())
    };
    root.children
        .insert(position, XmlNode::Element(XmlElement::new(name)));
    root.empty = false;
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMMENTS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<comments xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><authors><author>Tanaka</author></authors><commentList><comment ref="C3" authorId="0"><text><t>三番目</t></text></comment><comment ref="B2" authorId="0"><text><r><rPr><b/></rPr><t>Tanaka:</t></r><r><t xml:space="preserve">
確認</t></r><rPh sb="0" eb="1"><t>カクニン</t></rPh></text></comment></commentList></comments>"#;

    fn notes(items: &[(&str, &str)]) -> BTreeMap<CellCoord, String> {
        items
            .iter()
            .map(|(a1, v)| (CellRef::parse(a1).unwrap().coord(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_read_notes_sorted_without_phonetic_runs() {
        let read = read_notes(COMMENTS.as_bytes(), "comments1.xml").unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read[0].coord, CellCoord::new(1, 1));
        assert_eq!(read[0].text, "Tanaka:\n確認");
        assert_eq!(read[1].coord, CellCoord::new(2, 2));
        assert_eq!(read[1].text, "三番目");
    }

    #[test]
    fn test_apply_replaces_text_and_keeps_author() {
        let (xml, created) =
            apply_notes(COMMENTS.as_bytes(), "comments1.xml", &notes(&[("B2", "Checked")])).unwrap();
        assert!(created.is_empty());
        let out = String::from_utf8(xml.clone()).unwrap();
        assert!(out.contains(
            r#"<comment ref="B2" authorId="0"><text><t xml:space="preserve">Checked</t></text></comment>"#
        ));
        assert!(out.contains("<author>Tanaka</author>"));
        assert!(!out.contains("カクニン"));

        let read = read_notes(&xml, "comments1.xml").unwrap();
        assert_eq!(read[0].text, "Checked");
        assert_eq!(read[1].text, "三番目");
    }

    #[test]
    fn test_apply_creates_missing_note_with_empty_author() {
        let (xml, created) =
            apply_notes(COMMENTS.as_bytes(), "comments1.xml", &notes(&[("A1", "New")])).unwrap();
        assert_eq!(created, [CellCoord::new(0, 0)]);
        let out = String::from_utf8(xml).unwrap();
        assert!(out.contains("<authors><author>Tanaka</author><author></author></authors>"));
        assert!(out.contains(
            r#"<comment ref="A1" authorId="1"><text><t xml:space="preserve">New</t></text></comment></commentList>"#
        ));
    }

    #[test]
    fn test_new_comments_part() {
        let xml = new_comments_part("xl/comments1.xml", &notes(&[("B2", "x & y"), ("A1", "first")]))
            .unwrap();
        let out = String::from_utf8(xml.clone()).unwrap();
        assert!(out.contains("<authors><author></author></authors>"));
        let read = read_notes(&xml, "xl/comments1.xml").unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read[0].text, "first");
        assert_eq!(read[1].text, "x & y");
    }

    #[test]
    fn test_control_characters_round_trip() {
        let (xml, _) = apply_notes(
            COMMENTS.as_bytes(),
            "comments1.xml",
            &notes(&[("C3", "bell\u{7} _x0041_")]),
        )
        .unwrap();
        let out = String::from_utf8(xml.clone()).unwrap();
        assert!(out.contains(r#"<t xml:space="preserve">bell_x0007_ _x005F_x0041_</t>"#));

        let read = read_notes(&xml, "comments1.xml").unwrap();
        assert_eq!(read[1].text, "bell\u{7} _x0041_");
    }

    #[test]
    fn test_unparseable_comments() {
        assert!(read_notes(b"<comments><commentList>", "c.xml").is_err());
    }
}
