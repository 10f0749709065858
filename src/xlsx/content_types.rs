//! Content Types Module
//!
//! `[Content_Types].xml`の`Default`・`Override`エントリの追加と削除。

use crate::error::XlBridgeError;
use crate::xlsx::xml::{XmlDocument, XmlElement, XmlNode};

pub(crate) const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

pub(crate) const CT_COMMENTS: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.comments+xml";
pub(crate) const CT_VML_DRAWING: &str = "application/vnd.openxmlformats-officedocument.vmlDrawing";

/// 拡張子に対する`Default`エントリがなければ追加する
pub(crate) fn ensure_default(
    bytes: &[u8],
    extension: &str,
    content_type: &str,
) -> Result<Vec<u8>, XlBridgeError> {
    let mut doc = XmlDocument::parse(bytes, CONTENT_TYPES_PART)?;
    let root = types_root(&mut doc)?;

    let exists = root.child_elements().any(|el| {
        el.local_name() == b"Default"
            && el
                .attr(b"Extension")
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
    });
    if !exists {
        let prefix = root.prefix();
        // Defaultは全Overrideより前に置く
        let position = root
            .children
            .iter()
            .position(|node| matches!(node, XmlNode::Element(el) if el.local_name() == b"Override"))
            .unwrap_or(root.children.len());
        root.children.insert(
            position,
            XmlNode::Element(
                XmlElement::new(format!("{}Default", prefix))
                    .with_attr("Extension", extension)
                    .with_attr("ContentType", content_type),
            ),
        );
        root.empty = false;
    }
    doc.to_bytes(CONTENT_TYPES_PART)
}

/// パーツに対する`Override`エントリを追加（既存の場合は種類を更新）
///
/// # 引数
///
/// * `part` - パーツ名（先頭の`/`なし。例: `xl/comments1.xml`）
pub(crate) fn ensure_override(
    bytes: &[u8],
    part: &str,
    content_type: &str,
) -> Result<Vec<u8>, XlBridgeError> {
    let part_name = format!("/{}", part);
    let mut doc = XmlDocument::parse(bytes, CONTENT_TYPES_PART)?;
    let root = types_root(&mut doc)?;

    let prefix = root.prefix();
    let existing = root
        .child_elements_mut()
        .find(|el| el.local_name() == b"Override" && is_part(el, &part_name));
    if let Some(el) = existing {
        el.set_attr("ContentType", content_type);
    } else {
        root.children.push(XmlNode::Element(
            XmlElement::new(format!("{}Override", prefix))
                .with_attr("PartName", &part_name)
                .with_attr("ContentType", content_type),
        ));
        root.empty = false;
    }
    doc.to_bytes(CONTENT_TYPES_PART)
}

/// パーツに対する`Override`エントリを削除
pub(crate) fn remove_override(bytes: &[u8], part: &str) -> Result<Vec<u8>, XlBridgeError> {
    let part_name = format!("/{}", part);
    let mut doc = XmlDocument::parse(bytes, CONTENT_TYPES_PART)?;
    let root = types_root(&mut doc)?;
    root.children.retain(|node| match node {
        XmlNode::Element(el) => !(el.local_name() == b"Override" && is_part(el, &part_name)),
        _ => true,
    });
    doc.to_bytes(CONTENT_TYPES_PART)
}

fn is_part(el: &XmlElement, part_name: &str) -> bool {
    el.attr(b"PartName")
        .is_some_and(|name| name.eq_ignore_ascii_case(part_name))
}

fn types_root(doc: &mut XmlDocument) -> Result<&mut XmlElement, XlBridgeError> {
    doc.root_mut()
        .ok_or_else(|| XlBridgeError::xml(CONTENT_TYPES_PART, "missing Types element"))
}
