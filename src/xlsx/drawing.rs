//! Drawing Module
//!
//! DrawingMLの描画パーツ（`xl/drawings/drawingN.xml`）に含まれる図形（`sp`）の
//! テキスト抽出と、テキスト本体（`txBody`）の置き換え。

use crate::error::XlBridgeError;
use crate::xlsx::xml::{XmlDocument, XmlElement, XmlNode};

/// 名前も`id`もない図形の識別子
const UNNAMED_SHAPE: &str = "?";

/// 図形のテキスト
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ShapeText {
    /// 図形の識別子（名前、なければ`id`、どちらもなければ`?`）
    pub name: String,
    /// すべてのテキストランを連結して前後の空白を除いたもの
    pub text: String,
}

/// 描画パーツ内の図形を文書順に列挙する（グループ内の図形を含む）
///
/// # 戻り値
///
/// * `Ok(Vec<Result<ShapeText, _>>)` - 図形ごとの結果。テキストを復号できない図形は`Err`
/// * `Err(XlBridgeError::Xml)` - 描画パーツ自体を解析できない場合
pub(crate) fn read_shapes(
    xml: &[u8],
    part: &str,
) -> Result<Vec<Result<ShapeText, XlBridgeError>>, XlBridgeError> {
    let doc = XmlDocument::parse(xml, part)?;
    let Some(root) = doc.root() else {
        return Ok(Vec::new());
    };

    Ok(root
        .descendants()
        .into_iter()
        .filter(|el| el.local_name() == b"sp")
        .map(|sp| {
            let text = shape_text(sp).map_err(|e| XlBridgeError::xml(part, e))?;
            Ok(ShapeText {
                name: shape_identifier(sp),
                text: text.trim().to_string(),
            })
        })
        .collect())
}

fn shape_text(sp: &XmlElement) -> Result<String, quick_xml::Error> {
    let mut text = String::new();
    for el in sp.descendants() {
        if el.local_name() == b"t" {
            text.push_str(&el.text()?);
        }
    }
    Ok(text)
}

/// `nvSpPr/cNvPr`要素
fn non_visual_props(sp: &XmlElement) -> Option<&XmlElement> {
    sp.find_child(b"nvSpPr")?.find_child(b"cNvPr")
}

/// 図形の宣言された名前（`cNvPr@name`、加工なし）
fn declared_name(sp: &XmlElement) -> Option<String> {
    non_visual_props(sp)?.attr(b"name")
}

/// 抽出時に出力する図形の識別子
fn shape_identifier(sp: &XmlElement) -> String {
    let props = non_visual_props(sp);
    let name = props
        .and_then(|p| p.attr(b"name"))
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    if let Some(name) = name {
        return name;
    }
    props
        .and_then(|p| p.attr(b"id"))
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| UNNAMED_SHAPE.to_string())
}

/// 名前が一致する最初の図形のテキストを置き換える
///
/// 名前が一致し、かつテキストランを1つ以上含む`txBody`を持つ最初の図形が対象です。
/// 宣言された名前との完全一致に加え、抽出時の識別子
/// （前後の空白を除いた名前、名前がなければ`id`）でも一致します。
///
/// # 戻り値
///
/// * `true` - 置き換えた場合
/// * `false` - 対象の図形が見つからない場合
pub(crate) fn replace_shape_text(doc: &mut XmlDocument, name: &str, value: &str) -> bool {
    match doc.root_mut() {
        Some(root) => replace_in(root, name, value),
        None => false,
    }
}

fn replace_in(el: &mut XmlElement, name: &str, value: &str) -> bool {
    if el.local_name() == b"sp" {
        let matches =
            declared_name(el).as_deref() == Some(name) || shape_identifier(el) == name;
        if matches {
            if let Some(tx_body) = el.find_child_mut(b"txBody") {
                if collapse_text_body(tx_body, value) {
                    return true;
                }
            }
        }
        return false;
    }
    el.child_elements_mut()
        .any(|child| replace_in(child, name, value))
}

/// テキスト本体を1つのランにまとめる
///
/// 最初のラン（`r`）を含む段落を残し、そのランのテキストを`value`に置き換えます。
/// 残した段落の他のラン・改行（`br`）・フィールド（`fld`）と、他の段落はすべて削除します。
/// 段落プロパティ（`pPr`・`endParaRPr`）と本体プロパティ（`bodyPr`・`lstStyle`）は保持します。
///
/// # 戻り値
///
/// * `false` - ランが1つもない場合（何も変更しない）
fn collapse_text_body(tx_body: &mut XmlElement, value: &str) -> bool {
    let keep = tx_body.children.iter().position(|node| match node {
        XmlNode::Element(p) => p.local_name() == b"p" && p.find_child(b"r").is_some(),
        XmlNode::Event(_) => false,
    });
    let Some(keep) = keep else {
        return false;
    };

    let children = std::mem::take(&mut tx_body.children);
    for (index, node) in children.into_iter().enumerate() {
        let drop = matches!(&node, XmlNode::Element(el) if el.local_name() == b"p" && index != keep);
        if !drop {
            tx_body.children.push(node);
        }
    }

    let Some(paragraph) = tx_body
        .child_elements_mut()
        .find(|el| el.local_name() == b"p" && el.find_child(b"r").is_some())
    else {
        return false;
    };

    let mut seen_run = false;
    paragraph.children.retain(|node| match node {
        XmlNode::Element(el) => match el.local_name() {
            b"r" if !seen_run => {
                seen_run = true;
                true
            }
            b"r" | b"br" | b"fld" => false,
            _ => true,
        },
        XmlNode::Event(_) => true,
    });

    let Some(run) = paragraph.find_child_mut(b"r") else {
        return false;
    };
    match run.find_child_mut(b"t") {
        Some(t) => t.set_text(value),
        None => {
            let t = XmlElement::new(format!("{}t", run.prefix())).with_text(value);
            run.children.push(XmlNode::Element(t));
            run.empty = false;
        }
    }
    true
}
