//! Relationships Module
//!
//! OPCのリレーションシップ（`*.rels`）の読み取り・追加・削除と、
//! ターゲットパスの解決。

use crate::error::XlBridgeError;
use crate::xlsx::xml::{XmlDocument, XmlElement, XmlNode};

pub(crate) const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub(crate) const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
pub(crate) const REL_DRAWING: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing";
pub(crate) const REL_COMMENTS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments";
pub(crate) const REL_VML_DRAWING: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/vmlDrawing";
pub(crate) const REL_CALC_CHAIN: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/calcChain";

const EMPTY_RELATIONSHIPS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\"></Relationships>";

/// リレーションシップ1件
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

impl Relationship {
    /// 種類の末尾セグメントで比較する（Strict形式の名前空間にも一致させるため）
    pub fn is_type(&self, rel_type: &str) -> bool {
        type_suffix(&self.rel_type) == type_suffix(rel_type)
    }
}

fn type_suffix(rel_type: &str) -> &str {
    rel_type.rsplit('/').next().unwrap_or(rel_type)
}

/// パーツに対応する`.rels`パーツ名
pub(crate) fn rels_for_part(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file_name)) => format!("{dir}/_rels/{file_name}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// ソースパーツからの相対ターゲットをパッケージ内の絶対パーツ名に解決
pub(crate) fn resolve_target(source_part: &str, target: &str) -> String {
    let target = target.split('#').next().unwrap_or(target);
    if target.is_empty() {
        return normalize(source_part);
    }
    if let Some(target) = target.strip_prefix('/') {
        return normalize(target);
    }

    let base_dir = source_part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    normalize(&format!("{base_dir}/{target}"))
}

/// ソースパーツから見たターゲットパーツの相対パス
///
/// 例: `xl/worksheets/sheet1.xml` → `xl/comments1.xml` は `../comments1.xml`
pub(crate) fn relative_target(source_part: &str, target_part: &str) -> String {
    let source_dir: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    let target: Vec<&str> = target_part.split('/').collect();
    let (target_dir, file_name) = target.split_at(target.len().saturating_sub(1));

    let common = source_dir
        .iter()
        .zip(target_dir.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<&str> = Vec::new();
    segments.extend(std::iter::repeat("..").take(source_dir.len() - common));
    segments.extend(&target_dir[common..]);
    segments.extend(file_name);
    segments.join("/")
}

fn normalize(path: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out.join("/")
}

/// `.rels`パーツを解析
pub(crate) fn parse_relationships(
    bytes: &[u8],
    part: &str,
) -> Result<Vec<Relationship>, XlBridgeError> {
    let doc = XmlDocument::parse(bytes, part)?;
    let Some(root) = doc.root() else {
        return Ok(Vec::new());
    };

    Ok(root
        .child_elements()
        .filter(|el| el.local_name() == b"Relationship")
        .filter_map(|el| {
            Some(Relationship {
                id: el.attr(b"Id")?,
                rel_type: el.attr(b"Type")?,
                target: el.attr(b"Target")?,
                external: el
                    .attr(b"TargetMode")
                    .is_some_and(|mode| mode.eq_ignore_ascii_case("External")),
            })
        })
        .collect())
}

/// リレーションシップを追加し、新しい`.rels`のバイト列と割り当てたIDを返す
///
/// # 引数
///
/// * `existing` - 既存の`.rels`（存在しない場合は`None`で新規作成）
/// * `rels_part` - `.rels`パーツ名（エラーメッセージ用）
/// * `rel_type` - リレーションシップの種類
/// * `target` - ソースパーツからの相対ターゲット
pub(crate) fn add_relationship(
    existing: Option<&[u8]>,
    rels_part: &str,
    rel_type: &str,
    target: &str,
) -> Result<(Vec<u8>, String), XlBridgeError> {
    let bytes = existing.unwrap_or(EMPTY_RELATIONSHIPS.as_bytes());
    let mut doc = XmlDocument::parse(bytes, rels_part)?;
    let root = doc
        .root_mut()
        .ok_or_else(|| XlBridgeError::xml(rels_part, "missing Relationships element"))?;

    let used: Vec<String> = root
        .child_elements()
        .filter_map(|el| el.attr(b"Id"))
        .collect();
    let mut next = used.len() + 1;
    let id = loop {
        let candidate = format!("rId{}", next);
        if !used.contains(&candidate) {
            break candidate;
        }
        next += 1;
    };

    let prefix = root.prefix();
    root.children.push(XmlNode::Element(
        XmlElement::new(format!("{}Relationship", prefix))
            .with_attr("Id", &id)
            .with_attr("Type", rel_type)
            .with_attr("Target", target),
    ));
    root.empty = false;

    Ok((doc.to_bytes(rels_part)?, id))
}

/// 指定した種類のリレーションシップをすべて削除
pub(crate) fn remove_relationships(
    bytes: &[u8],
    rels_part: &str,
    rel_type: &str,
) -> Result<Vec<u8>, XlBridgeError> {
    let mut doc = XmlDocument::parse(bytes, rels_part)?;
    if let Some(root) = doc.root_mut() {
        root.children.retain(|node| match node {
            XmlNode::Element(el) => !el
                .attr(b"Type")
                .is_some_and(|t| type_suffix(&t) == type_suffix(rel_type)),
            _ => true,
        });
    }
    doc.to_bytes(rels_part)
}
