//! XML Tree Module
//!
//! quick-xmlのイベントをそのまま保持する軽量なXMLツリー。
//! 編集していない要素・テキストは元のイベント（エスケープ済みの生バイト）のまま
//! 書き戻されるため、対象の部分木以外は元のバイト列と一致します。

use std::borrow::Cow;

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::XlBridgeError;

/// ツリーのノード
#[derive(Debug, Clone)]
pub(crate) enum XmlNode {
    /// 要素
    Element(XmlElement),
    /// 要素以外のイベント（テキスト、CDATA、コメント、宣言など）
    Event(Event<'static>),
}

/// 要素ノード
#[derive(Debug, Clone)]
pub(crate) struct XmlElement {
    /// 開始タグ（属性を含む）
    pub start: BytesStart<'static>,
    /// 子ノード
    pub children: Vec<XmlNode>,
    /// 自己終了タグ（`<a/>`）として読み込まれたかどうか
    pub empty: bool,
}

impl XmlElement {
    /// 属性なしの新しい要素を生成
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            start: BytesStart::new(name.into()),
            children: Vec::new(),
            empty: true,
        }
    }

    /// 属性を追加した要素を返す（ビルダー形式）
    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.start.push_attribute((key, value));
        self
    }

    /// 子要素を追加した要素を返す（ビルダー形式）
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// テキストのみを子に持つ要素を返す（ビルダー形式）
    pub fn with_text(mut self, text: &str) -> Self {
        self.set_text(text);
        self
    }

    /// 修飾名（例: `a:r`）
    pub fn name(&self) -> &[u8] {
        self.start.name().into_inner()
    }

    /// ローカル名（例: `r`）
    pub fn local_name(&self) -> &[u8] {
        self.start.local_name().into_inner()
    }

    /// 名前空間接頭辞（コロンを含む。例: `"a:"`、接頭辞なしの場合は空文字列）
    pub fn prefix(&self) -> String {
        let name = String::from_utf8_lossy(self.name()).into_owned();
        match name.split_once(':') {
            Some((prefix, _)) => format!("{}:", prefix),
            None => String::new(),
        }
    }

    /// 属性値をローカル名で取得（エスケープ解除済み）
    ///
    /// 値を復号できない属性は存在しないものとして扱います。
    pub fn attr(&self, local: &[u8]) -> Option<String> {
        self.start
            .attributes()
            .flatten()
            .find(|a| a.key.local_name().as_ref() == local)
            .and_then(|a| attr_text(&a))
    }

    /// 属性を修飾名で設定する（既存の値は置き換え、他の属性は生バイトのまま保持）
    pub fn set_attr(&mut self, key: &str, value: &str) {
        let mut start = BytesStart::new(String::from_utf8_lossy(self.name()).into_owned());
        for attr in self.start.attributes().flatten() {
            if attr.key.as_ref() != key.as_bytes() {
                start.push_attribute(attr);
            }
        }
        start.push_attribute((key, value));
        self.start = start.into_owned();
    }

    /// 子要素のイテレータ
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            XmlNode::Event(_) => None,
        })
    }

    /// 子要素の可変イテレータ
    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            XmlNode::Event(_) => None,
        })
    }

    /// ローカル名が一致する最初の子要素
    pub fn find_child(&self, local: &[u8]) -> Option<&XmlElement> {
        self.child_elements().find(|el| el.local_name() == local)
    }

    /// ローカル名が一致する最初の子要素（可変）
    pub fn find_child_mut(&mut self, local: &[u8]) -> Option<&mut XmlElement> {
        self.child_elements_mut().find(|el| el.local_name() == local)
    }

    /// 子孫要素を文書順（前順）で収集
    pub fn descendants(&self) -> Vec<&XmlElement> {
        let mut out = Vec::new();
        for child in self.child_elements() {
            out.push(child);
            out.extend(child.descendants());
        }
        out
    }

    /// 直下のテキスト（CDATAを含む）を連結して返す
    pub fn text(&self) -> Result<String, quick_xml::Error> {
        let mut out = String::new();
        for node in &self.children {
            match node {
                XmlNode::Event(Event::Text(text)) => out.push_str(&text.unescape()?),
                XmlNode::Event(Event::CData(cdata)) => {
                    out.push_str(&String::from_utf8_lossy(cdata));
                }
                _ => {}
            }
        }
        Ok(out)
    }

    /// 子ノードを1つのテキストノードに置き換える
    pub fn set_text(&mut self, text: &str) {
        self.children = vec![XmlNode::Event(Event::Text(
            BytesText::new(text).into_owned(),
        ))];
        self.empty = false;
    }

    fn write(&self, writer: &mut Writer<Vec<u8>>) -> Result<(), quick_xml::Error> {
        if self.children.is_empty() && self.empty {
            writer.write_event(Event::Empty(self.start.borrow()))?;
            return Ok(());
        }
        writer.write_event(Event::Start(self.start.borrow()))?;
        for child in &self.children {
            match child {
                XmlNode::Element(el) => el.write(writer)?,
                XmlNode::Event(event) => writer.write_event(event.borrow())?,
            }
        }
        writer.write_event(Event::End(self.start.to_end()))?;
        Ok(())
    }
}

/// XML文書（ルート要素の前後のノードを含む）
#[derive(Debug, Clone)]
pub(crate) struct XmlDocument {
    nodes: Vec<XmlNode>,
}

impl XmlDocument {
    /// バイト列からツリーを構築
    ///
    /// # 引数
    ///
    /// * `bytes` - XMLのバイト列
    /// * `part` - エラーメッセージ用のパーツ名
    pub fn parse(bytes: &[u8], part: &str) -> Result<Self, XlBridgeError> {
        let mut reader = Reader::from_reader(bytes);
        reader.trim_text(false);

        let mut buf = Vec::new();
        let mut nodes: Vec<XmlNode> = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| XlBridgeError::xml(part, e))?;
            let node = match event {
                Event::Start(start) => {
                    stack.push(XmlElement {
                        start: start.into_owned(),
                        children: Vec::new(),
                        empty: false,
                    });
                    None
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| XlBridgeError::xml(part, "unbalanced end tag"))?;
                    Some(XmlNode::Element(element))
                }
                Event::Empty(start) => Some(XmlNode::Element(XmlElement {
                    start: start.into_owned(),
                    children: Vec::new(),
                    empty: true,
                })),
                Event::Eof => break,
                other => Some(XmlNode::Event(other.into_owned())),
            };

            if let Some(node) = node {
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => nodes.push(node),
                }
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(XlBridgeError::xml(part, "unclosed element at end of document"));
        }
        Ok(Self { nodes })
    }

    /// ルート要素
    pub fn root(&self) -> Option<&XmlElement> {
        self.nodes.iter().find_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            XmlNode::Event(_) => None,
        })
    }

    /// ルート要素（可変）
    pub fn root_mut(&mut self) -> Option<&mut XmlElement> {
        self.nodes.iter_mut().find_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            XmlNode::Event(_) => None,
        })
    }

    /// ツリーをバイト列に書き出す
    pub fn to_bytes(&self, part: &str) -> Result<Vec<u8>, XlBridgeError> {
        let mut writer = Writer::new(Vec::new());
        for node in &self.nodes {
            let result = match node {
                XmlNode::Element(el) => el.write(&mut writer),
                XmlNode::Event(event) => writer.write_event(event.borrow()),
            };
            result.map_err(|e| XlBridgeError::xml(part, e))?;
        }
        Ok(writer.into_inner())
    }
}

/// 属性値を文字列として取得（エスケープ解除済み）
///
/// UTF-8として復号できない値やエスケープが不正な値は`None`。
pub(crate) fn attr_text(attr: &Attribute<'_>) -> Option<String> {
    let raw = std::str::from_utf8(&attr.value).ok()?;
    quick_xml::escape::unescape(raw).ok().map(Cow::into_owned)
}

/// XMLに書けない制御文字を`_xHHHH_`形式に符号化する
///
/// 既存の`_xHHHH_`と同じ形の文字列は、先頭の`_`を`_x005F_`にして区別します。
pub(crate) fn encode_excel_text(text: &str) -> Cow<'_, str> {
    let needs_encoding = text
        .char_indices()
        .any(|(i, c)| is_restricted_char(c) || (c == '_' && starts_escape(&text[i..])));
    if !needs_encoding {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 16);
    for (i, c) in text.char_indices() {
        if is_restricted_char(c) || (c == '_' && starts_escape(&text[i..])) {
            out.push_str(&format!("_x{:04X}_", c as u32));
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// `_xHHHH_`形式を元の文字に戻す
///
/// 復号結果が有効な文字にならない並びはそのまま残します。
pub(crate) fn decode_excel_text(text: &str) -> Cow<'_, str> {
    if !text.contains("_x") {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("_x") {
        out.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        let decoded = starts_escape(candidate)
            .then(|| u32::from_str_radix(&candidate[2..6], 16).ok())
            .flatten()
            .and_then(char::from_u32);
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &candidate[7..];
            }
            None => {
                out.push_str("_x");
                rest = &candidate[2..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// タブ・改行以外のC0制御文字
fn is_restricted_char(c: char) -> bool {
    c < '\u{20}' && !matches!(c, '\t' | '\n' | '\r')
}

/// `_xHHHH_`で始まるかどうか
fn starts_escape(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() >= 7
        && bytes.starts_with(b"_x")
        && bytes[2..6].iter().all(u8::is_ascii_hexdigit)
        && bytes[6] == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<root xmlns:a="urn:a"><a:item id="1" name="x &amp; y">text &lt;1&gt;</a:item><empty/><!-- note --></root>"#;

    #[test]
    fn test_round_trip_is_byte_identical() {
        let doc = XmlDocument::parse(SAMPLE.as_bytes(), "sample.xml").unwrap();
        assert_eq!(doc.to_bytes("sample.xml").unwrap(), SAMPLE.as_bytes());
    }

    #[test]
    fn test_attr_and_text() {
        let doc = XmlDocument::parse(SAMPLE.as_bytes(), "sample.xml").unwrap();
        let item = doc.root().unwrap().find_child(b"item").unwrap();
        assert_eq!(item.attr(b"name").as_deref(), Some("x & y"));
        assert_eq!(item.text().unwrap(), "text <1>");
        assert_eq!(item.prefix(), "a:");
    }

    #[test]
    fn test_set_text_and_attr() {
        let mut doc = XmlDocument::parse(SAMPLE.as_bytes(), "sample.xml").unwrap();
        {
            let root = doc.root_mut().unwrap();
            let item = root.find_child_mut(b"item").unwrap();
            item.set_text("a<b");
            item.set_attr("id", "2");
            let empty = root.find_child_mut(b"empty").unwrap();
            empty.set_text("filled");
        }
        let out = String::from_utf8(doc.to_bytes("sample.xml").unwrap()).unwrap();
        assert!(out.contains(r#"<a:item name="x &amp; y" id="2">a&lt;b</a:item>"#));
        assert!(out.contains("<empty>filled</empty>"));
    }

    #[test]
    fn test_descendants_in_document_order() {
        let xml = "<r><a><b/></a><c/></r>";
        let doc = XmlDocument::parse(xml.as_bytes(), "t.xml").unwrap();
        let names: Vec<_> = doc
            .root()
            .unwrap()
            .descendants()
            .into_iter()
            .map(|el| String::from_utf8_lossy(el.local_name()).into_owned())
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn test_builder_elements() {
        let el = XmlElement::new("t")
            .with_attr("xml:space", "preserve")
            .with_text("x");
        let parent = XmlElement::new("text").with_child(el);
        let mut writer = Writer::new(Vec::new());
        parent.write(&mut writer).unwrap();
        assert_eq!(
            String::from_utf8(writer.into_inner()).unwrap(),
            r#"<text><t xml:space="preserve">x</t></text>"#
        );
    }

    #[test]
    fn test_attr_with_entities() {
        let xml = r#"<r a="&lt;1&gt; &amp; &#x41;" b="&bogus;"/>"#;
        let doc = XmlDocument::parse(xml.as_bytes(), "t.xml").unwrap();
        let root = doc.root().unwrap();
        assert_eq!(root.attr(b"a").as_deref(), Some("<1> & A"));
        assert_eq!(root.attr(b"b"), None);
    }

    #[test]
    fn test_encode_excel_text() {
        assert!(matches!(encode_excel_text("plain\ttext\n"), Cow::Borrowed(_)));
        assert_eq!(encode_excel_text("a\u{1}b\u{1f}"), "a_x0001_b_x001F_");
        assert_eq!(encode_excel_text("_x0041_"), "_x005F_x0041_");
        assert_eq!(encode_excel_text("snake_case_x"), "snake_case_x");
    }

    #[test]
    fn test_decode_excel_text() {
        assert_eq!(decode_excel_text("a_x0001_b"), "a\u{1}b");
        assert_eq!(decode_excel_text("_x005F_x0041_"), "_x0041_");
        assert_eq!(decode_excel_text("_xZZZZ_ _x12"), "_xZZZZ_ _x12");
        for text in ["\u{2}bell\u{7}", "_x0041_", "日本語_x"] {
            assert_eq!(decode_excel_text(&encode_excel_text(text)), text);
        }
    }

    #[test]
    fn test_malformed_xml_is_error() {
        let result = XmlDocument::parse(b"<a><b></a>", "bad.xml");
        assert!(matches!(result, Err(XlBridgeError::Xml { .. })));
    }
}
