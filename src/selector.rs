//! Value Selector Module
//!
//! 要求された言語に応じて、エントリから注入する値を選択する純粋関数。

use crate::api::Language;
use crate::types::Entry;

/// 値選択の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection<'a> {
    /// 注入するテキスト
    pub text: &'a str,
    /// 翻訳列がなく原文で代替したかどうか
    pub used_fallback: bool,
}

/// 注入する値を選択する
///
/// * `None` → 原文（代替なし）
/// * `Some(English)` → 英語列。なければ原文（代替あり）
/// * `Some(Vietnamese)` → ベトナム語列。なければ原文（代替あり）
///
/// 言語の検証は呼び出し側（`InjectorBuilder::build()`）で完了している前提です。
pub fn select_value(entry: &Entry, language: Option<Language>) -> Selection<'_> {
    let translation = match language {
        None => {
            return Selection {
                text: &entry.original,
                used_fallback: false,
            }
        }
        Some(Language::English) => entry.english.as_deref(),
        Some(Language::Vietnamese) => entry.vietnamese.as_deref(),
    };

    match translation {
        Some(text) => Selection {
            text,
            used_fallback: false,
        },
        None => {
            log::debug!(
                "{} translation missing for {}!{}, using original",
                language.map(Language::code).unwrap_or_default().to_uppercase(),
                entry.sheet,
                entry.address
            );
            Selection {
                text: &entry.original,
                used_fallback: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Address, CellRef};

    fn sample(english: Option<&str>, vietnamese: Option<&str>) -> Entry {
        Entry {
            sheet: "Sheet1".to_string(),
            address: Address::Cell(CellRef::parse("A1").unwrap()),
            original: "原文".to_string(),
            english: english.map(str::to_string),
            vietnamese: vietnamese.map(str::to_string),
        }
    }

    #[test]
    fn test_no_language_uses_original() {
        let entry = sample(Some("English"), Some("Tiếng Việt"));
        let selection = select_value(&entry, None);
        assert_eq!(selection.text, "原文");
        assert!(!selection.used_fallback);
    }

    #[test]
    fn test_english_present() {
        let entry = sample(Some("English"), None);
        let selection = select_value(&entry, Some(Language::English));
        assert_eq!(selection.text, "English");
        assert!(!selection.used_fallback);
    }

    #[test]
    fn test_english_missing_falls_back() {
        let entry = sample(None, Some("Tiếng Việt"));
        let selection = select_value(&entry, Some(Language::English));
        assert_eq!(selection.text, "原文");
        assert!(selection.used_fallback);
    }

    #[test]
    fn test_vietnamese_present_and_missing() {
        let entry = sample(Some("English"), Some("Tiếng Việt"));
        assert_eq!(
            select_value(&entry, Some(Language::Vietnamese)),
            Selection {
                text: "Tiếng Việt",
                used_fallback: false
            }
        );

        let entry = sample(Some("English"), None);
        assert_eq!(
            select_value(&entry, Some(Language::Vietnamese)),
            Selection {
                text: "原文",
                used_fallback: true
            }
        );
    }
}
