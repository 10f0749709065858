//! Public API Types
//!
//! 公開APIで使用する列挙型を定義するモジュール。

use std::fmt;
use std::str::FromStr;

use crate::error::XlBridgeError;

/// 注入時に選択する翻訳言語
///
/// 翻訳ファイルの第2列（英語）・第3列（ベトナム語）に対応します。
/// 言語を指定しない場合（`Option<Language>`が`None`）は第1列の原文が使用されます。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Language {
    /// 英語（第2列）
    English,

    /// ベトナム語（第3列）
    Vietnamese,
}

impl Language {
    /// サポートされている言語コードの一覧
    pub const SUPPORTED: [&'static str; 2] = ["en", "vi"];

    /// 言語コード（`en` / `vi`）
    ///
    /// デフォルト出力ファイル名の接尾辞（`*_en.xlsx`）にも使用されます。
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Vietnamese => "vi",
        }
    }

    /// 言語指定を検証して`Option<Language>`に変換する
    ///
    /// # 引数
    ///
    /// * `value` - 言語コード。`None`は原文を意味します
    ///
    /// # 戻り値
    ///
    /// * `Ok(None)` - 言語指定なし
    /// * `Ok(Some(Language))` - サポートされている言語
    /// * `Err(XlBridgeError::UnsupportedLanguage)` - それ以外の値
    pub fn parse_optional(value: Option<&str>) -> Result<Option<Language>, XlBridgeError> {
        value.map(str::parse).transpose()
    }

    pub(crate) fn supported_display() -> String {
        format!("{:?}", Self::SUPPORTED)
    }
}

impl FromStr for Language {
    type Err = XlBridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Language::English),
            "vi" => Ok(Language::Vietnamese),
            other => Err(XlBridgeError::UnsupportedLanguage {
                value: other.to_string(),
                supported: Self::supported_display(),
            }),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// シート選択方式
///
/// 抽出対象のシートを選択する方法を指定します。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum SheetSelector {
    /// すべてのシートをワークブック内の順序で抽出（デフォルト）
    #[default]
    All,

    /// シート名指定（指定順に抽出）
    ///
    /// ワークブックに存在しない名前は警告ログを出してスキップします。
    /// 抽出自体は残りのシートで継続されます。
    ///
    /// 例: `SheetSelector::Names(vec!["Sheet1".to_string(), "Sheet2".to_string()])`
    Names(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_codes() {
        assert_eq!(Language::English.code(), "en");
        assert_eq!(Language::Vietnamese.code(), "vi");
        assert_eq!(Language::English.to_string(), "en");
    }

    #[test]
    fn test_language_from_str() {
        assert_eq!("en".parse::<Language>().ok(), Some(Language::English));
        assert_eq!("vi".parse::<Language>().ok(), Some(Language::Vietnamese));
    }

    #[test]
    fn test_language_rejects_unknown() {
        match "ja".parse::<Language>() {
            Err(XlBridgeError::UnsupportedLanguage { value, supported }) => {
                assert_eq!(value, "ja");
                assert!(supported.contains("en"));
                assert!(supported.contains("vi"));
            }
            other => panic!("Expected UnsupportedLanguage, got {:?}", other),
        }
    }

    #[test]
    fn test_language_is_case_sensitive() {
        assert!("EN".parse::<Language>().is_err());
    }

    #[test]
    fn test_parse_optional() {
        assert_eq!(Language::parse_optional(None).ok(), Some(None));
        assert_eq!(
            Language::parse_optional(Some("vi")).ok(),
            Some(Some(Language::Vietnamese))
        );
        assert!(Language::parse_optional(Some("")).is_err());
    }

    #[test]
    fn test_sheet_selector_default() {
        assert_eq!(SheetSelector::default(), SheetSelector::All);
    }
}
