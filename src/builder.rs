//! Builder Module
//!
//! Fluent Builder APIを提供し、`Extractor`・`Injector`インスタンスを段階的に構築する。

use std::path::PathBuf;

use crate::api::{Language, SheetSelector};
use crate::error::XlBridgeError;
use crate::extractor::Extractor;
use crate::injector::Injector;

/// 抽出処理の設定を保持する内部構造体
#[derive(Debug, Clone)]
pub(crate) struct ExtractConfig {
    /// シート選択方式
    pub sheet_selector: SheetSelector,

    /// 図形のテキストを抽出するか
    pub include_shapes: bool,

    /// メモのテキストを抽出するか
    pub include_notes: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            sheet_selector: SheetSelector::All,
            include_shapes: true,
            include_notes: true,
        }
    }
}

/// `Extractor`を構築するビルダー
///
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみをオーバーライドできます。
///
/// # 使用例
///
/// ```rust,no_run
/// use xlbridge::ExtractorBuilder;
///
/// # fn main() -> Result<(), xlbridge::XlBridgeError> {
/// let extractor = ExtractorBuilder::new()
///     .with_sheets(vec!["Sheet1".to_string()])
///     .include_notes(false)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ExtractorBuilder {
    config: ExtractConfig,
}

impl ExtractorBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - シート選択: すべてのシート（ワークブック内の順序）
    /// - 図形: 抽出する
    /// - メモ: 抽出する
    pub fn new() -> Self {
        Self::default()
    }

    /// 抽出対象のシートを名前で指定する
    ///
    /// 空のリストを渡した場合はすべてのシートが対象になります。
    ///
    /// # 引数
    ///
    /// * `names` - シート名（指定順に抽出）
    pub fn with_sheets(mut self, names: Vec<String>) -> Self {
        self.config.sheet_selector = if names.is_empty() {
            SheetSelector::All
        } else {
            SheetSelector::Names(names)
        };
        self
    }

    /// シート選択方式を指定する
    pub fn with_sheet_selector(mut self, selector: SheetSelector) -> Self {
        self.config.sheet_selector = selector;
        self
    }

    /// 図形のテキストを抽出するかを指定する（デフォルト: `true`）
    pub fn include_shapes(mut self, include: bool) -> Self {
        self.config.include_shapes = include;
        self
    }

    /// メモのテキストを抽出するかを指定する（デフォルト: `true`）
    pub fn include_notes(mut self, include: bool) -> Self {
        self.config.include_notes = include;
        self
    }

    /// 設定を検証し、`Extractor`インスタンスを生成する
    ///
    /// # 戻り値
    ///
    /// * `Err(XlBridgeError::Config)` - 空のシート名が指定された場合
    pub fn build(self) -> Result<Extractor, XlBridgeError> {
        if let SheetSelector::Names(names) = &self.config.sheet_selector {
            if names.iter().any(|name| name.is_empty()) {
                return Err(XlBridgeError::Config(
                    "Sheet name must not be empty".to_string(),
                ));
            }
        }
        Ok(Extractor::new(self.config))
    }
}

/// 注入処理の設定を保持する内部構造体
#[derive(Debug, Clone, Default)]
pub(crate) struct InjectConfig {
    /// 注入する翻訳言語（`None`は原文）
    pub language: Option<Language>,

    /// 出力先のパス（`None`は入力ファイルから自動生成）
    pub output: Option<PathBuf>,
}

/// `Injector`を構築するビルダー
///
/// 言語指定は`build()`の時点で検証されるため、未対応の言語では
/// ファイルに一切触れずにエラーになります。
///
/// # 使用例
///
/// ```rust,no_run
/// use xlbridge::InjectorBuilder;
///
/// # fn main() -> Result<(), xlbridge::XlBridgeError> {
/// let injector = InjectorBuilder::new()
///     .with_language("en")
///     .with_output("report_en.xlsx")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct InjectorBuilder {
    language: Option<String>,
    output: Option<PathBuf>,
}

impl InjectorBuilder {
    /// デフォルト設定（言語指定なし、出力先は自動生成）のビルダーを生成する
    pub fn new() -> Self {
        Self::default()
    }

    /// 注入する翻訳言語を指定する
    ///
    /// # 引数
    ///
    /// * `language` - 言語コード（`en` / `vi`）
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// 出力先のパスを指定する
    ///
    /// 指定しない場合は入力ファイルと同じディレクトリに
    /// `<stem>_<言語コード>.<ext>`（言語指定なしは`<stem>_translated.<ext>`）で出力します。
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    /// 設定を検証し、`Injector`インスタンスを生成する
    ///
    /// # 戻り値
    ///
    /// * `Ok(Injector)` - 設定が有効な場合
    /// * `Err(XlBridgeError::UnsupportedLanguage)` - 言語が`en`・`vi`以外の場合
    pub fn build(self) -> Result<Injector, XlBridgeError> {
        let language = Language::parse_optional(self.language.as_deref())?;
        Ok(Injector::new(InjectConfig {
            language,
            output: self.output,
        }))
    }
}
