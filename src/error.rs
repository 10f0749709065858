//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use thiserror::Error;

/// xlbridgeクレート全体で使用するエラー型
///
/// 抽出（extract）と注入（inject）の両パイプラインで発生する
/// 致命的なエラーを統一的に扱います。
///
/// 1行単位・1エントリ単位の問題（不正な行、存在しないシートや図形）は
/// エラーではなく警告ログとサマリーのカウンタで報告されるため、
/// この型には現れません。
///
/// # エラーの種類
///
/// - `Io`: ファイルの読み書きに失敗
/// - `Parse`: calamineによるセル読み込みの失敗
/// - `Zip` / `Xml`: パッケージ（ZIP）やパーツ（XML）の構造が壊れている
/// - `UnsupportedLanguage`: 注入時の言語指定が未対応
/// - `Config`: その他の設定エラー
/// - `MissingPart`: ワークブックに必須のパーツが存在しない
/// - `SecurityViolation`: ZIP bomb等のセキュリティ制限違反
///
/// # 使用例
///
/// ```rust,no_run
/// use xlbridge::XlBridgeError;
/// use std::fs::File;
///
/// fn open_translation(path: &str) -> Result<(), XlBridgeError> {
///     let _file = File::open(path)?;  // Ioエラーが自動的に変換される
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum XlBridgeError {
    /// I/O操作中に発生したエラー
    ///
    /// `#[from]`属性により、`std::io::Error`から自動的に変換されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// calamineがExcelファイルを解析する際に発生したエラー
    #[error("Failed to parse Excel file: {0}")]
    Parse(#[from] calamine::Error),

    /// UTF-8文字列の変換エラー
    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// ZIPアーカイブの読み書きエラー
    #[error("ZIP archive error: {0}")]
    Zip(String),

    /// XMLパーツの解析・書き出しエラー
    ///
    /// `part`にはエラーが発生したパーツ名（例: `xl/worksheets/sheet1.xml`）が入ります。
    #[error("XML error in '{part}': {message}")]
    Xml {
        /// パーツ名
        part: String,
        /// 詳細メッセージ
        message: String,
    },

    /// サポートされていない言語が指定された
    ///
    /// `InjectorBuilder::build()`の時点で検出されるため、
    /// ファイルには一切触れずに返されます。
    ///
    /// # 例
    ///
    /// ```rust
    /// use xlbridge::{InjectorBuilder, XlBridgeError};
    ///
    /// let result = InjectorBuilder::new().with_language("fr").build();
    /// match result {
    ///     Err(XlBridgeError::UnsupportedLanguage { value, .. }) => assert_eq!(value, "fr"),
    ///     _ => panic!("expected UnsupportedLanguage"),
    /// }
    /// ```
    #[error("Language '{value}' is not supported. Supported values: {supported} or none")]
    UnsupportedLanguage {
        /// 指定された値
        value: String,
        /// サポートされている値の一覧（表示用）
        supported: String,
    },

    /// 設定の検証に失敗したエラー
    #[error("Configuration error: {0}")]
    Config(String),

    /// ワークブックに必須のパーツが見つからない
    #[error("Missing package part: {0}")]
    MissingPart(String),

    /// セキュリティ制限に違反したエラー
    ///
    /// ZIP bomb攻撃、パストラバーサル攻撃、ファイルサイズ制限などの
    /// セキュリティ制限に違反した場合に発生します。
    #[error("Security violation: {0}")]
    SecurityViolation(String),
}

impl XlBridgeError {
    /// パーツ名付きのXMLエラーを生成
    pub(crate) fn xml(part: &str, message: impl std::fmt::Display) -> Self {
        XlBridgeError::Xml {
            part: part.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<zip::result::ZipError> for XlBridgeError {
    fn from(err: zip::result::ZipError) -> Self {
        XlBridgeError::Zip(err.to_string())
    }
}
