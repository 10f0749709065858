//! Security Module
//!
//! ワークブックのパッケージを開く際の安全対策。
//! ZIP bomb（展開サイズ・ファイル数の上限）とパストラバーサルを検出します。

use crate::error::XlBridgeError;

/// パッケージ読み込み時のセキュリティ制限
#[derive(Debug, Clone)]
pub(crate) struct SecurityConfig {
    /// 展開後の合計最大サイズ（バイト）
    /// デフォルト: 1GB
    pub max_decompressed_size: u64,
    /// ZIPアーカイブ内の最大エントリ数
    /// デフォルト: 10000
    pub max_file_count: usize,
    /// 単一パーツの最大サイズ（バイト）
    /// デフォルト: 100MB
    pub max_file_size: u64,
    /// 入力ファイルの最大サイズ（バイト）
    /// デフォルト: 2GB
    pub max_input_file_size: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_decompressed_size: 1_073_741_824,
            max_file_count: 10_000,
            max_file_size: 104_857_600,
            max_input_file_size: 2_147_483_648,
        }
    }
}

impl SecurityConfig {
    /// 入力バイト列のサイズを検証
    pub fn check_input_size(&self, len: usize) -> Result<(), XlBridgeError> {
        if len as u64 > self.max_input_file_size {
            return Err(XlBridgeError::SecurityViolation(format!(
                "Input file exceeds maximum size: {} bytes (max: {} bytes)",
                len, self.max_input_file_size
            )));
        }
        Ok(())
    }

    /// エントリ数を検証
    pub fn check_file_count(&self, count: usize) -> Result<(), XlBridgeError> {
        if count > self.max_file_count {
            return Err(XlBridgeError::SecurityViolation(format!(
                "ZIP archive contains too many files: {} (max: {})",
                count, self.max_file_count
            )));
        }
        Ok(())
    }

    /// 1パーツのサイズを検証し、展開後の累計に加算した値を返す
    ///
    /// # 引数
    ///
    /// * `name` - パーツ名（エラーメッセージ用）
    /// * `size` - 展開後のサイズ
    /// * `total` - これまでの累計
    ///
    /// # 戻り値
    ///
    /// * `Ok(u64)` - 加算後の累計
    /// * `Err(XlBridgeError::SecurityViolation)` - 上限を超えた場合
    pub fn accumulate(&self, name: &str, size: u64, total: u64) -> Result<u64, XlBridgeError> {
        if size > self.max_file_size {
            return Err(XlBridgeError::SecurityViolation(format!(
                "File '{}' exceeds maximum size: {} bytes (max: {} bytes)",
                name, size, self.max_file_size
            )));
        }

        let total = total.checked_add(size).ok_or_else(|| {
            XlBridgeError::SecurityViolation(
                "Total decompressed size calculation overflow".to_string(),
            )
        })?;

        if total > self.max_decompressed_size {
            return Err(XlBridgeError::SecurityViolation(format!(
                "Total decompressed size exceeds maximum: {} bytes (max: {} bytes)",
                total, self.max_decompressed_size
            )));
        }
        Ok(total)
    }
}

/// ZIPエントリ名の検証
///
/// # 戻り値
///
/// * `Ok(())` - 安全なパスの場合
/// * `Err(String)` - 空、絶対パス、`..`、`\`を含む場合
pub(crate) fn validate_zip_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err("Empty path is not allowed".to_string());
    }

    // Unix形式の`/`、Windows形式のドライブレターで始まるパス
    let bytes = path.as_bytes();
    let drive_letter = bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':';
    if path.starts_with('/') || drive_letter {
        return Err(format!("Absolute path is not allowed: {}", path));
    }

    if path.split('/').any(|segment| segment == "..") {
        return Err(format!("Path traversal detected: {}", path));
    }

    if path.contains('\\') {
        return Err(format!("Backslash in path is not allowed: {}", path));
    }

    Ok(())
}
