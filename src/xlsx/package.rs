//! Package Module
//!
//! ワークブック（ZIPアーカイブ）のパーツ単位の読み書き。
//! 保存時、変更したパーツのみを再圧縮し、それ以外のパーツは
//! 圧縮済みデータのままコピーします（再圧縮なし）。

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Read, Write};

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::XlBridgeError;
use crate::security::{validate_zip_path, SecurityConfig};

/// メモリ上に展開したワークブックのパッケージ
pub(crate) struct XlsxPackage {
    archive: ZipArchive<Cursor<Vec<u8>>>,
    /// 元のアーカイブ内のエントリ名（格納順）
    names: Vec<String>,
    /// 置き換え・追加したパーツ
    updated: BTreeMap<String, Vec<u8>>,
    /// 追加したパーツ名（追加順）
    added: Vec<String>,
    /// 削除したパーツ名
    removed: BTreeSet<String>,
}

impl XlsxPackage {
    /// バイト列からパッケージを開く
    ///
    /// エントリ数、各パーツのサイズ、展開後の合計サイズ、エントリ名を
    /// `SecurityConfig`の制限に照らして検証します。
    ///
    /// # 戻り値
    ///
    /// * `Ok(XlsxPackage)` - 検証に成功した場合
    /// * `Err(XlBridgeError::Zip)` - ZIPとして読めない場合
    /// * `Err(XlBridgeError::SecurityViolation)` - 制限に違反した場合
    pub fn open(bytes: Vec<u8>) -> Result<Self, XlBridgeError> {
        let security_config = SecurityConfig::default();
        security_config.check_input_size(bytes.len())?;

        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        security_config.check_file_count(archive.len())?;

        let mut names = Vec::with_capacity(archive.len());
        let mut total_decompressed_size = 0u64;
        for i in 0..archive.len() {
            let file = archive.by_index(i)?;
            let name = file.name().to_string();
            validate_zip_path(&name).map_err(|e| {
                XlBridgeError::SecurityViolation(format!("Invalid ZIP path: {}", e))
            })?;
            total_decompressed_size =
                security_config.accumulate(&name, file.size(), total_decompressed_size)?;
            names.push(name);
        }

        Ok(Self {
            archive,
            names,
            updated: BTreeMap::new(),
            added: Vec::new(),
            removed: BTreeSet::new(),
        })
    }

    /// パーツが存在するかどうか（変更を反映）
    pub fn has_part(&self, name: &str) -> bool {
        if self.removed.contains(name) {
            return false;
        }
        self.updated.contains_key(name) || self.names.iter().any(|n| n == name)
    }

    /// パーツを読み込む（存在しない場合は`None`）
    pub fn read_part(&mut self, name: &str) -> Result<Option<Vec<u8>>, XlBridgeError> {
        if self.removed.contains(name) {
            return Ok(None);
        }
        if let Some(bytes) = self.updated.get(name) {
            return Ok(Some(bytes.clone()));
        }
        if !self.names.iter().any(|n| n == name) {
            return Ok(None);
        }

        let mut file = self.archive.by_name(name)?;
        let mut bytes = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut bytes)?;
        Ok(Some(bytes))
    }

    /// 必須パーツを読み込む
    ///
    /// # 戻り値
    ///
    /// * `Err(XlBridgeError::MissingPart)` - パーツが存在しない場合
    pub fn part(&mut self, name: &str) -> Result<Vec<u8>, XlBridgeError> {
        self.read_part(name)?
            .ok_or_else(|| XlBridgeError::MissingPart(name.to_string()))
    }

    /// パーツを置き換える、または追加する
    pub fn set_part(&mut self, name: &str, bytes: Vec<u8>) {
        self.removed.remove(name);
        let existed = self.names.iter().any(|n| n == name);
        if !existed && !self.added.iter().any(|n| n == name) {
            self.added.push(name.to_string());
        }
        self.updated.insert(name.to_string(), bytes);
    }

    /// パーツを削除する
    pub fn remove_part(&mut self, name: &str) {
        self.updated.remove(name);
        self.added.retain(|n| n != name);
        self.removed.insert(name.to_string());
    }

    /// 未使用のパーツ名を生成（例: `xl/comments` + `.xml` → `xl/comments2.xml`）
    ///
    /// # 戻り値
    ///
    /// * `(String, u32)` - パーツ名と付与した番号（1始まり）
    pub fn next_free_name(&self, stem: &str, extension: &str) -> (String, u32) {
        let mut index = 1u32;
        loop {
            let candidate = format!("{}{}{}", stem, index, extension);
            if !self.has_part(&candidate) {
                return (candidate, index);
            }
            index += 1;
        }
    }

    /// 変更があるかどうか
    #[cfg(test)]
    pub fn is_modified(&self) -> bool {
        !self.updated.is_empty() || !self.removed.is_empty()
    }

    /// パッケージをバイト列として書き出す
    ///
    /// 元の格納順を保ち、変更したパーツはDeflateで圧縮し直します。
    /// 変更していないパーツは`raw_copy_file`で圧縮済みデータをそのままコピーします。
    /// 追加したパーツは末尾に追加順で格納します。
    pub fn to_bytes(&mut self) -> Result<Vec<u8>, XlBridgeError> {
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        for i in 0..self.archive.len() {
            let file = self.archive.by_index(i)?;
            let name = file.name().to_string();
            if self.removed.contains(&name) {
                continue;
            }
            match self.updated.get(&name) {
                Some(bytes) => {
                    zip.start_file(name.as_str(), options)?;
                    zip.write_all(bytes)?;
                }
                None => zip.raw_copy_file(file)?,
            }
        }

        for name in &self.added {
            if let Some(bytes) = self.updated.get(name) {
                zip.start_file(name.as_str(), options)?;
                zip.write_all(bytes)?;
            }
        }

        Ok(zip.finish()?.into_inner())
    }
}
