//! XLSX Package Module
//!
//! ワークブック（Office Open XMLパッケージ）への低レベルなアクセスを提供するモジュール。
//! セル値の読み込みはcalamine、パーツの読み書きはzipとquick-xmlで行います。
//! 編集したパーツ以外は元の圧縮済みデータのまま保存されます。

pub(crate) mod cells;
pub(crate) mod comments;
pub(crate) mod content_types;
pub(crate) mod drawing;
pub(crate) mod package;
pub(crate) mod relationships;
pub(crate) mod vml;
pub(crate) mod workbook;
pub(crate) mod worksheet;
pub(crate) mod xml;
