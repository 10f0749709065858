//! Cell Grid Module
//!
//! calamineを使用したセル値と結合セル範囲の読み込み。
//! 数式セルはキャッシュされた計算結果の値として読み込まれます。

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Dimensions, Reader, Sheets, Xlsx, XlsxError};

use crate::error::XlBridgeError;
use crate::types::{CellCoord, CellRange, MergedRegion};

/// 1枚のシートのセル値
#[derive(Debug, Clone, Default)]
pub(crate) struct SheetCells {
    /// 空でないセル（行優先順）
    pub cells: Vec<(CellCoord, Data)>,
    /// 結合セル範囲
    pub merged_regions: Vec<MergedRegion>,
}

impl SheetCells {
    /// 結合範囲の親セル以外のセルかどうか
    pub fn is_merge_slave(&self, coord: CellCoord) -> bool {
        self.merged_regions.iter().any(|r| r.is_slave(coord))
    }
}

/// calamineのワークブックのラッパー
pub(crate) struct CellReader {
    workbook: Xlsx<Cursor<Vec<u8>>>,
}

impl CellReader {
    /// バイト列からワークブックを開く
    ///
    /// # 戻り値
    ///
    /// * `Err(XlBridgeError::Parse)` - calamineで読み込めない場合
    /// * `Err(XlBridgeError::Config)` - XLSX形式でない場合
    pub fn open(bytes: Vec<u8>) -> Result<Self, XlBridgeError> {
        let sheets = open_workbook_auto_from_rs(Cursor::new(bytes))?;
        let mut workbook = match sheets {
            Sheets::Xlsx(workbook) => workbook,
            _ => {
                return Err(XlBridgeError::Config(
                    "Only XLSX format is supported".to_string(),
                ))
            }
        };
        workbook
            .load_merged_regions()
            .map_err(|e| XlBridgeError::Parse(e.into()))?;
        Ok(Self { workbook })
    }

    /// シートのセル値と結合セル範囲を読み込む
    ///
    /// 座標はシートの使用範囲の開始位置を加味した絶対座標です。
    pub fn read_sheet(&mut self, sheet_name: &str) -> Result<SheetCells, XlBridgeError> {
        let range = self
            .workbook
            .worksheet_range(sheet_name)
            .map_err(|e| XlBridgeError::Parse(e.into()))?;

        let (row_offset, col_offset) = range.start().unwrap_or((0, 0));
        let cells = range
            .cells()
            .filter(|(_, _, value)| !matches!(value, Data::Empty))
            .map(|(row, col, value)| {
                (
                    CellCoord::new(row as u32 + row_offset, col as u32 + col_offset),
                    value.clone(),
                )
            })
            .collect();

        let merged_regions =
            merged_regions(sheet_name, self.workbook.worksheet_merge_cells(sheet_name));

        Ok(SheetCells {
            cells,
            merged_regions,
        })
    }
}

/// 結合セル範囲の読み込み結果を変換する
///
/// 読み込めなかった場合は警告を出し、結合なしとして扱います。
fn merged_regions(
    sheet_name: &str,
    result: Option<Result<Vec<Dimensions>, XlsxError>>,
) -> Vec<MergedRegion> {
    match result {
        Some(Ok(regions)) => regions
            .iter()
            .map(|dims| {
                let start = CellCoord::new(dims.start.0, dims.start.1);
                let end = CellCoord::new(dims.end.0, dims.end.1);
                MergedRegion::new(CellRange::new(start, end))
            })
            .collect(),
        Some(Err(e)) => {
            log::warn!("{}: merged cells unreadable, treated as unmerged: {}", sheet_name, e);
            Vec::new()
        }
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merged_regions_from_dimensions() {
        let regions = merged_regions("Sheet1", Some(Ok(vec![Dimensions::new((0, 0), (1, 2))])));
        assert_eq!(regions.len(), 1);
        assert!(regions[0].is_slave(CellCoord::new(1, 2)));
        assert!(!regions[0].is_slave(CellCoord::new(0, 0)));
    }

    #[test]
    fn test_merged_regions_read_error_is_unmerged() {
        let error = XlsxError::Unexpected("mergeCell without ref");
        assert!(merged_regions("Sheet1", Some(Err(error))).is_empty());
        assert!(merged_regions("Sheet1", None).is_empty());
    }
}
