//! Formatter Module
//!
//! セル値を翻訳ファイルに出力する文字列へ変換するモジュール。

use calamine::{Data, ExcelDateTime};
use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::xlsx::xml::decode_excel_text;

/// 日時の出力形式
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Excelで表現できる最大のシリアル値（9999-12-31の翌日）
const MAX_SERIAL: f64 = 2_958_466.0;

/// 整数として出力する浮動小数点数の上限（2^53）
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// セル値フォーマッター
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CellFormatter {
    /// 1904年エポックを使用するかどうか
    is_1904: bool,
}

impl CellFormatter {
    /// 新しいフォーマッターを生成
    ///
    /// # 引数
    ///
    /// * `is_1904` - ワークブックが1904年エポックを使用するかどうか
    pub fn new(is_1904: bool) -> Self {
        Self { is_1904 }
    }

    /// セル値を文字列に変換
    ///
    /// # 戻り値
    ///
    /// * `Some(String)` - 出力する文字列（前後の空白は除去しない、`_xHHHH_`は復号）
    /// * `None` - 空セル
    pub fn format(&self, value: &Data) -> Option<String> {
        let text = match value {
            Data::Empty => return None,
            Data::String(s) => decode_excel_text(s).into_owned(),
            Data::Int(i) => i.to_string(),
            Data::Float(f) => format_number(*f),
            Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Data::DateTime(dt) => self.format_datetime(dt),
            Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
            Data::Error(e) => e.to_string(),
        };
        Some(text)
    }

    fn format_datetime(&self, value: &ExcelDateTime) -> String {
        let serial = value.as_f64();
        if value.is_duration() {
            return format_number(serial);
        }
        DateFormatter::to_datetime(serial, self.is_1904)
            .map(|dt| dt.format(DATETIME_FORMAT).to_string())
            .unwrap_or_else(|| format_number(serial))
    }
}

/// 数値を文字列に変換（整数値は小数点なし）
fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// 日付フォーマッター
///
/// Excelのシリアル日付値を日時に変換します。
pub(crate) struct DateFormatter;

impl DateFormatter {
    /// シリアル値を日時に変換
    ///
    /// # エポックシステム
    ///
    /// - 1900年システム: 1899年12月30日起算。シリアル値60（存在しない1900年2月29日）より前は
    ///   Excelのうるう年バグを補正するため1日ずらす（シリアル値1 = 1900年1月1日）
    /// - 1904年システム: 1904年1月1日起算（シリアル値0 = 1904年1月1日）
    ///
    /// # 戻り値
    ///
    /// * `None` - 負の値や範囲外の値
    pub fn to_datetime(serial: f64, is_1904: bool) -> Option<NaiveDateTime> {
        if !serial.is_finite() || !(0.0..MAX_SERIAL).contains(&serial) {
            return None;
        }

        let (epoch, offset) = if is_1904 {
            (NaiveDate::from_ymd_opt(1904, 1, 1)?, 0)
        } else if serial < 60.0 {
            (NaiveDate::from_ymd_opt(1899, 12, 30)?, 1)
        } else {
            (NaiveDate::from_ymd_opt(1899, 12, 30)?, 0)
        };

        let days = serial.floor();
        let seconds = ((serial - days) * 86_400.0).round() as i64;
        epoch
            .checked_add_signed(Duration::days(days as i64 + offset))?
            .and_hms_opt(0, 0, 0)?
            .checked_add_signed(Duration::seconds(seconds))
    }
}
