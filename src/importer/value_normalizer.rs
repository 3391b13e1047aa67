// ==========================================
// 抓取结果导入系统 - 单元格值标准化
// ==========================================
// 职责: 原始单元格值 → 日期 / 金额 / 布尔 / 数值
// 红线: 纯函数，不抛错；解析失败记录日志并返回 None，由调用方回退默认值
// ==========================================

use crate::domain::CellValue;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

// ISO 字符串末尾的亚秒 + Z（如 .123Z）统一为 Z
static RE_FRACTION_ZULU: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.\d+Z$").expect("valid fraction regex"));

// 金额中的第一段数字（可带小数点）
static RE_PRICE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+\.?\d*").expect("valid price regex"));

/// 带时区的 ISO 格式（Z 已替换为 +00:00）
const ZONED_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%:z"];

/// 无时区的 ISO 日期时间格式
const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// 纯日期格式（按优先级：日/月 先于 月/日）
const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%m-%d-%Y"];

const CURRENCY_SYMBOLS: [char; 3] = ['$', '£', '€'];

// ==========================================
// 日期
// ==========================================

/// 解析日期时间
///
/// # 支持
/// - 原生日期时间单元格
/// - ISO-8601 字符串（末尾 `.fffZ` 统一为 `Z`，带时区时保留当地时间）
/// - Y-M-D / D/M/Y / M/D/Y / D-M-Y / M-D-Y
///
/// # 返回
/// - None: 空值或无法解析
pub fn parse_date(value: &CellValue) -> Option<NaiveDateTime> {
    match value {
        CellValue::DateTime(dt) => Some(*dt),
        CellValue::Text(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return None;
            }
            let parsed = parse_date_str(trimmed);
            if parsed.is_none() {
                warn!(value = %trimmed, "日期解析失败，回退默认日期");
            }
            parsed
        }
        _ => None,
    }
}

/// 解析日期，失败时使用调用方提供的默认值
pub fn parse_date_or(value: &CellValue, default: NaiveDateTime) -> NaiveDateTime {
    parse_date(value).unwrap_or(default)
}

fn parse_date_str(raw: &str) -> Option<NaiveDateTime> {
    let normalized = RE_FRACTION_ZULU.replace(raw, "Z");
    let zoned = match normalized.strip_suffix('Z') {
        Some(stem) => format!("{}+00:00", stem),
        None => normalized.to_string(),
    };

    for fmt in ZONED_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&zoned, fmt) {
            return Some(dt.naive_local());
        }
    }

    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&zoned, fmt) {
            return Some(dt);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&zoned, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

// ==========================================
// 金额
// ==========================================

/// 去掉货币符号与千分位
pub fn clean_price_text(raw: &str) -> String {
    raw.chars()
        .filter(|c| !CURRENCY_SYMBOLS.contains(c) && *c != ',')
        .collect::<String>()
        .trim()
        .to_string()
}

/// 解析金额
///
/// # 规则
/// - 数值单元格直接转换
/// - 文本：去货币符号与千分位后取第一段数字
/// - 空值 / 无数字 → None
pub fn parse_price(value: &CellValue) -> Option<f64> {
    match value {
        CellValue::Int(i) => Some(*i as f64),
        CellValue::Float(f) if !f.is_nan() => Some(*f),
        CellValue::Text(raw) => {
            let cleaned = clean_price_text(raw);
            RE_PRICE_NUMBER
                .find(&cleaned)
                .and_then(|m| m.as_str().parse::<f64>().ok())
        }
        _ => None,
    }
}

// ==========================================
// 布尔
// ==========================================

/// 解析布尔值
///
/// # 规则
/// - true: true/t/yes/y/1/1.0（不区分大小写，TRIM）
/// - false: false/f/no/n/0/0.0
/// - 数值: 0 → false，非 0 → true
/// - 其他 → None
pub fn parse_bool(value: &CellValue) -> Option<bool> {
    match value {
        CellValue::Bool(b) => Some(*b),
        CellValue::Int(i) => Some(*i != 0),
        CellValue::Float(f) if !f.is_nan() => Some(*f != 0.0),
        CellValue::Text(raw) => match raw.trim().to_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" | "1.0" => Some(true),
            "false" | "f" | "no" | "n" | "0" | "0.0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

// ==========================================
// 数值
// ==========================================

/// 解析整数（浮点截断；文本允许千分位与小数）
pub fn parse_int(value: &CellValue) -> Option<i64> {
    match value {
        CellValue::Int(i) => Some(*i),
        CellValue::Float(f) if f.is_finite() => Some(f.trunc() as i64),
        CellValue::Text(_) => parse_float(value)
            .filter(|f| f.is_finite())
            .map(|f| f.trunc() as i64),
        _ => None,
    }
}

/// 解析浮点数（文本允许千分位）
pub fn parse_float(value: &CellValue) -> Option<f64> {
    match value {
        CellValue::Int(i) => Some(*i as f64),
        CellValue::Float(f) if !f.is_nan() => Some(*f),
        CellValue::Text(raw) => raw.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    }
}
