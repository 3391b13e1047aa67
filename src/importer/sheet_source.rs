// ==========================================
// 抓取结果导入系统 - 工作表来源实现
// ==========================================
// 支持: Excel (.xlsx/.xlsm/.xls/.xlsb/.ods) / CSV (.csv) / 内存工作簿
// 约定: 首行为表头；完全空白的行跳过；空单元格为 CellValue::Empty
// ==========================================

use crate::domain::{CellValue, InMemoryWorkbook, Row, Sheet};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::SheetSource;
use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const EXCEL_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xls", "xlsb", "ods"];

// ==========================================
// Excel 工作簿
// ==========================================
pub struct ExcelWorkbookSource {
    workbook: Sheets<BufReader<File>>,
}

impl ExcelWorkbookSource {
    pub fn open<P: AsRef<Path>>(path: P) -> ImportResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        let workbook = open_workbook_auto(path)?;
        info!(file_path = %path.display(), "Excel 工作簿已打开");
        Ok(Self { workbook })
    }
}

impl SheetSource for ExcelWorkbookSource {
    fn list_sheet_names(&mut self) -> ImportResult<Vec<String>> {
        Ok(self.workbook.sheet_names())
    }

    fn read_sheet(&mut self, name: &str) -> ImportResult<Sheet> {
        let range = self.workbook.worksheet_range(name)?;
        Ok(range_to_sheet(name, &range))
    }
}

fn range_to_sheet(name: &str, range: &Range<Data>) -> Sheet {
    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect(),
        None => return Sheet::new(name, Vec::<String>::new()),
    };

    let mut sheet = Sheet::new(name, headers.iter().filter(|h| !h.is_empty()).cloned());
    for data_row in rows {
        let row: Row = headers
            .iter()
            .zip(data_row.iter())
            .filter(|(header, _)| !header.is_empty())
            .map(|(header, cell)| (header.clone(), excel_cell_value(cell)))
            .collect();

        if row.is_blank() {
            continue;
        }
        sheet.push_row(row);
    }

    debug!(sheet = %name, rows = sheet.rows.len(), "Excel 工作表读取完成");
    sheet
}

/// Excel 单元格 → CellValue（错误单元格视为缺失）
fn excel_cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(CellValue::DateTime)
            .unwrap_or(CellValue::Empty),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

// ==========================================
// CSV 文件（单工作表，名称 = 文件名主干）
// ==========================================
pub struct CsvWorkbookSource {
    path: PathBuf,
    sheet_name: String,
}

impl CsvWorkbookSource {
    pub fn open<P: AsRef<Path>>(path: P) -> ImportResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        let sheet_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Sheet1".to_string());

        Ok(Self {
            path: path.to_path_buf(),
            sheet_name,
        })
    }
}

impl SheetSource for CsvWorkbookSource {
    fn list_sheet_names(&mut self) -> ImportResult<Vec<String>> {
        Ok(vec![self.sheet_name.clone()])
    }

    fn read_sheet(&mut self, name: &str) -> ImportResult<Sheet> {
        if name != self.sheet_name {
            return Err(ImportError::SheetNotFound(name.to_string()));
        }

        let file = File::open(&self.path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut sheet = Sheet::new(name, headers.iter().filter(|h| !h.is_empty()).cloned());
        for result in reader.records() {
            let record = result?;
            let row: Row = headers
                .iter()
                .zip(record.iter())
                .filter(|(header, _)| !header.is_empty())
                .map(|(header, value)| {
                    let cell = if value.is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::from(value)
                    };
                    (header.clone(), cell)
                })
                .collect();

            // 跳过完全空白的行
            if row.is_blank() {
                continue;
            }
            sheet.push_row(row);
        }

        debug!(sheet = %name, rows = sheet.rows.len(), "CSV 工作表读取完成");
        Ok(sheet)
    }
}

// ==========================================
// 内存工作簿
// ==========================================
impl SheetSource for InMemoryWorkbook {
    fn list_sheet_names(&mut self) -> ImportResult<Vec<String>> {
        Ok(self.sheet_names())
    }

    fn read_sheet(&mut self, name: &str) -> ImportResult<Sheet> {
        self.sheet(name)
            .cloned()
            .ok_or_else(|| ImportError::SheetNotFound(name.to_string()))
    }
}

// ==========================================
// 通用入口（根据扩展名自动选择）
// ==========================================
pub fn open_workbook_source<P: AsRef<Path>>(path: P) -> ImportResult<Box<dyn SheetSource>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "csv" => Ok(Box::new(CsvWorkbookSource::open(path)?)),
        e if EXCEL_EXTENSIONS.contains(&e) => Ok(Box::new(ExcelWorkbookSource::open(path)?)),
        _ => Err(ImportError::UnsupportedFormat(ext)),
    }
}
