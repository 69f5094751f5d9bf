// ==========================================
// 市场价格数据导入工具 - 行源
// ==========================================
// 职责: 按工作表名产出"列标签 → 单元格文本"记录
// 约定（与原始询价表一致）:
// - 第 0 行为装饰性标题，跳过
// - 第 1 行为真实表头
// - 第 2 行起为数据，完全空白的行跳过
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::row_mapper::RowRecord;
use calamine::{open_workbook_auto, Reader, Sheets};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

// ==========================================
// RowSource Trait
// ==========================================

/// 行源接口
///
/// 生产实现为 ExcelRowSource；测试使用 InMemoryRowSource
pub trait RowSource {
    /// 读取指定工作表的全部数据行
    ///
    /// # 返回
    /// - Ok(Vec<RowRecord>): 数据行（已剥离装饰行与表头行）
    /// - Err: 工作表不存在或解析失败（该表被整体跳过）
    fn sheet_rows(&mut self, sheet_name: &str) -> ImportResult<Vec<RowRecord>>;
}

// ==========================================
// ExcelRowSource - Excel 行源
// ==========================================

/// Excel 行源（calamine，整个运行期只打开一次工作簿）
pub struct ExcelRowSource {
    workbook: Sheets<BufReader<File>>,
}

impl ExcelRowSource {
    /// 打开 Excel 工作簿
    pub fn open<P: AsRef<Path>>(path: P) -> ImportResult<Self> {
        let path = path.as_ref();

        // 检查文件存在
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        // 检查扩展名
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if ext != "xlsx" && ext != "xls" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let workbook = open_workbook_auto(path)?;
        Ok(Self { workbook })
    }
}

impl RowSource for ExcelRowSource {
    fn sheet_rows(&mut self, sheet_name: &str) -> ImportResult<Vec<RowRecord>> {
        let range = self
            .workbook
            .worksheet_range(sheet_name)
            .map_err(|_| ImportError::SheetNotFound(sheet_name.to_string()))?;

        let mut rows = range.rows();

        // 第 0 行为装饰性标题，跳过
        rows.next();

        // 第 1 行为真实表头
        let header_row = rows.next().ok_or_else(|| {
            ImportError::ExcelParseError(format!("工作表 {} 无表头行", sheet_name))
        })?;
        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        // 第 2 行起为数据
        let mut records = Vec::new();
        for data_row in rows {
            let mut row_map = HashMap::new();

            for (col_idx, cell) in data_row.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    let value = cell.to_string().trim().to_string();
                    row_map.insert(header.clone(), value);
                }
            }

            // 跳过完全空白的行
            if row_map.values().all(|v| v.is_empty()) {
                continue;
            }

            records.push(row_map);
        }

        Ok(records)
    }
}

// ==========================================
// InMemoryRowSource - 内存行源（测试/演示用）
// ==========================================

/// 内存行源：预置"工作表名 → 数据行"映射
#[derive(Debug, Default)]
pub struct InMemoryRowSource {
    sheets: HashMap<String, Vec<RowRecord>>,
}

impl InMemoryRowSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// 链式添加一个工作表
    pub fn with_sheet(mut self, sheet_name: &str, rows: Vec<RowRecord>) -> Self {
        self.sheets.insert(sheet_name.to_string(), rows);
        self
    }
}

impl RowSource for InMemoryRowSource {
    fn sheet_rows(&mut self, sheet_name: &str) -> ImportResult<Vec<RowRecord>> {
        self.sheets
            .get(sheet_name)
            .cloned()
            .ok_or_else(|| ImportError::SheetNotFound(sheet_name.to_string()))
    }
}
