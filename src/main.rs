// ==========================================
// 市场价格数据导入工具 - 命令行入口
// ==========================================
// 用法:
//   market-price-importer --file 询价表.xlsx \
//       --db foodapp.db --period 2025年9月上旬 \
//       --start-date 2025-09-01 --end-date 2025-09-10
// ==========================================

use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use market_price_importer::domain::types::PeriodType;
use market_price_importer::importer::{ExcelRowSource, ImportPlan, PriceImporter, SheetLayout};
use market_price_importer::{db, logging};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// 市场价格数据导入工具
#[derive(Parser, Debug)]
#[command(name = "market-price-importer", version, about = "导入市场价格数据")]
struct Cli {
    /// SQLite 数据库文件路径
    #[arg(long, default_value = "foodapp.db")]
    db: String,

    /// Excel 文件路径
    #[arg(long)]
    file: String,

    /// 价格时期名称
    #[arg(long, default_value = "2025年9月上旬")]
    period: String,

    /// 开始日期 (YYYY-MM-DD)
    #[arg(long = "start-date", default_value = "2025-09-01")]
    start_date: NaiveDate,

    /// 结束日期 (YYYY-MM-DD)
    #[arg(long = "end-date", default_value = "2025-09-10")]
    end_date: NaiveDate,

    /// 组织名称
    #[arg(long, default_value = "都匀市")]
    org: String,

    /// 自定义表格布局 JSON（缺省使用内置布局）
    #[arg(long)]
    layout: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();

    tracing::info!("==================================================");
    tracing::info!("市场价格数据导入工具 v{}", market_price_importer::VERSION);
    tracing::info!("==================================================");

    // 打开数据库是唯一的进程级致命错误
    let conn = db::open_connection(&cli.db)
        .with_context(|| format!("打开数据库失败: {}", cli.db))?;
    db::init_schema(&conn).context("初始化数据库 schema 失败")?;
    let conn = Arc::new(Mutex::new(conn));

    let layout = match &cli.layout {
        Some(path) => SheetLayout::from_json_file(path)
            .with_context(|| format!("读取布局配置失败: {}", path.display()))?,
        None => SheetLayout::standard(),
    };

    let plan = ImportPlan {
        org_name: cli.org,
        period_name: cli.period,
        start_date: cli.start_date,
        end_date: cli.end_date,
        period_type: PeriodType::TenDay,
        sheets: ImportPlan::standard_sheets(),
        layout,
    };

    // 文件打不开不是致命错误: 记日志后照常收尾（与工作表级隔离一致）
    let mut source = match ExcelRowSource::open(&cli.file) {
        Ok(source) => source,
        Err(e) => {
            tracing::error!("读取 Excel 失败: {}", e);
            tracing::info!("所有数据导入完成！");
            return Ok(());
        }
    };

    let importer = PriceImporter::new(conn);
    let report = importer.import(&mut source, &plan);

    tracing::info!("==================================================");
    tracing::info!(
        "导入完成: {} 个工作表成功, {} 个失败",
        report.sheets.len(),
        report.failed_sheets
    );
    tracing::info!(
        "行统计: 共 {} 行, 导入 {}, 跳过 {}, 失败 {}",
        report.total_rows(),
        report.imported_rows(),
        report.skipped_rows(),
        report.failed_rows()
    );
    tracing::info!(
        "价格统计: 市场价格 {} 条, 供应商结算价 {} 条, 写入失败 {} 条, 格式警告 {} 条",
        report.market_price_facts(),
        report.supplier_price_facts(),
        report.fact_failures(),
        report.value_warnings()
    );
    tracing::info!("耗时: {} ms", report.elapsed_ms);
    tracing::info!("所有数据导入完成！");

    Ok(())
}
