// ==========================================
// 市场价格数据导入工具 - 导入编排器
// ==========================================
// 职责: 按配置的 (工作表, 品类) 列表迭代，
//       串联 行映射 → 实体归一 → 价格事实写入
// 失败隔离:
// - 单行实体归一失败 → 记日志，该行剩余工作中止，下一行继续
// - 单条价格事实写入失败 → 记日志并计数，同行其余事实继续
// - 单个工作表读取失败 → 记日志，下一个工作表继续
// ==========================================

use crate::domain::types::{MarketType, PeriodType};
use crate::importer::error::ImportResult;
use crate::importer::layout::SheetLayout;
use crate::importer::row_mapper::{RowIntent, RowMapper};
use crate::importer::sheet_source::RowSource;
use crate::repository::entity_repo::{EntityDraft, EntityRepository};
use crate::repository::error::RepositoryResult;
use crate::repository::price_repo::PriceFactRepository;
use chrono::NaiveDate;
use rusqlite::Connection;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

// ==========================================
// ImportPlan - 导入计划
// ==========================================

/// 一次导入任务: 一个工作表对应一个品类
#[derive(Debug, Clone)]
pub struct SheetTask {
    pub sheet_name: String,
    pub category_name: String,
}

impl SheetTask {
    pub fn new(sheet_name: &str, category_name: &str) -> Self {
        Self {
            sheet_name: sheet_name.to_string(),
            category_name: category_name.to_string(),
        }
    }
}

/// 一次完整导入的计划: 共享实体参数 + 任务列表 + 表格布局
#[derive(Debug, Clone)]
pub struct ImportPlan {
    pub org_name: String,
    pub period_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub period_type: PeriodType,
    pub sheets: Vec<SheetTask>,
    pub layout: SheetLayout,
}

impl ImportPlan {
    /// 固定的 (工作表, 品类) 列表（与原始询价表一致）
    pub fn standard_sheets() -> Vec<SheetTask> {
        vec![
            SheetTask::new("蔬菜类", "蔬菜类"),
            SheetTask::new("水产类", "水产类"),
            SheetTask::new("水果类", "水果类"),
        ]
    }
}

// ==========================================
// 导入报告
// ==========================================

/// 单个工作表的导入统计
#[derive(Debug, Clone, Default)]
pub struct SheetReport {
    pub sheet_name: String,
    pub total_rows: usize,
    pub imported_rows: usize,
    /// 商品名空白而跳过的行
    pub skipped_rows: usize,
    /// 实体归一失败而中止的行
    pub failed_rows: usize,
    pub market_price_facts: usize,
    pub supplier_price_facts: usize,
    /// 被捕获的价格事实写入失败数
    pub fact_failures: usize,
    /// 价格格式警告数
    pub value_warnings: usize,
}

/// 整次导入的汇总报告
#[derive(Debug, Default)]
pub struct ImportReport {
    pub sheets: Vec<SheetReport>,
    /// 整表读取失败而跳过的工作表数
    pub failed_sheets: usize,
    pub elapsed_ms: u128,
}

impl ImportReport {
    pub fn total_rows(&self) -> usize {
        self.sheets.iter().map(|s| s.total_rows).sum()
    }

    pub fn imported_rows(&self) -> usize {
        self.sheets.iter().map(|s| s.imported_rows).sum()
    }

    pub fn skipped_rows(&self) -> usize {
        self.sheets.iter().map(|s| s.skipped_rows).sum()
    }

    pub fn failed_rows(&self) -> usize {
        self.sheets.iter().map(|s| s.failed_rows).sum()
    }

    pub fn market_price_facts(&self) -> usize {
        self.sheets.iter().map(|s| s.market_price_facts).sum()
    }

    pub fn supplier_price_facts(&self) -> usize {
        self.sheets.iter().map(|s| s.supplier_price_facts).sum()
    }

    pub fn fact_failures(&self) -> usize {
        self.sheets.iter().map(|s| s.fact_failures).sum()
    }

    pub fn value_warnings(&self) -> usize {
        self.sheets.iter().map(|s| s.value_warnings).sum()
    }
}

// ==========================================
// PriceImporter - 导入编排器
// ==========================================

/// 导入编排器
pub struct PriceImporter {
    entity_repo: EntityRepository,
    price_repo: PriceFactRepository,
}

impl PriceImporter {
    /// 从共享连接创建（整个运行期复用同一连接）
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            entity_repo: EntityRepository::from_connection(conn.clone()),
            price_repo: PriceFactRepository::from_connection(conn),
        }
    }

    /// 执行完整导入: 逐表尝试，任何失败都不影响其余工作表
    pub fn import(&self, source: &mut dyn RowSource, plan: &ImportPlan) -> ImportReport {
        let started = Instant::now();
        let mut report = ImportReport::default();

        for task in &plan.sheets {
            tracing::info!("开始导入: {} (品类: {})", task.sheet_name, task.category_name);
            match self.import_sheet(source, task, plan) {
                Ok(sheet_report) => {
                    tracing::info!(
                        "完成导入: {} (共 {} 行, 导入 {}, 跳过 {}, 失败 {})",
                        task.sheet_name,
                        sheet_report.total_rows,
                        sheet_report.imported_rows,
                        sheet_report.skipped_rows,
                        sheet_report.failed_rows
                    );
                    report.sheets.push(sheet_report);
                }
                Err(e) => {
                    tracing::error!("导入 {} 失败: {}", task.sheet_name, e);
                    report.failed_sheets += 1;
                }
            }
        }

        report.elapsed_ms = started.elapsed().as_millis();
        report
    }

    /// 导入单个工作表
    ///
    /// 组织/品类/时期/具名市场/供应商每表只归一一次，行间共享
    pub fn import_sheet(
        &self,
        source: &mut dyn RowSource,
        task: &SheetTask,
        plan: &ImportPlan,
    ) -> ImportResult<SheetReport> {
        let rows = source.sheet_rows(&task.sheet_name)?;
        let mapper = RowMapper::new(plan.layout.clone());

        // 每表共享的基础实体
        let org_id = self
            .entity_repo
            .resolve_or_create(&EntityDraft::organization(&plan.org_name))?;
        let category_id = self
            .entity_repo
            .resolve_or_create(&EntityDraft::category(&task.category_name, &org_id))?;
        let period_id = self.entity_repo.resolve_or_create(&EntityDraft::price_period(
            &plan.period_name,
            plan.start_date,
            plan.end_date,
            plan.period_type,
            &org_id,
        ))?;

        // 具名市场一次性归一（列标签 → market_id）；
        // 汇总列的合成市场在行处理中按需懒创建并加入同一缓存
        let mut market_ids: HashMap<String, String> = HashMap::new();
        for column in &plan.layout.market_columns {
            if let Some(market) = &column.market {
                let id = self.entity_repo.resolve_or_create(&EntityDraft::market(
                    &market.name,
                    market.market_type,
                    &org_id,
                ))?;
                market_ids.insert(column.label.clone(), id);
            }
        }

        // 供应商一次性归一（供应商名 → supplier_id）
        let mut supplier_ids: HashMap<String, String> = HashMap::new();
        for supplier in &plan.layout.suppliers {
            let id = self.entity_repo.resolve_or_create(&EntityDraft::supplier(
                &supplier.name,
                supplier.float_ratio,
                &org_id,
            ))?;
            supplier_ids.insert(supplier.name.clone(), id);
        }

        let mut report = SheetReport {
            sheet_name: task.sheet_name.clone(),
            total_rows: rows.len(),
            ..Default::default()
        };

        for (idx, record) in rows.iter().enumerate() {
            let row_no = idx + 1;
            let Some(intent) = mapper.map_row(record, row_no) else {
                report.skipped_rows += 1;
                continue;
            };
            report.value_warnings += intent.value_warnings;

            match self.write_row(
                &intent,
                &category_id,
                &period_id,
                &org_id,
                &mut market_ids,
                &supplier_ids,
                &mut report,
            ) {
                Ok(()) => report.imported_rows += 1,
                Err(e) => {
                    tracing::error!("处理第 {} 行 ({}) 出错: {}", row_no, intent.goods_name, e);
                    report.failed_rows += 1;
                }
            }
        }

        Ok(report)
    }

    /// 执行一行的归一与写入
    ///
    /// 实体归一失败向上传播（中止本行）；
    /// 价格事实写入失败被就地捕获计数（事实之间相互独立）
    #[allow(clippy::too_many_arguments)]
    fn write_row(
        &self,
        intent: &RowIntent,
        category_id: &str,
        period_id: &str,
        org_id: &str,
        market_ids: &mut HashMap<String, String>,
        supplier_ids: &HashMap<String, String>,
        report: &mut SheetReport,
    ) -> RepositoryResult<()> {
        let spec_id = self
            .entity_repo
            .resolve_or_create(&EntityDraft::spec(&intent.spec_name))?;
        let unit_id = self
            .entity_repo
            .resolve_or_create(&EntityDraft::unit(&intent.unit_name))?;
        let goods_id = self.entity_repo.resolve_or_create(&EntityDraft::goods(
            &intent.goods_name,
            &spec_id,
            &unit_id,
            category_id,
            org_id,
        ))?;

        tracing::debug!(
            "处理商品: {} ({}/{})",
            intent.goods_name,
            intent.spec_name,
            intent.unit_name
        );

        for mp in &intent.market_prices {
            // 汇总列: 以列标签为名懒创建合成市场（类型 5 = 其他）
            let market_id = match market_ids.get(&mp.column_label) {
                Some(id) => id.clone(),
                None => {
                    let id = self.entity_repo.resolve_or_create(&EntityDraft::market(
                        &mp.column_label,
                        MarketType::Other,
                        org_id,
                    ))?;
                    market_ids.insert(mp.column_label.clone(), id.clone());
                    id
                }
            };

            match self.price_repo.upsert_market_price(
                &goods_id,
                &market_id,
                period_id,
                mp.price,
                mp.price_type,
                org_id,
            ) {
                Ok(()) => report.market_price_facts += 1,
                Err(e) => {
                    tracing::error!("插入市场价格失败 ({}): {}", mp.column_label, e);
                    report.fact_failures += 1;
                }
            }
        }

        for sp in &intent.supplier_prices {
            // 供应商在表级已归一；布局不一致时兜底懒创建
            let supplier_id = match supplier_ids.get(&sp.supplier_name) {
                Some(id) => id.clone(),
                None => self.entity_repo.resolve_or_create(&EntityDraft::supplier(
                    &sp.supplier_name,
                    sp.float_ratio,
                    org_id,
                ))?,
            };

            match self.price_repo.upsert_supplier_price(
                &goods_id,
                &supplier_id,
                period_id,
                sp.reference_price,
                sp.float_ratio,
                org_id,
            ) {
                Ok(()) => report.supplier_price_facts += 1,
                Err(e) => {
                    tracing::error!("插入供应商价格失败 ({}): {}", sp.supplier_name, e);
                    report.fact_failures += 1;
                }
            }
        }

        Ok(())
    }
}
