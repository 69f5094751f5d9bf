// ==========================================
// 导入编排器集成测试
// ==========================================
// 测试目标: 完整导入流程的幂等性与失败隔离
// 行源: InMemoryRowSource（Excel 端到端见 excel_e2e_test）
// ==========================================


use chrono::NaiveDate;
use market_price_importer::domain::types::{MarketType, PeriodType, PriceType};
use market_price_importer::importer::{
    ImportPlan, InMemoryRowSource, PriceImporter, RowRecord, SheetLayout, SheetTask,
};
use market_price_importer::logging;
use rusqlite::Connection;
use test_helpers::{count_rows, create_test_db, open_shared, query_int, query_text};

fn row(pairs: &[(&str, &str)]) -> RowRecord {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn test_plan(sheets: Vec<SheetTask>) -> ImportPlan {
    ImportPlan {
        org_name: "都匀市".to_string(),
        period_name: "2025年9月上旬".to_string(),
        start_date: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2025, 9, 10).unwrap(),
        period_type: PeriodType::TenDay,
        sheets,
        layout: SheetLayout::standard(),
    }
}

fn vegetables_plan() -> ImportPlan {
    test_plan(vec![SheetTask::new("蔬菜类", "蔬菜类")])
}

#[test]
fn test_cabbage_guided_price_scenario() {
    logging::init_test();
    let (_temp, db_path) = create_test_db().unwrap();
    let importer = PriceImporter::new(open_shared(&db_path));

    let mut source = InMemoryRowSource::new().with_sheet(
        "蔬菜类",
        vec![row(&[
            ("品名", "白菜"),
            ("规格标准", "新鲜"),
            ("单位", "斤"),
            ("发改委指导价", "2.50"),
        ])],
    );

    let report = importer.import(&mut source, &vegetables_plan());
    assert_eq!(report.imported_rows(), 1);
    assert_eq!(report.market_price_facts(), 1);
    assert_eq!(report.fact_failures(), 0);

    // 一个商品 + 一条指导价事实，价格精确为 2.50
    assert_eq!(count_rows(&db_path, "base_goods"), 1);
    assert_eq!(count_rows(&db_path, "base_market_price"), 1);
    assert_eq!(
        query_text(&db_path, "SELECT price FROM base_market_price LIMIT 1"),
        "2.50"
    );
    assert_eq!(
        query_int(&db_path, "SELECT price_type FROM base_market_price LIMIT 1"),
        PriceType::Guided.code()
    );
}

#[test]
fn test_blank_goods_name_row_skipped_silently() {
    logging::init_test();
    let (_temp, db_path) = create_test_db().unwrap();
    let importer = PriceImporter::new(open_shared(&db_path));

    let mut source = InMemoryRowSource::new().with_sheet(
        "蔬菜类",
        vec![
            row(&[("品名", ""), ("发改委指导价", "2.50")]),
            row(&[("品名", "萝卜"), ("富万家超市", "1.80")]),
        ],
    );

    let report = importer.import(&mut source, &vegetables_plan());
    // 空名行静默跳过，后续行照常处理
    assert_eq!(report.skipped_rows(), 1);
    assert_eq!(report.imported_rows(), 1);
    assert_eq!(report.failed_rows(), 0);
    assert_eq!(count_rows(&db_path, "base_goods"), 1);
    assert_eq!(count_rows(&db_path, "base_market_price"), 1);
}

#[test]
fn test_unparseable_price_warns_and_row_continues() {
    logging::init_test();
    let (_temp, db_path) = create_test_db().unwrap();
    let importer = PriceImporter::new(open_shared(&db_path));

    let mut source = InMemoryRowSource::new().with_sheet(
        "蔬菜类",
        vec![row(&[
            ("品名", "鲤鱼"),
            ("发改委指导价", "N/A"),
            ("富万家超市", "3.20"),
        ])],
    );

    let report = importer.import(&mut source, &vegetables_plan());
    assert_eq!(report.value_warnings(), 1);
    assert_eq!(report.imported_rows(), 1);
    // N/A 列无事实，其余列照常写入
    assert_eq!(count_rows(&db_path, "base_market_price"), 1);
    assert_eq!(
        query_text(&db_path, "SELECT price FROM base_market_price LIMIT 1"),
        "3.20"
    );
}

#[test]
fn test_current_avg_creates_synthetic_market_and_supplier_facts() {
    logging::init_test();
    let (_temp, db_path) = create_test_db().unwrap();
    let importer = PriceImporter::new(open_shared(&db_path));

    let mut source = InMemoryRowSource::new().with_sheet(
        "蔬菜类",
        vec![row(&[("品名", "苹果"), ("本期均价", "3.00")])],
    );

    let report = importer.import(&mut source, &vegetables_plan());
    assert_eq!(report.market_price_facts(), 1);
    assert_eq!(report.supplier_price_facts(), 2);

    // 均价列挂在以列标签命名的合成市场上，类型 5 = 其他
    assert_eq!(
        query_int(
            &db_path,
            "SELECT market_type FROM base_market WHERE name = '本期均价'"
        ),
        MarketType::Other.code()
    );
    assert_eq!(
        query_int(
            &db_path,
            "SELECT price_type FROM base_market_price LIMIT 1"
        ),
        PriceType::CurrentPeriodAvg.code()
    );

    // 两家供应商: 相同参考价，各自的下浮比例
    assert_eq!(count_rows(&db_path, "base_supplier_price"), 2);
    assert_eq!(
        query_int(
            &db_path,
            "SELECT COUNT(DISTINCT reference_price) FROM base_supplier_price"
        ),
        1
    );
    assert_eq!(
        query_text(
            &db_path,
            "SELECT reference_price FROM base_supplier_price LIMIT 1"
        ),
        "3.00"
    );
    assert_eq!(
        query_int(
            &db_path,
            "SELECT COUNT(DISTINCT float_ratio) FROM base_supplier_price"
        ),
        2
    );
}

#[test]
fn test_reimport_is_idempotent() {
    logging::init_test();
    let (_temp, db_path) = create_test_db().unwrap();
    let importer = PriceImporter::new(open_shared(&db_path));
    let plan = vegetables_plan();

    let rows = vec![
        row(&[
            ("品名", "白菜"),
            ("发改委指导价", "2.50"),
            ("富万家超市", "2.80"),
            ("本期均价", "3.00"),
        ]),
        row(&[("品名", "萝卜"), ("大润发", "1.60")]),
    ];

    let mut source = InMemoryRowSource::new().with_sheet("蔬菜类", rows.clone());
    importer.import(&mut source, &plan);

    let goods_ids_first = all_ids(&db_path, "base_goods");
    let market_price_count = count_rows(&db_path, "base_market_price");
    let supplier_price_count = count_rows(&db_path, "base_supplier_price");

    // 相同数据再导一遍: 实体 id 不变，事实不重复
    let mut source = InMemoryRowSource::new().with_sheet("蔬菜类", rows);
    let report = importer.import(&mut source, &plan);
    assert_eq!(report.imported_rows(), 2);

    assert_eq!(all_ids(&db_path, "base_goods"), goods_ids_first);
    assert_eq!(count_rows(&db_path, "base_market_price"), market_price_count);
    assert_eq!(count_rows(&db_path, "base_supplier_price"), supplier_price_count);
    assert_eq!(count_rows(&db_path, "base_org"), 1);
    assert_eq!(count_rows(&db_path, "base_market"), 4); // 发改委/富万家/大润发/本期均价
    assert_eq!(count_rows(&db_path, "supplier"), 2);
}

#[test]
fn test_reimport_with_changed_price_overwrites() {
    logging::init_test();
    let (_temp, db_path) = create_test_db().unwrap();
    let importer = PriceImporter::new(open_shared(&db_path));
    let plan = vegetables_plan();

    let mut source = InMemoryRowSource::new()
        .with_sheet("蔬菜类", vec![row(&[("品名", "白菜"), ("发改委指导价", "2.50")])]);
    importer.import(&mut source, &plan);

    let mut source = InMemoryRowSource::new()
        .with_sheet("蔬菜类", vec![row(&[("品名", "白菜"), ("发改委指导价", "2.80")])]);
    importer.import(&mut source, &plan);

    assert_eq!(count_rows(&db_path, "base_market_price"), 1);
    assert_eq!(
        query_text(&db_path, "SELECT price FROM base_market_price LIMIT 1"),
        "2.80"
    );
}

#[test]
fn test_missing_sheet_does_not_abort_run() {
    logging::init_test();
    let (_temp, db_path) = create_test_db().unwrap();
    let importer = PriceImporter::new(open_shared(&db_path));

    let plan = test_plan(vec![
        SheetTask::new("蔬菜类", "蔬菜类"),
        SheetTask::new("水果类", "水果类"),
    ]);

    // 行源只有水果表，蔬菜表整体失败但不影响后续
    let mut source = InMemoryRowSource::new().with_sheet(
        "水果类",
        vec![row(&[("品名", "苹果"), ("富万家超市", "4.50")])],
    );

    let report = importer.import(&mut source, &plan);
    assert_eq!(report.failed_sheets, 1);
    assert_eq!(report.sheets.len(), 1);
    assert_eq!(report.imported_rows(), 1);
    assert_eq!(count_rows(&db_path, "base_goods"), 1);
}

#[test]
fn test_fact_write_failure_degrades_without_aborting_row() {
    logging::init_test();
    let (_temp, db_path) = create_test_db().unwrap();
    let importer = PriceImporter::new(open_shared(&db_path));

    // 删掉市场价格表: 市场价格写入全部失败，行与供应商结算价不受影响
    let conn = Connection::open(&db_path).unwrap();
    conn.execute("DROP TABLE base_market_price", []).unwrap();
    drop(conn);

    let mut source = InMemoryRowSource::new().with_sheet(
        "蔬菜类",
        vec![row(&[
            ("品名", "白菜"),
            ("发改委指导价", "2.50"),
            ("本期均价", "3.00"),
        ])],
    );

    let report = importer.import(&mut source, &vegetables_plan());
    assert_eq!(report.failed_sheets, 0);
    assert_eq!(report.failed_rows(), 0);
    assert_eq!(report.imported_rows(), 1);
    assert_eq!(report.fact_failures(), 2);
    assert_eq!(report.market_price_facts(), 0);
    // 事实独立: 供应商结算价照常写入
    assert_eq!(report.supplier_price_facts(), 2);
    assert_eq!(count_rows(&db_path, "base_supplier_price"), 2);
}

#[test]
fn test_entity_failure_aborts_row_but_not_sheet() {
    logging::init_test();
    let (_temp, db_path) = create_test_db().unwrap();
    let importer = PriceImporter::new(open_shared(&db_path));

    // 删掉商品表: 行级实体归一失败，整行中止但表继续
    let conn = Connection::open(&db_path).unwrap();
    conn.execute("DROP TABLE base_goods", []).unwrap();
    drop(conn);

    let mut source = InMemoryRowSource::new().with_sheet(
        "蔬菜类",
        vec![
            row(&[("品名", "白菜"), ("发改委指导价", "2.50")]),
            row(&[("品名", "萝卜"), ("富万家超市", "1.80")]),
        ],
    );

    let report = importer.import(&mut source, &vegetables_plan());
    assert_eq!(report.failed_sheets, 0);
    assert_eq!(report.failed_rows(), 2);
    assert_eq!(report.imported_rows(), 0);
    assert_eq!(report.market_price_facts(), 0);
    // 行前置实体（规格/单位）在归一失败前已各自提交
    assert_eq!(count_rows(&db_path, "base_spec"), 1);
}

#[test]
fn test_spec_and_unit_defaults_applied() {
    logging::init_test();
    let (_temp, db_path) = create_test_db().unwrap();
    let importer = PriceImporter::new(open_shared(&db_path));

    let mut source = InMemoryRowSource::new().with_sheet(
        "蔬菜类",
        vec![row(&[("品名", "土豆"), ("育英巷菜市场", "2.20")])],
    );

    importer.import(&mut source, &vegetables_plan());
    assert_eq!(query_text(&db_path, "SELECT name FROM base_spec LIMIT 1"), "新鲜");
    assert_eq!(query_text(&db_path, "SELECT name FROM base_unit LIMIT 1"), "斤");
}

/// 某张表的全部 id（排序后），用于幂等性比对
fn all_ids(db_path: &str, table: &str) -> Vec<String> {
    let conn = Connection::open(db_path).unwrap();
    let mut stmt = conn
        .prepare(&format!("SELECT id FROM {} ORDER BY id", table))
        .unwrap();
    let ids = stmt
        .query_map([], |r| r.get::<_, String>(0))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    ids
}
