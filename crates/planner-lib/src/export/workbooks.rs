//! Sheet layouts of the three analysis reports

use super::{Cell, Sheet, Workbook};
use crate::analysis::{
    DetailRow, FootprintReport, MigrationReport, ScaleDownReport, SummaryRow, LARGE_SLACK_CORES,
};
use chrono::{DateTime, Local};

/// Separator for list-valued fields such as `other_pools`
pub const LIST_DELIMITER: &str = ", ";

fn with_package(mut columns: Vec<&'static str>, include_package: bool) -> Vec<&'static str> {
    if include_package {
        columns.insert(2, "package");
    }
    columns
}

fn summary_cells(row: &SummaryRow, include_package: bool) -> Vec<Cell> {
    let mut cells = vec![Cell::text(&row.psm), Cell::text(&row.pool_identifier)];
    if include_package {
        cells.push(Cell::optional(row.package.as_deref()));
    }
    cells.extend([
        Cell::from(row.instance_num),
        Cell::from(row.cpu_limit),
        Cell::from(row.mem_limit),
    ]);
    cells
}

fn detail_cells(row: &DetailRow, include_package: bool) -> Vec<Cell> {
    let mut cells = vec![Cell::text(&row.psm), Cell::text(&row.pool_identifier)];
    if include_package {
        cells.push(Cell::optional(row.package.as_deref()));
    }
    cells.extend([
        Cell::text(&row.physical_cluster),
        Cell::text(&row.iaas_cluster),
        Cell::from(row.instance_num),
        Cell::from(row.cpu_limit),
        Cell::from(row.mem_limit),
        Cell::text(&row.cluster_name),
        Cell::optional(row.dept_level1.as_deref()),
        Cell::optional(row.dept_level2.as_deref()),
        Cell::optional(row.host_type.as_deref()),
        Cell::text(&row.idc),
    ]);
    cells
}

/// Summary sheet first, then detail, then statistics
pub fn migration_workbook(report: &MigrationReport) -> Workbook {
    let include_package = report.include_package;

    let mut summary = Sheet::new(
        "资源汇总",
        with_package(
            vec!["psm", "pool_identifier", "instance_num", "cpu_limit", "mem_limit"],
            include_package,
        ),
    );
    for row in &report.summary {
        summary.push(summary_cells(row, include_package));
    }

    let mut detail = Sheet::new(
        "详细数据",
        with_package(
            vec![
                "psm",
                "pool_identifier",
                "physical_cluster",
                "iaas_cluster",
                "instance_num",
                "cpu_limit",
                "mem_limit",
                "cluster_name",
                "dept_level1",
                "dept_level2",
                "host_type",
                "idc",
            ],
            include_package,
        ),
    );
    for row in &report.detail {
        detail.push(detail_cells(row, include_package));
    }

    let mut stats = Sheet::new("统计信息", ["资源池1(需借出)", "资源池2(可补充)", "PSM数量"]);
    stats.push(vec![
        Cell::text(&report.stats.pool_a),
        Cell::text(&report.stats.pool_b),
        Cell::from(report.stats.psm_count),
    ]);

    Workbook {
        sheets: vec![summary, detail, stats],
    }
}

fn stats_sheet(items: Vec<(&str, Cell)>) -> Sheet {
    let mut sheet = Sheet::new("统计信息", ["统计项", "数值"]);
    for (label, value) in items {
        sheet.push(vec![Cell::text(label), value]);
    }
    sheet
}

fn notes_sheet(lines: Vec<String>) -> Sheet {
    let mut sheet = Sheet::new("分析说明", ["说明"]);
    for line in lines {
        sheet.push(vec![Cell::Text(line)]);
    }
    sheet
}

fn analysed_at(now: DateTime<Local>) -> String {
    format!("分析时间: {}", now.format("%Y-%m-%d %H:%M:%S"))
}

pub fn scale_down_workbook(
    report: &ScaleDownReport,
    idc: &str,
    pool: &str,
    now: DateTime<Local>,
) -> Workbook {
    let mut records = Sheet::new(
        "缩容建议",
        [
            "psm",
            "cluster_id",
            "package",
            "cpu_limit",
            "mem_limit",
            "save_cores",
            "cpu_util_max_1days",
            "cpu_util_max_7days",
            "mem_util_max_7days",
            "business_line",
        ],
    );
    for r in &report.records {
        records.push(vec![
            Cell::text(&r.psm),
            Cell::text(&r.cluster_id),
            Cell::text(&r.package),
            Cell::from(r.cpu_limit),
            Cell::from(r.mem_limit),
            Cell::from(r.save_cores),
            Cell::text(&r.cpu_util_max_1days),
            Cell::text(&r.cpu_util_max_7days),
            Cell::text(&r.mem_util_max_7days),
            Cell::text(&r.business_line),
        ]);
    }

    let over_threshold = format!("建议缩容核数大于{}的集群数", LARGE_SLACK_CORES);
    let stats = stats_sheet(vec![
        ("预计可释放CPU(核)", Cell::from(report.stats.total_save_cores)),
        ("符合条件的集群数量", Cell::from(report.stats.cluster_count)),
        (
            over_threshold.as_str(),
            Cell::from(report.stats.clusters_over_threshold),
        ),
    ]);

    let notes = notes_sheet(vec![
        analysed_at(now),
        format!("机房: {idc}"),
        format!("资源池: {pool}"),
        "缩容建议: 优先考虑缩容建议核数较大的集群，缩容前请确认服务实际运行情况".to_string(),
    ]);

    Workbook {
        sheets: vec![records, stats, notes],
    }
}

pub fn footprint_workbook(
    report: &FootprintReport,
    idc: &str,
    pool: &str,
    now: DateTime<Local>,
) -> Workbook {
    let mut records = Sheet::new(
        "可腾挪集群",
        [
            "psm",
            "deployment_status",
            "other_pools",
            "other_pool_cluster_count",
            "idc",
            "pool",
            "instance_num",
            "cpu_limit",
            "mem_limit",
            "dept_level1",
            "dept_level2",
            "package",
            "cluster_id",
        ],
    );
    for r in &report.records {
        let mut cells = vec![
            Cell::text(&r.psm),
            Cell::text(r.deployment_status.as_str()),
            Cell::Text(r.other_pools.join(LIST_DELIMITER)),
            Cell::from(r.other_pool_cluster_count),
            Cell::text(&r.idc),
            Cell::text(&r.pool),
        ];
        match &r.target {
            Some(t) => cells.extend([
                Cell::from(t.instance_num),
                Cell::from(t.cpu_limit),
                Cell::from(t.mem_limit),
                Cell::optional(t.dept_level1.as_deref()),
                Cell::optional(t.dept_level2.as_deref()),
                Cell::optional(t.package.as_deref()),
                Cell::optional(t.cluster_id.as_deref()),
            ]),
            None => cells.extend(std::iter::repeat(Cell::Empty).take(7)),
        }
        records.push(cells);
    }

    let stats = stats_sheet(vec![
        ("总查询PSM数量", Cell::from(report.stats.total_psm)),
        ("可跨资源池腾挪的PSM数量", Cell::from(report.stats.migratable_psm)),
        ("总集群数量", Cell::from(report.stats.total_clusters)),
    ]);

    let notes = notes_sheet(vec![
        analysed_at(now),
        format!("机房: {idc}"),
        format!("查询资源池: {pool}"),
        "使用建议: 选择可腾挪状态的PSM，结合其他可用资源池信息进行资源规划".to_string(),
    ]);

    Workbook {
        sheets: vec![records, stats, notes],
    }
}
