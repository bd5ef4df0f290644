//! Dual-pool migration command

use anyhow::Result;
use planner_lib::analysis::{DetailRow, MigrationOutcome, MigrationRequest, SummaryRow};
use planner_lib::export::migration_workbook;
use planner_lib::policy::Facilities;
use serde::Serialize;
use tabled::Tabled;

use super::{report_written, Backend, Session};
use crate::client::MigrationBody;
use crate::output::{format_quantity, print_info, print_json, print_table, print_warning, OutputFormat};

/// Row for the summary table
#[derive(Tabled)]
struct SummaryLine {
    #[tabled(rename = "PSM")]
    psm: String,
    #[tabled(rename = "Pool")]
    pool: String,
    #[tabled(rename = "Package")]
    package: String,
    #[tabled(rename = "Instances")]
    instances: i64,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "Mem")]
    mem: String,
}

/// Row for the detail table
#[derive(Tabled)]
struct DetailLine {
    #[tabled(rename = "PSM")]
    psm: String,
    #[tabled(rename = "Pool")]
    pool: String,
    #[tabled(rename = "Package")]
    package: String,
    #[tabled(rename = "Cluster")]
    cluster: String,
    #[tabled(rename = "IDC")]
    idc: String,
    #[tabled(rename = "Instances")]
    instances: i64,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "Mem")]
    mem: String,
}

#[derive(Debug, Serialize)]
struct MigrationView {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    source_pool: String,
    target_pool: String,
    psm_count: usize,
    summary: Vec<SummaryRow>,
    detail: Vec<DetailRow>,
    report_file: Option<String>,
}

/// Find services deployed under both pools
pub async fn run(
    session: &Session,
    idc: Option<String>,
    pool1: String,
    pool2: String,
    export: bool,
) -> Result<()> {
    let view = match &session.backend {
        Backend::Local { inventory } => {
            let request = MigrationRequest {
                facilities: Facilities::parse(idc.as_deref().unwrap_or("")),
                pool_a: pool1,
                pool_b: pool2,
            };
            let (pool_a, pool_b) = request.validate()?;
            let outcome = Session::planner(inventory)?.migration(&request)?;

            match outcome {
                MigrationOutcome::NoMatches => MigrationView {
                    status: "empty".to_string(),
                    message: Some(planner_lib::analysis::NO_DUAL_POOL_MATCH.to_string()),
                    source_pool: pool_a.identifier(),
                    target_pool: pool_b.identifier(),
                    psm_count: 0,
                    summary: Vec::new(),
                    detail: Vec::new(),
                    report_file: None,
                },
                MigrationOutcome::Matches(report) => {
                    let report_file = if export {
                        Some(session.export("resource_migration", &migration_workbook(&report))?)
                    } else {
                        None
                    };
                    MigrationView {
                        status: "success".to_string(),
                        message: None,
                        source_pool: report.stats.pool_a,
                        target_pool: report.stats.pool_b,
                        psm_count: report.stats.psm_count,
                        summary: report.summary,
                        detail: report.detail,
                        report_file,
                    }
                }
            }
        }
        Backend::Remote { client, data_file } => {
            let response = client
                .migration(&MigrationBody {
                    idc,
                    pool1,
                    pool2,
                    data_file: data_file.clone(),
                })
                .await?;
            MigrationView {
                status: response.status,
                message: response.message,
                source_pool: response.summary.source_pool,
                target_pool: response.summary.target_pool,
                psm_count: response.summary.psm_count,
                summary: response.results.summary,
                detail: response.results.detail,
                report_file: response.report_file,
            }
        }
    };

    render(&view, session.format)
}

fn render(view: &MigrationView, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(view)?,
        OutputFormat::Table => {
            if let Some(message) = &view.message {
                print_warning(message);
                return Ok(());
            }

            let summary: Vec<SummaryLine> = view
                .summary
                .iter()
                .map(|s| SummaryLine {
                    psm: s.psm.clone(),
                    pool: s.pool_identifier.clone(),
                    package: s.package.clone().unwrap_or_default(),
                    instances: s.instance_num,
                    cpu: format_quantity(s.cpu_limit),
                    mem: format_quantity(s.mem_limit),
                })
                .collect();
            print_table("资源汇总", summary);

            let detail: Vec<DetailLine> = view
                .detail
                .iter()
                .map(|d| DetailLine {
                    psm: d.psm.clone(),
                    pool: d.pool_identifier.clone(),
                    package: d.package.clone().unwrap_or_default(),
                    cluster: d.cluster_name.clone(),
                    idc: d.idc.clone(),
                    instances: d.instance_num,
                    cpu: format_quantity(d.cpu_limit),
                    mem: format_quantity(d.mem_limit),
                })
                .collect();
            print_table("详细数据", detail);

            print_info(&format!(
                "{} PSMs deployed in both {} and {}",
                view.psm_count, view.source_pool, view.target_pool
            ));
            report_written(view.report_file.as_deref());
        }
    }

    Ok(())
}
