//! Cross-pool footprint command

use anyhow::Result;
use planner_lib::analysis::{DeploymentStatus, FootprintRecord, FootprintRequest};
use planner_lib::export::{footprint_workbook, LIST_DELIMITER};
use serde::Serialize;
use tabled::Tabled;

use super::{report_written, Backend, Session};
use crate::client::MigratableBody;
use crate::output::{
    color_deployment_status, format_quantity, print_info, print_json, print_table, print_warning,
    OutputFormat,
};

/// Row for the footprint table
#[derive(Tabled)]
struct FootprintLine {
    #[tabled(rename = "PSM")]
    psm: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Other Pools")]
    other_pools: String,
    #[tabled(rename = "Other Clusters")]
    other_clusters: usize,
    #[tabled(rename = "Instances")]
    instances: String,
    #[tabled(rename = "CPU")]
    cpu: String,
}

#[derive(Debug, Serialize)]
struct MigratableView {
    idc: String,
    pool: String,
    total_psm: usize,
    migratable_psm: usize,
    available_pools: Vec<String>,
    total_clusters: usize,
    truncated: bool,
    records: Vec<FootprintRecord>,
    report_file: Option<String>,
}

/// List services under one pool with the other pools they occupy
pub async fn run(session: &Session, idc: String, pool: String, export: bool) -> Result<()> {
    let view = match &session.backend {
        Backend::Local { inventory } => {
            let request = FootprintRequest { idc, pool };
            let (idc, pool) = request.validate()?;
            let report = Session::planner(inventory)?.footprint(&request)?;

            let report_file = if export && !report.records.is_empty() {
                let workbook = footprint_workbook(&report, &idc, &pool, chrono::Local::now());
                Some(session.export("migratable_clusters", &workbook)?)
            } else {
                None
            };

            MigratableView {
                idc,
                pool,
                total_psm: report.stats.total_psm,
                migratable_psm: report.stats.migratable_psm,
                available_pools: report.stats.available_pools,
                total_clusters: report.stats.total_clusters,
                truncated: false,
                records: report.records,
                report_file,
            }
        }
        Backend::Remote { client, data_file } => {
            let response = client
                .migratable(&MigratableBody {
                    idc,
                    pool,
                    data_file: data_file.clone(),
                })
                .await?;
            MigratableView {
                idc: response.summary.idc,
                pool: response.summary.pool,
                total_psm: response.summary.total_psm,
                migratable_psm: response.summary.migratable_psm,
                available_pools: response.summary.available_pools,
                total_clusters: response.summary.total_clusters,
                truncated: response.truncated,
                records: response.results,
                report_file: response.report_file,
            }
        }
    };

    render(&view, session.format)
}

fn render(view: &MigratableView, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(view)?,
        OutputFormat::Table => {
            let rows: Vec<FootprintLine> = view
                .records
                .iter()
                .map(|r| FootprintLine {
                    psm: r.psm.clone(),
                    status: color_deployment_status(
                        r.deployment_status.as_str(),
                        r.deployment_status == DeploymentStatus::MultiPool,
                    ),
                    other_pools: r.other_pools.join(LIST_DELIMITER),
                    other_clusters: r.other_pool_cluster_count,
                    instances: r
                        .target
                        .as_ref()
                        .map(|t| t.instance_num.to_string())
                        .unwrap_or_default(),
                    cpu: r
                        .target
                        .as_ref()
                        .map(|t| format_quantity(t.cpu_limit))
                        .unwrap_or_default(),
                })
                .collect();
            print_table("可腾挪集群", rows);

            if view.truncated {
                print_warning(&format!(
                    "Showing the first {} of {} PSMs",
                    view.records.len(),
                    view.total_psm
                ));
            }
            print_info(&format!(
                "{} / {}: {} of {} PSMs can move, {} clusters in total",
                view.idc, view.pool, view.migratable_psm, view.total_psm, view.total_clusters
            ));
            if !view.available_pools.is_empty() {
                print_info(&format!(
                    "Available pools: {}",
                    view.available_pools.join(LIST_DELIMITER)
                ));
            }
            report_written(view.report_file.as_deref());
        }
    }

    Ok(())
}
