//! Scale-down recommendation command

use anyhow::Result;
use planner_lib::analysis::{ScaleDownRecord, ScaleDownRequest, LARGE_SLACK_CORES};
use planner_lib::export::scale_down_workbook;
use serde::Serialize;
use tabled::Tabled;

use super::{report_written, Backend, Session};
use crate::client::RecommendBody;
use crate::output::{
    color_save_cores, format_quantity, print_info, print_json, print_table, OutputFormat,
};

/// Row for recommendations table
#[derive(Tabled)]
struct RecommendationLine {
    #[tabled(rename = "PSM")]
    psm: String,
    #[tabled(rename = "Cluster")]
    cluster_id: String,
    #[tabled(rename = "Package")]
    package: String,
    #[tabled(rename = "CPU Lim")]
    cpu_limit: String,
    #[tabled(rename = "Mem Lim")]
    mem_limit: String,
    #[tabled(rename = "Save Cores")]
    save_cores: String,
    #[tabled(rename = "CPU Max 7d")]
    cpu_util: String,
    #[tabled(rename = "Business Line")]
    business_line: String,
}

#[derive(Debug, Serialize)]
struct RecommendView {
    idc: String,
    pool: String,
    total_cpu: i64,
    total_clusters: usize,
    clusters_over_threshold: usize,
    records: Vec<ScaleDownRecord>,
    report_file: Option<String>,
}

/// Recommend low-utilization clusters of one pool for scale-down
pub async fn run(
    session: &Session,
    idc: String,
    pool: String,
    min_save_cores: i64,
    export: bool,
) -> Result<()> {
    let view = match &session.backend {
        Backend::Local { inventory } => {
            let request = ScaleDownRequest {
                idc,
                pool,
                min_save_cores,
            };
            let (idc, pool) = request.validate()?;
            let report = Session::planner(inventory)?.scale_down(&request)?;

            let report_file = if export && !report.records.is_empty() {
                let workbook =
                    scale_down_workbook(&report, &idc, &pool.identifier(), chrono::Local::now());
                Some(session.export("recommend_scale_down", &workbook)?)
            } else {
                None
            };

            RecommendView {
                idc,
                pool: pool.identifier(),
                total_cpu: report.stats.total_save_cores,
                total_clusters: report.stats.cluster_count,
                clusters_over_threshold: report.stats.clusters_over_threshold,
                records: report.records,
                report_file,
            }
        }
        Backend::Remote { client, data_file } => {
            let response = client
                .recommend(&RecommendBody {
                    idc,
                    pool,
                    min_save_cores,
                    data_file: data_file.clone(),
                })
                .await?;
            RecommendView {
                idc: response.summary.idc,
                pool: response.summary.pool,
                total_cpu: response.summary.total_cpu,
                total_clusters: response.summary.total_clusters,
                clusters_over_threshold: response.summary.clusters_over_threshold,
                records: response.results,
                report_file: response.report_file,
            }
        }
    };

    render(&view, session.format)
}

fn render(view: &RecommendView, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(view)?,
        OutputFormat::Table => {
            let rows: Vec<RecommendationLine> = view
                .records
                .iter()
                .map(|r| RecommendationLine {
                    psm: r.psm.clone(),
                    cluster_id: r.cluster_id.clone(),
                    package: r.package.clone(),
                    cpu_limit: format_quantity(r.cpu_limit),
                    mem_limit: format_quantity(r.mem_limit),
                    save_cores: color_save_cores(r.save_cores, LARGE_SLACK_CORES),
                    cpu_util: r.cpu_util_max_7days.clone(),
                    business_line: r.business_line.clone(),
                })
                .collect();
            print_table("缩容建议", rows);

            print_info(&format!(
                "{} / {}: {} clusters, {} cores reclaimable, {} clusters over {} cores",
                view.idc,
                view.pool,
                view.total_clusters,
                view.total_cpu,
                view.clusters_over_threshold,
                LARGE_SLACK_CORES
            ));
            report_written(view.report_file.as_deref());
        }
    }

    Ok(())
}
