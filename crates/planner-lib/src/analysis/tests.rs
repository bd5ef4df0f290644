use super::*;
use crate::loader::CsvSource;
use std::io::Write;
use tempfile::NamedTempFile;

const HEADER: &str = "psm,physical_cluster,iaas_cluster,cluster_name,idc,instance_num,cpu_limit,mem_limit,package,cluster_id,dept_level1,dept_level2,save_cores";

fn inventory(lines: &[&str]) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "{HEADER}").unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file.flush().unwrap();
    file
}

fn planner(file: &NamedTempFile) -> Planner {
    Planner::new(Box::new(CsvSource::new(file.path())))
}

fn migration(pool_a: &str, pool_b: &str) -> MigrationRequest {
    MigrationRequest {
        facilities: Facilities::default(),
        pool_a: pool_a.into(),
        pool_b: pool_b.into(),
    }
}

fn fleet() -> NamedTempFile {
    inventory(&[
        "svc.a,PC1,IC1,default,lf,5,10,20,,c-1,Infra,Compute,4",
        "svc.a,PC2,IC1,default,lf,3,6,12,,c-2,Infra,Compute,12",
        "svc.b,PC1,IC1,default,lf,2,4,8,,c-3,Ads,Serving/,1",
        "svc.c,PC1,IC1,default,hl,7,14,28,,c-4,Ads,Serving,20",
        "svc.c,PC3,IC2,default,hl,1,2,4,,c-5,Ads,Serving,0",
        "svc.d,PC2,IC1,default,lf,9,18,36,,c-6,Search,,30",
        "svc.d,PC1,IC1,canary,lf,1,2,4,,c-7,Search,,15",
    ])
}

#[test]
fn test_dual_pool_rows_are_tagged_and_ordered_by_anchor_weight() {
    let file = inventory(&[
        "svc.z,PC2,IC1,default,lf,3,6,12,,,,,",
        "svc.a,PC1,IC1,default,lf,5,10,20,,,,,",
        "svc.a,PC2,IC1,default,lf,3,6,12,,,,,",
        "svc.z,PC1,IC1,default,lf,1,2,4,,,,,",
    ]);

    let outcome = planner(&file).migration(&migration("PC1/IC1", "PC2/IC1")).unwrap();
    let report = outcome.report().expect("dual-pool services exist");

    let detail: Vec<(&str, &str)> = report
        .detail
        .iter()
        .map(|r| (r.psm.as_str(), r.pool_identifier.as_str()))
        .collect();
    assert_eq!(
        detail,
        vec![
            ("svc.a", "PC1/IC1"),
            ("svc.a", "PC2/IC1"),
            ("svc.z", "PC1/IC1"),
            ("svc.z", "PC2/IC1"),
        ]
    );
    assert_eq!(report.stats.psm_count, 2);
    assert_eq!(report.stats.pool_a, "PC1/IC1");
    assert!(!report.include_package);
}

#[test]
fn test_malformed_pool_is_rejected_before_loading() {
    // The source does not exist; a format error must win
    let planner = Planner::new(Box::new(CsvSource::new("/nonexistent/all.csv")));
    let err = planner.migration(&migration("PC1", "PC2/IC1")).unwrap_err();
    assert!(matches!(err, PlannerError::InvalidPool(ref pool) if pool == "PC1"));

    let err = planner.migration(&migration("PC1/IC1", "")).unwrap_err();
    assert!(matches!(err, PlannerError::MissingParameter("pool2")));
}

#[test]
fn test_dual_pool_result_is_restricted_to_both_pools() {
    let file = fleet();
    let outcome = planner(&file).migration(&migration("PC1/IC1", "PC2/IC1")).unwrap();
    let report = outcome.report().unwrap();

    // svc.d's PC1 row is outside the default sub-cluster, so only svc.a qualifies
    assert!(report.detail.iter().all(|r| r.psm == "svc.a"));
    assert!(report
        .detail
        .iter()
        .all(|r| r.pool_identifier == "PC1/IC1" || r.pool_identifier == "PC2/IC1"));
}

#[test]
fn test_dual_pool_drops_third_pool_rows() {
    let file = inventory(&[
        "svc.a,PC1,IC1,default,lf,5,10,20,,,,,",
        "svc.a,PC9,IC9,default,lf,8,16,32,,,,,",
        "svc.a,PC2,IC1,default,lf,3,6,12,,,,,",
    ]);
    let outcome = planner(&file).migration(&migration("PC1/IC1", "PC2/IC1")).unwrap();
    let report = outcome.report().unwrap();

    assert_eq!(report.detail.len(), 2);
    assert!(report.summary.iter().all(|s| s.pool_identifier != "PC9/IC9"));
}

#[test]
fn test_dual_pool_facility_filter() {
    let file = fleet();
    let request = MigrationRequest {
        facilities: Facilities::parse("hl"),
        ..migration("PC1/IC1", "PC2/IC1")
    };
    let outcome = planner(&file).migration(&request).unwrap();
    assert_eq!(outcome, MigrationOutcome::NoMatches);
}

#[test]
fn test_summary_sums_match_detail_and_groups_are_contiguous() {
    let file = inventory(&[
        "svc.a,PC1,IC1,default,lf,2,1.5,3,pkg.a,,,,",
        "svc.b,PC2,IC1,default,lf,4,2,4,pkg.b,,,,",
        "svc.a,PC2,IC1,default,lf,1,1,1,pkg.a,,,,",
        "svc.b,PC1,IC1,default,lf,6,3,6,pkg.b,,,,",
        "svc.a,PC1,IC1,default,lf,3,2.5,5,pkg.a,,,,",
    ]);
    let outcome = planner(&file).migration(&migration("PC1/IC1", "PC2/IC1")).unwrap();
    let report = outcome.report().unwrap();
    assert!(report.include_package);

    let detail_instances: i64 = report.detail.iter().map(|r| r.instance_num).sum();
    let summary_instances: i64 = report.summary.iter().map(|r| r.instance_num).sum();
    assert_eq!(detail_instances, summary_instances);

    let detail_cpu: f64 = report.detail.iter().map(|r| r.cpu_limit).sum();
    let summary_cpu: f64 = report.summary.iter().map(|r| r.cpu_limit).sum();
    assert!((detail_cpu - summary_cpu).abs() < 1e-9);

    // Anchor weight: svc.b has 6 in PC1/IC1, svc.a's last anchor row has 3
    let psms: Vec<&str> = report.detail.iter().map(|r| r.psm.as_str()).collect();
    assert_eq!(psms, vec!["svc.b", "svc.b", "svc.a", "svc.a", "svc.a"]);

    let mut seen = Vec::new();
    for psm in &psms {
        if seen.last() != Some(psm) {
            assert!(!seen.contains(psm), "{psm} rows are not contiguous");
            seen.push(psm);
        }
    }

    let pkg_a: Vec<&SummaryRow> = report.summary.iter().filter(|s| s.psm == "svc.a").collect();
    assert_eq!(pkg_a.len(), 2);
    assert_eq!(pkg_a[0].pool_identifier, "PC1/IC1");
    assert_eq!(pkg_a[0].instance_num, 5);
    assert_eq!(pkg_a[0].package.as_deref(), Some("pkg.a"));
}

#[test]
fn test_repeated_runs_are_identical() {
    let file = fleet();
    let planner = planner(&file);
    let first = planner.migration(&migration("PC1/IC1", "PC2/IC1")).unwrap();
    let second = planner.migration(&migration("PC1/IC1", "PC2/IC1")).unwrap();
    assert_eq!(first, second);

    let request = FootprintRequest {
        idc: "hl".into(),
        pool: "PC1/IC1".into(),
    };
    assert_eq!(
        planner.footprint(&request).unwrap(),
        planner.footprint(&request).unwrap()
    );
}

#[test]
fn test_scale_down_empty_scope_fails_but_high_threshold_is_empty() {
    let file = fleet();
    let planner = planner(&file);

    let missing = ScaleDownRequest {
        idc: "lf".into(),
        pool: "PC7/IC7".into(),
        min_save_cores: 0,
    };
    let err = planner.scale_down(&missing).unwrap_err();
    assert!(matches!(err, PlannerError::NoDataForScope { ref idc, ref pool } if idc == "lf" && pool == "PC7/IC7"));

    let strict = ScaleDownRequest {
        idc: "lf".into(),
        pool: "PC2/IC1".into(),
        min_save_cores: 1000,
    };
    let report = planner.scale_down(&strict).unwrap();
    assert!(report.records.is_empty());
    assert_eq!(report.stats, ScaleDownStats::default());
}

#[test]
fn test_scale_down_ranks_by_slack_and_includes_canary_clusters() {
    let file = fleet();
    let request = ScaleDownRequest {
        idc: "lf".into(),
        pool: "PC1/IC1".into(),
        min_save_cores: 2,
    };
    let report = planner(&file).scale_down(&request).unwrap();

    let ranked: Vec<(&str, i64)> = report
        .records
        .iter()
        .map(|r| (r.cluster_id.as_str(), r.save_cores))
        .collect();
    assert_eq!(ranked, vec![("c-7", 15), ("c-1", 4)]);
    assert_eq!(report.stats.total_save_cores, 19);
    assert_eq!(report.stats.cluster_count, 2);
    assert_eq!(report.stats.clusters_over_threshold, 1);
    assert_eq!(report.records[1].business_line, "Infra/Compute");
}

#[test]
fn test_scale_down_requires_idc() {
    let file = fleet();
    let request = ScaleDownRequest {
        idc: " ".into(),
        pool: "PC1/IC1".into(),
        min_save_cores: 0,
    };
    let err = planner(&file).scale_down(&request).unwrap_err();
    assert!(matches!(err, PlannerError::MissingParameter("idc")));
}

#[test]
fn test_scale_down_without_slack_columns_fails() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "psm,physical_cluster,iaas_cluster,idc,cpu_limit").unwrap();
    writeln!(file, "svc.a,PC1,IC1,lf,8").unwrap();
    file.flush().unwrap();

    let request = ScaleDownRequest {
        idc: "lf".into(),
        pool: "PC1/IC1".into(),
        min_save_cores: 0,
    };
    let err = planner(&file).scale_down(&request).unwrap_err();
    assert!(matches!(err, PlannerError::MissingColumn(ref c) if c == "save_cores"));
}

#[test]
fn test_footprint_single_and_multi_pool() {
    let file = fleet();
    let planner = planner(&file);

    let lf = planner
        .footprint(&FootprintRequest {
            idc: "lf".into(),
            pool: "PC1/IC1".into(),
        })
        .unwrap();
    let svc_b = lf.records.iter().find(|r| r.psm == "svc.b").unwrap();
    assert_eq!(svc_b.deployment_status, DeploymentStatus::SinglePool);
    assert!(svc_b.other_pools.is_empty());

    let hl = planner
        .footprint(&FootprintRequest {
            idc: "hl".into(),
            pool: "PC1/IC1".into(),
        })
        .unwrap();
    assert_eq!(hl.records.len(), 1);
    let svc_c = &hl.records[0];
    assert_eq!(svc_c.deployment_status, DeploymentStatus::MultiPool);
    assert_eq!(svc_c.other_pools, vec!["PC3/IC2".to_string()]);
    assert_eq!(svc_c.other_pool_cluster_count, 1);
    assert_eq!(svc_c.target.as_ref().unwrap().instance_num, 7);

    assert_eq!(hl.stats.total_psm, 1);
    assert_eq!(hl.stats.migratable_psm, 1);
    assert_eq!(hl.stats.available_pools, vec!["PC3/IC2".to_string()]);
    assert_eq!(hl.stats.total_clusters, 2);
}

#[test]
fn test_footprint_orders_services_by_first_target_row() {
    let file = fleet();
    let report = planner(&file)
        .footprint(&FootprintRequest {
            idc: "lf".into(),
            pool: "PC1".into(),
        })
        .unwrap();

    let psms: Vec<&str> = report.records.iter().map(|r| r.psm.as_str()).collect();
    assert_eq!(psms, vec!["svc.a", "svc.b"]);
    assert_eq!(report.records[0].other_pools, vec!["PC2/IC1".to_string()]);
}

#[test]
fn test_footprint_unknown_pool_is_empty_success() {
    let file = fleet();
    let report = planner(&file)
        .footprint(&FootprintRequest {
            idc: "lf".into(),
            pool: "PC8/IC8".into(),
        })
        .unwrap();
    assert!(report.records.is_empty());
    assert_eq!(report.stats.total_clusters, 0);
}

#[test]
fn test_non_numeric_instance_num_is_kept_as_zero() {
    let file = inventory(&[
        "svc.a,PC1,IC1,default,lf,N/A,10,20,,,,,",
        "svc.a,PC2,IC1,default,lf,3,6,12,,,,,",
    ]);
    let outcome = planner(&file).migration(&migration("PC1/IC1", "PC2/IC1")).unwrap();
    let report = outcome.report().unwrap();

    assert_eq!(report.detail.len(), 2);
    let anchor = report
        .detail
        .iter()
        .find(|r| r.pool_identifier == "PC1/IC1")
        .unwrap();
    assert_eq!(anchor.instance_num, 0);
    assert_eq!(anchor.cpu_limit, 10.0);
}

#[test]
fn test_missing_required_column() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "psm,physical_cluster,iaas_cluster,instance_num").unwrap();
    writeln!(file, "svc.a,PC1,IC1,3").unwrap();
    file.flush().unwrap();

    let err = planner(&file)
        .migration(&migration("PC1/IC1", "PC2/IC1"))
        .unwrap_err();
    assert!(matches!(err, PlannerError::MissingColumn(ref c) if c == "cluster_name"));
}
