//! Pool-membership classifier
//!
//! Builds, per service, the set of distinct resource pools it is deployed
//! under. The index is built once over a scoped table and handed to the
//! analysis by reference; row positions refer to that same table.

use crate::models::{InventoryRow, InventoryTable, PoolKey};
use std::collections::{BTreeSet, HashMap};

/// Deployment footprint of one service
#[derive(Debug, Clone, Default)]
pub struct Footprint {
    pools: BTreeSet<PoolKey>,
    positions: Vec<usize>,
}

impl Footprint {
    pub fn pools(&self) -> &BTreeSet<PoolKey> {
        &self.pools
    }

    pub fn contains(&self, pool: &PoolKey) -> bool {
        self.pools.contains(pool)
    }

    pub fn on_physical(&self, physical_cluster: &str) -> bool {
        self.pools
            .iter()
            .any(|pool| pool.physical_cluster == physical_cluster)
    }

    /// Positions of the service's rows, in table order
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }
}

/// psm -> set of pools, plus first-appearance order of services
#[derive(Debug, Clone, Default)]
pub struct PoolIndex {
    footprints: HashMap<String, Footprint>,
    order: Vec<String>,
}

impl PoolIndex {
    pub fn build(table: &InventoryTable) -> Self {
        let mut index = Self::default();

        for (position, row) in table.rows().iter().enumerate() {
            if !index.footprints.contains_key(&row.psm) {
                index.order.push(row.psm.clone());
            }
            let footprint = index.footprints.entry(row.psm.clone()).or_default();
            footprint.pools.insert(row.pool_key());
            footprint.positions.push(position);
        }

        tracing::debug!(
            rows = table.len(),
            services = index.order.len(),
            "Built pool membership index"
        );
        index
    }

    /// Number of distinct services
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn footprint(&self, psm: &str) -> Option<&Footprint> {
        self.footprints.get(psm)
    }

    pub fn pools(&self, psm: &str) -> Option<&BTreeSet<PoolKey>> {
        self.footprint(psm).map(Footprint::pools)
    }

    /// Services in order of first appearance
    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    fn services_where<F>(&self, keep: F) -> Vec<&str>
    where
        F: Fn(&Footprint) -> bool,
    {
        self.order
            .iter()
            .filter(|psm| self.footprints.get(psm.as_str()).map(&keep).unwrap_or(false))
            .map(String::as_str)
            .collect()
    }

    /// Services whose pool set contains both pools (other pools allowed)
    pub fn services_in_both(&self, a: &PoolKey, b: &PoolKey) -> Vec<&str> {
        self.services_where(|fp| fp.contains(a) && fp.contains(b))
    }

    pub fn services_in_pool(&self, pool: &PoolKey) -> Vec<&str> {
        self.services_where(|fp| fp.contains(pool))
    }

    pub fn services_on_physical(&self, physical_cluster: &str) -> Vec<&str> {
        self.services_where(|fp| fp.on_physical(physical_cluster))
    }

    /// Rows of a service from the table this index was built over
    pub fn rows<'t>(
        &'t self,
        table: &'t InventoryTable,
        psm: &str,
    ) -> impl Iterator<Item = &'t InventoryRow> + 't {
        let rows = table.rows();
        self.footprint(psm)
            .map(Footprint::positions)
            .unwrap_or(&[])
            .iter()
            .filter_map(move |&position| rows.get(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(psm: &str, physical: &str, iaas: &str) -> InventoryRow {
        InventoryRow {
            psm: psm.into(),
            physical_cluster: physical.into(),
            iaas_cluster: iaas.into(),
            ..Default::default()
        }
    }

    fn table() -> InventoryTable {
        InventoryTable::from_rows(vec![
            row("svc.b", "PC1", "IC1"),
            row("svc.a", "PC1", "IC1"),
            row("svc.a", "PC2", "IC1"),
            row("svc.a", "PC1", "IC1"),
            row("svc.c", "PC3", "IC2"),
        ])
    }

    #[test]
    fn test_pool_sets_are_distinct() {
        let index = PoolIndex::build(&table());
        let pools = index.pools("svc.a").unwrap();
        assert_eq!(pools.len(), 2);
        assert!(pools.contains(&PoolKey::new("PC2", "IC1")));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_services_keep_first_appearance_order() {
        let index = PoolIndex::build(&table());
        assert_eq!(
            index.services().collect::<Vec<_>>(),
            vec!["svc.b", "svc.a", "svc.c"]
        );
    }

    #[test]
    fn test_services_in_both_uses_containment() {
        let index = PoolIndex::build(&table());
        let a = PoolKey::new("PC1", "IC1");
        let b = PoolKey::new("PC2", "IC1");
        assert_eq!(index.services_in_both(&a, &b), vec!["svc.a"]);
        assert_eq!(index.services_in_pool(&a), vec!["svc.b", "svc.a"]);
        assert_eq!(index.services_on_physical("PC3"), vec!["svc.c"]);
    }

    #[test]
    fn test_rows_follow_table_order() {
        let table = table();
        let index = PoolIndex::build(&table);
        let pools: Vec<_> = index
            .rows(&table, "svc.a")
            .map(|r| r.physical_cluster.as_str())
            .collect();
        assert_eq!(pools, vec!["PC1", "PC2", "PC1"]);
        assert_eq!(index.rows(&table, "missing").count(), 0);
    }
}
