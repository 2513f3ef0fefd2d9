use std::rc::Rc;

use log::{info, warn};
use serde::Serialize;

use crate::aggregate::{self, CategoryCounts, ClassSeries};
use crate::extent::{self, Extent};
use crate::filter::FilterConfig;
use crate::graph::{Derived, Graph, Source};
use crate::record::{Port, Record, Sex};
use crate::survivors;

/// The survivor dashboard graph: two primitive cells and the projections
/// derived from them.
///
/// ```text
/// records ─┬──────────────────────────────────────────► global_age_extent
///          └─► survivors ◄── filters
///                 ├─► by_sex
///                 ├─► by_port
///                 └─► by_class ─┬─► age_extent
///                               └─► max_count
/// ```
///
/// Handles are public so consumers can [`Graph::subscribe`] to any cell.
pub struct SurvivalPipeline {
    graph: Graph,
    pub records: Source<Vec<Record>>,
    pub filters: Source<FilterConfig>,
    pub survivors: Derived<Vec<Record>>,
    pub by_sex: Derived<CategoryCounts<Sex>>,
    pub by_port: Derived<CategoryCounts<Port>>,
    pub by_class: Derived<Vec<ClassSeries>>,
    pub age_extent: Derived<Option<Extent<u32>>>,
    pub max_count: Derived<Option<usize>>,
    pub global_age_extent: Derived<Option<Extent<f64>>>,
}

/// Every projection at one settled point in time.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    pub record_count: usize,
    pub filters: FilterConfig,
    pub survivor_count: usize,
    pub by_sex: CategoryCounts<Sex>,
    pub by_port: CategoryCounts<Port>,
    pub by_class: Vec<ClassSeries>,
    pub age_extent: Option<Extent<u32>>,
    pub max_count: Option<usize>,
    pub global_age_extent: Option<Extent<f64>>,
}

impl SurvivalPipeline {
    pub fn new() -> Self {
        Self::with_filters(FilterConfig::default())
    }

    pub fn with_filters(filters: FilterConfig) -> Self {
        let graph = Graph::new();
        let records = graph.source("records", Vec::<Record>::new());
        let filters = graph.source("filters", filters);
        let survivors = graph.derive2(
            "survivors",
            &records,
            &filters,
            |records: &Vec<Record>, filters: &FilterConfig| {
                survivors::survivors(records, filters)
            },
        );
        let by_sex = graph.derive("by_sex", &survivors, |rows: &Vec<Record>| {
            aggregate::by_sex(rows)
        });
        let by_port = graph.derive("by_port", &survivors, |rows: &Vec<Record>| {
            aggregate::by_port(rows)
        });
        let by_class = graph.derive("by_class", &survivors, |rows: &Vec<Record>| {
            aggregate::by_class_and_age(rows)
        });
        let age_extent = graph.derive("age_extent", &by_class, |series: &Vec<ClassSeries>| {
            extent::age_extent(series)
        });
        let max_count = graph.derive("max_count", &by_class, |series: &Vec<ClassSeries>| {
            extent::max_count(series)
        });
        let global_age_extent = graph.derive(
            "global_age_extent",
            &records,
            |records: &Vec<Record>| extent::global_age_extent(records),
        );

        SurvivalPipeline {
            graph,
            records,
            filters,
            survivors,
            by_sex,
            by_port,
            by_class,
            age_extent,
            max_count,
            global_age_extent,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Pushes the loaded dataset into the record store.
    pub fn load(&self, records: Vec<Record>) {
        if self.is_loaded() {
            warn!("record store already holds a dataset, replacing it");
        }
        info!("record store loaded with {} records", records.len());
        self.graph.set(&self.records, records);
    }

    pub fn is_loaded(&self) -> bool {
        !self.graph.get(&self.records).is_empty()
    }

    /// Replaces the whole filter configuration.
    pub fn set_filters(&self, filters: FilterConfig) {
        self.graph.set(&self.filters, filters);
    }

    /// Edits a copy of the latest configuration and writes it back whole.
    ///
    /// Edits made from subscribers during one pass apply on top of each other.
    pub fn update_filters(&self, edit: impl FnOnce(&mut FilterConfig)) {
        self.graph.update(&self.filters, |current| {
            let mut filters = current.clone();
            edit(&mut filters);
            filters
        });
    }

    pub fn filters(&self) -> Rc<FilterConfig> {
        self.graph.get(&self.filters)
    }

    pub fn snapshot(&self) -> Snapshot {
        let g = &self.graph;
        Snapshot {
            record_count: g.get(&self.records).len(),
            filters: FilterConfig::clone(&g.get(&self.filters)),
            survivor_count: g.get(&self.survivors).len(),
            by_sex: CategoryCounts::clone(&g.get(&self.by_sex)),
            by_port: CategoryCounts::clone(&g.get(&self.by_port)),
            by_class: Vec::clone(&g.get(&self.by_class)),
            age_extent: *g.get(&self.age_extent),
            max_count: *g.get(&self.max_count),
            global_age_extent: *g.get(&self.global_age_extent),
        }
    }
}

impl Default for SurvivalPipeline {
    fn default() -> Self {
        Self::new()
    }
}
