/*!
# Survivor Pipeline

A reactive derivation pipeline over the Titanic passenger list. A raw dataset
and a user-adjustable filter configuration feed a small dependency graph of
derived projections, recomputed whenever either input changes.

## Overview

The application keeps two kinds of state:

- **Primitive cells** - the record store (empty until the dataset load
  completes, then written exactly once) and the filter configuration (replaced
  whole by UI events).
- **Derived cells** - pure functions of their upstream cells, memoized and
  recomputed in dependency order after every write.

## Architecture

```text
records ─┬─────────────────────────────► global age extent
         └─► survivors ◄── filters
                ├─► by sex
                ├─► by port
                └─► by class and age ─┬─► age extent
                                      └─► max count
```

### Core Components
- Cell Storage - Nodes with upstream lists and a vector/ordered-set hybrid of dependents
- Dependency Graph - Registers cells, orders recomputation topologically
- Recalculation Engine - Recomputes subscribed cells once per write, defers the rest
- Subscriptions - Consumers receive the current value, then every settled change

### Projections
- Survivor filter shared by every aggregation
- Group-by-sex and group-by-port counts with totals
- Per-class age series (ages floored, ascending)
- Axis ranges: age extent, maximum count, dataset-wide age extent

### Data Ingestion
- CSV loader for the Titanic layout, run on the tokio runtime
- Gzip-compressed bincode snapshots of a loaded dataset

## Modules

- **cell**: Node storage and dependent management
- **graph**: Dependency graph, propagation passes, subscriptions
- **record**: Passenger record and category enums
- **filter**: Filter configuration, typed flag lookup, `key=value` patches
- **survivors**: The survivor predicate
- **aggregate**: Category and class/age aggregations
- **extent**: Range and extremum derivations
- **pipeline**: The wired dashboard graph
- **loader**: CSV parsing and the asynchronous dataset load
- **saving**: Dataset snapshots
- **display**: Plain-text rendering of a pipeline snapshot
- **error**: Load and patch errors

## Example

```
use survivor_pipeline::{CategoryCounts, Pclass, Port, Record, Sex, SurvivalPipeline};

let pipeline = SurvivalPipeline::new();
let _sub = pipeline.graph().subscribe(&pipeline.by_sex, |counts: &CategoryCounts<Sex>| {
    println!("{} survivors", counts.total);
});

pipeline.load(vec![Record::passenger(
    true,
    Sex::Female,
    Pclass::First,
    Some(38.0),
    Some(Port::Cherbourg),
)]);
pipeline.update_filters(|f| f.female = false);
assert_eq!(pipeline.snapshot().survivor_count, 0);
```
*/

pub mod aggregate;
pub mod cell;
pub mod display;
pub mod error;
pub mod extent;
pub mod filter;
pub mod graph;
pub mod loader;
pub mod pipeline;
pub mod record;
pub mod saving;
pub mod survivors;

/// Re-export everything from these modules to make it easier to use
pub use aggregate::*;
pub use cell::*;
pub use display::*;
pub use error::*;
pub use extent::*;
pub use filter::*;
pub use graph::*;
pub use loader::*;
pub use pipeline::*;
pub use record::*;
pub use saving::*;
pub use survivors::*;
