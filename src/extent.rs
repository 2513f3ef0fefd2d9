use serde::Serialize;

use crate::aggregate::ClassSeries;
use crate::record::Record;

/// Closed `[min, max]` range over a numeric sequence.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Extent<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> Extent<T> {
    /// Range of `values`, or `None` when nothing comparable was seen.
    /// Values that do not compare with themselves (NaN) are skipped.
    pub fn of<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = T>,
    {
        let mut extent: Option<Extent<T>> = None;
        for value in values {
            if value.partial_cmp(&value).is_none() {
                continue;
            }
            extent = Some(match extent {
                None => Extent {
                    min: value,
                    max: value,
                },
                Some(Extent { min, max }) => Extent {
                    min: if value < min { value } else { min },
                    max: if value > max { value } else { max },
                },
            });
        }
        extent
    }

    pub fn contains(&self, value: T) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Age axis of the class/age chart.
pub fn age_extent(series: &[ClassSeries]) -> Option<Extent<u32>> {
    Extent::of(
        series
            .iter()
            .flat_map(|class| class.values.iter().map(|point| point.age)),
    )
}

/// Count axis of the class/age chart.
pub fn max_count(series: &[ClassSeries]) -> Option<usize> {
    series
        .iter()
        .flat_map(|class| class.values.iter().map(|point| point.count))
        .max()
}

/// Age range of the whole unfiltered dataset, ignoring unknown ages.
pub fn global_age_extent(records: &[Record]) -> Option<Extent<f64>> {
    Extent::of(records.iter().filter_map(|record| record.age))
}
