use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use log::debug;
use serde::Serialize;

use crate::record::{Pclass, Port, Record, Sex};

/// Members of one category value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategoryGroup<K> {
    pub key: K,
    #[serde(skip_serializing)]
    pub members: Vec<Record>,
    pub count: usize,
}

/// Group-by-one-key count projection. Groups keep first-seen order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategoryCounts<K> {
    pub groups: Vec<CategoryGroup<K>>,
    pub total: usize,
}

impl<K> Default for CategoryCounts<K> {
    fn default() -> Self {
        CategoryCounts {
            groups: Vec::new(),
            total: 0,
        }
    }
}

impl<K: Copy + PartialEq> CategoryCounts<K> {
    pub fn count_of(&self, key: K) -> usize {
        self.groups
            .iter()
            .find(|group| group.key == key)
            .map_or(0, |group| group.count)
    }

    pub fn keys(&self) -> Vec<K> {
        self.groups.iter().map(|group| group.key).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Partitions `survivors` by `key`. Records for which `key` yields `None`
/// belong to no group and are not counted.
pub fn group_by_category<K, F>(survivors: &[Record], key: F) -> CategoryCounts<K>
where
    K: Copy + Eq + Hash,
    F: Fn(&Record) -> Option<K>,
{
    let mut positions: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<CategoryGroup<K>> = Vec::new();

    for record in survivors {
        let Some(k) = key(record) else {
            continue;
        };
        let index = *positions.entry(k).or_insert_with(|| {
            groups.push(CategoryGroup {
                key: k,
                members: Vec::new(),
                count: 0,
            });
            groups.len() - 1
        });
        let group = &mut groups[index];
        group.members.push(record.clone());
        group.count += 1;
    }

    let total = groups.iter().map(|group| group.count).sum();
    CategoryCounts { groups, total }
}

pub fn by_sex(survivors: &[Record]) -> CategoryCounts<Sex> {
    group_by_category(survivors, |record| Some(record.sex))
}

pub fn by_port(survivors: &[Record]) -> CategoryCounts<Port> {
    group_by_category(survivors, |record| record.embarked)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AgeCount {
    /// Floor of the raw age.
    pub age: u32,
    pub count: usize,
}

/// Per-age survivor counts of one passenger class, ascending by age.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClassSeries {
    pub pclass: Pclass,
    pub values: Vec<AgeCount>,
}

impl ClassSeries {
    pub fn total(&self) -> usize {
        self.values.iter().map(|point| point.count).sum()
    }
}

/// Whole-year bucket of an age. Negative and NaN ages are clamped into bucket 0.
pub fn age_bucket(age: f64) -> u32 {
    if age.is_nan() || age < 0.0 {
        debug!("age {} has no whole-year bucket, counting it as 0", age);
        return 0;
    }
    age.floor() as u32
}

/// Groups by class (first-seen order), then by floored age within each class.
pub fn by_class_and_age(survivors: &[Record]) -> Vec<ClassSeries> {
    let mut classes: Vec<(Pclass, BTreeMap<u32, usize>)> = Vec::new();

    for record in survivors {
        let Some(age) = record.age else {
            continue;
        };
        let bucket = age_bucket(age);
        let index = match classes.iter().position(|(class, _)| *class == record.pclass) {
            Some(index) => index,
            None => {
                classes.push((record.pclass, BTreeMap::new()));
                classes.len() - 1
            }
        };
        *classes[index].1.entry(bucket).or_insert(0) += 1;
    }

    classes
        .into_iter()
        .map(|(pclass, ages)| ClassSeries {
            pclass,
            values: ages
                .into_iter()
                .map(|(age, count)| AgeCount { age, count })
                .collect(),
        })
        .collect()
}
