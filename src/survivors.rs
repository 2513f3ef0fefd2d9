use crate::filter::FilterConfig;
use crate::record::Record;

/// Survivor predicate shared by every aggregation.
///
/// A record passes when it survived, has a known age, and its sex, class and
/// port flags are all enabled. `min_age`/`max_age` are not consulted.
pub fn is_survivor(record: &Record, filters: &FilterConfig) -> bool {
    record.survived
        && record.age.is_some()
        && filters.sex_enabled(record.sex)
        && filters.class_enabled(record.pclass)
        && filters.port_enabled(record.embarked)
}

/// Records passing [`is_survivor`], in dataset order.
pub fn survivors(records: &[Record], filters: &FilterConfig) -> Vec<Record> {
    records
        .iter()
        .filter(|record| is_survivor(record, filters))
        .cloned()
        .collect()
}
