use std::cell::RefCell;
use std::rc::Rc;

use survivor_pipeline::{
    CategoryCounts, FilterConfig, FilterKey, Graph, Pclass, Port, Record, Sex, SurvivalPipeline,
};

fn passengers() -> Vec<Record> {
    vec![
        Record::passenger(true, Sex::Male, Pclass::First, Some(35.0), Some(Port::Southampton)),
        Record::passenger(true, Sex::Female, Pclass::Second, Some(27.0), Some(Port::Cherbourg)),
        Record::passenger(true, Sex::Female, Pclass::Third, Some(4.0), Some(Port::Queenstown)),
        Record::passenger(false, Sex::Male, Pclass::Third, Some(19.0), Some(Port::Southampton)),
        Record::passenger(true, Sex::Male, Pclass::Third, None, Some(Port::Southampton)),
    ]
}

#[test]
fn subscribe_delivers_current_value_first() {
    let pipeline = SurvivalPipeline::new();
    pipeline.load(passengers());

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let _sub = pipeline
        .graph()
        .subscribe(&pipeline.by_sex, move |counts: &CategoryCounts<Sex>| {
            sink.borrow_mut().push(counts.total)
        });
    assert_eq!(*seen.borrow(), vec![3]);

    pipeline.update_filters(|f| f.female = false);
    assert_eq!(*seen.borrow(), vec![3, 1]);
}

#[test]
fn each_write_recomputes_subscribed_cells_once() {
    let pipeline = SurvivalPipeline::new();
    let g = pipeline.graph();
    let _subs = vec![
        g.subscribe(&pipeline.by_sex, |_| {}),
        g.subscribe(&pipeline.by_port, |_| {}),
        g.subscribe(&pipeline.age_extent, |_| {}),
        g.subscribe(&pipeline.max_count, |_| {}),
        g.subscribe(&pipeline.global_age_extent, |_| {}),
    ];

    let counts = || {
        [
            g.recompute_count(&pipeline.survivors),
            g.recompute_count(&pipeline.by_sex),
            g.recompute_count(&pipeline.by_port),
            g.recompute_count(&pipeline.by_class),
            g.recompute_count(&pipeline.age_extent),
            g.recompute_count(&pipeline.max_count),
            g.recompute_count(&pipeline.global_age_extent),
        ]
    };
    assert_eq!(counts(), [1; 7]);

    pipeline.load(passengers());
    assert_eq!(counts(), [2; 7]);

    // a filter write never reaches the dataset-wide extent
    pipeline.set_filters(FilterConfig::default().with_flag(FilterKey::Class3, false));
    assert_eq!(counts(), [3, 3, 3, 3, 3, 3, 2]);
}

#[test]
fn consumers_never_observe_torn_state() {
    let pipeline = Rc::new(SurvivalPipeline::new());
    let checks = Rc::new(RefCell::new(0));

    let reader = Rc::clone(&pipeline);
    let counter = Rc::clone(&checks);
    let _sub = pipeline
        .graph()
        .subscribe(&pipeline.by_sex, move |by_sex: &CategoryCounts<Sex>| {
            let g = reader.graph();
            let survivors = g.get(&reader.survivors);
            let by_port = g.get(&reader.by_port);
            let by_class = g.get(&reader.by_class);
            assert_eq!(by_sex.total, survivors.len());
            assert_eq!(by_port.total, survivors.len());
            let class_total: usize = by_class.iter().map(|c| c.total()).sum();
            assert_eq!(class_total, survivors.len());
            *counter.borrow_mut() += 1;
        });

    pipeline.load(passengers());
    for key in FilterKey::ALL {
        pipeline.update_filters(|f| f.set_flag(key, false));
    }
    pipeline.set_filters(FilterConfig::default());
    assert_eq!(*checks.borrow(), 2 + FilterKey::ALL.len() + 1);
}

#[test]
fn diamond_dependencies_settle_before_notification() {
    let graph = Graph::new();
    let a = graph.source("a", 1_i64);
    let doubled = graph.derive("doubled", &a, |a: &i64| a * 2);
    let tripled = graph.derive("tripled", &a, |a: &i64| a * 3);
    let sum = graph.derive2("sum", &doubled, &tripled, |d: &i64, t: &i64| d + t);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let _sub = graph.subscribe(&sum, move |s: &i64| sink.borrow_mut().push(*s));

    for value in 2..=4 {
        graph.set(&a, value);
    }
    assert_eq!(*seen.borrow(), vec![5, 10, 15, 20]);
    assert_eq!(graph.recompute_count(&sum), 4);
}

#[test]
fn writes_from_subscribers_run_after_the_current_pass() {
    let graph = Graph::new();
    let a = graph.source("a", 0_i32);
    let doubled = graph.derive("doubled", &a, |a: &i32| a * 2);
    let log = Rc::new(RefCell::new(Vec::new()));

    let writer = graph.clone();
    let first_log = Rc::clone(&log);
    let _first = graph.subscribe(&doubled, move |v: &i32| {
        first_log.borrow_mut().push(("first", *v));
        if *v == 2 {
            writer.set(&a, 10);
        }
    });
    let second_log = Rc::clone(&log);
    let _second = graph.subscribe(&doubled, move |v: &i32| {
        second_log.borrow_mut().push(("second", *v));
    });

    graph.set(&a, 1);
    assert_eq!(
        *log.borrow(),
        vec![
            ("first", 0),
            ("second", 0),
            ("first", 2),
            ("second", 2),
            ("first", 20),
            ("second", 20),
        ]
    );
    assert_eq!(*graph.get(&a), 10);
}

#[test]
fn resubscribing_yields_an_up_to_date_value() {
    let pipeline = SurvivalPipeline::new();
    let g = pipeline.graph();
    let sub = g.subscribe(&pipeline.by_port, |_| {});
    sub.unsubscribe();

    pipeline.load(passengers());
    pipeline.update_filters(|f| f.port_s = false);
    assert_eq!(g.recompute_count(&pipeline.by_port), 1);
    assert!(g.is_stale(&pipeline.by_port));

    let latest = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&latest);
    let _sub = g.subscribe(&pipeline.by_port, move |counts: &CategoryCounts<Port>| {
        *sink.borrow_mut() = Some(counts.keys());
    });
    assert_eq!(
        *latest.borrow(),
        Some(vec![Port::Cherbourg, Port::Queenstown])
    );
    assert_eq!(g.recompute_count(&pipeline.by_port), 2);
}

#[test]
fn filter_edits_from_one_pass_all_apply() {
    let pipeline = Rc::new(SurvivalPipeline::new());
    let edit_once = |edit: fn(&mut FilterConfig)| {
        let writer = Rc::clone(&pipeline);
        let done = Rc::new(std::cell::Cell::new(false));
        move |counts: &CategoryCounts<Sex>| {
            if counts.total > 0 && !done.replace(true) {
                writer.update_filters(edit);
            }
        }
    };
    let _male = pipeline
        .graph()
        .subscribe(&pipeline.by_sex, edit_once(|f| f.male = false));
    let _class1 = pipeline
        .graph()
        .subscribe(&pipeline.by_sex, edit_once(|f| f.class1 = false));

    pipeline.load(passengers());
    let filters = pipeline.filters();
    assert!(!filters.male);
    assert!(!filters.class1);
    assert!(filters.female);
}
