use std::fs;

use survivor_pipeline::{
    LoadError, Pclass, Sex, SurvivalPipeline, load_dataset, read_dataset, save_records,
};

const TITANIC_HEAD: &str = "\
PassengerId,Survived,Pclass,Name,Sex,Age,SibSp,Parch,Ticket,Fare,Cabin,Embarked
1,0,3,\"Braund, Mr. Owen Harris\",male,22,1,0,A/5 21171,7.25,,S
2,1,1,\"Cumings, Mrs. John Bradley (Florence Briggs Thayer)\",female,38,1,0,PC 17599,71.2833,C85,C
3,1,3,\"Heikkinen, Miss. Laina\",female,26,0,0,STON/O2. 3101282,7.925,,S
4,1,1,\"Futrelle, Mrs. Jacques Heath (Lily May Peel)\",female,35,1,0,113803,53.1,C123,S
5,0,3,\"Allen, Mr. William Henry\",male,35,0,0,373450,8.05,,S
6,0,3,\"Moran, Mr. James\",male,,0,0,330877,8.4583,,Q
8,0,3,\"Palsson, Master. Gosta Leonard\",male,2,3,1,349909,21.075,,S
10,1,2,\"Nasser, Mrs. Nicholas (Adele Achem)\",female,14,1,0,237736,30.0708,,C
18,1,2,\"Williams, Mr. Charles Eugene\",male,,0,0,244373,13,,S
22,1,2,\"Beesley, Mr. Lawrence\",male,34,0,0,248698,13,D56,S
62,1,1,\"Icard, Miss. Amelie\",female,38,0,0,113572,80,B28,
79,1,2,\"Caldwell, Master. Alden Gates\",male,0.83,0,2,248738,29,,S
";

#[tokio::test]
async fn csv_load_pushes_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("titanic.csv");
    fs::write(&path, TITANIC_HEAD).unwrap();

    let pipeline = SurvivalPipeline::new();
    let writes = std::rc::Rc::new(std::cell::Cell::new(0));
    let counter = std::rc::Rc::clone(&writes);
    let _sub = pipeline
        .graph()
        .subscribe(&pipeline.records, move |_| counter.set(counter.get() + 1));

    let count = load_dataset(&pipeline, &path).await.unwrap();
    assert_eq!(count, 12);
    // initial empty value plus exactly one load
    assert_eq!(writes.get(), 2);

    let snapshot = pipeline.snapshot();
    assert_eq!(snapshot.record_count, 12);
    // survived, known age and a recorded port
    assert_eq!(snapshot.survivor_count, 6);
    assert_eq!(snapshot.by_sex.keys(), vec![Sex::Female, Sex::Male]);
    assert_eq!(snapshot.by_sex.count_of(Sex::Female), 4);
    assert_eq!(snapshot.by_class[0].pclass, Pclass::First);
    assert_eq!(snapshot.by_class.iter().find(|c| c.pclass == Pclass::Second).map(|c| c.values[0].age), Some(0));
    let data_ages = snapshot.global_age_extent.unwrap();
    assert_eq!((data_ages.min, data_ages.max), (0.83, 38.0));
}

#[tokio::test]
async fn failed_load_leaves_the_store_empty() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = SurvivalPipeline::new();

    let err = load_dataset(&pipeline, dir.path().join("missing.csv"))
        .await
        .unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
    assert!(!pipeline.is_loaded());
    assert_eq!(pipeline.snapshot().survivor_count, 0);
    assert_eq!(pipeline.snapshot().age_extent, None);
}

#[tokio::test]
async fn snapshot_file_loads_like_csv() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("titanic.csv");
    let snapshot = dir.path().join("titanic.bin.gz");
    fs::write(&csv, TITANIC_HEAD).unwrap();

    let parsed = read_dataset(&csv).unwrap();
    save_records(&parsed, &snapshot).unwrap();
    assert_eq!(read_dataset(&snapshot).unwrap(), parsed);

    let from_csv = SurvivalPipeline::new();
    let from_snapshot = SurvivalPipeline::new();
    load_dataset(&from_csv, &csv).await.unwrap();
    load_dataset(&from_snapshot, &snapshot).await.unwrap();
    assert_eq!(from_csv.snapshot(), from_snapshot.snapshot());
}
