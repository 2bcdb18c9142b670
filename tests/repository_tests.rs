use std::sync::Arc;
use std::thread;

use mcstore::{execute_queries, DatasetView, Series, SeriesQuery, SeriesRepository, StoreConfig};

fn series(text: &str) -> Series {
    Series::parse(text).expect("valid series")
}

fn populated() -> SeriesRepository {
    let repo = SeriesRepository::new(5).expect("repository");
    let heap = series("ns:jvm HeapUsage");
    let threads = series("ns:jvm ThreadCount");
    for t in 0..10 {
        let time = 1000 * t;
        repo.add(&heap, "server", time, 100 + t).unwrap();
        repo.add(&heap, "instance1", time, 200).unwrap();
        repo.add(&threads, "server", time, 40 + t % 2).unwrap();
    }
    repo
}

#[test]
fn selection_is_ordered_and_filtered() {
    let repo = populated();
    let heap = series("ns:jvm HeapUsage");

    let all = repo.select_series(&heap).unwrap();
    let instances: Vec<&str> = all.iter().map(|s| s.instance()).collect();
    assert_eq!(instances, vec!["instance1", "server"]);

    let only = repo.select_series_in(&heap, &["server", "unknown", "server"]).unwrap();
    assert_eq!(only.len(), 1);
    assert_eq!(only[0].instance(), "server");
    assert_eq!(only[0].points(), vec![5000, 105, 6000, 106, 7000, 107, 8000, 108, 9000, 109]);

    assert!(repo.select_series(&series("Unknown")).unwrap().is_empty());
    assert!(repo.select_series_in::<&str>(&heap, &[]).unwrap().is_empty());

    let everything = repo.select_all_series().unwrap();
    let keys: Vec<(String, String)> = everything
        .iter()
        .map(|s| (s.series().to_string(), s.instance().to_string()))
        .collect();
    assert_eq!(
        keys,
        vec![
            ("ns:jvm HeapUsage".to_string(), "instance1".to_string()),
            ("ns:jvm HeapUsage".to_string(), "server".to_string()),
            ("ns:jvm ThreadCount".to_string(), "server".to_string()),
        ]
    );

    assert_eq!(repo.series().unwrap(), vec![heap, series("ns:jvm ThreadCount")]);
    assert_eq!(repo.instances().unwrap(), vec!["instance1".to_string(), "server".to_string()]);
    assert_eq!(repo.len().unwrap(), 3);
    assert!(!repo.is_empty().unwrap());
}

#[test]
fn constant_instance_keeps_statistics() {
    let repo = populated();
    let set = repo
        .get(&series("ns:jvm HeapUsage"), "instance1")
        .unwrap()
        .expect("dataset exists");
    assert_eq!(set.size(), 2);
    assert_eq!(set.points(), vec![0, 200, 9000, 200]);
    assert_eq!(set.observed_values(), 10);
    assert_eq!(set.observed_value_changes(), 1);
    assert_eq!(set.stable_since(), 0);
    assert_eq!(set.stable_count(), 10);
}

#[test]
fn copied_views_survive_buffer_compaction() {
    let repo = populated();
    let heap = series("ns:jvm HeapUsage");
    let before = repo.get(&heap, "server").unwrap().unwrap();
    let view = DatasetView::from(&before);
    assert!(!before.is_outdated());

    // ten changing values fill the nine buffer slots of capacity 5; the next add compacts
    repo.add(&heap, "server", 10_000, 110).unwrap();
    assert!(before.is_outdated());
    let compacted = repo.get(&heap, "server").unwrap().unwrap();
    assert!(compacted.is_outdated());

    repo.add(&heap, "server", 11_000, 111).unwrap();
    let after = repo.get(&heap, "server").unwrap().unwrap();
    assert!(!after.is_outdated());
    assert_eq!(after.points(), vec![7000, 107, 8000, 108, 9000, 109, 10_000, 110, 11_000, 111]);

    let times: Vec<i64> = view.points.iter().map(|p| p.time).collect();
    assert_eq!(times, vec![5000, 6000, 7000, 8000, 9000]);
    assert_eq!(view.points.last().map(|p| p.value), Some(109));
}

#[test]
fn batch_queries_return_views() {
    let repo = populated();
    let results = execute_queries(
        &repo,
        &[
            SeriesQuery::on("ns:jvm ThreadCount", ["server"]),
            SeriesQuery::all("not:a:series"),
            SeriesQuery::all("ns:jvm HeapUsage"),
        ],
    )
    .unwrap();

    let keys: Vec<&str> = results.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["ns:jvm ThreadCount", "not:a:series", "ns:jvm HeapUsage"]);
    assert!(results[1].1.is_empty());
    assert_eq!(results[2].1.len(), 2);

    let threads = &results[0].1[0];
    assert_eq!(threads.series, "ns:jvm ThreadCount");
    assert_eq!(threads.points.len(), 5);
    assert_eq!(threads.per_second.len(), 4);
    assert!(threads.per_second.iter().all(|p| p.value == 1 || p.value == -1));
    assert_eq!(threads.observed_min, 40);
    assert_eq!(threads.observed_max, 41);
    assert_eq!(threads.observed_value_changes, 10);

    let decoded = DatasetView::from_bytes(&threads.to_bytes().unwrap()).unwrap();
    assert_eq!(&decoded, threads);
}

#[test]
fn concurrent_writers_and_readers() {
    let repo = Arc::new(
        SeriesRepository::with_config(StoreConfig {
            capacity: 8,
            ..StoreConfig::default()
        })
        .unwrap(),
    );

    let writers: Vec<_> = (0..4)
        .map(|w| {
            let repo = Arc::clone(&repo);
            thread::spawn(move || {
                let series = Series::new("Requests").with_tag("worker", w.to_string());
                for t in 0..500 {
                    repo.add(&series, "server", t, t % 7).unwrap();
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..2)
        .map(|_| {
            let repo = Arc::clone(&repo);
            thread::spawn(move || {
                for _ in 0..200 {
                    for set in repo.select_all_series().unwrap() {
                        assert!(set.size() <= 8);
                        let points = set.points();
                        assert_eq!(points.len(), set.size() * 2);
                    }
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().expect("thread panicked");
    }

    assert_eq!(repo.len().unwrap(), 4);
    for set in repo.select_all_series().unwrap() {
        assert_eq!(set.observed_values(), 500);
        assert_eq!(set.last_time(), 499);
        assert_eq!(set.size(), 8);
    }
}
