use std::collections::HashSet;
use std::num::NonZeroU64;
use std::sync::Arc;
use std::time::Duration;

use loadmix::config::{Config, ConfigError, Store};
use loadmix::workload::WorkloadError;
use loadmix::{Controller, Workload};
use loadmix_store::{MemoryStore, Record, Store as _, StoreError};

fn start_id() -> NonZeroU64 {
    NonZeroU64::new(1000).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_clients_share_the_id_space() {
    loadmix_test::tracing::init();

    const CLIENTS: usize = 100;
    let store = MemoryStore::new();
    let controller = Controller::new(CLIENTS, Workload::default(), start_id()).seed(1);

    let report = controller
        .run(
            Arc::new(store.clone()),
            tokio::time::sleep(Duration::from_millis(300)),
        )
        .await
        .unwrap();

    let stats = controller.stats().snapshot();
    assert!(stats.total_reads > 0);
    assert!(stats.total_writes > 0);
    assert!(stats.empty_reads <= stats.total_reads);
    assert!(stats.total_documents_read <= stats.total_reads);
    assert!(report.documents_written > 0);

    // Clients may still be finishing inserts, so take the records before the counter.
    let records = store.records();
    let next = controller.counter().next();
    let numbers: HashSet<_> = records.iter().map(|record| record.number).collect();
    assert_eq!(numbers.len(), records.len());
    for record in &records {
        assert!((1000..next).contains(&record.number));
        assert!(record.group < CLIENTS as u64);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn write_failure_aborts_the_run() {
    loadmix_test::tracing::init();

    let store = MemoryStore::new();
    let controller = Controller::new(10, Workload::default(), start_id());

    let breaker = store.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        breaker.fail_writes();
    });

    let err = controller
        .run(Arc::new(store), std::future::pending())
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<StoreError>(),
        Some(StoreError::Write { .. })
    ));
    assert!(format!("{err:#}").contains("failed to insert record"));
}

#[tokio::test]
async fn query_failure_aborts_the_run() {
    let store = MemoryStore::new();
    store.fail_queries();

    let workload = Workload::builder().write_fraction(0.0).build().unwrap();
    let err = Controller::new(5, workload, start_id())
        .run(Arc::new(store.clone()), std::future::pending())
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<StoreError>(),
        Some(StoreError::Query { .. })
    ));
}

#[tokio::test]
async fn delete_failure_aborts_the_run() {
    let store = MemoryStore::new();
    let session = store.connect().await.unwrap();
    for number in 0..1000 {
        session.insert(&Record { number, group: 0 }).await.unwrap();
    }
    session.close().await;
    store.fail_deletes();

    // Every target below the start id exists, so nearly every step attempts a delete.
    let workload = Workload::builder()
        .write_fraction(1.0)
        .delete_fraction(0.99)
        .update_fraction(0.0)
        .build()
        .unwrap();
    let err = Controller::new(5, workload, start_id())
        .run(Arc::new(store.clone()), std::future::pending())
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<StoreError>(),
        Some(StoreError::Delete { .. })
    ));
}

#[test]
fn memory_store_from_config() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("LOADMIX__STORE__TYPE", "memory");
        jail.set_env("LOADMIX__CLIENTS", "4");
        jail.set_env("LOADMIX__SEED", "9");

        let config = Config::load(None).unwrap();
        assert!(matches!(config.store, Store::Memory));

        let validated = config.validate().unwrap();
        let controller = Controller::from_config(&validated).seed(9);
        assert_eq!(controller.counter().next(), 1000);
        assert_eq!(config.store.open().name(), "memory");
        Ok(())
    });
}

#[test]
fn invalid_configuration_is_rejected_before_running() {
    let mut config = Config::default();
    config.workload.write_fraction = 1.2;

    let err = config.validate().unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Workload(WorkloadError::OutOfRange {
            name: "write fraction",
            ..
        })
    ));
    assert_eq!(
        err.to_string(),
        "invalid workload: write fraction must be between 0 and 1, got 1.2"
    );
}
