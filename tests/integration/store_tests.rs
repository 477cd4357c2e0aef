//! Result store over the NVS-backed slot table (simulation backend).

use quadpack::adapters::nvs::{NvsAdapter, NvsResultTable};
use quadpack::error::StoreError;
use quadpack::model::{Slot, TestDate, TestMode, TestResult};
use quadpack::store::{ResultStore, TABLE_LEN};

use crate::mock_hw::Eeprom;

fn record(amps: u16) -> TestResult {
    TestResult {
        unloaded: [3.3, 3.3, 3.2, 3.3],
        loaded: [2.9, 2.8, 2.7, 2.9],
        max_load_current: amps,
        test_mode: TestMode::Automated,
        ambient_temp: 22,
        date: TestDate {
            year: 25,
            month: 11,
            day: 3,
        },
    }
}

fn open(nvs: &NvsAdapter) -> ResultStore<NvsResultTable> {
    let table = NvsResultTable::open(nvs.clone()).unwrap();
    ResultStore::new(table).unwrap()
}

#[test]
fn saved_slots_survive_a_reopen() {
    let nvs = NvsAdapter::new().unwrap();
    let slot = Slot::from_number(7).unwrap();
    open(&nvs).save(slot, &record(45)).unwrap();

    let reopened = open(&nvs);
    assert_eq!(reopened.load(slot).unwrap(), record(45));
}

#[test]
fn last_write_wins_and_neighbours_are_untouched() {
    let nvs = NvsAdapter::new().unwrap();
    let mut store = open(&nvs);
    let a = Slot::from_number(1).unwrap();
    let b = Slot::from_number(2).unwrap();

    store.save(a, &record(10)).unwrap();
    store.save(b, &record(20)).unwrap();
    store.save(a, &record(30)).unwrap();

    assert_eq!(store.load(a).unwrap().max_load_current, 30);
    assert_eq!(store.load(b).unwrap().max_load_current, 20);
}

#[test]
fn erase_restores_the_blank_pattern() {
    let nvs = NvsAdapter::new().unwrap();
    let slot = Slot::LAST;
    let mut store = open(&nvs);
    store.save(slot, &record(99)).unwrap();
    store.erase(slot).unwrap();

    let raw = nvs.get_blob("results").unwrap().unwrap();
    assert_eq!(raw.len(), TABLE_LEN);
    assert!(raw[TABLE_LEN - 39..].iter().all(|&b| b == 0xFF));
}

#[test]
fn undersized_medium_is_refused() {
    let eeprom = Eeprom {
        bytes: vec![0xFF; 100],
        ..Eeprom::blank()
    };
    assert!(matches!(
        ResultStore::new(eeprom),
        Err(StoreError::TooSmall {
            capacity: 100,
            required: TABLE_LEN
        })
    ));
}
