mod common;

use common::Record;
use isp_drivers::backend;
use isp_drivers::setfile;
use isp_drivers::state;

fn table() -> setfile::SetfileTable {
    setfile::SetfileTable {
        version: 0x0301,
        entries: vec![
            setfile::Entry {
                address: 0x8000_0000,
                size: 0x400,
            },
            setfile::Entry {
                address: 0x8000_0400,
                size: 0x800,
            },
            setfile::Entry {
                address: 0x8000_0c00,
                size: 0x200,
            },
            setfile::Entry {
                address: 0x8000_0e00,
                size: 0x200,
            },
        ],
        index: vec![0, 2, 3, 1],
        using_count: 3,
    }
}

fn target(instance: u32) -> backend::Target {
    backend::Target {
        kind: isp_drivers::Kind::Isp,
        slot: common::ISP,
        instance,
    }
}

#[test]
fn load_creates_every_entry_in_use() {
    let fixture = common::fixture();
    fixture.start(&[common::ISP], 0);
    fixture.backend.clear();

    fixture.pipeline.load_setfile(common::ISP, 0, &table()).unwrap();
    assert_eq!(
        fixture.backend.records(),
        vec![
            Record::CreateTuneSet(target(0), 0),
            Record::CreateTuneSet(target(0), 1),
            Record::CreateTuneSet(target(0), 2),
        ]
    );
    let block = fixture.pipeline.block(common::ISP).unwrap();
    assert_eq!(block.loaded_setfiles(0).unwrap(), 0b111);
    assert_eq!(
        fixture.pipeline.state(common::ISP).unwrap().flags(),
        state::OPEN | state::INIT | state::TUNESET
    );
}

#[test]
fn failed_entries_do_not_stop_the_load() {
    let fixture = common::fixture();
    fixture.start(&[common::ISP], 0);
    fixture.backend.fail_tune_set(1, -22);

    fixture.pipeline.load_setfile(common::ISP, 0, &table()).unwrap();
    assert_eq!(fixture.backend.count(backend::Call::CreateTuneSet), 3);
    let block = fixture.pipeline.block(common::ISP).unwrap();
    assert_eq!(block.loaded_setfiles(0).unwrap(), 0b101);
    assert!(fixture.pipeline.state(common::ISP).unwrap().is_tuneset());
}

#[test]
fn load_requires_init() {
    let fixture = common::fixture();
    fixture.pipeline.open(common::ISP, 0).unwrap();
    assert_eq!(
        fixture.pipeline.load_setfile(common::ISP, 0, &table()),
        Err(isp_drivers::Error::NotInitialized(common::ISP))
    );
    assert_eq!(fixture.backend.count(backend::Call::CreateTuneSet), 0);
}

#[test]
fn invalid_table_is_refused() {
    let fixture = common::fixture();
    fixture.start(&[common::ISP], 0);
    let mut table = table();
    table.using_count = 5;

    assert!(matches!(
        fixture.pipeline.load_setfile(common::ISP, 0, &table),
        Err(isp_drivers::Error::InvalidSetfile(_))
    ));
    assert!(!fixture.pipeline.state(common::ISP).unwrap().is_tuneset());
}

#[test]
fn apply_resolves_the_scenario() {
    let fixture = common::fixture();
    fixture.start(&[common::ISP], 0);
    fixture.pipeline.load_setfile(common::ISP, 0, &table()).unwrap();

    fixture
        .pipeline
        .apply_setfile(common::ISP, 0, &table(), 1)
        .unwrap();
    assert_eq!(
        fixture.backend.records().last(),
        Some(&Record::ApplyTuneSet(target(0), 2))
    );
}

#[test]
fn apply_outside_the_entries_in_use() {
    let fixture = common::fixture();
    fixture.start(&[common::ISP], 0);
    fixture.pipeline.load_setfile(common::ISP, 0, &table()).unwrap();

    // scenario 2 maps to entry 3, past using_count
    assert_eq!(
        fixture.pipeline.apply_setfile(common::ISP, 0, &table(), 2),
        Err(isp_drivers::Error::OutOfRange { index: 3, limit: 3 })
    );
    assert_eq!(
        fixture.pipeline.apply_setfile(common::ISP, 0, &table(), 4),
        Err(isp_drivers::Error::OutOfRange { index: 4, limit: 4 })
    );
    assert_eq!(fixture.backend.count(backend::Call::ApplyTuneSet), 0);
}

#[test]
fn delete_unloads_and_clears_tuneset() {
    let fixture = common::fixture();
    fixture.start(&[common::ISP], 0);
    fixture.backend.fail_tune_set(0, -1);
    fixture.pipeline.load_setfile(common::ISP, 0, &table()).unwrap();
    fixture.backend.clear();

    fixture.pipeline.delete_setfile(common::ISP, 0).unwrap();
    assert_eq!(
        fixture.backend.records(),
        vec![
            Record::DeleteTuneSet(target(0), 1),
            Record::DeleteTuneSet(target(0), 2),
        ]
    );
    assert_eq!(
        fixture
            .pipeline
            .block(common::ISP)
            .unwrap()
            .loaded_setfiles(0)
            .unwrap(),
        0
    );
    assert!(!fixture.pipeline.state(common::ISP).unwrap().is_tuneset());
}

#[test]
fn close_unloads_the_instance() {
    let fixture = common::fixture();
    fixture.start(&[common::ISP], 0);
    fixture.pipeline.load_setfile(common::ISP, 0, &table()).unwrap();

    fixture.pipeline.close(common::ISP, 0).unwrap();
    assert_eq!(fixture.backend.count(backend::Call::DeleteTuneSet), 3);
    assert_eq!(fixture.pipeline.state(common::ISP).unwrap().flags(), 0);
}

#[test]
fn table_decodes_from_bincode() {
    let bytes = isp_drivers::bincode::serialize(&table()).unwrap();
    let decoded = setfile::SetfileTable::deserialize_bincode(&bytes).unwrap();
    assert_eq!(decoded, table());
    assert_eq!(decoded.resolve(3), Ok(1));
}
