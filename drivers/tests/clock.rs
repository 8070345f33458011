use isp_drivers::clock;
use isp_drivers::register;
use isp_drivers::register::Window;

const GATE: register::Field = register::Field::new(0x8, 3, 1);

fn resource(consumers: usize) -> (std::sync::Arc<register::MemoryWindow>, clock::Resource) {
    let window = std::sync::Arc::new(register::MemoryWindow::new(0x10));
    window.poke(0x8, 0xf0);
    let resource = clock::Resource::new(window.clone(), GATE, consumers);
    (window, resource)
}

#[test]
fn balanced_sequences_end_gated() -> Result<(), isp_drivers::Error> {
    let (_window, resource) = resource(3);
    assert!(resource.is_gated());
    let sequence = [0, 1, 1, 2, 0, 2, 1];
    for bit in sequence {
        resource.acquire(bit)?;
        assert!(!resource.is_gated());
    }
    for bit in sequence.iter().rev() {
        resource.release(*bit)?;
    }
    assert!(resource.is_gated());
    for bit in 0..3 {
        assert_eq!(resource.count(bit), 0);
    }
    Ok(())
}

#[test]
fn gate_toggles_on_aggregate_transitions_only() -> Result<(), isp_drivers::Error> {
    let (window, resource) = resource(2);
    let initial = window.writes();

    resource.acquire(0)?;
    resource.acquire(1)?;
    resource.acquire(0)?;
    assert_eq!(window.writes(), initial + 1);
    resource.release(0)?;
    resource.release(1)?;
    assert_eq!(window.writes(), initial + 1);
    assert!(!resource.is_gated());
    resource.release(0)?;
    assert_eq!(window.writes(), initial + 2);
    assert!(resource.is_gated());
    // neighbouring bits are left alone
    assert_eq!(window.read(0x8), 0xf8);
    Ok(())
}

#[test]
fn release_saturates_at_zero() -> Result<(), isp_drivers::Error> {
    let (window, resource) = resource(2);
    resource.release(1)?;
    assert_eq!(resource.count(1), 0);
    assert!(resource.is_gated());

    resource.acquire(0)?;
    resource.release(1)?;
    assert!(!resource.is_gated());
    resource.release(0)?;
    assert!(resource.is_gated());
    assert_eq!(window.read(0x8), 0xf8);
    Ok(())
}

#[test]
fn unknown_consumer() {
    let (_window, resource) = resource(2);
    assert_eq!(
        resource.acquire(2),
        Err(isp_drivers::Error::OutOfRange { index: 2, limit: 2 })
    );
    assert_eq!(
        resource.release(5),
        Err(isp_drivers::Error::OutOfRange { index: 5, limit: 2 })
    );
    assert!(resource.is_gated());
}

#[test]
fn field_accessors() {
    let field = register::Field::new(0x20, 4, 3);
    assert_eq!(field.mask(), 0b111_0000);
    assert_eq!(field.get(0xffff_ff5f), 0b101);
    assert_eq!(field.set(0xffff_ffff, 0b010), 0xffff_ffaf);
    assert_eq!(field.set(0, 0xff), 0b111_0000);

    let window = register::MemoryWindow::new(0x40);
    window.poke(0x20, 0x1);
    field.modify(&window, 6);
    assert_eq!(window.read(0x20), 0x61);
    assert_eq!(field.read(&window), 6);
    assert_eq!(window.writes(), 1);
    assert_eq!(register::Field::new(0, 0, 32).mask(), u32::MAX);
}
