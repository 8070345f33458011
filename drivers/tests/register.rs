use isp_drivers::register;
use isp_drivers::register::Window;

#[test]
fn mmio_window_accesses_the_mapping() {
    let mut registers = vec![0u32; 4];
    let base = std::ptr::NonNull::new(registers.as_mut_ptr() as *mut u8).unwrap();
    let window = unsafe { register::MmioWindow::new(base, 16) };

    window.write(0x4, 0xdead_beef);
    assert_eq!(window.read(0x4), 0xdead_beef);
    register::Field::new(0xc, 8, 8).modify(&window, 0x5a);
    assert_eq!(window.read(0xc), 0x5a00);

    // out of the window or unaligned
    window.write(0x10, 1);
    window.write(0x6, 1);
    assert_eq!(window.read(0x10), 0);
    assert_eq!(window.read(0x6), 0);

    drop(window);
    assert_eq!(registers, vec![0, 0xdead_beef, 0, 0x5a00]);
}

#[test]
fn memory_window_ignores_accesses_outside_of_the_window() {
    let window = register::MemoryWindow::new(8);
    window.write(0x8, 1);
    assert_eq!(window.read(0x8), 0);
    assert_eq!(window.writes(), 0);
    window.write(0x4, 2);
    assert_eq!(window.read(0x4), 2);
    assert_eq!(window.writes(), 1);
}
