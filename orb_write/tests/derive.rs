use orb_write::OrbWrite;

#[test]
fn write_named_fields_in_order() {
    #[derive(OrbWrite)]
    struct TestStruct {
        x: u8,
        y: u16,
        z: u32,
    }

    let mut writer = Vec::new();
    TestStruct { x: 1, y: 2, z: 3 }.orb_write(&mut writer).unwrap();

    assert_eq!(vec![1u8, 2u8, 0u8, 3u8, 0u8, 0u8, 0u8], writer);
}

#[test]
fn write_tuple_struct() {
    #[derive(OrbWrite)]
    struct Offset(u32);

    let mut writer = Vec::new();
    Offset(0x0A0B0C0D).orb_write(&mut writer).unwrap();

    assert_eq!(vec![0x0Du8, 0x0Cu8, 0x0Bu8, 0x0Au8], writer);
}

#[test]
fn write_nested_struct() {
    #[derive(OrbWrite)]
    struct Inner {
        values: [f32; 2],
    }

    #[derive(OrbWrite)]
    struct Outer {
        parent: i32,
        inner: Inner,
    }

    let mut writer = Vec::new();
    Outer {
        parent: -1,
        inner: Inner {
            values: [0.0, 1.0],
        },
    }
    .orb_write(&mut writer)
    .unwrap();

    assert_eq!(
        vec![
            0xFFu8, 0xFFu8, 0xFFu8, 0xFFu8, 0u8, 0u8, 0u8, 0u8, 0u8, 0u8, 0x80u8, 0x3Fu8
        ],
        writer
    );
}
