use orb_lib::Orb;

pub fn test_write_read_write(input: &Orb) {
    let before = input.to_bytes().unwrap();
    let output = Orb::read_bytes(&before).unwrap();
    let after = output.to_bytes().unwrap();

    assert_eq!(before, after, "{}", serde_json::to_string(&input).unwrap());
}
