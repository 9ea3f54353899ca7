#![no_main]
use libfuzzer_sys::fuzz_target;
use orb_data::builder::BuildOptions;
use orb_data::scene_data::SceneData;

fuzz_target!(|data: SceneData| {
    let orb = data.to_orb(BuildOptions::default());
    if let Ok(bytes) = orb_data::encode(&orb) {
        let (scene, errors) = orb_data::decode(&bytes).unwrap();
        assert!(errors.is_empty());
        assert_eq!(bytes, orb_data::encode(scene.orb()).unwrap());
    }
});
