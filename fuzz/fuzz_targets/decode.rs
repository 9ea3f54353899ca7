#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok((scene, errors)) = orb_data::decode(data) {
        // Accessors must not panic even for invalid references.
        for i in 0..scene.orb().meshes.len() {
            scene.mesh_indices(i);
            scene.mesh_vertex_data(i);
        }
        for (i, clip) in scene.orb().anim_clips.iter().enumerate() {
            for position in 0..clip.num_curves.min(64) as usize {
                let _ = scene.curve_keys(i, position, Default::default());
            }
        }

        let scene_data = orb_data::scene_data::SceneData::try_from(&scene);
        assert_eq!(
            orb_data::validation::validate(scene.orb()).is_empty(),
            scene_data.is_ok()
        );

        // A file without faults is reproduced exactly.
        if errors.is_empty() {
            assert_eq!(data, orb_data::encode(scene.orb()).unwrap());
        }
    }
});
