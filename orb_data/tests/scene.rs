use orb_data::anim_keys::{CurveKeys, KeyCount};
use orb_data::builder::{CurveInput, Transform};
use orb_data::prelude::*;
use orb_data::vertex_layout::VertexLayout;
use orb_lib::{AnimKeyFormat, ErrorKind, Section, VertexAttr, VertexFormat};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn character() -> OrbBuilder {
    let mut builder = OrbBuilder::new();
    builder.add_vertex_component(VertexAttr::Position, VertexFormat::Float3);
    builder.add_vertex_component(VertexAttr::Normal, VertexFormat::Byte4N);
    builder.add_vertex_component(VertexAttr::TexCoord0, VertexFormat::Short2N);
    builder.add_vertex_component(VertexAttr::Weights, VertexFormat::UByte4N);
    builder.add_vertex_component(VertexAttr::Indices, VertexFormat::UByte4);

    let layout = VertexLayout::from_components(&[
        orb_lib::VertexComponent::new(VertexAttr::Position, VertexFormat::Float3),
        orb_lib::VertexComponent::new(VertexAttr::Normal, VertexFormat::Byte4N),
        orb_lib::VertexComponent::new(VertexAttr::TexCoord0, VertexFormat::Short2N),
        orb_lib::VertexComponent::new(VertexAttr::Weights, VertexFormat::UByte4N),
        orb_lib::VertexComponent::new(VertexAttr::Indices, VertexFormat::UByte4),
    ])
    .unwrap();

    let mut vertex_data = Vec::new();
    for position in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
        layout.write_vertex(
            &[
                [position[0], position[1], position[2], 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [position[0], position[1], 0.0, 0.0],
                [1.0, 0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0, 0.0],
            ],
            &mut vertex_data,
        );
    }

    let body = builder.add_material(
        "body",
        "skinned",
        &[("tint", &[1.0, 0.9, 0.8, 1.0]), ("roughness", &[0.5])],
        &[("albedo", 0), ("normal", 1)],
    );
    builder.add_mesh(body, &vertex_data, &[0, 1, 2], [1.0, 1.0, 0.0]);

    let hips = builder.add_bone("hips", None, Transform::IDENTITY);
    builder.add_bone(
        "spine",
        Some(hips),
        Transform {
            translate: [0.0, 1.0, 0.0],
            ..Transform::IDENTITY
        },
    );

    let root = builder.add_node("character", None, 0..1, Transform::IDENTITY);
    builder.add_node("attachment", Some(root), 0..0, Transform::IDENTITY);

    builder.add_anim_key_component(AnimKeyFormat::Float3);
    builder.add_anim_key_component(AnimKeyFormat::Quaternion);
    builder.add_anim_clip(
        "walk",
        0.25,
        &[
            CurveInput::Keyed(&[0.0, 0.0, 0.0, 0.0, 0.1, 0.0, 0.0, 0.0, 0.0]),
            CurveInput::Static([0.0, 0.0, 0.0, 1.0]),
        ],
    );
    builder.add_anim_clip(
        "wave",
        0.5,
        &[
            CurveInput::Static([0.0, 1.0, 0.0, 0.0]),
            CurveInput::Keyed(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.7071, 0.7071]),
        ],
    );

    builder
}

#[test]
fn build_decode_character() {
    init_logger();

    let bytes = character().build().unwrap();
    let (scene, errors) = decode(&bytes).unwrap();
    assert!(errors.is_empty());

    let orb = scene.orb();
    assert_eq!(Ok("skinned"), scene.string(orb.materials[0].shader));
    assert_eq!(Ok("spine"), scene.string(orb.bones[1].name));
    assert_eq!(28, scene.vertex_layout().unwrap().stride);
    assert_eq!(Some(vec![0, 1, 2]), scene.mesh_indices(0));

    let positions = scene
        .mesh_attribute_values(0, VertexAttr::Position)
        .unwrap();
    assert_eq!([1.0, 0.0, 0.0, 0.0], positions[1]);

    let weights = scene.mesh_attribute_values(0, VertexAttr::Weights).unwrap();
    assert!(weights.iter().all(|w| w[0] == 1.0));
}

#[test]
fn resolve_character_curves() {
    let bytes = character().build().unwrap();
    let (scene, _) = decode(&bytes).unwrap();

    let CurveKeys::Keyed(translation) = scene.curve_keys(0, 0, KeyCount::UntilNextCurve).unwrap()
    else {
        panic!("expected keyed translation");
    };
    assert_eq!(3, translation.len());

    let CurveKeys::Static(rotation) = scene.curve_keys(0, 1, KeyCount::UntilNextCurve).unwrap()
    else {
        panic!("expected static rotation");
    };
    assert_eq!(&[0.0, 0.0, 0.0, 1.0], rotation.as_slice());

    let CurveKeys::Static(translation) = scene.curve_keys(1, 0, KeyCount::UntilNextCurve).unwrap()
    else {
        panic!("expected static translation");
    };
    assert_eq!(&[0.0, 1.0, 0.0], translation.as_slice());

    let CurveKeys::Keyed(rotation) = scene.curve_keys(1, 1, KeyCount::SampleRate(4.0)).unwrap()
    else {
        panic!("expected keyed rotation");
    };
    assert_eq!(2, rotation.len());
}

#[test]
fn scene_data_rebuilds_identical_bytes() {
    let bytes = character().build().unwrap();
    let (scene, _) = decode(&bytes).unwrap();

    let data = SceneData::try_from(&scene).unwrap();
    assert_eq!(3, data.meshes[0].vertex_data.len() / 28);
    assert_eq!(bytes, encode(&data.to_orb(BuildOptions::default())).unwrap());
}

#[test]
fn decode_reports_every_fault() {
    init_logger();

    let mut orb = character().finish();
    orb.meshes[0].material = 1;
    orb.bones[0].parent = 1;
    orb.anim_key_components[1].key_format = 0;
    let bytes = orb.to_bytes().unwrap();

    let (scene, errors) = decode(&bytes).unwrap();
    let kinds: Vec<_> = errors.iter().map(|e| e.kind()).collect();
    assert_eq!(
        vec![
            ErrorKind::OutOfBoundsReference,
            ErrorKind::CyclicOrInvalidHierarchy,
            ErrorKind::CyclicOrInvalidHierarchy,
            ErrorKind::UnknownEnumValue
        ],
        kinds
    );

    // The tables are still accessible.
    assert_eq!(Ok("character"), scene.string(scene.orb().nodes[0].name));
    assert!(matches!(
        encode(scene.orb()),
        Err(BuildError::Validation(ValidationError::OutOfBoundsReference {
            section: Section::Meshes,
            ..
        }))
    ));
}
