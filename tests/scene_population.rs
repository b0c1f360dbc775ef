mod common;

use biome_viewer::gpu::{ProgramKind, RecordingContext};
use biome_viewer::renderer::catalog::{Geometry, MeshSpec};
use biome_viewer::renderer::MeshLibrary;
use biome_viewer::scene::{ObjectType, Region, Scene, SpawnRule, Transform, WorldLayout};
use biome_viewer::Error;
use glam::Vec3;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use common::{libraries, MemoryAssets};

fn transforms(scene: &Scene) -> Vec<Transform> {
    scene.objects().iter().map(|o| *o.transform()).collect()
}

#[test]
fn ten_instances_land_inside_their_region() {
    let mut gpu = RecordingContext::new();
    let libs = libraries(&mut gpu, &MemoryAssets::new());
    let mut scene = Scene::new();
    scene
        .spawn(
            &Region::new("other", 50.0..60.0, 50.0..60.0, 0.0).unwrap(),
            &SpawnRule::new(ObjectType::Tent, 3),
            &mut SmallRng::seed_from_u64(1),
            &libs.meshes,
            &libs.textures,
        )
        .unwrap();
    let before = scene.len();

    let region = Region::new("square", 0.0..10.0, 0.0..10.0, 0.0).unwrap();
    let keys = scene
        .spawn(
            &region,
            &SpawnRule::new(ObjectType::SmallRock, 10),
            &mut SmallRng::seed_from_u64(77),
            &libs.meshes,
            &libs.textures,
        )
        .unwrap();

    assert_eq!(keys.len(), 10);
    assert_eq!(scene.len(), before + 10);
    for key in keys {
        let object = scene.get(key).unwrap();
        let t = object.transform();
        assert_eq!(object.object_type(), ObjectType::SmallRock);
        assert!((0.0..10.0).contains(&t.position.x), "x = {}", t.position.x);
        assert!((0.0..10.0).contains(&t.position.z), "z = {}", t.position.z);
        assert_eq!(t.position.y, -0.75);
        assert_eq!(t.rotation.x, 0.0);
        assert_eq!(t.rotation.z, 0.0);
    }
}

#[test]
fn same_seed_reproduces_the_world() {
    let mut gpu = RecordingContext::new();
    let libs = libraries(&mut gpu, &MemoryAssets::new());
    let layout = WorldLayout::standard().unwrap();

    let build = |seed: u64| {
        let mut scene = Scene::new();
        let mut rng = SmallRng::seed_from_u64(seed);
        scene
            .populate(&layout, &mut rng, &libs.meshes, &libs.textures)
            .unwrap();
        transforms(&scene)
    };

    let first = build(2024);
    assert_eq!(first, build(2024));
    assert_ne!(first, build(2025));
}

#[test]
fn standard_world_fills_every_biome() {
    let mut gpu = RecordingContext::new();
    let libs = libraries(&mut gpu, &MemoryAssets::new());
    let layout = WorldLayout::standard().unwrap();
    let mut scene = Scene::new();

    let added = scene
        .populate(&layout, &mut SmallRng::seed_from_u64(5), &libs.meshes, &libs.textures)
        .unwrap();

    assert_eq!(added, layout.object_count());
    assert_eq!(scene.len(), added);

    // every scattered object stays inside one of the biomes
    for object in scene.objects() {
        let p = object.transform().position;
        let inside = layout.biomes.iter().any(|b| b.region.contains(p.x, p.z));
        let fixed = layout.fixed.iter().any(|f| f.transform.position == p);
        assert!(inside || fixed, "{:?} at {p}", object.object_type());
    }

    let moving = scene
        .objects()
        .iter()
        .filter(|o| o.object_type() == ObjectType::MovingCube)
        .count();
    assert_eq!(moving, 1);
}

#[test]
fn tree_tops_sit_above_their_trunks() {
    let mut gpu = RecordingContext::new();
    let libs = libraries(&mut gpu, &MemoryAssets::new());
    let mut scene = Scene::new();
    let rule = SpawnRule::new(ObjectType::TreeBottom, 5)
        .companion(ObjectType::TreeTop, Vec3::new(0.0, 4.0, 0.0));
    let region = Region::new("grove", -10.0..0.0, -10.0..0.0, 2.0).unwrap();

    scene
        .spawn(&region, &rule, &mut SmallRng::seed_from_u64(8), &libs.meshes, &libs.textures)
        .unwrap();

    assert_eq!(scene.len(), 10);
    for pair in scene.objects().chunks_exact(2) {
        assert_eq!(pair[0].object_type(), ObjectType::TreeBottom);
        assert_eq!(pair[1].object_type(), ObjectType::TreeTop);
        let (bottom, top) = (pair[0].transform(), pair[1].transform());
        assert_eq!(bottom.position.y, 2.0 - 0.75);
        assert!((top.position - bottom.position).abs_diff_eq(Vec3::Y * 4.0, 1e-5));
        assert_eq!(top.rotation, bottom.rotation);
    }
}

#[test]
fn spawning_an_unknown_mesh_adds_nothing() {
    let mut gpu = RecordingContext::new();
    let libs = libraries(&mut gpu, &MemoryAssets::new());
    let meshes = MeshLibrary::from_specs(
        &mut gpu,
        &MemoryAssets::new(),
        &libs.shaders,
        &[MeshSpec::builtin("cube", Geometry::Cube, ProgramKind::Lit)],
    )
    .unwrap();
    let mut scene = Scene::new();

    let err = scene
        .spawn(
            &Region::new("dunes", 0.0..1.0, 0.0..1.0, 0.0).unwrap(),
            &SpawnRule::new(ObjectType::Camel, 4),
            &mut SmallRng::seed_from_u64(3),
            &meshes,
            &libs.textures,
        )
        .unwrap_err();

    assert!(matches!(err, Error::UnknownMesh(name) if name == "camel"));
    assert!(scene.is_empty());
}

#[test]
fn regions_reject_empty_bounds() {
    assert!(matches!(
        Region::new("sliver", 5.0..5.0, 0.0..10.0, 0.0),
        Err(Error::InvalidRegion { name }) if name == "sliver"
    ));
}
