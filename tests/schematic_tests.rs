use nucleation_core::formats::FormatManager;
use nucleation_core::{
    Axis, BlockEntity, BlockState, BoundingBox, ChunkOptions, NbtValue, Region, SchematicError,
    UniversalSchematic,
};
use std::collections::HashMap;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn snapshot(schematic: &UniversalSchematic) -> HashMap<(i32, i32, i32), BlockState> {
    schematic
        .iter_blocks()
        .map(|(pos, state)| ((pos.x, pos.y, pos.z), state.clone()))
        .collect()
}

fn sample_build() -> UniversalSchematic {
    let mut schematic = UniversalSchematic::new("Sample");
    schematic.set_block_str(0, 0, 0, "minecraft:stone").unwrap();
    schematic
        .set_block_str(2, 0, 1, "minecraft:oak_stairs[facing=north,half=bottom]")
        .unwrap();
    schematic.set_block_str(1, 3, 2, "minecraft:oak_log[axis=x]").unwrap();
    schematic.set_block_str(3, 1, 0, "minecraft:glass").unwrap();
    schematic
}

#[test]
fn test_set_get_across_negative_coordinates() {
    init_tracing();
    let mut schematic = UniversalSchematic::new("Negative");
    let stone = BlockState::new("minecraft:stone");
    let dirt = BlockState::new("minecraft:dirt");

    schematic.set_block(-5, -2, -7, &stone).unwrap();
    schematic.set_block(4, 10, 3, &dirt).unwrap();
    schematic.set_block(-5, -2, -7, &dirt).unwrap();

    assert_eq!(schematic.get_block(-5, -2, -7), Some(&dirt));
    assert_eq!(schematic.get_block(4, 10, 3), Some(&dirt));
    assert_eq!(schematic.block_count(), 2);

    let tight = schematic.tight_bounds().unwrap();
    assert_eq!(tight.min, (-5, -2, -7));
    assert_eq!(tight.max, (4, 10, 3));

    let counts = schematic.count_block_types();
    assert_eq!(counts.get(&dirt), Some(&2));
    assert!(!counts.contains_key(&stone));
    assert!(!counts.contains_key(&BlockState::air()));
}

#[test]
fn test_filled_cube_counts_every_cell() {
    let mut schematic = UniversalSchematic::new("Cube");
    schematic
        .fill_cuboid((0, 0, 0), (9, 9, 9), &BlockState::new("minecraft:stone"))
        .unwrap();
    assert_eq!(schematic.block_count(), 1000);
    assert_eq!(schematic.dimensions(), (10, 10, 10));
    assert_eq!(schematic.get_block(9, 9, 9), Some(&BlockState::new("minecraft:stone")));
}

#[test]
fn test_out_of_world_write_is_rejected() {
    let mut schematic = sample_build();
    let before = snapshot(&schematic);
    let result = schematic.set_block(0, 40_000_000, 0, &BlockState::new("minecraft:stone"));
    assert!(matches!(result, Err(SchematicError::InvalidArgument(_))));
    assert_eq!(snapshot(&schematic), before);
}

#[test]
fn test_four_quarter_turns_restore_content() {
    init_tracing();
    for axis in [Axis::X, Axis::Y, Axis::Z] {
        let mut schematic = sample_build();
        let before = snapshot(&schematic);
        for _ in 0..4 {
            schematic.rotate(axis, 90).unwrap();
        }
        assert_eq!(snapshot(&schematic), before, "axis {}", axis);
    }
}

#[test]
fn test_rotation_keeps_block_count_and_rejects_bad_angles() {
    let mut schematic = sample_build();
    schematic.rotate(Axis::Y, 90).unwrap();
    assert_eq!(schematic.block_count(), 4);

    let before = snapshot(&schematic);
    assert!(schematic.rotate(Axis::Y, 45).is_err());
    assert_eq!(snapshot(&schematic), before);
}

#[test]
fn test_flip_twice_restores_content() {
    for axis in [Axis::X, Axis::Y, Axis::Z] {
        let mut schematic = sample_build();
        let before = snapshot(&schematic);
        schematic.flip(axis);
        schematic.flip(axis);
        assert_eq!(snapshot(&schematic), before);
    }
}

#[test]
fn test_named_regions() {
    let mut schematic = UniversalSchematic::new("Regions");
    schematic.add_region(Region::new("Annex", (100, 0, 0), (2, 2, 2))).unwrap();
    schematic
        .set_block_in_region("Annex", 100, 1, 1, &BlockState::new("minecraft:gold_block"))
        .unwrap();

    assert_eq!(
        schematic.get_block(100, 1, 1),
        Some(&BlockState::new("minecraft:gold_block"))
    );
    assert_eq!(schematic.block_count(), 1);
    assert!(matches!(
        schematic.add_region(Region::new("Annex", (0, 0, 0), (1, 1, 1))),
        Err(SchematicError::NameCollision(_))
    ));
    assert!(matches!(
        schematic.get_region("Missing"),
        Err(SchematicError::NotFound(_))
    ));

    let removed = schematic.remove_region("Annex").unwrap();
    assert_eq!(removed.count_non_air_blocks(), 1);
    assert_eq!(schematic.get_block(100, 1, 1), None);
    assert_eq!(schematic.block_count(), 0);
}

#[test]
fn test_block_entities_follow_their_cells() {
    let mut schematic = UniversalSchematic::new("Entities");
    schematic.set_block_str(0, 0, 0, "minecraft:chest[facing=west]").unwrap();
    schematic
        .set_block_entity(
            BlockEntity::new("minecraft:chest", (0, 0, 0))
                .with_nbt_data("Lock", NbtValue::String("key".to_string())),
        )
        .unwrap();

    let mut copy = UniversalSchematic::new("Copy");
    copy.copy_region(&schematic, &BoundingBox::new((0, 0, 0), (0, 0, 0)), (10, 5, 10), &[])
        .unwrap();

    let moved = copy.get_block_entity((10, 5, 10)).unwrap();
    assert_eq!(moved.position, (10, 5, 10));
    assert_eq!(moved.nbt.get("Lock"), Some(&NbtValue::String("key".to_string())));
    assert_eq!(copy.get_block(10, 5, 10).map(|b| b.name()), Some("minecraft:chest"));

    assert!(schematic.remove_block_entity((0, 0, 0)).is_some());
    assert!(schematic.get_block_entity((0, 0, 0)).is_none());
}

#[test]
fn test_extract_then_reinsert() {
    let schematic = sample_build();
    let piece = schematic
        .extract(&BoundingBox::new((1, 0, 0), (3, 3, 2)))
        .unwrap();
    // Stone at x = 0 is outside the box.
    assert_eq!(piece.block_count(), 3);
    assert_eq!(piece.get_block(2, 1, 0), Some(&BlockState::new("minecraft:glass")));

    let mut target = UniversalSchematic::new("Target");
    target
        .copy_region(&piece, &BoundingBox::new((0, 0, 0), (2, 3, 2)), (1, 0, 0), &[])
        .unwrap();
    assert_eq!(target.get_block(3, 1, 0), Some(&BlockState::new("minecraft:glass")));
    assert_eq!(target.block_count(), 3);
}

#[test]
fn test_chunk_partition_covers_content() {
    let mut schematic = UniversalSchematic::new("Chunks");
    let stone = BlockState::new("minecraft:stone");
    schematic.fill_cuboid((0, 0, 0), (31, 0, 0), &stone).unwrap();

    let chunks = schematic.chunks(&ChunkOptions::default()).unwrap();
    assert_eq!(chunks.len(), 2);
    assert!(chunks.iter().all(|c| c.len() == 16));

    let total: usize = schematic
        .iter_chunks(&ChunkOptions::default().with_size(8, 8, 8))
        .unwrap()
        .map(|c| c.len())
        .sum();
    assert_eq!(total, 32);
}

#[test]
fn test_json_codec_through_format_manager() {
    init_tracing();
    let mut schematic = sample_build();
    schematic
        .create_definition_region_from_bounds("frame", (0, 0, 0), (3, 3, 2))
        .unwrap();
    let manager = FormatManager::with_defaults();

    let bytes = manager.encode(&schematic, "json", None).unwrap();
    assert_eq!(manager.detect_format(&bytes), Some("json".to_string()));
    let restored = manager.decode(&bytes).unwrap();

    assert_eq!(snapshot(&restored), snapshot(&schematic));
    assert_eq!(restored.definition_region_names(), vec!["frame".to_string()]);
    assert_eq!(restored.metadata.name.as_deref(), Some("Sample"));
}
