use nucleation_core::{Axis, BlockState, DefinitionRegion, SchematicError, UniversalSchematic};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, HashSet};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A 5x1x1 bus of wool with a lamp in the middle.
fn circuit() -> UniversalSchematic {
    let mut schematic = UniversalSchematic::new("Circuit");
    for x in 0..5 {
        schematic.set_block_str(x, 0, 0, "minecraft:gray_wool").unwrap();
    }
    schematic
        .set_block_str(2, 1, 0, "minecraft:redstone_lamp[lit=true]")
        .unwrap();
    schematic
        .set_block_str(4, 1, 0, "minecraft:redstone_lamp[lit=false]")
        .unwrap();
    schematic
}

#[test]
fn test_boolean_algebra_laws() {
    let a = DefinitionRegion::from_bounds((0, 0, 0), (5, 5, 5));
    let b = DefinitionRegion::from_bounds((3, 3, 3), (8, 8, 8));

    let union = a.union(&b);
    let inter = a.intersect(&b);
    let a_minus_b = a.subtract(&b);

    assert_eq!(inter.volume(), 27);
    assert_eq!(union.volume(), 216 + 216 - 27);
    assert_eq!(a_minus_b.volume(), 216 - 27);
    // (A \ B) ∪ (A ∩ B) = A
    assert!(a_minus_b.union(&inter).same_members(&a));
    // Subtracting a superset empties the region.
    assert!(inter.subtract(&a).is_empty());

    for (x, y, z) in union.positions() {
        assert!(a.contains(x, y, z) || b.contains(x, y, z));
    }
}

#[test]
fn test_canonical_form_is_independent_of_construction() {
    let mut by_rows = DefinitionRegion::new();
    for z in 0..3 {
        by_rows.add_bounds((0, 0, z), (3, 1, z));
    }
    let mut by_points = DefinitionRegion::new();
    for z in 0..3 {
        for y in 0..2 {
            for x in 0..4 {
                by_points.add_point(x, y, z);
            }
        }
    }
    by_rows.simplify();
    by_points.simplify();
    assert_eq!(by_rows, by_points);
    assert_eq!(by_rows.box_count(), 1);
    assert_eq!(by_rows.get_box(0), Some(((0, 0, 0), (3, 1, 2))));
}

#[test]
fn test_filters_against_schematic() {
    init_tracing();
    let schematic = circuit();
    let area = DefinitionRegion::from_bounds((0, 0, 0), (4, 1, 0));

    let wool = area.filter_by_block(&schematic, "gray_wool").unwrap();
    assert_eq!(wool.volume(), 5);
    assert!(wool.is_contiguous());

    let lamps = area.filter_by_block(&schematic, "minecraft:redstone_lamp").unwrap();
    assert_eq!(lamps.positions_sorted(), vec![(2, 1, 0), (4, 1, 0)]);
    assert_eq!(lamps.connected_components(), 2);

    let mut lit = HashMap::new();
    lit.insert("lit".to_string(), "true".to_string());
    let lit_lamps = area.filter_by_properties(&schematic, &lit).unwrap();
    assert_eq!(lit_lamps.positions(), vec![(2, 1, 0)]);

    // Air and lamps remain once the wool is excluded.
    let rest = area.exclude_block(&schematic, "gray_wool").unwrap();
    assert_eq!(rest.volume(), 5);
    assert!(!rest.contains(0, 0, 0));
}

#[test]
fn test_filter_rejects_huge_regions() {
    let schematic = circuit();
    let huge = DefinitionRegion::from_bounds((0, 0, 0), (1023, 1023, 1023));
    assert!(matches!(
        huge.filter_by_block(&schematic, "stone"),
        Err(SchematicError::InvalidArgument(_))
    ));
    // Algebra never enumerates cells.
    assert_eq!(huge.contracted(1).volume(), 1022u64.pow(3));
}

#[test]
fn test_sync_and_fetch() {
    let mut schematic = circuit();
    let mut input = DefinitionRegion::from_bounds((0, 0, 0), (0, 0, 0));
    input.set_metadata("type", "input");

    input.sync(&mut schematic, "a").unwrap();
    input.sync(&mut schematic, "a").unwrap();
    let other = DefinitionRegion::from_point(9, 9, 9);
    assert!(matches!(
        other.sync(&mut schematic, "a"),
        Err(SchematicError::NameCollision(_))
    ));

    other.sync_update(&mut schematic, "a");
    let fetched = DefinitionRegion::fetch(&schematic, "a").unwrap();
    assert!(fetched.contains(9, 9, 9));
    assert!(matches!(
        DefinitionRegion::fetch(&schematic, "missing"),
        Err(SchematicError::NotFound(_))
    ));
}

#[test]
fn test_components_split_and_rejoin() {
    let mut region = DefinitionRegion::new();
    region.add_bounds((0, 0, 0), (2, 0, 0));
    region.add_bounds((0, 0, 4), (2, 0, 4));
    region.add_point(10, 10, 10);

    let parts = region.components();
    assert_eq!(parts.len(), 3);
    let total = parts
        .iter()
        .fold(DefinitionRegion::new(), |acc, part| acc.union(part));
    assert!(total.same_members(&region));

    // Bridging the two bars joins them.
    region.add_bounds((1, 0, 1), (1, 0, 3));
    assert_eq!(region.connected_components(), 2);
}

#[test]
fn test_corner_and_edge_contact_stay_separate() {
    let corners = DefinitionRegion::from_bounding_boxes(vec![
        ((0, 0, 0), (1, 1, 1)),
        ((2, 2, 2), (3, 3, 3)),
    ]);
    assert_eq!(corners.connected_components(), 2);
    assert!(!corners.is_contiguous());

    let edges = DefinitionRegion::from_bounding_boxes(vec![
        ((0, 0, 0), (1, 1, 1)),
        ((2, 2, 0), (3, 3, 1)),
    ]);
    assert_eq!(edges.connected_components(), 2);

    let faces = DefinitionRegion::from_bounding_boxes(vec![
        ((0, 0, 0), (1, 1, 1)),
        ((2, 0, 0), (3, 1, 1)),
    ]);
    assert_eq!(faces.connected_components(), 1);
}

fn random_region(rng: &mut StdRng) -> (DefinitionRegion, HashSet<(i32, i32, i32)>) {
    let mut region = DefinitionRegion::new();
    let mut cells = HashSet::new();
    for _ in 0..rng.gen_range(0..4) {
        let min = (rng.gen_range(-4..4), rng.gen_range(-4..4), rng.gen_range(-4..4));
        let max = (
            min.0 + rng.gen_range(0..4),
            min.1 + rng.gen_range(0..4),
            min.2 + rng.gen_range(0..4),
        );
        region.add_bounds(min, max);
        for x in min.0..=max.0 {
            for y in min.1..=max.1 {
                for z in min.2..=max.2 {
                    cells.insert((x, y, z));
                }
            }
        }
    }
    for _ in 0..rng.gen_range(0..5) {
        let p = (rng.gen_range(-5..5), rng.gen_range(-5..5), rng.gen_range(-5..5));
        region.add_point(p.0, p.1, p.2);
        cells.insert(p);
    }
    (region, cells)
}

fn members(region: &DefinitionRegion) -> HashSet<(i32, i32, i32)> {
    let cells: HashSet<_> = region.iter_positions().collect();
    assert_eq!(cells.len() as u64, region.volume());
    cells
}

#[test]
fn test_algebra_matches_point_sets() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for round in 0..200 {
        let (a, a_cells) = random_region(&mut rng);
        let (b, b_cells) = random_region(&mut rng);

        let union: HashSet<_> = a_cells.union(&b_cells).copied().collect();
        let inter: HashSet<_> = a_cells.intersection(&b_cells).copied().collect();
        let diff: HashSet<_> = a_cells.difference(&b_cells).copied().collect();

        assert_eq!(members(&a.union(&b)), union, "union, round {}", round);
        assert_eq!(members(&a.intersect(&b)), inter, "intersect, round {}", round);
        assert_eq!(members(&a.subtract(&b)), diff, "subtract, round {}", round);

        for x in -6..8 {
            let (y, z) = (rng.gen_range(-6..8), rng.gen_range(-6..8));
            assert_eq!(a.contains(x, y, z), a_cells.contains(&(x, y, z)));
        }
    }
}

#[test]
fn test_expand_then_contract_restores_box() {
    let core = DefinitionRegion::from_bounds((-3, 0, 2), (4, 6, 9));
    let grown = core.expanded(2, 2, 2);
    assert_eq!(grown.bounds().unwrap().min, (-5, -2, 0));
    assert_eq!(grown.bounds().unwrap().max, (6, 8, 11));
    assert!(grown.contracted(2).same_members(&core));
}

#[test]
fn test_rotate_definition_region_moves_cells_with_footprint() {
    init_tracing();
    let mut schematic = UniversalSchematic::new("Rotate");
    let gold = BlockState::new("minecraft:gold_block");
    schematic
        .create_definition_region_from_bounds("arm", (0, 0, 0), (3, 0, 0))
        .unwrap();
    schematic.fill_definition_region("arm", &gold).unwrap();

    schematic.rotate_definition_region("arm", Axis::Y, 90).unwrap();

    let arm = schematic.get_definition_region("arm").unwrap().clone();
    assert_eq!(arm.volume(), 4);
    assert_eq!(arm.dimensions(), (1, 1, 4));
    for (x, y, z) in arm.positions() {
        assert_eq!(schematic.get_block(x, y, z), Some(&gold));
    }
    assert_eq!(schematic.block_count(), 4);
}

#[test]
fn test_flip_definition_region_mirrors_cells() {
    let mut schematic = UniversalSchematic::new("Flip");
    schematic.set_block_str(0, 0, 0, "minecraft:stone").unwrap();
    schematic.set_block_str(1, 0, 0, "minecraft:dirt").unwrap();
    schematic.set_block_str(5, 0, 0, "minecraft:glass").unwrap();
    schematic
        .create_definition_region_from_bounds("pair", (0, 0, 0), (1, 0, 0))
        .unwrap();

    schematic.flip_definition_region("pair", Axis::X).unwrap();

    assert_eq!(schematic.get_block(0, 0, 0).map(|b| b.name()), Some("minecraft:dirt"));
    assert_eq!(schematic.get_block(1, 0, 0).map(|b| b.name()), Some("minecraft:stone"));
    assert_eq!(schematic.get_block(5, 0, 0).map(|b| b.name()), Some("minecraft:glass"));
}

#[test]
fn test_transforms_of_region_alone() {
    let region = DefinitionRegion::from_bounds((0, 0, 0), (2, 0, 0));
    let rotated = region.rotated(Axis::Y, 180).unwrap();
    assert!(rotated.same_members(&region));
    assert!(region.rotated(Axis::Y, 30).is_err());

    let mut l_shape = DefinitionRegion::from_bounds((0, 0, 0), (2, 0, 0));
    l_shape.add_point(0, 1, 0);
    let flipped = l_shape.flipped(Axis::X);
    assert!(flipped.contains(2, 1, 0));
    assert!(!flipped.contains(0, 1, 0));
    assert_eq!(flipped.volume(), 4);
}
