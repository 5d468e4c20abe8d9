//! Merge resolution
//!
//! Turns a step's collision-start pairs into merges. A pair merges when both
//! bodies are dropped fruits of the same, non-terminal tier. A body consumed by
//! an earlier pair of the same batch is never looked at again, so batch order
//! only decides which of several candidate partners wins.

use std::collections::HashSet;

use glam::Vec2;

use super::physics::{BodyHandle, BodyKind, ContactPair, DiscBody, PhysicsWorld};
use super::state::DiscSet;
use crate::catalog::FruitCatalog;
use crate::tuning::Material;

/// One applied merge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    pub from: usize,
    pub into: usize,
    /// Midpoint of the two consumed fruits (where the new one appears)
    pub pos: Vec2,
    /// Body of the new fruit
    pub body: BodyHandle,
    /// Score value of the new tier
    pub points: u64,
}

/// Apply every valid merge in `pairs`, in delivery order
pub fn resolve_merges<W: PhysicsWorld>(
    world: &mut W,
    catalog: &FruitCatalog,
    material: Material,
    discs: &mut DiscSet,
    pairs: &[ContactPair],
) -> Vec<Merge> {
    let mut consumed: HashSet<BodyHandle> = HashSet::new();
    let mut merges = Vec::new();

    for pair in pairs {
        if pair.a == pair.b || consumed.contains(&pair.a) || consumed.contains(&pair.b) {
            continue;
        }

        // Walls and the aimed fruit are not in the set
        let (Some(tier_a), Some(tier_b)) = (
            discs.by_body(pair.a).map(|d| d.tier),
            discs.by_body(pair.b).map(|d| d.tier),
        ) else {
            continue;
        };
        if tier_a != tier_b {
            continue;
        }
        let Some(into) = catalog.merge_target(tier_a) else {
            continue;
        };
        let (Some(pos_a), Some(pos_b)) = (world.position(pair.a), world.position(pair.b)) else {
            continue;
        };

        let pos = (pos_a + pos_b) / 2.0;
        world.remove(pair.a);
        world.remove(pair.b);
        discs.remove_body(pair.a);
        discs.remove_body(pair.b);
        consumed.insert(pair.a);
        consumed.insert(pair.b);

        let body = world.add_disc(&DiscBody {
            pos,
            radius: catalog.radius(into),
            kind: BodyKind::Dynamic,
            material,
        });
        discs.insert(into, body);

        let points = catalog.get(into).map(|t| t.score).unwrap_or(0);
        log::debug!("Merged two tier {} into tier {} at {:?} (+{})", tier_a, into, pos, points);
        merges.push(Merge {
            from: tier_a,
            into,
            pos,
            body,
            points,
        });
    }

    merges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::fake::FakeWorld;

    fn drop_disc(world: &mut FakeWorld, discs: &mut DiscSet, tier: usize, pos: Vec2) -> BodyHandle {
        let body = world.add_disc(&DiscBody {
            pos,
            radius: FruitCatalog::classic().radius(tier),
            kind: BodyKind::Dynamic,
            material: Material::default(),
        });
        discs.insert(tier, body);
        body
    }

    #[test]
    fn test_every_tier_merges_into_next() {
        let catalog = FruitCatalog::classic();
        for tier in 0..catalog.terminal() {
            let mut world = FakeWorld::new();
            let mut discs = DiscSet::new();
            let a = drop_disc(&mut world, &mut discs, tier, Vec2::new(100.0, 500.0));
            let b = drop_disc(&mut world, &mut discs, tier, Vec2::new(140.0, 520.0));

            let merges = resolve_merges(
                &mut world,
                &catalog,
                Material::default(),
                &mut discs,
                &[ContactPair::new(a, b)],
            );

            assert_eq!(merges.len(), 1);
            let merge = merges[0];
            assert_eq!(merge.into, tier + 1);
            assert_eq!(merge.pos, Vec2::new(120.0, 510.0));
            assert_eq!(merge.points, catalog.get(tier + 1).unwrap().score);
            assert_eq!(discs.len(), 1);
            assert_eq!(discs.count_tier(tier + 1), 1);
            assert_eq!(world.discs().count(), 1);
            assert_eq!(world.position(merge.body), Some(merge.pos));
            assert_eq!(world.bodies[&merge.body].radius, catalog.radius(tier + 1));
        }
    }

    #[test]
    fn test_terminal_tier_does_not_merge() {
        let catalog = FruitCatalog::classic();
        let mut world = FakeWorld::new();
        let mut discs = DiscSet::new();
        let top = catalog.terminal();
        let a = drop_disc(&mut world, &mut discs, top, Vec2::new(150.0, 600.0));
        let b = drop_disc(&mut world, &mut discs, top, Vec2::new(390.0, 600.0));

        let merges = resolve_merges(&mut world, &catalog, Material::default(), &mut discs, &[ContactPair::new(a, b)]);
        assert!(merges.is_empty());
        assert_eq!(discs.len(), 2);
        assert_eq!(world.discs().count(), 2);
    }

    #[test]
    fn test_different_tiers_do_not_merge() {
        let catalog = FruitCatalog::classic();
        let mut world = FakeWorld::new();
        let mut discs = DiscSet::new();
        let a = drop_disc(&mut world, &mut discs, 0, Vec2::new(100.0, 600.0));
        let b = drop_disc(&mut world, &mut discs, 1, Vec2::new(130.0, 600.0));

        let merges = resolve_merges(&mut world, &catalog, Material::default(), &mut discs, &[ContactPair::new(a, b)]);
        assert!(merges.is_empty());
        assert_eq!(discs.len(), 2);
    }

    #[test]
    fn test_walls_and_ghost_are_ignored() {
        let catalog = FruitCatalog::classic();
        let mut world = FakeWorld::new();
        let mut discs = DiscSet::new();
        let wall = world.add_wall(Vec2::new(300.0, 800.0), Vec2::new(300.0, 20.0));
        let ghost = world.add_disc(&DiscBody {
            pos: Vec2::new(300.0, 80.0),
            radius: 15.0,
            kind: BodyKind::Sensor,
            material: Material::default(),
        });
        let fruit = drop_disc(&mut world, &mut discs, 0, Vec2::new(300.0, 100.0));

        let merges = resolve_merges(
            &mut world,
            &catalog,
            Material::default(),
            &mut discs,
            &[ContactPair::new(fruit, wall), ContactPair::new(ghost, fruit)],
        );
        assert!(merges.is_empty());
        assert_eq!(discs.len(), 1);
        assert!(world.position(ghost).is_some());
    }

    #[test]
    fn test_consumed_body_is_not_reused_in_batch() {
        let catalog = FruitCatalog::classic();
        let mut world = FakeWorld::new();
        let mut discs = DiscSet::new();
        let a = drop_disc(&mut world, &mut discs, 2, Vec2::new(100.0, 600.0));
        let b = drop_disc(&mut world, &mut discs, 2, Vec2::new(160.0, 600.0));
        let c = drop_disc(&mut world, &mut discs, 2, Vec2::new(220.0, 600.0));

        // b touches both a and c in the same step
        let merges = resolve_merges(
            &mut world,
            &catalog,
            Material::default(),
            &mut discs,
            &[ContactPair::new(a, b), ContactPair::new(b, c), ContactPair::new(a, b)],
        );

        assert_eq!(merges.len(), 1);
        assert_eq!(discs.count_tier(3), 1);
        assert_eq!(discs.count_tier(2), 1);
        assert_eq!(discs.by_body(c).map(|d| d.tier), Some(2));
        assert_eq!(world.discs().count(), 2);
    }

    #[test]
    fn test_independent_pairs_in_one_batch() {
        let catalog = FruitCatalog::classic();
        let mut world = FakeWorld::new();
        let mut discs = DiscSet::new();
        let a = drop_disc(&mut world, &mut discs, 0, Vec2::new(100.0, 600.0));
        let b = drop_disc(&mut world, &mut discs, 0, Vec2::new(120.0, 600.0));
        let c = drop_disc(&mut world, &mut discs, 4, Vec2::new(400.0, 600.0));
        let d = drop_disc(&mut world, &mut discs, 4, Vec2::new(480.0, 600.0));

        let merges = resolve_merges(
            &mut world,
            &catalog,
            Material::default(),
            &mut discs,
            &[ContactPair::new(c, d), ContactPair::new(a, b)],
        );

        assert_eq!(merges.len(), 2);
        assert_eq!(merges[0].into, 5);
        assert_eq!(merges[1].into, 1);
        let total: u64 = merges.iter().map(|m| m.points).sum();
        assert_eq!(total, 21 + 3);
    }
}
