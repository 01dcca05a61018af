//! Integration tests for the replay pipeline
//!
//! Tests full record → store → load → play cycles, writer backpressure,
//! and playback of recordings whose on-disk order or entity set varies.

mod pipeline_tests;

pub(crate) mod sim {
    use glam::Vec2;

    use crate::replay::{Rgba, ShapeDescriptor, ShapeKind};
    use crate::test_utils::TestEntity;

    /// Small deterministic scene: a still player, a moving enemy and a decoration
    pub fn scene() -> Vec<TestEntity> {
        vec![
            TestEntity::new("Player", Vec2::new(400.0, 300.0)),
            TestEntity::new("Enemy", Vec2::ZERO).with_velocity(Vec2::new(10.0, 0.0)),
            TestEntity::new("Decoration", Vec2::new(50.0, 60.0)).with_shape(ShapeDescriptor::new(
                ShapeKind::Circle,
                Vec2::splat(5.0),
                Rgba::new(0.5, 0.5, 1.0, 0.8),
            )),
        ]
    }

    /// Move every entity along its velocity
    pub fn step(entities: &mut [TestEntity], dt: f32) {
        for entity in entities {
            if let (Some(position), Some(velocity)) = (entity.position.as_mut(), entity.velocity) {
                *position += velocity * dt;
            }
        }
    }
}
