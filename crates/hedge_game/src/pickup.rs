use hedge_core::events::{EventAction, EventCategory, EventData, EventDispatcher};

use crate::physics::{Contact, PhysicsWorld};
use crate::scene::Scene;

/// Reward carried by a collectable object.
#[derive(Debug, Clone, PartialEq)]
pub struct PickupBehaviour {
    pub description: String,
    pub value: i32,
    pub sound_cue: Option<String>,
}

impl PickupBehaviour {
    pub fn new(description: &str, value: i32, sound_cue: Option<&str>) -> Self {
        Self {
            description: description.to_string(),
            value,
            sound_cue: sound_cue.map(str::to_string),
        }
    }

    /// Events raised when the player collects this pickup.
    pub fn collected_events(&self) -> Vec<EventData> {
        let mut events = Vec::with_capacity(2);
        if let Some(cue) = &self.sound_cue {
            events.push(
                EventData::new(EventCategory::Sound, EventAction::OnPlay).with_param(cue.as_str()),
            );
        }
        events.push(
            EventData::new(EventCategory::Pickup, EventAction::OnPickup)
                .with_param(self.description.as_str())
                .with_param(self.value),
        );
        events
    }
}

/// Consumes every pickup the player touched: raises its events, then removes
/// the object from the scene and its body from the world. Returns how many
/// were collected. An object that is already gone is skipped, so a pickup
/// can never fire twice.
pub fn collect_pickups(
    contacts: &[Contact],
    scene: &mut Scene,
    world: &mut PhysicsWorld,
    events: &mut EventDispatcher,
) -> usize {
    let mut collected = 0;
    for contact in contacts {
        let has_pickup = scene
            .get(&contact.owner)
            .is_some_and(|object| object.pickup.is_some());
        if !has_pickup {
            continue;
        }
        let Some(object) = scene.remove(&contact.owner) else {
            continue;
        };
        if let Some(body) = object.body {
            world.remove_body(body);
        }
        if let Some(pickup) = &object.pickup {
            log::info!(
                "Collected '{}' ({}) worth {}",
                object.id,
                pickup.description,
                pickup.value
            );
            for event in pickup.collected_events() {
                events.raise(event);
            }
        }
        collected += 1;
    }
    collected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{Aabb3, Collider, MaterialProperties, Shape};
    use crate::scene::{GameObject, ObjectType};
    use glam::{Quat, Vec3};
    use hedge_core::transform::Transform3D;

    fn trigger_scene() -> (Scene, PhysicsWorld) {
        let mut scene = Scene::new("level 1");
        let mut world = PhysicsWorld::new();
        let position = Vec3::new(20.0, 2.0, 15.0);
        let mut collider = Collider::new_trigger();
        collider.add_primitive(
            Shape::Box {
                center: position,
                rotation: Quat::IDENTITY,
                size: Vec3::splat(1.01),
            },
            MaterialProperties::new(0.0, 0.0, 0.0),
        );
        let body = world.add_body(
            "announcement_1",
            ObjectType::Consumable,
            collider.enable(false, 1).expect("enabled"),
        );
        let mut object = GameObject::new(
            "announcement_1",
            ObjectType::Consumable,
            Transform3D::from_translation(position),
        );
        object.body = Some(body);
        object.pickup = Some(PickupBehaviour::new("audio 1", 15, Some("announcement")));
        scene.add(object).expect("add");
        (scene, world)
    }

    #[test]
    fn collected_events_play_cue_then_report_pickup() {
        let events = PickupBehaviour::new("audio 2", 10, Some("testaudio")).collected_events();
        assert_eq!(events.len(), 2);
        assert!(events[0].is(EventCategory::Sound, EventAction::OnPlay));
        assert_eq!(events[0].text(0), Some("testaudio"));
        assert!(events[1].is(EventCategory::Pickup, EventAction::OnPickup));
        assert_eq!(events[1].text(0), Some("audio 2"));
        assert_eq!(events[1].int(1), Some(10));

        let silent = PickupBehaviour::new("orb", 5, None).collected_events();
        assert_eq!(silent.len(), 1);
    }

    #[test]
    fn touching_a_pickup_consumes_it_once() {
        let (mut scene, mut world) = trigger_scene();
        let mut events = EventDispatcher::new();
        let player = Aabb3::from_center_half(Vec3::new(20.0, 2.8, 15.0), Vec3::new(1.0, 2.8, 1.0));

        let contacts = world.contacts(player);
        assert_eq!(contacts.len(), 1);
        assert_eq!(collect_pickups(&contacts, &mut scene, &mut world, &mut events), 1);
        assert_eq!(events.pending(), 2);
        assert!(scene.get("announcement_1").is_none());
        assert_eq!(world.len(), 0);

        // Replaying the same contact list finds nothing left to collect.
        assert_eq!(collect_pickups(&contacts, &mut scene, &mut world, &mut events), 0);
        assert_eq!(events.pending(), 2);
    }
}
