use bevy_ecs::prelude::{Entity, Resource};
use rand::Rng;

use crate::routing::Address;

/// The scene of the incident: the victims still lying there and how many the
/// first call reported.
#[derive(Debug, Clone, PartialEq, Resource)]
pub struct IncidentPlace {
    pub address: Address,
    victims: Vec<Entity>,
    /// Victims at the scene when the incident began; pickups do not lower it.
    true_victim_count: usize,
    pub reported_victims_count: usize,
}

impl IncidentPlace {
    pub fn new(address: Address, victims: Vec<Entity>, reported_victims_count: usize) -> Self {
        Self {
            address,
            true_victim_count: victims.len(),
            victims,
            reported_victims_count,
        }
    }

    /// Draws the initially reported count as a random share of the true count
    /// (at least one when anyone is there).
    pub fn with_reported_fraction<R: Rng + ?Sized>(
        address: Address,
        victims: Vec<Entity>,
        fraction_min: f64,
        fraction_max: f64,
        rng: &mut R,
    ) -> Self {
        let reported = reported_victims_count(victims.len(), fraction_min, fraction_max, rng);
        Self::new(address, victims, reported)
    }

    pub fn victims(&self) -> &[Entity] {
        &self.victims
    }

    pub fn true_victim_count(&self) -> usize {
        self.true_victim_count
    }

    pub fn needs_reconnaissance(&self) -> bool {
        self.true_victim_count != self.reported_victims_count
    }

    /// Victims found beyond the reported count.
    pub fn unreported_victims(&self) -> usize {
        self.true_victim_count.saturating_sub(self.reported_victims_count)
    }

    pub fn complete_reconnaissance(&mut self) -> usize {
        let newly_found = self.unreported_victims();
        self.reported_victims_count = self.true_victim_count;
        newly_found
    }

    /// Removes a victim leaving the scene; `None` if it is not here.
    pub fn try_take_victim(&mut self, victim: Entity) -> Option<Entity> {
        let index = self.victims.iter().position(|v| *v == victim)?;
        Some(self.victims.remove(index))
    }
}

pub fn reported_victims_count<R: Rng + ?Sized>(
    true_count: usize,
    fraction_min: f64,
    fraction_max: f64,
    rng: &mut R,
) -> usize {
    if true_count == 0 {
        return 0;
    }
    let low = (fraction_min * true_count as f64).floor() as usize;
    let high = ((fraction_max * true_count as f64).floor() as usize).max(low);
    rng.gen_range(low..=high).clamp(1, true_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::world::World;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn victims(world: &mut World, n: usize) -> Vec<Entity> {
        (0..n).map(|_| world.spawn_empty().id()).collect()
    }

    #[test]
    fn reported_count_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let reported = reported_victims_count(20, 0.3, 0.75, &mut rng);
            assert!((6..=15).contains(&reported), "{reported}");
        }
        assert_eq!(reported_victims_count(1, 0.3, 0.75, &mut rng), 1);
        assert_eq!(reported_victims_count(0, 0.3, 0.75, &mut rng), 0);
    }

    #[test]
    fn reconnaissance_reveals_unreported_victims() {
        let mut world = World::new();
        let mut incident = IncidentPlace::new(Address::new("incident"), victims(&mut world, 4), 2);
        assert!(incident.needs_reconnaissance());
        assert_eq!(incident.complete_reconnaissance(), 2);
        assert!(!incident.needs_reconnaissance());
        assert_eq!(incident.reported_victims_count, 4);
    }

    #[test]
    fn taking_a_victim_keeps_the_count() {
        let mut world = World::new();
        let on_scene = victims(&mut world, 2);
        let mut incident = IncidentPlace::new(Address::new("incident"), on_scene.clone(), 2);
        assert_eq!(incident.try_take_victim(on_scene[0]), Some(on_scene[0]));
        assert_eq!(incident.try_take_victim(on_scene[0]), None);
        assert_eq!(incident.victims(), &on_scene[1..]);
        assert!(!incident.needs_reconnaissance());
    }
}
