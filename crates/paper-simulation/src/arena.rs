//! Particle storage with generational handles
//!
//! The arena owns every particle. Other structures (the grid, the per-step pair
//! set) only hold [`ParticleId`]s. A slot freed by removal is reused with a
//! bumped generation, so a handle to a removed particle never aliases a new one.

use std::collections::VecDeque;

use glam::IVec3;
use paper_physics::Particle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticleId {
    index: u32,
    generation: u32,
}

impl ParticleId {
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// A live particle and the grid cell it is filed under
#[derive(Debug, Clone)]
pub struct Entry {
    pub particle: Particle,
    pub cell: IVec3,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

#[derive(Debug, Clone, Default)]
pub struct ParticleArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    /// Live handles, oldest first
    spawn_order: VecDeque<ParticleId>,
}

impl ParticleArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, particle: Particle, cell: IVec3) -> ParticleId {
        let entry = Some(Entry { particle, cell });
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.generation += 1;
                slot.entry = entry;
                ParticleId::new(index, slot.generation)
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    entry,
                });
                ParticleId::new(self.slots.len() as u32 - 1, 0)
            }
        };
        self.spawn_order.push_back(id);
        id
    }

    pub fn remove(&mut self, id: ParticleId) -> Option<Entry> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let entry = slot.entry.take()?;
        self.free.push(id.index);
        self.spawn_order.retain(|&other| other != id);
        Some(entry)
    }

    pub fn contains(&self, id: ParticleId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: ParticleId) -> Option<&Entry> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    pub fn get_mut(&mut self, id: ParticleId) -> Option<&mut Entry> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_mut())
    }

    /// Mutable access to two distinct live particles at once
    pub fn pair_mut(&mut self, a: ParticleId, b: ParticleId) -> Option<(&mut Entry, &mut Entry)> {
        if a.index == b.index || !self.contains(a) || !self.contains(b) {
            return None;
        }

        let (lo, hi) = (a.index.min(b.index) as usize, a.index.max(b.index) as usize);
        let (head, tail) = self.slots.split_at_mut(hi);
        let low = head[lo].entry.as_mut()?;
        let high = tail[0].entry.as_mut()?;

        if a.index < b.index {
            Some((low, high))
        } else {
            Some((high, low))
        }
    }

    pub fn oldest(&self) -> Option<ParticleId> {
        self.spawn_order.front().copied()
    }

    /// Live handles in slot order
    pub fn ids(&self) -> impl Iterator<Item = ParticleId> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.entry
                .as_ref()
                .map(|_| ParticleId::new(index as u32, slot.generation))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParticleId, &Entry)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.entry
                .as_ref()
                .map(|entry| (ParticleId::new(index as u32, slot.generation), entry))
        })
    }

    pub fn len(&self) -> usize {
        self.spawn_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spawn_order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use paper_physics::ParticleDesc;

    fn particle(x: f32) -> Particle {
        ParticleDesc::new(Vec3::new(x, 0.0, 0.0), 1.0).build().unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let mut arena = ParticleArena::new();
        let a = arena.insert(particle(1.0), IVec3::ZERO);
        let b = arena.insert(particle(2.0), IVec3::X);

        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(a).unwrap().particle.position.x, 1.0);
        assert_eq!(arena.get(b).unwrap().cell, IVec3::X);
        assert_eq!(arena.ids().collect::<Vec<_>>(), vec![a, b]);
    }

    #[test]
    fn test_removed_slot_is_reused_with_new_generation() {
        let mut arena = ParticleArena::new();
        let a = arena.insert(particle(1.0), IVec3::ZERO);
        assert!(arena.remove(a).is_some());
        assert!(arena.remove(a).is_none());

        let b = arena.insert(particle(2.0), IVec3::ZERO);

        assert_eq!(b.index(), a.index());
        assert_ne!(b.generation(), a.generation());
        assert!(arena.get(a).is_none());
        assert_eq!(arena.get(b).unwrap().particle.position.x, 2.0);
    }

    #[test]
    fn test_oldest_follows_spawn_order() {
        let mut arena = ParticleArena::new();
        let a = arena.insert(particle(1.0), IVec3::ZERO);
        let b = arena.insert(particle(2.0), IVec3::ZERO);
        let c = arena.insert(particle(3.0), IVec3::ZERO);

        assert_eq!(arena.oldest(), Some(a));
        arena.remove(a);
        assert_eq!(arena.oldest(), Some(b));
        arena.remove(c);
        // A freed slot is reused, but the new particle is the youngest
        let d = arena.insert(particle(4.0), IVec3::ZERO);
        assert_eq!(d.index(), c.index());
        assert_eq!(arena.oldest(), Some(b));
        arena.remove(b);
        assert_eq!(arena.oldest(), Some(d));
    }

    #[test]
    fn test_pair_mut_preserves_argument_order() {
        let mut arena = ParticleArena::new();
        let a = arena.insert(particle(1.0), IVec3::ZERO);
        let b = arena.insert(particle(2.0), IVec3::ZERO);

        let (second, first) = arena.pair_mut(b, a).unwrap();
        assert_eq!(second.particle.position.x, 2.0);
        assert_eq!(first.particle.position.x, 1.0);

        assert!(arena.pair_mut(a, a).is_none());
        arena.remove(b);
        assert!(arena.pair_mut(a, b).is_none());
    }
}
