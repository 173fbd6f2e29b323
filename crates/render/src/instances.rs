use glam::Mat4;
use renderkit_common::Material;

/// Opaque handle to one drawable instance.
///
/// Handles carry a generation, so a handle to a removed instance never
/// resolves to whatever later reuses its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId {
    index: u32,
    generation: u32,
}

/// One drawable: transform, material and the backend's buffer set.
#[derive(Debug)]
pub struct InstanceRecord<G> {
    pub transform: Mat4,
    pub material: Material,
    pub geometry: G,
}

#[derive(Debug)]
struct Slot<G> {
    generation: u32,
    record: Option<InstanceRecord<G>>,
}

/// Generation-checked arena of instance records.
///
/// Iteration order follows slot order, which callers must treat as
/// unspecified since freed slots are reused.
#[derive(Debug)]
pub struct InstanceTable<G> {
    slots: Vec<Slot<G>>,
    free: Vec<u32>,
    len: usize,
}

impl<G> Default for InstanceTable<G> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }
}

impl<G> InstanceTable<G> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Store a record under a fresh handle.
    pub fn insert(&mut self, record: InstanceRecord<G>) -> InstanceId {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.record = Some(record);
            return InstanceId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            record: Some(record),
        });
        InstanceId {
            index,
            generation: 0,
        }
    }

    pub fn get(&self, id: InstanceId) -> Option<&InstanceRecord<G>> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.record.as_ref())
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut InstanceRecord<G>> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.record.as_mut())
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.get(id).is_some()
    }

    /// Remove a record. Returns it if `id` was live.
    pub fn remove(&mut self, id: InstanceId) -> Option<InstanceRecord<G>> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let record = slot.record.take()?;
        self.len -= 1;
        // A slot whose generation is exhausted is retired for good.
        if let Some(next) = slot.generation.checked_add(1) {
            slot.generation = next;
            self.free.push(id.index);
        }
        Some(record)
    }

    /// Live records with their handles.
    pub fn iter(&self) -> impl Iterator<Item = (InstanceId, &InstanceRecord<G>)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.record.as_ref().map(|record| {
                (
                    InstanceId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    record,
                )
            })
        })
    }

    pub fn ids(&self) -> impl Iterator<Item = InstanceId> + '_ {
        self.iter().map(|(id, _)| id)
    }
}
