// Copyright 2025 the Coffer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generational storage of a session's components.

use alloc::vec::Vec;

use crate::component::Component;
use crate::id::ComponentId;

struct Slot<I> {
    generation: u32,
    component: Option<Component<I>>,
}

/// Component records addressed by [`ComponentId`].
///
/// Removing a component frees its slot. The next insert into that slot bumps
/// the generation, so every id issued before stays stale.
pub(crate) struct Arena<I> {
    slots: Vec<Slot<I>>,
    free: Vec<u32>,
    live: usize,
}

impl<I> Arena<I> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    pub(crate) fn insert(&mut self, component: Component<I>) -> ComponentId {
        self.live += 1;
        if let Some(idx) = self.free.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.component = Some(component);
            return ComponentId::new(idx, slot.generation);
        }
        let idx = u32::try_from(self.slots.len()).expect("component arena exhausted");
        self.slots.push(Slot {
            generation: 1,
            component: Some(component),
        });
        ComponentId::new(idx, 1)
    }

    pub(crate) fn remove(&mut self, id: ComponentId) -> Option<Component<I>> {
        let slot = self.slots.get_mut(id.idx())?;
        if slot.generation != id.generation() {
            return None;
        }
        let component = slot.component.take()?;
        self.free.push(id.index());
        self.live -= 1;
        Some(component)
    }

    pub(crate) fn get(&self, id: ComponentId) -> Option<&Component<I>> {
        let slot = self.slots.get(id.idx())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.component.as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: ComponentId) -> Option<&mut Component<I>> {
        let slot = self.slots.get_mut(id.idx())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.component.as_mut()
    }

    pub(crate) fn contains(&self, id: ComponentId) -> bool {
        self.get(id).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.live
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (ComponentId, &Component<I>)> + '_ {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| {
            let component = slot.component.as_ref()?;
            let idx = u32::try_from(idx).ok()?;
            Some((ComponentId::new(idx, slot.generation), component))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentKind;
    use alloc::string::String;

    fn item(key: &str) -> Component<u8> {
        Component::new(ComponentKind::Item, String::from(key))
    }

    #[test]
    fn stale_ids_do_not_alias_reused_slots() {
        let mut arena = Arena::new();
        let a = arena.insert(item("a"));
        assert_eq!(arena.remove(a).map(|c| c.key), Some(String::from("a")));
        let b = arena.insert(item("b"));

        assert_eq!(a.index(), b.index());
        assert!(b.generation() > a.generation());
        assert!(arena.get(a).is_none());
        assert!(arena.remove(a).is_none());
        assert_eq!(arena.get(b).map(Component::key), Some("b"));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn iter_skips_free_slots() {
        let mut arena = Arena::new();
        let a = arena.insert(item("a"));
        let _b = arena.insert(item("b"));
        arena.remove(a);
        let keys: alloc::vec::Vec<_> = arena.iter().map(|(_, c)| c.key()).collect();
        assert_eq!(keys, ["b"]);
        assert!(!arena.contains(a));
    }
}
