use core::array;

/// A fixed number of slots addressed by index.
///
/// Insertion always takes the lowest free slot, so handle numbers are deterministic.
#[derive(Debug)]
pub struct SlotTable<T, const N: usize>([Option<T>; N]);

impl<T, const N: usize> Default for SlotTable<T, N> {
    fn default() -> Self {
        Self(array::from_fn(|_| None))
    }
}

impl<T, const N: usize> SlotTable<T, N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入新元素至空槽位，并返回槽位的索引；没有空槽位时返回`None`
    pub fn insert(&mut self, element: T) -> Option<usize> {
        let index = self.0.iter().position(Option::is_none)?;
        self.0[index] = Some(element);
        Some(index)
    }

    pub fn remove(&mut self, index: usize) -> Option<T> {
        self.0.get_mut(index)?.take()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.0.get(index)?.as_ref()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.0.get_mut(index)?.as_mut()
    }

    /// Occupied slots with their indices, in ascending order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|element| (index, element)))
    }

    pub fn len(&self) -> usize {
        self.0.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }
}
