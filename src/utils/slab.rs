use std::mem::MaybeUninit;

/// A growable slot array with O(1) insert/remove and stable indices.
///
/// Used by the [engine](crate::engine) to hand out request ids that double
/// as indices into the pending-completion table.
pub(crate) struct Slab<T> {
    items: Vec<MaybeUninit<T>>,
    occupied: Vec<bool>,
    free: Vec<usize>,
}

impl<T> Slab<T> {
    pub(crate) fn new(size: usize) -> Self {
        let items = (0..size).map(|_| MaybeUninit::<T>::uninit()).collect();
        let occupied = vec![false; size];
        let free = (0..size).collect();

        Self {
            items,
            occupied,
            free,
        }
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if self.occupied.get(index).copied().unwrap_or(false) {
            Some(unsafe { self.items[index].assume_init_mut() })
        } else {
            None
        }
    }

    pub(crate) fn remove(&mut self, index: usize) -> T {
        assert!(self.occupied[index], "double-remove of slab index {index}");

        let item = unsafe { self.items[index].assume_init_read() };

        self.items[index] = MaybeUninit::uninit();
        self.occupied[index] = false;
        self.free.push(index);

        item
    }

    pub(crate) fn insert(&mut self, item: T) -> usize {
        let index = if let Some(i) = self.free.pop() {
            i
        } else {
            let len = self.items.len();
            let new_len = if len == 0 { 1 } else { 2 * len };

            self.items
                .extend((len..new_len).map(|_| MaybeUninit::<T>::uninit()));
            self.occupied.extend((len..new_len).map(|_| false));
            self.free.extend((len + 1)..new_len);

            len
        };

        self.items[index] = MaybeUninit::new(item);
        self.occupied[index] = true;

        index
    }
}

impl<T> Drop for Slab<T> {
    fn drop(&mut self) {
        for (slot, &occupied) in self.items.iter_mut().zip(self.occupied.iter()) {
            if occupied {
                unsafe {
                    slot.assume_init_drop();
                }
            }
        }
    }
}
