//! Layers of the watch face and the set of layers waiting for a redraw.

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LayerId {
    Background = 0,
    Hour = 1,
    Minute = 2,
    Seconds = 3,
}

impl LayerId {
    /// Bottom to top.
    pub const ALL: [LayerId; 4] = [
        LayerId::Background,
        LayerId::Hour,
        LayerId::Minute,
        LayerId::Seconds,
    ];

    #[inline]
    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Outbound "this layer needs a redraw" request from a face to its host.
pub trait Invalidate {
    fn mark_dirty(&mut self, layer: LayerId);
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DirtyLayers(u8);

impl DirtyLayers {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(0b1111)
    }

    pub fn mark(&mut self, layer: LayerId) {
        self.0 |= layer.bit();
    }

    pub const fn contains(&self, layer: LayerId) -> bool {
        self.0 & layer.bit() != 0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Returns the current set and leaves `self` empty.
    pub fn take(&mut self) -> Self {
        core::mem::take(self)
    }
}

impl Invalidate for DirtyLayers {
    fn mark_dirty(&mut self, layer: LayerId) {
        self.mark(layer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_and_take() {
        let mut dirty = DirtyLayers::empty();
        assert!(dirty.is_empty());

        dirty.mark_dirty(LayerId::Seconds);
        dirty.mark(LayerId::Hour);
        dirty.mark(LayerId::Hour);
        assert!(dirty.contains(LayerId::Hour));
        assert!(!dirty.contains(LayerId::Minute));

        let taken = dirty.take();
        assert!(dirty.is_empty());
        let marked: Vec<_> = LayerId::ALL.into_iter().filter(|l| taken.contains(*l)).collect();
        assert_eq!(marked, vec![LayerId::Hour, LayerId::Seconds]);
    }

    #[test]
    fn all_covers_every_layer() {
        let all = DirtyLayers::all();
        assert!(LayerId::ALL.into_iter().all(|l| all.contains(l)));
    }
}
