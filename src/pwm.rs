//! Pulse-distance bit serializer with configurable mark/space lengths

/// Order in which the bits of a word are put on the wire.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum BitOrder {
    MsbFirst,
    LsbFirst,
}

/// Mark and space lengths used for each bit value, in the protocol's tick unit.
/// Lengths are bounded by `i32::MAX` so every pulse keeps its sign.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Timing {
    one_mark: i32,
    one_space: i32,
    zero_mark: i32,
    zero_space: i32,
}

const fn length(value: u32) -> Option<i32> {
    if value > i32::MAX as u32 {
        None
    } else {
        Some(value as i32)
    }
}

impl Timing {
    /// Returns `None` when a length does not fit a signed pulse.
    pub const fn checked(
        one_mark: u32,
        one_space: u32,
        zero_mark: u32,
        zero_space: u32,
    ) -> Option<Self> {
        match (
            length(one_mark),
            length(one_space),
            length(zero_mark),
            length(zero_space),
        ) {
            (Some(one_mark), Some(one_space), Some(zero_mark), Some(zero_space)) => Some(Self {
                one_mark,
                one_space,
                zero_mark,
                zero_space,
            }),
            _ => None,
        }
    }

    /// Panics (at compile time in a `const`) when a length exceeds `i32::MAX`.
    pub const fn new(one_mark: u32, one_space: u32, zero_mark: u32, zero_space: u32) -> Self {
        match Self::checked(one_mark, one_space, zero_mark, zero_space) {
            Some(timing) => timing,
            None => panic!("pulse length exceeds i32::MAX"),
        }
    }

    fn bit(&self, set: bool) -> [i32; 2] {
        if set {
            [self.one_mark, -self.one_space]
        } else {
            [self.zero_mark, -self.zero_space]
        }
    }

    /// Serializes the low `nbits` bits of `data` as mark (positive) / space
    /// (negative) pairs. The returned iterator yields exactly `2 * nbits`
    /// values and can be cloned to replay the train.
    pub fn pulses(
        &self,
        data: u64,
        nbits: u32,
        order: BitOrder,
    ) -> impl Iterator<Item = i32> + Clone {
        let timing = *self;
        (0..nbits)
            .map(move |i| match order {
                BitOrder::MsbFirst => nbits - 1 - i,
                BitOrder::LsbFirst => i,
            })
            .flat_map(move |pos| timing.bit(data.checked_shr(pos).unwrap_or(0) & 1 == 1))
    }
}
