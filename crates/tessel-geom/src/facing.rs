use crate::Vec3;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// The two in-plane axes `(u, v)` of a plane perpendicular to `self`.
    #[inline]
    pub fn plane_axes(self) -> (Axis, Axis) {
        match self {
            Axis::X => (Axis::Y, Axis::Z),
            Axis::Y => (Axis::X, Axis::Z),
            Axis::Z => (Axis::X, Axis::Y),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Facing {
    PosY = 0,
    NegY = 1,
    PosX = 2,
    NegX = 3,
    PosZ = 4,
    NegZ = 5,
}

impl Facing {
    pub const ALL: [Facing; 6] = [
        Facing::PosY,
        Facing::NegY,
        Facing::PosX,
        Facing::NegX,
        Facing::PosZ,
        Facing::NegZ,
    ];

    /// Returns the `[0..6)` index of this facing.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Converts an index `[0..6)` back into a `Facing`.
    /// Falls back to `PosY` for out-of-range indices.
    #[inline]
    pub fn from_index(i: usize) -> Facing {
        match i {
            0 => Facing::PosY,
            1 => Facing::NegY,
            2 => Facing::PosX,
            3 => Facing::NegX,
            4 => Facing::PosZ,
            5 => Facing::NegZ,
            _ => Facing::PosY,
        }
    }

    #[inline]
    pub fn axis(self) -> Axis {
        match self {
            Facing::PosX | Facing::NegX => Axis::X,
            Facing::PosY | Facing::NegY => Axis::Y,
            Facing::PosZ | Facing::NegZ => Axis::Z,
        }
    }

    #[inline]
    pub fn is_positive(self) -> bool {
        matches!(self, Facing::PosX | Facing::PosY | Facing::PosZ)
    }

    #[inline]
    pub fn opposite(self) -> Facing {
        match self {
            Facing::PosY => Facing::NegY,
            Facing::NegY => Facing::PosY,
            Facing::PosX => Facing::NegX,
            Facing::NegX => Facing::PosX,
            Facing::PosZ => Facing::NegZ,
            Facing::NegZ => Facing::PosZ,
        }
    }

    /// Returns the unit-normal vector for this facing.
    #[inline]
    pub fn normal(self) -> Vec3 {
        let (dx, dy, dz) = self.delta();
        Vec3::new(dx as f32, dy as f32, dz as f32)
    }

    /// Returns the integer grid delta `(dx,dy,dz)` when stepping out of this face.
    #[inline]
    pub fn delta(self) -> (i32, i32, i32) {
        match self {
            Facing::PosY => (0, 1, 0),
            Facing::NegY => (0, -1, 0),
            Facing::PosX => (1, 0, 0),
            Facing::NegX => (-1, 0, 0),
            Facing::PosZ => (0, 0, 1),
            Facing::NegZ => (0, 0, -1),
        }
    }
}
