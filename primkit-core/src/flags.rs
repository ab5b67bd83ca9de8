/// Feature flags read by dispatchers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimFlag {
    Light,
    ThreeD,
    ZBuffer,
    Normal,
}

impl PrimFlag {
    pub const ALL: [PrimFlag; 4] = [
        PrimFlag::Light,
        PrimFlag::ThreeD,
        PrimFlag::ZBuffer,
        PrimFlag::Normal,
    ];

    fn bit(self) -> u8 {
        match self {
            PrimFlag::Light => 1 << 0,
            PrimFlag::ThreeD => 1 << 1,
            PrimFlag::ZBuffer => 1 << 2,
            PrimFlag::Normal => 1 << 3,
        }
    }
}

/// Set of enabled `PrimFlag`s, all off by default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PrimFlags {
    bits: u8,
}

impl PrimFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, flag: PrimFlag) -> bool {
        self.bits & flag.bit() != 0
    }

    pub fn set(&mut self, flag: PrimFlag, value: bool) {
        if value {
            self.bits |= flag.bit();
        } else {
            self.bits &= !flag.bit();
        }
    }

    pub fn with(mut self, flag: PrimFlag, value: bool) -> Self {
        self.set(flag, value);
        self
    }

    /// Whether normals should be forwarded to the backend.
    pub fn wants_normals(&self) -> bool {
        self.get(PrimFlag::Normal) || self.get(PrimFlag::Light)
    }

    pub fn enabled(&self) -> impl Iterator<Item = PrimFlag> + '_ {
        PrimFlag::ALL.into_iter().filter(|flag| self.get(*flag))
    }
}
