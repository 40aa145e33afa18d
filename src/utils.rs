//! Hashing helpers for the BDD computed table.

/// [Szudzik pairing function][szudzik-pairing].
///
/// ```text
/// (a, b) -> if (a<b) then (b^2 + a) else (a^2 + a + b)
/// ```
///
/// Wrapping arithmetic: the result only feeds cache slot selection,
/// and the full key is compared on lookup.
///
/// [szudzik-pairing]: http://szudzik.com/ElegantPairing.pdf
pub fn pairing2(a: u64, b: u64) -> u64 {
    if a < b {
        b.wrapping_mul(b).wrapping_add(a)
    } else {
        a.wrapping_mul(a).wrapping_add(a).wrapping_add(b)
    }
}

/// Pairing function for three `u64` values.
pub fn pairing3(a: u64, b: u64, c: u64) -> u64 {
    pairing2(pairing2(a, b), c)
}

/// Hash used to pick a slot in a direct-mapped cache.
pub trait SlotHash {
    fn slot_hash(&self) -> u64;
}

impl SlotHash for (u64, u64) {
    fn slot_hash(&self) -> u64 {
        pairing2(self.0, self.1)
    }
}

impl SlotHash for (u64, u64, u64) {
    fn slot_hash(&self) -> u64 {
        pairing3(self.0, self.1, self.2)
    }
}
