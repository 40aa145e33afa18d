//! Tunables for the BDD manager and the loop detector.

/// Sizing of a [`Bdd`][crate::bdd::Bdd] manager.
///
/// ```
/// use bdd_reach::config::BddConfig;
///
/// let config = BddConfig::default().with_cache_bits(18);
/// assert_eq!(config.cache_bits, 18);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BddConfig {
    /// Initial node storage capacity, as a power of two. Storage grows on demand.
    pub initial_capacity_bits: usize,
    /// Size of each computed table, as a power of two.
    pub cache_bits: usize,
}

impl Default for BddConfig {
    fn default() -> Self {
        Self {
            initial_capacity_bits: 16,
            cache_bits: 16,
        }
    }
}

impl BddConfig {
    pub fn with_initial_capacity_bits(mut self, bits: usize) -> Self {
        self.initial_capacity_bits = bits;
        self
    }

    pub fn with_cache_bits(mut self, bits: usize) -> Self {
        self.cache_bits = bits;
        self
    }
}

/// Bound for the first (candidate-finding) phase of loop detection.
///
/// Without TTL modeling, a packet that is still in flight after more edge
/// traversals than any acyclic path could take is assumed to circulate forever.
/// The default covers the maximum TTL of 255 hops with five edges per hop
/// (`PreInInterface -> PostInVrf -> PreOutVrf -> PreOutEdge -> PreOutEdgePostNat`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopDetectionConfig {
    pub max_hops: usize,
    pub steps_per_hop: usize,
}

impl Default for LoopDetectionConfig {
    fn default() -> Self {
        Self {
            max_hops: 256,
            steps_per_hop: 5,
        }
    }
}

impl LoopDetectionConfig {
    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    pub fn with_steps_per_hop(mut self, steps_per_hop: usize) -> Self {
        self.steps_per_hop = steps_per_hop;
        self
    }

    /// Number of forward propagation rounds in the candidate phase.
    pub fn num_rounds(&self) -> usize {
        self.max_hops.saturating_mul(self.steps_per_hop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rounds() {
        assert_eq!(LoopDetectionConfig::default().num_rounds(), 1280);
    }

    #[test]
    fn test_builders() {
        let config = LoopDetectionConfig::default()
            .with_max_hops(4)
            .with_steps_per_hop(3);
        assert_eq!(config.num_rounds(), 12);

        let config = BddConfig::default().with_initial_capacity_bits(10);
        assert_eq!(config.initial_capacity_bits, 10);
        assert_eq!(config.cache_bits, 16);
    }
}
