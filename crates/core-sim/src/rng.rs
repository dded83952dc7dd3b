const LCG_MULTIPLIER: u64 = 1_103_515_245;
const LCG_INCREMENT: u64 = 12_345;
const STATE_MASK: u64 = 0x7fff_ffff;
const STATE_SPAN: f64 = 2_147_483_648.0;
const MIN_BOX_MULLER_UNIFORM: f64 = 1e-9;
const TWO_PI: f64 = 6.28318530718;

pub const DEFAULT_SEED: u64 = 123_456_789;

/// 31-bit linear congruential source owned by a single session.
///
/// Two generators built from the same seed yield bit-identical `uniform` and
/// `normal` sequences. Nothing here is process-global.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn reseed(&mut self, seed: u64) {
        self.state = seed;
    }

    pub fn state(&self) -> u64 {
        self.state
    }

    pub fn next_state(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(LCG_MULTIPLIER)
            .wrapping_add(LCG_INCREMENT)
            & STATE_MASK;
        self.state
    }

    pub fn uniform(&mut self) -> f64 {
        self.next_state() as f64 / STATE_SPAN
    }

    /// Standard normal variate via the cosine branch of Box-Muller. The paired
    /// sine value is discarded, so every call consumes exactly two uniforms.
    pub fn normal(&mut self) -> f64 {
        let u = self.uniform().max(MIN_BOX_MULLER_UNIFORM);
        let v = self.uniform();
        (-2.0 * u.ln()).sqrt() * (TWO_PI * v).cos()
    }
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

#[cfg(test)]
mod tests {
    use super::{DeterministicRng, DEFAULT_SEED};

    #[test]
    fn first_draw_matches_reference_lcg_step() {
        let mut rng = DeterministicRng::new(123_456_789);

        let expected = (123_456_789_u64 * 1_103_515_245 + 12_345) & 0x7fff_ffff;
        assert_eq!(rng.next_state(), expected);
        assert_eq!(expected, 231_794_730);
    }

    #[test]
    fn state_sequence_matches_recorded_reference() {
        let mut rng = DeterministicRng::new(123_456_789);

        let states: Vec<u64> = (0..6).map(|_| rng.next_state()).collect();

        assert_eq!(
            states,
            vec![
                231_794_730,
                1_126_946_331,
                1_757_975_480,
                850_994_577,
                1_634_557_174,
                707_246_327,
            ]
        );
    }

    #[test]
    fn uniform_is_state_over_two_pow_31() {
        let mut rng = DeterministicRng::new(123_456_789);

        assert_eq!(rng.uniform(), 231_794_730.0 / 2_147_483_648.0);
        assert_eq!(rng.uniform(), 0.524_775_279_220_193_6);
    }

    #[test]
    fn normal_consumes_two_uniforms() {
        let mut paired = DeterministicRng::new(99);
        let mut stepped = DeterministicRng::new(99);

        paired.normal();
        stepped.next_state();
        stepped.next_state();

        assert_eq!(paired, stepped);
    }

    #[test]
    fn first_normal_matches_recorded_reference() {
        let mut rng = DeterministicRng::new(123_456_789);

        let z = rng.normal();

        assert!((z - -2.084_556_533_154_652_5).abs() < 1e-12);
    }

    #[test]
    fn normal_survives_a_zero_uniform() {
        // Solve (s * a + c) & mask == 0 so the first uniform is exactly zero.
        let mut rng = DeterministicRng::new(0);
        rng.state = zero_producing_state();

        let z = rng.normal();

        assert!(z.is_finite());
    }

    #[test]
    fn same_seed_yields_identical_sequences() {
        let mut left = DeterministicRng::new(7);
        let mut right = DeterministicRng::new(7);

        let a: Vec<f64> = (0..100).map(|_| left.normal()).collect();
        let b: Vec<f64> = (0..100).map(|_| right.normal()).collect();

        assert_eq!(a, b);
    }

    #[test]
    fn reseed_restarts_the_sequence() {
        let mut rng = DeterministicRng::default();
        let first = rng.uniform();
        rng.uniform();

        rng.reseed(DEFAULT_SEED);

        assert_eq!(rng.uniform(), first);
    }

    fn zero_producing_state() -> u64 {
        // a is odd, so it has an inverse mod 2^31.
        let modulus = 1_u64 << 31;
        let a_inv = mod_inverse(1_103_515_245, modulus);
        ((modulus - 12_345) * a_inv) % modulus
    }

    fn mod_inverse(a: u64, modulus: u64) -> u64 {
        let mut inverse = 1_u64;
        for _ in 0..31 {
            inverse = inverse.wrapping_mul(2_u64.wrapping_sub(a.wrapping_mul(inverse)));
        }
        inverse % modulus
    }
}
