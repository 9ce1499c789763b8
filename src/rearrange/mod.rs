//! Layout rearrangement.
//!
//! Produces alternative arrangements of one detected scene. An arrangement is
//! a uniformly random permutation of the layout's objects; coordinates are
//! never touched, so the renderer draws the same boxes in a different order.
//! Variants are drawn independently, so two of them may coincide.

use rand::seq::SliceRandom;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::RedecorError;
use crate::layout::{Layout, LayoutVariant};

/// Number of variants produced when the caller does not ask for a count.
pub const DEFAULT_NUM_VERSIONS: usize = 4;

/// Rearrangement options, also the `rearrange:` section of the config file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RearrangeOptions {
    pub num_versions: usize,
    /// Fixed seed for reproducible variants; `None` uses the thread-local RNG.
    pub seed: Option<u64>,
}

impl Default for RearrangeOptions {
    fn default() -> Self {
        Self {
            num_versions: DEFAULT_NUM_VERSIONS,
            seed: None,
        }
    }
}

/// Validate rearrangement options before running.
pub fn validate_rearrange_options(opts: &RearrangeOptions) -> Result<(), RedecorError> {
    if opts.num_versions == 0 {
        return Err(RedecorError::invalid_argument(
            "num_versions must be greater than 0",
        ));
    }
    Ok(())
}

/// Converts an externally supplied signed count, rejecting zero and negatives.
pub fn num_versions_from_i64(value: i64) -> Result<usize, RedecorError> {
    if value <= 0 {
        return Err(RedecorError::invalid_argument(format!(
            "num_versions must be greater than 0 (got {})",
            value
        )));
    }
    usize::try_from(value).map_err(|_| {
        RedecorError::invalid_argument(format!("num_versions {} is too large", value))
    })
}

/// Generate `num_versions` independent random permutations of `layout`.
///
/// The input is only read; every variant owns fresh clones of the objects.
/// Fails with an invalid-argument error when `num_versions` is zero, before
/// drawing anything from `rng`.
pub fn generate_rearranged_layouts_with_rng<R: Rng + ?Sized>(
    layout: &Layout,
    num_versions: usize,
    rng: &mut R,
) -> Result<Vec<LayoutVariant>, RedecorError> {
    validate_rearrange_options(&RearrangeOptions {
        num_versions,
        seed: None,
    })?;

    let mut variants = Vec::with_capacity(num_versions);
    for _ in 0..num_versions {
        let mut objects = layout.objects.clone();
        objects.shuffle(rng);
        variants.push(LayoutVariant::new(objects));
    }
    Ok(variants)
}

/// Generate variants according to options, seeding an RNG when asked to.
pub fn generate_rearranged_layouts(
    layout: &Layout,
    opts: &RearrangeOptions,
) -> Result<Vec<LayoutVariant>, RedecorError> {
    validate_rearrange_options(opts)?;

    if let Some(seed) = opts.seed {
        let mut rng = StdRng::seed_from_u64(seed);
        generate_rearranged_layouts_with_rng(layout, opts.num_versions, &mut rng)
    } else {
        let mut rng = rand::rng();
        generate_rearranged_layouts_with_rng(layout, opts.num_versions, &mut rng)
    }
}
