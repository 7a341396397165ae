//! Time-to-live values and jitter.
//!
//! A TTL is either a fixed number of seconds or a function of the object being
//! cached. Jitter multiplies the resolved base by a factor drawn uniformly from
//! a [`RandomizationScale`], spreading expiries so entries written together do
//! not all expire together.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use cachet_core::constants::{
    DEFAULT_TTL_RANDOMIZATION_HIGH, DEFAULT_TTL_RANDOMIZATION_LOW, DEFAULT_TTL_SECONDS,
};
use cachet_core::error::{CachetError, Result};

/// Per-object TTL callback. `None` is passed when no single object is being
/// cached (collection fetches).
pub type TtlFn<T> = Arc<dyn Fn(Option<&T>) -> Result<f64> + Send + Sync>;

// ═══════════════════════════════════════════════════════════════════════════════
// TTL
// ═══════════════════════════════════════════════════════════════════════════════

/// Base expiration for entries of type `T`, in seconds.
pub enum Ttl<T> {
    /// The same TTL for every object.
    Fixed(f64),
    /// TTL computed from the object about to be cached.
    Dynamic(TtlFn<T>),
}

impl<T> Ttl<T> {
    /// A fixed TTL in seconds.
    pub fn fixed(seconds: f64) -> Self {
        Ttl::Fixed(seconds)
    }

    /// A TTL computed from the object. The callback cannot fail.
    ///
    /// ```rust
    /// use cachet_config::Ttl;
    ///
    /// struct Quote { expires_in: u64 }
    ///
    /// let ttl = Ttl::dynamic(|quote: Option<&Quote>| {
    ///     quote.map_or(60.0, |q| q.expires_in as f64)
    /// });
    /// assert_eq!(ttl.base_secs(Some(&Quote { expires_in: 30 })).unwrap(), 30.0);
    /// assert_eq!(ttl.base_secs(None).unwrap(), 60.0);
    /// ```
    pub fn dynamic<F>(func: F) -> Self
    where
        F: Fn(Option<&T>) -> f64 + Send + Sync + 'static,
    {
        Self::try_dynamic(move |object| Ok(func(object)))
    }

    /// A TTL computed from the object by a callback that may fail. Failures
    /// reach the caller of `resolve_ttl` unchanged.
    pub fn try_dynamic<F>(func: F) -> Self
    where
        F: Fn(Option<&T>) -> Result<f64> + Send + Sync + 'static,
    {
        Ttl::Dynamic(Arc::new(func))
    }

    /// Returns true if the TTL depends on the cached object.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Ttl::Dynamic(_))
    }

    /// Returns the fixed value, if this TTL is not dynamic.
    pub fn as_fixed(&self) -> Option<f64> {
        match self {
            Ttl::Fixed(seconds) => Some(*seconds),
            Ttl::Dynamic(_) => None,
        }
    }

    /// Resolves the base TTL (before jitter) for `object`.
    pub fn base_secs(&self, object: Option<&T>) -> Result<f64> {
        match self {
            Ttl::Fixed(seconds) => Ok(*seconds),
            Ttl::Dynamic(func) => func(object),
        }
    }

    /// Checks that a fixed TTL is a non-negative finite number.
    ///
    /// Dynamic TTLs can only be checked once resolved.
    pub fn validate(&self) -> Result<()> {
        match self {
            Ttl::Fixed(seconds) if !seconds.is_finite() || *seconds < 0.0 => {
                Err(CachetError::InvalidTtl { seconds: *seconds })
            }
            _ => Ok(()),
        }
    }
}

impl<T> Clone for Ttl<T> {
    fn clone(&self) -> Self {
        match self {
            Ttl::Fixed(seconds) => Ttl::Fixed(*seconds),
            Ttl::Dynamic(func) => Ttl::Dynamic(Arc::clone(func)),
        }
    }
}

impl<T> fmt::Debug for Ttl<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ttl::Fixed(seconds) => f.debug_tuple("Fixed").field(seconds).finish(),
            Ttl::Dynamic(_) => f.write_str("Dynamic(<fn>)"),
        }
    }
}

impl<T> Default for Ttl<T> {
    fn default() -> Self {
        Ttl::Fixed(DEFAULT_TTL_SECONDS as f64)
    }
}

impl<T> From<u64> for Ttl<T> {
    fn from(seconds: u64) -> Self {
        Ttl::Fixed(seconds as f64)
    }
}

impl<T> From<u32> for Ttl<T> {
    fn from(seconds: u32) -> Self {
        Ttl::Fixed(f64::from(seconds))
    }
}

/// Negative values are kept as-is and rejected by [`Ttl::validate`].
impl<T> From<i32> for Ttl<T> {
    fn from(seconds: i32) -> Self {
        Ttl::Fixed(f64::from(seconds))
    }
}

impl<T> From<f64> for Ttl<T> {
    fn from(seconds: f64) -> Self {
        Ttl::Fixed(seconds)
    }
}

impl<T> From<Duration> for Ttl<T> {
    fn from(duration: Duration) -> Self {
        Ttl::Fixed(duration.as_secs_f64())
    }
}

/// Converts resolved seconds into a `Duration`.
///
/// Negative, non-finite, or overflowing values are rejected.
pub fn to_duration(seconds: f64) -> Result<Duration> {
    if seconds < 0.0 {
        return Err(CachetError::InvalidTtl { seconds });
    }
    Duration::try_from_secs_f64(seconds).map_err(|_| CachetError::InvalidTtl { seconds })
}

// ═══════════════════════════════════════════════════════════════════════════════
// RANDOMIZATION SCALE
// ═══════════════════════════════════════════════════════════════════════════════

/// Half-open multiplier range `[low, high)` for TTL jitter.
///
/// Deserializes from either `[low, high]` or `{ "low": .., "high": .. }`.
/// Bounds are not checked on construction; an inverted range produces
/// factors outside it (possibly negative). Use [`validate`](Self::validate)
/// to check eagerly.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "ScaleRepr")]
pub struct RandomizationScale {
    /// Inclusive lower bound.
    pub low: f64,
    /// Exclusive upper bound.
    pub high: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScaleRepr {
    Pair([f64; 2]),
    Bounds { low: f64, high: f64 },
}

impl From<ScaleRepr> for RandomizationScale {
    fn from(repr: ScaleRepr) -> Self {
        match repr {
            ScaleRepr::Pair([low, high]) => Self { low, high },
            ScaleRepr::Bounds { low, high } => Self { low, high },
        }
    }
}

impl RandomizationScale {
    /// Creates a scale without checking the bounds.
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Creates a scale, rejecting inverted or non-finite bounds.
    pub fn try_new(low: f64, high: f64) -> Result<Self> {
        let scale = Self::new(low, high);
        scale.validate()?;
        Ok(scale)
    }

    /// Returns true if `low <= high` and both bounds are finite.
    pub fn is_valid(&self) -> bool {
        self.low.is_finite() && self.high.is_finite() && self.low <= self.high
    }

    /// Checks the bounds.
    pub fn validate(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(CachetError::InvalidScale {
                low: self.low,
                high: self.high,
            })
        }
    }

    /// Width of the range, `high - low`.
    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    /// Returns true if `factor` lies in `[low, high)`.
    pub fn contains(&self, factor: f64) -> bool {
        self.low <= factor && factor < self.high
    }

    /// Draws a factor `r * (high - low) + low` with `r` uniform in `[0, 1)`.
    ///
    /// For a valid range the result is always below `high`: a draw that
    /// rounds up to `high` is folded back to `low`. Inverted and degenerate
    /// ranges are sampled unchecked.
    pub fn sample_with<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let r: f64 = rng.gen();
        let factor = r * self.width() + self.low;
        if self.low < self.high && factor >= self.high {
            return self.low;
        }
        factor
    }

    /// Draws a factor from the thread-local generator.
    pub fn sample(&self) -> f64 {
        self.sample_with(&mut rand::thread_rng())
    }

    /// Scales `base` by a factor drawn from `rng`.
    pub fn jitter_with<R: Rng + ?Sized>(&self, base: f64, rng: &mut R) -> f64 {
        base * self.sample_with(rng)
    }
}

impl Default for RandomizationScale {
    fn default() -> Self {
        Self::new(DEFAULT_TTL_RANDOMIZATION_LOW, DEFAULT_TTL_RANDOMIZATION_HIGH)
    }
}

impl From<std::ops::Range<f64>> for RandomizationScale {
    fn from(range: std::ops::Range<f64>) -> Self {
        Self::new(range.start, range.end)
    }
}

impl fmt::Display for RandomizationScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.low, self.high)
    }
}
