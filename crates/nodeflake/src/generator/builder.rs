#[cfg(feature = "tracing")]
use tracing::debug;

use crate::{DEFAULT_EPOCH, NodeIdSource, Result, SnowflakeGenerator, SystemClock, TimeSource};

/// Configures and builds a [`SnowflakeGenerator`].
///
/// The node ID is resolved once, in [`GeneratorBuilder::build`], and cached
/// for the lifetime of the generator.
///
/// # Example
///
/// ```
/// use nodeflake::{GeneratorBuilder, TimeSource};
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1_000
///     }
/// }
///
/// let generator = GeneratorBuilder::new()
///     .node_id(5)
///     .epoch(0)
///     .clock(FixedTime)
///     .build()?;
///
/// let id = generator.next_id()?;
/// assert_eq!((id.timestamp(), id.node_id(), id.sequence()), (1_000, 5, 0));
/// # Ok::<(), nodeflake::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct GeneratorBuilder<T = SystemClock> {
    node: NodeIdSource,
    epoch: u64,
    time: T,
}

impl GeneratorBuilder<SystemClock> {
    pub fn new() -> Self {
        Self {
            node: NodeIdSource::default(),
            epoch: DEFAULT_EPOCH,
            time: SystemClock,
        }
    }
}

impl Default for GeneratorBuilder<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> GeneratorBuilder<T>
where
    T: TimeSource,
{
    /// Assigns the node ID explicitly. Validated in [`Self::build`].
    #[must_use]
    pub fn node_id(self, node_id: i64) -> Self {
        self.node_source(NodeIdSource::Explicit(node_id))
    }

    #[must_use]
    pub fn node_source(mut self, node: NodeIdSource) -> Self {
        self.node = node;
        self
    }

    /// Sets the epoch in milliseconds since the Unix epoch.
    #[must_use]
    pub fn epoch(mut self, epoch: u64) -> Self {
        self.epoch = epoch;
        self
    }

    /// Replaces the time source, e.g. with a mock clock in tests.
    pub fn clock<U>(self, time: U) -> GeneratorBuilder<U>
    where
        U: TimeSource,
    {
        GeneratorBuilder {
            node: self.node,
            epoch: self.epoch,
            time,
        }
    }

    /// Resolves the node ID and builds the generator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if an explicit node ID is
    /// outside `0..=1023`.
    ///
    /// [`Error::InvalidConfiguration`]: crate::Error::InvalidConfiguration
    pub fn build(self) -> Result<SnowflakeGenerator<T>> {
        let node_id = self.node.resolve()?;
        #[cfg(feature = "tracing")]
        debug!(
            node_id = node_id.get(),
            epoch = self.epoch,
            source = ?self.node,
            "built snowflake generator"
        );
        Ok(SnowflakeGenerator::with_clock(node_id, self.epoch, self.time))
    }
}
