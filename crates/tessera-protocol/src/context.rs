use crate::scratch::{BufferPool, ScratchPool};
use std::fmt;
use std::sync::Arc;
use tessera_common::{CodecConfig, Result, TileRegistry};

/// Everything a codec needs besides the bytes: block type metadata, the scratch pool used
/// for decompression, and the tunables. Cheap to clone.
#[derive(Clone)]
pub struct CodecContext {
    registry: Arc<TileRegistry>,
    pool: Arc<dyn BufferPool>,
    config: CodecConfig,
}

impl CodecContext {
    pub fn new(registry: TileRegistry, config: CodecConfig) -> Result<Self> {
        Self::with_pool(registry, config, Arc::new(ScratchPool::default()))
    }

    pub fn with_pool(
        registry: TileRegistry,
        config: CodecConfig,
        pool: Arc<dyn BufferPool>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            registry: Arc::new(registry),
            pool,
            config,
        })
    }

    pub fn registry(&self) -> &TileRegistry {
        &self.registry
    }

    pub fn pool(&self) -> &dyn BufferPool {
        self.pool.as_ref()
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }
}

impl Default for CodecContext {
    fn default() -> Self {
        Self {
            registry: Arc::new(TileRegistry::vanilla()),
            pool: Arc::new(ScratchPool::default()),
            config: CodecConfig::default(),
        }
    }
}

impl fmt::Debug for CodecContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
