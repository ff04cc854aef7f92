use crate::{
    DataTransformer, Error, Implementations, Result, ResultShape, RowFactory, Transformers,
};
use std::{
    any::{self, Any, TypeId},
    cell::RefCell,
    collections::HashMap,
    env, fmt,
    sync::{Arc, LazyLock, PoisonError, RwLock},
    time::Duration,
};

/// Settings and registries shared by every call observing them.
///
/// Created once, usually at startup, and shared as `Arc<Config>`. Procedures use the
/// [current](Config::current) configuration unless given one explicitly.
pub struct Config {
    convert_numeric: bool,
    ignore_enum_case: bool,
    default_timeout: Option<Duration>,
    transformers: Transformers,
    implementations: Implementations,
    factories: RwLock<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
}

static DEFAULT: LazyLock<Arc<Config>> = LazyLock::new(|| match Config::from_env() {
    Ok(config) => config,
    Err(e) => {
        log::error!("{e:#}");
        ConfigBuilder::default().build()
    }
});

thread_local! {
    static SCOPED: RefCell<Vec<Arc<Config>>> = const { RefCell::new(Vec::new()) };
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        Default::default()
    }

    /// The configuration installed by the innermost [`Config::scoped`] of this thread,
    /// otherwise the process default read from the environment on first use.
    pub fn current() -> Arc<Config> {
        SCOPED
            .with_borrow(|v| v.last().cloned())
            .unwrap_or_else(|| DEFAULT.clone())
    }

    /// Runs `f` with `config` as the current configuration of this thread.
    pub fn scoped<R>(config: Arc<Config>, f: impl FnOnce() -> R) -> R {
        struct Restore;
        impl Drop for Restore {
            fn drop(&mut self) {
                SCOPED.with_borrow_mut(|v| v.pop());
            }
        }
        SCOPED.with_borrow_mut(|v| v.push(config));
        let _restore = Restore;
        f()
    }

    /// Defaults overridden by `SPROCKET_CONVERT_NUMERIC`, `SPROCKET_IGNORE_ENUM_CASE`
    /// and `SPROCKET_TIMEOUT_MS`.
    pub fn from_env() -> Result<Arc<Config>> {
        Ok(ConfigBuilder::default()
            .lookup(|name| env::var(name).ok())?
            .build())
    }

    /// Allow conversions between numeric types.
    pub fn convert_numeric(&self) -> bool {
        self.convert_numeric
    }

    /// Match enum names ignoring case.
    pub fn ignore_enum_case(&self) -> bool {
        self.ignore_enum_case
    }

    /// Timeout of procedures not declaring their own.
    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout
    }

    /// General transformers, in registration order.
    pub fn transformers(&self) -> &Transformers {
        &self.transformers
    }

    pub fn implementations(&self) -> &Implementations {
        &self.implementations
    }

    /// Factory of `T` for this configuration, built on first request. Concurrent first
    /// requests may both build it, the first one stored is kept.
    pub(crate) fn cached_factory<T: ResultShape>(&self) -> Result<Arc<dyn RowFactory<T>>> {
        let key = TypeId::of::<T>();
        if let Some(factory) = self
            .factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .and_then(|v| v.downcast_ref::<Arc<dyn RowFactory<T>>>())
        {
            return Ok(factory.clone());
        }
        let factory = T::row_factory(self)?;
        log::debug!("Created the row factory of `{}`", any::type_name::<T>());
        let mut factories = self
            .factories
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let stored = factories
            .entry(key)
            .or_insert_with(|| Box::new(factory.clone()));
        Ok(stored
            .downcast_ref::<Arc<dyn RowFactory<T>>>()
            .cloned()
            .unwrap_or(factory))
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("convert_numeric", &self.convert_numeric)
            .field("ignore_enum_case", &self.ignore_enum_case)
            .field("default_timeout", &self.default_timeout)
            .field("transformers", &self.transformers.len())
            .field("implementations", &self.implementations)
            .finish_non_exhaustive()
    }
}

/// Builds a [`Config`].
///
/// ```rust
/// use sprocket_core::{Config, TrimString};
/// use std::{sync::Arc, time::Duration};
/// let config = Config::builder()
///     .convert_numeric(true)
///     .default_timeout(Duration::from_secs(30))
///     .transformer(Arc::new(TrimString))
///     .build();
/// assert!(config.convert_numeric());
/// ```
#[derive(Default)]
pub struct ConfigBuilder {
    convert_numeric: bool,
    ignore_enum_case: bool,
    default_timeout: Option<Duration>,
    transformers: Vec<Arc<dyn DataTransformer>>,
    implementations: Implementations,
}

impl ConfigBuilder {
    pub fn convert_numeric(mut self, value: bool) -> Self {
        self.convert_numeric = value;
        self
    }

    pub fn ignore_enum_case(mut self, value: bool) -> Self {
        self.ignore_enum_case = value;
        self
    }

    pub fn default_timeout(mut self, value: Duration) -> Self {
        self.default_timeout = Some(value);
        self
    }

    /// Appends a general transformer.
    pub fn transformer(mut self, transformer: Arc<dyn DataTransformer>) -> Self {
        self.transformers.push(transformer);
        self
    }

    /// Reads `Box<I>` results as `C`.
    pub fn implement<I, C>(mut self, convert: fn(C) -> Box<I>) -> Self
    where
        I: ?Sized + Send + 'static,
        C: ResultShape,
    {
        self.implementations.register::<I, C>(convert);
        self
    }

    /// Overrides the settings found through `lookup`, called with the names of the
    /// environment variables.
    pub fn lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(v) = lookup("SPROCKET_CONVERT_NUMERIC") {
            self.convert_numeric = parse_flag("SPROCKET_CONVERT_NUMERIC", &v)?;
        }
        if let Some(v) = lookup("SPROCKET_IGNORE_ENUM_CASE") {
            self.ignore_enum_case = parse_flag("SPROCKET_IGNORE_ENUM_CASE", &v)?;
        }
        if let Some(v) = lookup("SPROCKET_TIMEOUT_MS") {
            let millis = v.trim().parse::<u64>().map_err(|e| {
                Error::new(e).context(format!(
                    "SPROCKET_TIMEOUT_MS must be a number of milliseconds, found `{v}`"
                ))
            })?;
            self.default_timeout = (millis > 0).then(|| Duration::from_millis(millis));
        }
        Ok(self)
    }

    pub fn build(self) -> Arc<Config> {
        Arc::new(Config {
            convert_numeric: self.convert_numeric,
            ignore_enum_case: self.ignore_enum_case,
            default_timeout: self.default_timeout,
            transformers: self.transformers.into(),
            implementations: self.implementations,
            factories: Default::default(),
        })
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(Error::msg(format!(
            "{name} must be a boolean, found `{value}`"
        ))),
    }
}
