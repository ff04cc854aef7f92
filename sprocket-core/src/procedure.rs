use crate::{
    AsValue, CancelHandle, CancellationToken, Config, Context, Cursor, DataTransformer,
    MaterializeError, ParseContext, Result, ResultShape, RowFactory, Value, create_row_factory,
    future::BoxFuture, is_cancelled, is_timeout, stream::TryStreamExt,
};
use std::{
    any, fmt,
    sync::{
        Arc, Mutex, OnceLock, PoisonError,
        mpsc::{self, RecvTimeoutError},
    },
    thread,
    time::{Duration, Instant},
};

/// The ordered list of shapes a procedure returns, one per result set.
///
/// Implemented for `()` and for tuples of up to eight [`ResultShape`] types:
/// `(Order, OrderLine)` reads the first result set as `Vec<Order>` and the second as
/// `Vec<OrderLine>`.
pub trait ResultSets: Send + 'static {
    type Output: Send;
    type Factories: Send + Sync;

    fn factories(config: &Config) -> Result<Self::Factories>;

    fn read(
        factories: &Self::Factories,
        cursor: &mut dyn Cursor,
        ctx: &ParseContext,
    ) -> Result<Self::Output>;

    fn read_async<'a>(
        factories: &'a Self::Factories,
        cursor: &'a mut dyn Cursor,
        ctx: &'a ParseContext,
    ) -> BoxFuture<'a, Result<Self::Output>>;
}

/// Reads the result set at `index`, the cursor being on the result set `index - 1`
/// (or on the first one when `index` is zero).
fn read_set<T: Send + 'static>(
    index: usize,
    factory: &Arc<dyn RowFactory<T>>,
    cursor: &mut dyn Cursor,
    ctx: &ParseContext,
) -> Result<Vec<T>> {
    if index > 0 {
        ctx.check()?;
        if !cursor.advance_result_set()? {
            return Err(MaterializeError::MissingResultSet {
                type_name: any::type_name::<T>(),
            }
            .into());
        }
    }
    log::trace!("Reading result set {index} into `{}`", any::type_name::<T>());
    factory
        .parse_rows(cursor, ctx)
        .with_context(|| read_context::<T>(index))
}

async fn read_set_async<T: Send + 'static>(
    index: usize,
    factory: &Arc<dyn RowFactory<T>>,
    cursor: &mut dyn Cursor,
    ctx: &ParseContext,
) -> Result<Vec<T>> {
    if index > 0 {
        ctx.check()?;
        if !ctx.token().guard(cursor.advance_result_set_async()).await? {
            return Err(MaterializeError::MissingResultSet {
                type_name: any::type_name::<T>(),
            }
            .into());
        }
    }
    log::trace!("Reading result set {index} into `{}`", any::type_name::<T>());
    factory
        .parse_rows_async(cursor, ctx)
        .try_collect::<Vec<T>>()
        .await
        .with_context(|| read_context::<T>(index))
}

fn read_context<T>(index: usize) -> String {
    format!(
        "While reading result set {index} into `{}`",
        any::type_name::<T>()
    )
}

impl ResultSets for () {
    type Output = ();
    type Factories = ();

    fn factories(_config: &Config) -> Result<Self::Factories> {
        Ok(())
    }

    fn read(_: &Self::Factories, _: &mut dyn Cursor, ctx: &ParseContext) -> Result<()> {
        ctx.check()
    }

    fn read_async<'a>(
        _: &'a Self::Factories,
        _: &'a mut dyn Cursor,
        ctx: &'a ParseContext,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move { ctx.check() })
    }
}

macro_rules! impl_result_sets {
    ($(($index:tt, $ty:ident, $var:ident)),+) => {
        impl<$($ty: ResultShape),+> ResultSets for ($($ty,)+) {
            type Output = ($(Vec<$ty>,)+);
            type Factories = ($(Arc<dyn RowFactory<$ty>>,)+);

            fn factories(config: &Config) -> Result<Self::Factories> {
                Ok(($(create_row_factory::<$ty>(config)?,)+))
            }

            fn read(
                factories: &Self::Factories,
                cursor: &mut dyn Cursor,
                ctx: &ParseContext,
            ) -> Result<Self::Output> {
                $(let $var = read_set($index, &factories.$index, &mut *cursor, ctx)?;)+
                Ok(($($var,)+))
            }

            fn read_async<'a>(
                factories: &'a Self::Factories,
                cursor: &'a mut dyn Cursor,
                ctx: &'a ParseContext,
            ) -> BoxFuture<'a, Result<Self::Output>> {
                Box::pin(async move {
                    $(
                        let $var =
                            read_set_async($index, &factories.$index, &mut *cursor, ctx).await?;
                    )+
                    Ok(($($var,)+))
                })
            }
        }
    };
}
impl_result_sets!((0, A, a));
impl_result_sets!((0, A, a), (1, B, b));
impl_result_sets!((0, A, a), (1, B, b), (2, C, c));
impl_result_sets!((0, A, a), (1, B, b), (2, C, c), (3, D, d));
impl_result_sets!((0, A, a), (1, B, b), (2, C, c), (3, D, d), (4, E, e));
impl_result_sets!((0, A, a), (1, B, b), (2, C, c), (3, D, d), (4, E, e), (5, F, f));
impl_result_sets!(
    (0, A, a),
    (1, B, b),
    (2, C, c),
    (3, D, d),
    (4, E, e),
    (5, F, f),
    (6, G, g)
);
impl_result_sets!(
    (0, A, a),
    (1, B, b),
    (2, C, c),
    (3, D, d),
    (4, E, e),
    (5, F, f),
    (6, G, g),
    (7, H, h)
);

/// Slot receiving an output or return parameter once the procedure completed.
///
/// Clones share the slot: keep one and hand the other to the procedure.
#[derive(Debug, Clone)]
pub struct OutputParameter {
    name: String,
    value: Arc<Mutex<Value>>,
}

impl OutputParameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Arc::new(Mutex::new(Value::Null)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The received value, `Value::Null` until the procedure completed.
    pub fn value(&self) -> Value {
        self.value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get<T: AsValue>(&self) -> Result<T> {
        T::try_from_value(self.value())
            .with_context(|| format!("While reading the output parameter {}", self.name))
    }

    fn set(&self, value: Value) {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = value;
    }

    /// Names match ignoring ASCII case and a leading `@`.
    fn matches(&self, name: &str) -> bool {
        self.name
            .trim_start_matches('@')
            .eq_ignore_ascii_case(name.trim_start_matches('@'))
    }
}

/// A stored procedure call returning the result sets `R`.
///
/// ```ignore
/// let procedure = Procedure::<(Order, OrderLine)>::new("GetOrders")
///     .schema("sales")
///     .timeout(Duration::from_secs(5))
///     .output(total.clone());
/// let (orders, lines) = procedure.execute(&mut cursor, &CancellationToken::new())?;
/// ```
pub struct Procedure<R: ResultSets = ()> {
    schema: Option<String>,
    name: String,
    timeout: Option<Duration>,
    outputs: Vec<OutputParameter>,
    transformers: Vec<Arc<dyn DataTransformer>>,
    config: Arc<Config>,
    factories: OnceLock<R::Factories>,
}

impl<R: ResultSets> Procedure<R> {
    /// Uses the [current](Config::current) configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
            timeout: None,
            outputs: Vec::new(),
            transformers: Vec::new(),
            config: Config::current(),
            factories: OnceLock::new(),
        }
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Overrides the default timeout of the configuration.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn output(mut self, parameter: OutputParameter) -> Self {
        self.outputs.push(parameter);
        self
    }

    /// Transformer applied to this call only, after the configured ones.
    pub fn transformer(mut self, transformer: Arc<dyn DataTransformer>) -> Self {
        self.transformers.push(transformer);
        self
    }

    pub fn config(mut self, config: Arc<Config>) -> Self {
        self.config = config;
        self.factories = OnceLock::new();
        self
    }

    pub fn full_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{schema}.{}", self.name),
            None => self.name.clone(),
        }
    }

    pub fn effective_timeout(&self) -> Option<Duration> {
        self.timeout.or(self.config.default_timeout())
    }

    fn factories(&self) -> Result<&R::Factories> {
        if let Some(factories) = self.factories.get() {
            return Ok(factories);
        }
        let factories = R::factories(&self.config)
            .with_context(|| format!("While preparing the results of {}", self.full_name()))?;
        Ok(self.factories.get_or_init(|| factories))
    }

    fn context(&self, token: &CancellationToken) -> ParseContext {
        ParseContext::new(self.config.clone(), token.clone())
            .with_transformers(self.transformers.iter().cloned())
    }

    /// Reads every result set from `cursor`, then the output parameters.
    ///
    /// The command is cancelled through [`Cursor::cancel_handle`] when `token` is
    /// cancelled or the timeout elapses, the outcome is then a
    /// [`MaterializeError::Cancelled`] or a [`MaterializeError::Timeout`].
    pub fn execute(
        &self,
        cursor: &mut dyn Cursor,
        token: &CancellationToken,
    ) -> Result<R::Output> {
        let factories = self.factories()?;
        let ctx = self.context(token);
        ctx.check()?;
        let timeout = self.effective_timeout();
        let handle = cursor.cancel_handle();
        let watchdog = Watchdog {
            handle: handle.clone(),
            token: token.clone(),
            deadline: timeout.map(|v| Instant::now() + v),
        };
        let (result, timed_out) = thread::scope(|scope| {
            let (done, finished) = mpsc::channel::<()>();
            let watchdog = scope.spawn(move || watchdog.run(finished));
            let result = R::read(factories, &mut *cursor, &ctx);
            drop(done);
            (result, watchdog.join().unwrap_or(false))
        });
        let result = match result {
            Err(e) if timed_out => Err(e.context(MaterializeError::Timeout {
                after: timeout.unwrap_or_default(),
            })),
            Err(e) if token.is_cancelled() && !is_cancelled(&e) => {
                Err(e.context(MaterializeError::Cancelled))
            }
            result => result,
        };
        if matches!(&result, Err(e) if is_cancelled(e)) {
            handle.cancel();
        }
        self.complete(result, &*cursor)
    }

    /// Asynchronous [`Procedure::execute`].
    pub async fn execute_async(
        &self,
        cursor: &mut dyn Cursor,
        token: &CancellationToken,
    ) -> Result<R::Output> {
        let factories = self.factories()?;
        let ctx = self.context(token);
        ctx.check()?;
        let handle = cursor.cancel_handle();
        let timeout = self.effective_timeout();
        let result = {
            let work = async {
                let read = R::read_async(factories, &mut *cursor, &ctx);
                match timeout {
                    Some(after) => tokio::time::timeout(after, read)
                        .await
                        .unwrap_or_else(|_| Err(MaterializeError::Timeout { after }.into())),
                    None => read.await,
                }
            };
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(MaterializeError::Cancelled.into()),
                result = work => result,
            }
        };
        if matches!(&result, Err(e) if is_timeout(e) || is_cancelled(e)) {
            handle.cancel();
        }
        self.complete(result, &*cursor)
    }

    fn complete(&self, result: Result<R::Output>, cursor: &dyn Cursor) -> Result<R::Output> {
        match result {
            Ok(output) => {
                self.transfer_outputs(cursor);
                Ok(output)
            }
            Err(e) => {
                if is_timeout(&e) {
                    log::error!("{} timed out: {e:#}", self.full_name());
                } else if is_cancelled(&e) {
                    log::debug!("{} was cancelled", self.full_name());
                } else {
                    log::error!("{} failed: {e:#}", self.full_name());
                }
                Err(e)
            }
        }
    }

    fn transfer_outputs(&self, cursor: &dyn Cursor) {
        for (name, value) in cursor.output_parameters() {
            match self.outputs.iter().find(|v| v.matches(&name)) {
                Some(slot) => slot.set(value),
                None => log::warn!(
                    "{} returned the output parameter {name} that has no slot",
                    self.full_name()
                ),
            }
        }
    }
}

impl<R: ResultSets> fmt::Debug for Procedure<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Procedure")
            .field("name", &self.full_name())
            .field("timeout", &self.effective_timeout())
            .field("outputs", &self.outputs)
            .finish_non_exhaustive()
    }
}

/// Cancels the command of a synchronous call when the token fires or the deadline
/// passes. Returns whether the deadline was the reason.
struct Watchdog {
    handle: CancelHandle,
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Watchdog {
    const TICK: Duration = Duration::from_millis(5);

    fn run(self, finished: mpsc::Receiver<()>) -> bool {
        loop {
            if self.token.is_cancelled() {
                log::debug!("Cancelling the command");
                self.handle.cancel();
                return false;
            }
            let wait = match self.deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        self.handle.cancel();
                        return true;
                    }
                    (deadline - now).min(Self::TICK)
                }
                None => Self::TICK,
            };
            match finished.recv_timeout(wait) {
                Err(RecvTimeoutError::Timeout) => continue,
                _ => return false,
            }
        }
    }
}

/// Shorthand for a single result set of `T`.
pub fn read_all<T: ResultShape>(
    cursor: &mut dyn Cursor,
    token: &CancellationToken,
) -> Result<Vec<T>> {
    let config = Config::current();
    let ctx = ParseContext::new(config.clone(), token.clone());
    create_row_factory::<T>(&config)?.parse_rows(cursor, &ctx)
}
