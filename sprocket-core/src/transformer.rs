use crate::{Result, TargetType, Value};
use std::{fmt, sync::Arc};

/// Replaces a cell before it is coerced to the type of its destination.
///
/// Implementations are asked first whether they accept the cell with
/// `can_transform`, `transform` is only called after a positive answer. The target
/// type is never the nullable form: `Option<f64>` is reported as `Double` with
/// `is_nullable` set.
pub trait DataTransformer: Send + Sync {
    fn can_transform(
        &self,
        value: &Value,
        target: &TargetType,
        is_nullable: bool,
        attributes: &Attributes,
    ) -> bool;

    fn transform(
        &self,
        value: Value,
        target: &TargetType,
        is_nullable: bool,
        attributes: &Attributes,
    ) -> Result<Value>;
}

/// A transformer declared on a property, `#[sprocket(transform(TrimString, order = 1))]`.
#[derive(Clone, Copy)]
pub struct PropertyTransformer {
    pub order: i32,
    pub transformer: &'static dyn DataTransformer,
}

impl PropertyTransformer {
    pub const fn new(order: i32, transformer: &'static dyn DataTransformer) -> Self {
        Self { order, transformer }
    }

    /// Sorts by ascending order, keeping the declaration order between equal orders.
    pub fn sorted(mut transformers: Vec<PropertyTransformer>) -> Vec<PropertyTransformer> {
        transformers.sort_by_key(|v| v.order);
        transformers
    }
}

impl fmt::Debug for PropertyTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyTransformer")
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

/// What is declared on the destination property: its transformers and its tags.
#[derive(Debug, Clone, Copy, Default)]
pub struct Attributes<'a> {
    pub transformers: &'a [PropertyTransformer],
    pub tags: &'a [&'static str],
}

impl<'a> Attributes<'a> {
    pub fn new(transformers: &'a [PropertyTransformer], tags: &'a [&'static str]) -> Self {
        Self { transformers, tags }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|v| *v == tag)
    }
}

/// General transformers shared by all the properties of a call.
pub type Transformers = Arc<[Arc<dyn DataTransformer>]>;

/// Runs the transformers applying to one cell.
///
/// The property transformers run first, each one that accepts the current value
/// replaces it. Then the general transformers are consulted in registration order
/// and only the first accepting one is applied.
pub struct TransformerPipeline<'a> {
    general: &'a [Arc<dyn DataTransformer>],
}

impl<'a> TransformerPipeline<'a> {
    pub fn new(general: &'a [Arc<dyn DataTransformer>]) -> Self {
        Self { general }
    }

    pub fn run(
        &self,
        mut value: Value,
        target: &TargetType,
        is_nullable: bool,
        attributes: &Attributes,
    ) -> Result<Value> {
        for declared in attributes.transformers {
            let transformer = declared.transformer;
            if transformer.can_transform(&value, target, is_nullable, attributes) {
                value = transformer.transform(value, target, is_nullable, attributes)?;
            }
        }
        if let Some(transformer) = self
            .general
            .iter()
            .find(|v| v.can_transform(&value, target, is_nullable, attributes))
        {
            value = transformer.transform(value, target, is_nullable, attributes)?;
        }
        Ok(value)
    }
}
