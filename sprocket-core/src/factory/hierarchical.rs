use crate::{
    ColumnLayout, ComplexFactory, Config, Cursor, MaterializeError, ParseContext, Record, Result,
    ResultShape, RowFactory, RowReader, boxed, create_row_factory,
    future::BoxFuture,
    stitch,
    stream::{BoxStream, TryStreamExt},
};
use async_stream::try_stream;
use std::sync::Arc;

/// The factory of a record: hierarchical when it declares child collections,
/// complex otherwise.
pub fn record_factory<T: Record>(_config: &Config) -> Result<Arc<dyn RowFactory<T>>> {
    let relations = T::relations();
    if relations.is_empty() {
        Ok(Arc::new(ComplexFactory::<T>::new()))
    } else {
        Ok(Arc::new(HierarchicalFactory::new(relations)?))
    }
}

/// A child collection of `P`, read from its own result set.
pub struct Relation<P> {
    property: &'static str,
    key: &'static str,
    foreign_key: &'static str,
    children: Box<dyn LoadChildren<P>>,
}

impl<P: Record> Relation<P> {
    /// Children of type `C` whose `foreign_key` equals the `key` of the parent, stored
    /// into `property` by `assign`.
    pub fn new<C: Record + ResultShape>(
        property: &'static str,
        key: &'static str,
        foreign_key: &'static str,
        assign: fn(&mut P, Vec<C>),
    ) -> Self {
        Self {
            property,
            key,
            foreign_key,
            children: Box::new(Children { assign }),
        }
    }

    pub fn property(&self) -> &'static str {
        self.property
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn foreign_key(&self) -> &'static str {
        self.foreign_key
    }

    pub fn child_type(&self) -> &'static str {
        self.children.child_type()
    }

    fn validate(&self) -> Result<()> {
        let reason = if P::field_index(self.key).is_none() {
            format!(
                "the key `{}` of the relation {} is not a property",
                self.key, self.property
            )
        } else if !self.children.has_property(self.foreign_key) {
            format!(
                "the foreign key `{}` of the relation {} is not a property of `{}`",
                self.foreign_key,
                self.property,
                self.child_type()
            )
        } else {
            return Ok(());
        };
        Err(MaterializeError::UnsupportedShape {
            type_name: P::NAME.to_string(),
            reason,
        }
        .into())
    }

    /// Moves to the next result set and attaches the children read from it.
    pub fn load(
        &self,
        parents: &mut [P],
        cursor: &mut dyn Cursor,
        ctx: &ParseContext,
    ) -> Result<()> {
        self.children.load(self, parents, cursor, ctx)
    }

    pub fn load_async<'a>(
        &'a self,
        parents: &'a mut [P],
        cursor: &'a mut dyn Cursor,
        ctx: &'a ParseContext,
    ) -> BoxFuture<'a, Result<()>> {
        self.children.load_async(self, parents, cursor, ctx)
    }
}

trait LoadChildren<P>: Send + Sync {
    fn child_type(&self) -> &'static str;
    fn has_property(&self, name: &str) -> bool;
    fn load(
        &self,
        relation: &Relation<P>,
        parents: &mut [P],
        cursor: &mut dyn Cursor,
        ctx: &ParseContext,
    ) -> Result<()>;
    fn load_async<'a>(
        &'a self,
        relation: &'a Relation<P>,
        parents: &'a mut [P],
        cursor: &'a mut dyn Cursor,
        ctx: &'a ParseContext,
    ) -> BoxFuture<'a, Result<()>>;
}

struct Children<P, C> {
    assign: fn(&mut P, Vec<C>),
}

impl<P: Record, C: Record> Children<P, C> {
    fn attach(&self, relation: &Relation<P>, parents: &mut [P], children: Vec<C>) {
        log::trace!(
            "Attaching {} `{}` to {} `{}`",
            children.len(),
            C::NAME,
            parents.len(),
            P::NAME
        );
        stitch(
            parents,
            |p| p.field_value(relation.key),
            children,
            |c| c.field_value(relation.foreign_key),
            self.assign,
        );
    }
}

impl<P: Record, C: Record + ResultShape> LoadChildren<P> for Children<P, C> {
    fn child_type(&self) -> &'static str {
        C::NAME
    }

    fn has_property(&self, name: &str) -> bool {
        C::field_index(name).is_some()
    }

    fn load(
        &self,
        relation: &Relation<P>,
        parents: &mut [P],
        cursor: &mut dyn Cursor,
        ctx: &ParseContext,
    ) -> Result<()> {
        ctx.check()?;
        if !cursor.advance_result_set()? {
            return Err(MaterializeError::MissingResultSet { type_name: C::NAME }.into());
        }
        let factory = create_row_factory::<C>(ctx.config())?;
        let children = factory.parse_rows(cursor, ctx)?;
        self.attach(relation, parents, children);
        Ok(())
    }

    fn load_async<'a>(
        &'a self,
        relation: &'a Relation<P>,
        parents: &'a mut [P],
        cursor: &'a mut dyn Cursor,
        ctx: &'a ParseContext,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            ctx.check()?;
            if !ctx.token().guard(cursor.advance_result_set_async()).await? {
                return Err(MaterializeError::MissingResultSet { type_name: C::NAME }.into());
            }
            let factory = create_row_factory::<C>(ctx.config())?;
            let children: Vec<C> = factory.parse_rows_async(cursor, ctx).try_collect().await?;
            self.attach(relation, parents, children);
            Ok(())
        })
    }
}

/// Reads the parents from the current result set with the complex algorithm, then
/// one result set per relation, in declaration order. Only the parents are
/// produced.
pub struct HierarchicalFactory<T> {
    parents: ComplexFactory<T>,
    relations: Vec<Relation<T>>,
}

impl<T: Record> HierarchicalFactory<T> {
    /// Fails when the key of a relation is not a property of `T`, or its foreign key
    /// not a property of the child type.
    pub fn new(relations: Vec<Relation<T>>) -> Result<Self> {
        for relation in &relations {
            relation.validate()?;
        }
        Ok(Self {
            parents: ComplexFactory::new(),
            relations,
        })
    }

    pub fn relations(&self) -> &[Relation<T>] {
        &self.relations
    }
}

impl<T: Record> RowFactory<T> for HierarchicalFactory<T> {
    /// Reads the parent rows only, children are attached by `parse_rows`.
    fn reader<'a>(
        &'a self,
        columns: &ColumnLayout,
        ctx: &ParseContext,
    ) -> Result<Box<dyn RowReader<T> + 'a>> {
        self.parents.reader(columns, ctx)
    }

    fn parse_rows(&self, cursor: &mut dyn Cursor, ctx: &ParseContext) -> Result<Vec<T>> {
        let mut parents = self.parents.parse_rows(cursor, ctx)?;
        for relation in &self.relations {
            relation.load(&mut parents, cursor, ctx)?;
        }
        Ok(parents)
    }

    fn parse_rows_async<'a>(
        &'a self,
        cursor: &'a mut dyn Cursor,
        ctx: &'a ParseContext,
    ) -> BoxStream<'a, Result<T>> {
        boxed(try_stream! {
            let mut parents: Vec<T> = self
                .parents
                .parse_rows_async(&mut *cursor, ctx)
                .try_collect()
                .await?;
            for relation in &self.relations {
                relation.load_async(&mut parents, &mut *cursor, ctx).await?;
            }
            for parent in parents {
                yield parent;
            }
        })
    }
}
