use crate::{Attributes, PropertyTransformer, Relation, Result, TargetType, Value};

/// A user type whose properties are filled column by column.
///
/// Implemented by `#[derive(Record)]`:
///
/// ```ignore
/// #[derive(Default, Record)]
/// #[sprocket(rename_all = "PascalCase")]
/// struct Order {
///     id: i32,
///     #[sprocket(name = "Total_Amount")]
///     total: Decimal,
///     #[sprocket(optional)]
///     note: Option<String>,
///     #[sprocket(children(foreign_key = "order_id"))]
///     lines: Vec<OrderLine>,
/// }
/// ```
pub trait Record: Default + Send + 'static {
    /// Name used in the error messages.
    const NAME: &'static str;

    /// The settable properties, in declaration order.
    fn fields() -> &'static [FieldDef];

    /// Assigns the property at `index` of [`Record::fields`]. The value was already
    /// coerced to the target of the property.
    fn set_field(&mut self, index: usize, value: Value) -> Result<()>;

    /// Current value of the property named `name`, resolved by [`Record::field_index`].
    fn field_value(&self, name: &str) -> Option<Value>;

    /// Child collections loaded from the result sets following the one of `Self`.
    fn relations() -> Vec<Relation<Self>> {
        Vec::new()
    }

    /// Index of the property named `name`, by property or column name.
    fn field_index(name: &str) -> Option<usize> {
        let fields = Self::fields();
        fields
            .iter()
            .position(|f| f.name == name || f.column == name)
            .or_else(|| {
                fields.iter().position(|f| {
                    f.name.eq_ignore_ascii_case(name) || f.column.eq_ignore_ascii_case(name)
                })
            })
    }
}

/// Metadata of one settable property of a [`Record`].
#[derive(Debug)]
pub struct FieldDef {
    /// Property name, used in error messages.
    pub name: &'static str,
    /// Column the property is read from.
    pub column: &'static str,
    /// A missing column leaves the property to its default instead of failing.
    pub optional: bool,
    /// A database null becomes an absent value.
    pub nullable: bool,
    pub target: TargetType,
    /// Sorted by order.
    pub transformers: Vec<PropertyTransformer>,
    pub tags: &'static [&'static str],
}

impl FieldDef {
    pub fn attributes(&self) -> Attributes<'_> {
        Attributes::new(&self.transformers, self.tags)
    }
}
