mod resource {
    pub mod logs;
    pub mod shop;
}

#[cfg(test)]
mod tests {
    use crate::resource::{
        logs::init_logs,
        shop::{Customer, Product, Status},
    };
    use rust_decimal::Decimal;
    use sprocket::{
        Attributes, Bindings, CancellationToken, ColumnDescriptor, ColumnLayout, ComplexFactory,
        Config, DataTransformer, MaterializeError, MemoryCursor, MemoryResultSet, ParseContext,
        Procedure, Record, Result, RowFactory, TargetType, Value, create_row_factory,
    };
    use std::sync::{Arc, Mutex};
    use time::macros::datetime;

    fn parse<T>(config: Arc<Config>, set: MemoryResultSet) -> Result<Vec<T>>
    where
        T: sprocket::ResultShape,
    {
        let ctx = ParseContext::new(config.clone(), CancellationToken::new());
        let mut cursor = MemoryCursor::new([set]);
        create_row_factory::<T>(&config)?.parse_rows(&mut cursor, &ctx)
    }

    fn products() -> MemoryResultSet {
        MemoryResultSet::new([
            ("price", Value::Float64(None)),
            ("name", Value::Varchar(None)),
            ("id", Value::Int32(None)),
        ])
        .row([
            Value::Float64(Some(9.99)),
            Value::Varchar(Some("Pencil".into())),
            Value::Int32(Some(1)),
        ])
        .row([
            Value::Float64(Some(120.0)),
            Value::Varchar(Some("Stapler".into())),
            Value::Int32(Some(2)),
        ])
    }

    #[test]
    fn fields() {
        let fields = Product::fields();
        assert_eq!(fields.len(), 5);
        assert_eq!(fields[0].name, "id");
        assert_eq!(fields[2].target, TargetType::Scalar(Value::Float64(None)));
        assert!(!fields[2].nullable);
        assert!(fields[3].optional);
        assert!(fields[3].nullable);

        let fields = Customer::fields();
        assert_eq!(fields.len(), 5, "skipped fields are not mapped");
        assert_eq!(fields[0].column, "CustomerId");
        assert_eq!(fields[1].column, "FullName");
        assert_eq!(fields[1].transformers.len(), 1);
        assert_eq!(fields[2].name, "email");
        assert_eq!(fields[2].column, "e_mail");
        assert_eq!(fields[4].tags, ["utc"]);
    }

    #[test]
    fn columns_in_any_order() {
        init_logs();
        let result = parse::<Product>(Config::builder().build(), products()).unwrap();
        assert_eq!(
            result,
            [
                Product::new(1, "Pencil", 9.99),
                Product::new(2, "Stapler", 120.0)
            ]
        );
    }

    #[test]
    fn optional_columns_keep_defaults() {
        init_logs();
        let result = parse::<Product>(Config::builder().build(), products()).unwrap();
        assert!(result.iter().all(|v| v.description.is_none()));
        assert!(result.iter().all(|v| v.status == Status::Pending));
    }

    #[test]
    fn missing_columns_are_listed_together() {
        init_logs();
        let set = MemoryResultSet::new([("id", Value::Int32(None))]).row([Value::Int32(Some(1))]);
        let error = parse::<Product>(Config::builder().build(), set).unwrap_err();
        assert_eq!(
            error.to_string(),
            "The properties `name`, `price` of `Product` have no matching columns in the result set"
        );
        assert!(matches!(
            error.downcast_ref::<MaterializeError>(),
            Some(MaterializeError::MissingColumns { properties, .. }) if properties.len() == 2
        ));

        let set = MemoryResultSet::new([
            ("id", Value::Int32(None)),
            ("name", Value::Varchar(None)),
        ]);
        let error = parse::<Product>(Config::builder().build(), set).unwrap_err();
        assert_eq!(
            error.to_string(),
            "The property `price` of `Product` has no matching column in the result set"
        );
    }

    #[test]
    fn missing_column_fails_without_rows() {
        init_logs();
        let set = MemoryResultSet::new([("id", Value::Int32(None))]);
        assert!(parse::<Product>(Config::builder().build(), set).is_err());
    }

    #[test]
    fn bindings_follow_the_layout() {
        let layout = ColumnLayout::new([
            ColumnDescriptor::new("description", 0, Value::Varchar(None)),
            ColumnDescriptor::new("ID", 1, Value::Int32(None)),
            ColumnDescriptor::new("Name", 2, Value::Varchar(None)),
            ColumnDescriptor::new("price", 3, Value::Float64(None)),
        ]);
        let bindings = Bindings::resolve::<Product>(&layout).unwrap();
        assert_eq!(bindings.properties, [(0, 1), (1, 2), (2, 3), (3, 0)]);

        let factory = ComplexFactory::<Product>::new();
        let first = factory.bindings(&layout).unwrap();
        let second = factory.bindings(&layout).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn strict_numbers() {
        init_logs();
        let set = MemoryResultSet::new([
            ("id", Value::Int32(None)),
            ("name", Value::Varchar(None)),
            ("price", Value::Int32(None)),
        ])
        .row([
            Value::Int32(Some(1)),
            Value::Varchar(Some("Eraser".into())),
            Value::Int32(Some(3)),
        ]);
        let error = parse::<Product>(Config::builder().build(), set.clone()).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Error setting [Double] price. Stored Procedure returns [Int32]."
        );
        let result =
            parse::<Product>(Config::builder().convert_numeric(true).build(), set).unwrap();
        assert_eq!(result, [Product::new(1, "Eraser", 3.0)]);
    }

    #[test]
    fn mismatch_message() {
        init_logs();
        let set = MemoryResultSet::new([
            ("id", Value::Int32(None)),
            ("name", Value::Varchar(None)),
            ("price", Value::Varchar(None)),
        ])
        .row([
            Value::Int32(Some(1)),
            Value::Varchar(Some("Eraser".into())),
            Value::Varchar(Some("cheap".into())),
        ]);
        let error = parse::<Product>(Config::builder().build(), set).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Error setting [Double] price. Stored Procedure returns [String]."
        );
        let Some(MaterializeError::Coercion {
            property,
            expected,
            actual,
            value,
        }) = error.downcast_ref::<MaterializeError>()
        else {
            panic!("Unexpected error: {error:#}");
        };
        assert_eq!(property, "price");
        assert_eq!(expected, "Double");
        assert_eq!(actual, "String");
        assert_eq!(value, "\"cheap\"");
    }

    #[test]
    fn null_into_required_property() {
        init_logs();
        let set = MemoryResultSet::new([
            ("id", Value::Int32(None)),
            ("name", Value::Varchar(None)),
            ("price", Value::Float64(None)),
        ])
        .row([Value::Int32(Some(4)), Value::Null, Value::Float64(None)]);
        let result = parse::<Product>(Config::builder().build(), set).unwrap();
        assert_eq!(result, [Product::new(4, "", 0.0)]);
    }

    /// Records every value given to `transform`.
    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<Value>>,
    }

    impl DataTransformer for Recorder {
        fn can_transform(&self, _: &Value, _: &TargetType, _: bool, _: &Attributes) -> bool {
            true
        }
        fn transform(
            &self,
            value: Value,
            _: &TargetType,
            _: bool,
            _: &Attributes,
        ) -> Result<Value> {
            self.seen.lock().unwrap().push(value.clone());
            Ok(value)
        }
    }

    fn customers() -> MemoryResultSet {
        MemoryResultSet::new([
            ("customerid", Value::Int64(None)),
            ("FullName", Value::Varchar(None)),
            ("e_mail", Value::Varchar(None)),
            ("Credit", Value::Decimal(None)),
            ("Registered", Value::TimestampWithTimezone(None)),
        ])
        .row([
            Value::Int64(Some(10)),
            Value::Varchar(Some("  Ada Lovelace ".into())),
            Value::Null,
            Value::Decimal(Some(Decimal::new(15050, 2))),
            Value::TimestampWithTimezone(Some(datetime!(2024-01-15 08:00:00 UTC))),
        ])
        .row([
            Value::Int64(Some(11)),
            Value::Varchar(Some("Alan Turing".into())),
            Value::Varchar(Some("alan@example.com".into())),
            Value::Decimal(None),
            Value::TimestampWithTimezone(None),
        ])
    }

    #[test]
    fn nulls_never_reach_transformers() {
        init_logs();
        let recorder = Arc::new(Recorder::default());
        let config = Config::builder().transformer(recorder.clone()).build();
        let result = parse::<Customer>(config, customers()).unwrap();
        assert_eq!(result[0].email, None);
        assert_eq!(result[1].credit, None);
        assert_eq!(result[1].registered, None);
        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen.len(), 7);
        assert!(seen.iter().all(|v| !v.is_null()));
    }

    #[test]
    fn renamed_and_transformed_columns() {
        init_logs();
        let result = parse::<Customer>(Config::builder().build(), customers()).unwrap();
        assert_eq!(
            result,
            [
                Customer {
                    customer_id: 10,
                    full_name: "Ada Lovelace".into(),
                    email: None,
                    credit: Some(Decimal::new(15050, 2)),
                    registered: Some(datetime!(2024-01-15 08:00:00 UTC)),
                    loaded: false,
                },
                Customer {
                    customer_id: 11,
                    full_name: "Alan Turing".into(),
                    email: Some("alan@example.com".into()),
                    credit: None,
                    registered: None,
                    loaded: false,
                },
            ]
        );
    }

    #[test]
    fn procedure_single_set() {
        init_logs();
        let procedure = Procedure::<(Product,)>::new("GetProducts")
            .schema("catalog")
            .config(Config::builder().build());
        assert_eq!(procedure.full_name(), "catalog.GetProducts");
        let mut cursor = MemoryCursor::new([products()]);
        let (products,) = procedure
            .execute(&mut cursor, &CancellationToken::new())
            .unwrap();
        assert_eq!(products.len(), 2);
        // The factories are kept by the procedure
        let mut cursor = MemoryCursor::new([self::products()]);
        let (again,) = procedure
            .execute(&mut cursor, &CancellationToken::new())
            .unwrap();
        assert_eq!(products, again);
    }
}
