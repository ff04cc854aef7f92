mod resource {
    pub mod logs;
    pub mod shop;
}

#[cfg(test)]
mod tests {
    use crate::resource::{
        logs::init_logs,
        shop::{Order, OrderLine, Product, Status},
    };
    use rust_decimal::Decimal;
    use sprocket::{
        CancellationToken, Config, MaterializeError, MemoryCursor, MemoryResultSet,
        OutputParameter, Procedure, Record, RowLabeled, Value, is_cancelled, is_timeout,
        read_all,
    };
    use std::{thread, time::Duration};

    fn products() -> MemoryResultSet {
        MemoryResultSet::new([
            ("id", Value::Int32(None)),
            ("name", Value::Varchar(None)),
            ("price", Value::Float64(None)),
            ("status", Value::Varchar(None)),
        ])
        .row([
            Value::Int32(Some(1)),
            Value::from("Pencil"),
            Value::Float64(Some(1.5)),
            Value::from("Shipped"),
        ])
    }

    fn totals() -> MemoryResultSet {
        MemoryResultSet::new([("total", Value::Decimal(None))])
            .row([Value::Decimal(Some(Decimal::new(1999, 2)))])
    }

    fn slow(rows: usize) -> MemoryResultSet {
        MemoryResultSet::new([("n", Value::Int64(None))])
            .rows((0..rows as i64).map(|i| [Value::Int64(Some(i))]))
    }

    #[test]
    fn several_result_sets() {
        init_logs();
        let procedure = Procedure::<(Product, Decimal, RowLabeled)>::new("Report")
            .config(Config::builder().build());
        let mut cursor = MemoryCursor::new([
            products(),
            totals(),
            MemoryResultSet::new([("note", Value::Varchar(None))]).row([Value::from("ok")]),
        ]);
        let (products, totals, notes) = procedure
            .execute(&mut cursor, &CancellationToken::new())
            .unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].status, Status::Shipped);
        assert_eq!(totals, [Decimal::new(1999, 2)]);
        assert_eq!(notes[0].get::<String>("note").unwrap(), "ok");
    }

    #[test]
    fn hierarchy_then_more_sets() {
        init_logs();
        let orders = MemoryResultSet::new([
            ("order_id", Value::Int64(None)),
            ("customer", Value::Varchar(None)),
        ])
        .row([Value::Int64(Some(5)), Value::from("Ada")]);
        let lines = MemoryResultSet::new([
            ("order_id", Value::Int64(None)),
            ("sku", Value::Varchar(None)),
            ("quantity", Value::Int32(None)),
        ])
        .row([Value::Int64(Some(5)), Value::from("X-1"), Value::Int32(Some(3))]);
        let notes = MemoryResultSet::new([
            ("OrderRef", Value::Int32(None)),
            ("text", Value::Varchar(None)),
        ]);
        let procedure =
            Procedure::<(Order, i32)>::new("Orders").config(Config::builder().build());
        let count =
            MemoryResultSet::new([("count", Value::Int32(None))]).row([Value::Int32(Some(1))]);
        let mut cursor = MemoryCursor::new([orders, lines, notes, count]);
        let (orders, count) = procedure
            .execute(&mut cursor, &CancellationToken::new())
            .unwrap();
        assert_eq!(
            orders[0].lines,
            [OrderLine {
                order_id: 5,
                sku: "X-1".into(),
                quantity: 3
            }]
        );
        assert!(orders[0].notes.is_empty());
        assert_eq!(count, [1]);
    }

    #[test]
    fn missing_result_set() {
        init_logs();
        let procedure =
            Procedure::<(Product, Decimal)>::new("Report").config(Config::builder().build());
        let mut cursor = MemoryCursor::new([products()]);
        let error = procedure
            .execute(&mut cursor, &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<MaterializeError>(),
            Some(MaterializeError::MissingResultSet { .. })
        ));
    }

    #[test]
    fn errors_name_the_result_set() {
        init_logs();
        let procedure =
            Procedure::<(Product, Decimal)>::new("Report").config(Config::builder().build());
        let broken =
            MemoryResultSet::new([("total", Value::Varchar(None))]).row([Value::from("x")]);
        let mut cursor = MemoryCursor::new([products(), broken]);
        let error = procedure
            .execute(&mut cursor, &CancellationToken::new())
            .unwrap_err();
        let message = format!("{error:#}");
        assert!(message.starts_with("While reading result set 1 into `"), "{message}");
        assert!(
            message.contains("Error setting [Decimal] total. Stored Procedure returns [String]."),
            "{message}"
        );
    }

    #[test]
    fn output_parameters() {
        init_logs();
        let total = OutputParameter::new("@Total");
        let status = OutputParameter::new("ReturnValue");
        let procedure = Procedure::<(Product,)>::new("Report")
            .config(Config::builder().build())
            .output(total.clone())
            .output(status.clone());
        let mut cursor = MemoryCursor::new([products()])
            .with_output("total", Value::Decimal(Some(Decimal::new(150, 2))))
            .with_output("@returnvalue", Value::Int32(Some(0)))
            .with_output("@Unknown", Value::Int32(Some(9)));
        assert_eq!(total.value(), Value::Null);
        procedure
            .execute(&mut cursor, &CancellationToken::new())
            .unwrap();
        assert_eq!(total.get::<Decimal>().unwrap(), Decimal::new(150, 2));
        assert_eq!(status.get::<i32>().unwrap(), 0);
    }

    #[test]
    fn outputs_untouched_on_failure() {
        init_logs();
        let total = OutputParameter::new("total");
        let procedure = Procedure::<(Product, Decimal)>::new("Report")
            .config(Config::builder().build())
            .output(total.clone());
        let mut cursor = MemoryCursor::new([products()])
            .with_output("total", Value::Decimal(Some(Decimal::ONE)));
        assert!(
            procedure
                .execute(&mut cursor, &CancellationToken::new())
                .is_err()
        );
        assert_eq!(total.value(), Value::Null);
    }

    #[test]
    fn cancelled_before_start() {
        init_logs();
        let procedure = Procedure::<(Product,)>::new("Report").config(Config::builder().build());
        let mut cursor = MemoryCursor::new([products()]);
        let token = CancellationToken::new();
        token.cancel();
        let error = procedure.execute(&mut cursor, &token).unwrap_err();
        assert!(is_cancelled(&error));
        assert!(!is_timeout(&error));
        assert_eq!(cursor.row_reads(), 0);
    }

    #[test]
    fn cancelled_while_running() {
        init_logs();
        let procedure = Procedure::<(i64,)>::new("Slow").config(Config::builder().build());
        let mut cursor = MemoryCursor::new([slow(10_000)]).with_delay(Duration::from_millis(1));
        let token = CancellationToken::new();
        let error = thread::scope(|scope| {
            let canceller = token.clone();
            scope.spawn(move || {
                thread::sleep(Duration::from_millis(30));
                canceller.cancel();
            });
            procedure.execute(&mut cursor, &token).unwrap_err()
        });
        assert!(is_cancelled(&error), "{error:#}");
        assert!(!is_timeout(&error));
        assert!(cursor.is_cancelled(), "the command is cancelled too");
        assert!(cursor.row_reads() < 10_000);
    }

    #[test]
    fn timeout() {
        init_logs();
        let procedure = Procedure::<(i64,)>::new("Slow")
            .config(Config::builder().build())
            .timeout(Duration::from_millis(40));
        assert_eq!(procedure.effective_timeout(), Some(Duration::from_millis(40)));
        let mut cursor = MemoryCursor::new([slow(10_000)]).with_delay(Duration::from_millis(1));
        let token = CancellationToken::new();
        let error = procedure.execute(&mut cursor, &token).unwrap_err();
        assert!(is_timeout(&error), "{error:#}");
        assert!(!is_cancelled(&error));
        assert!(cursor.is_cancelled());
        assert!(!token.is_cancelled());
    }

    #[test]
    fn default_timeout_from_config() {
        let config = Config::builder()
            .default_timeout(Duration::from_secs(3))
            .build();
        let procedure = Procedure::<(i64,)>::new("Slow").config(config.clone());
        assert_eq!(procedure.effective_timeout(), Some(Duration::from_secs(3)));
        let procedure = Procedure::<(i64,)>::new("Slow")
            .config(config)
            .timeout(Duration::from_secs(1));
        assert_eq!(procedure.effective_timeout(), Some(Duration::from_secs(1)));
    }

    #[tokio::test]
    async fn several_result_sets_async() {
        init_logs();
        let procedure = Procedure::<(Product, Decimal)>::new("Report")
            .config(Config::builder().build());
        let total = OutputParameter::new("total");
        let procedure = procedure.output(total.clone());
        let mut cursor = MemoryCursor::new([products(), totals()])
            .with_output("total", Value::Decimal(Some(Decimal::TEN)));
        let (products, totals) = procedure
            .execute_async(&mut cursor, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(products[0].name, "Pencil");
        assert_eq!(totals, [Decimal::new(1999, 2)]);
        assert_eq!(total.get::<Decimal>().unwrap(), Decimal::TEN);
    }

    #[tokio::test]
    async fn timeout_async() {
        init_logs();
        let procedure = Procedure::<(i64,)>::new("Slow")
            .config(Config::builder().build())
            .timeout(Duration::from_millis(40));
        let mut cursor = MemoryCursor::new([slow(10_000)]).with_delay(Duration::from_millis(1));
        let error = procedure
            .execute_async(&mut cursor, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(is_timeout(&error), "{error:#}");
        assert!(cursor.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_async() {
        init_logs();
        let procedure = Procedure::<(i64,)>::new("Slow").config(Config::builder().build());
        let mut cursor = MemoryCursor::new([slow(10_000)]).with_delay(Duration::from_millis(1));
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            canceller.cancel();
        });
        let error = procedure
            .execute_async(&mut cursor, &token)
            .await
            .unwrap_err();
        assert!(is_cancelled(&error), "{error:#}");
        assert!(!is_timeout(&error));
        assert!(cursor.is_cancelled());
    }

    trait Priced: Send + std::fmt::Debug {
        fn price(&self) -> f64;
    }

    impl Priced for Product {
        fn price(&self) -> f64 {
            self.price
        }
    }

    #[test]
    fn abstract_results() {
        init_logs();
        let config = Config::builder()
            .implement::<dyn Priced, Product>(|v| Box::new(v))
            .build();
        assert!(config.implementations().contains::<dyn Priced>());
        assert!(
            config
                .implementations()
                .implementation_of::<dyn Priced>()
                .is_some_and(|v| v.ends_with("Product"))
        );
        let procedure = Procedure::<(Box<dyn Priced>,)>::new("Report").config(config);
        let mut cursor = MemoryCursor::new([products()]);
        let (priced,) = procedure
            .execute(&mut cursor, &CancellationToken::new())
            .unwrap();
        assert_eq!(priced[0].price(), 1.5);
    }

    #[test]
    fn unregistered_abstract_result() {
        init_logs();
        let procedure =
            Procedure::<(Box<dyn Priced>,)>::new("Report").config(Config::builder().build());
        let mut cursor = MemoryCursor::new([products()]);
        let error = procedure
            .execute(&mut cursor, &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<MaterializeError>(),
            Some(MaterializeError::UnsupportedShape { reason, .. })
                if reason == "it is abstract and no implementation is registered"
        ));
        assert_eq!(cursor.row_reads(), 0);
    }

    #[test]
    fn read_all_uses_the_current_config() {
        init_logs();
        let whole =
            || MemoryResultSet::new([("n", Value::Int32(None))]).row([Value::Int32(Some(7))]);
        let mut cursor = MemoryCursor::new([whole()]);
        assert!(read_all::<i64>(&mut cursor, &CancellationToken::new()).is_err());

        let config = Config::builder().convert_numeric(true).build();
        let result = Config::scoped(config, || {
            let mut cursor = MemoryCursor::new([whole()]);
            read_all::<i64>(&mut cursor, &CancellationToken::new())
        });
        assert_eq!(result.unwrap(), [7]);
    }

    #[test]
    fn record_names() {
        assert_eq!(Product::NAME, "Product");
        assert_eq!(Order::NAME, "Order");
    }
}
