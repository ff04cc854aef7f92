#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use sprocket_core::{CoerceOptions, EnumType, TargetType, Value, coerce};
    use std::str::FromStr;

    const STRICT: CoerceOptions = CoerceOptions {
        convert_numeric: false,
        ignore_case: false,
    };
    const CONVERT: CoerceOptions = CoerceOptions {
        convert_numeric: true,
        ignore_case: false,
    };

    fn scalar(value: Value) -> TargetType {
        TargetType::Scalar(value)
    }

    fn colors() -> TargetType {
        TargetType::Enum(EnumType {
            name: "Colors",
            underlying: Value::Int32(None),
            flags: true,
            variants: &[("Red", 1), ("Green", 2), ("Blue", 4)],
        })
    }

    fn status() -> TargetType {
        TargetType::Enum(EnumType {
            name: "Status",
            underlying: Value::Int16(None),
            flags: false,
            variants: &[("Pending", 1), ("Shipped", 2), ("Delivered", 3)],
        })
    }

    #[test]
    fn null_becomes_empty_target() {
        let result = coerce(Value::Varchar(None), &scalar(Value::Float64(None)), &STRICT).unwrap();
        assert_eq!(result, Value::Float64(None));
        let result = coerce(Value::Null, &status(), &STRICT).unwrap();
        assert_eq!(result, Value::Int16(None));
    }

    #[test]
    fn same_type_passes_through() {
        let result = coerce(
            Value::Varchar(Some("hello".into())),
            &scalar(Value::Varchar(None)),
            &STRICT,
        )
        .unwrap();
        assert_eq!(result, Value::Varchar(Some("hello".into())));
    }

    #[test]
    fn strict_mode_rejects_widening() {
        let failure = coerce(
            Value::Int32(Some(7)),
            &scalar(Value::Float64(None)),
            &STRICT,
        )
        .unwrap_err();
        assert_eq!(failure.value, Value::Int32(Some(7)));
        assert_eq!(failure.reason, "Cannot convert Int32 to Double");
    }

    #[test]
    fn convert_mode_widens_and_narrows() {
        assert_eq!(
            coerce(Value::Int32(Some(7)), &scalar(Value::Float64(None)), &CONVERT).unwrap(),
            Value::Float64(Some(7.0))
        );
        assert_eq!(
            coerce(Value::Int64(Some(300)), &scalar(Value::Int16(None)), &CONVERT).unwrap(),
            Value::Int16(Some(300))
        );
        assert!(coerce(Value::Int64(Some(300)), &scalar(Value::UInt8(None)), &CONVERT).is_err());
        assert!(coerce(Value::Int32(Some(-1)), &scalar(Value::UInt32(None)), &CONVERT).is_err());
        assert_eq!(
            coerce(
                Value::Decimal(Some(Decimal::from_str("12.50").unwrap())),
                &scalar(Value::Float64(None)),
                &CONVERT
            )
            .unwrap(),
            Value::Float64(Some(12.5))
        );
        assert_eq!(
            coerce(Value::Float64(Some(2.25)), &scalar(Value::Decimal(None)), &CONVERT).unwrap(),
            Value::Decimal(Some(Decimal::from_str("2.25").unwrap()))
        );
    }

    #[test]
    fn floats_round_half_to_even() {
        assert_eq!(
            coerce(Value::Float64(Some(2.5)), &scalar(Value::Int32(None)), &CONVERT).unwrap(),
            Value::Int32(Some(2))
        );
        assert_eq!(
            coerce(Value::Float64(Some(3.5)), &scalar(Value::Int32(None)), &CONVERT).unwrap(),
            Value::Int32(Some(4))
        );
        assert_eq!(
            coerce(
                Value::Decimal(Some(Decimal::from_str("-0.5").unwrap())),
                &scalar(Value::Int64(None)),
                &CONVERT
            )
            .unwrap(),
            Value::Int64(Some(0))
        );
        let nan = Value::Float64(Some(f64::NAN));
        assert!(coerce(nan, &scalar(Value::Int32(None)), &CONVERT).is_err());
    }

    #[test]
    fn numbers_and_booleans() {
        assert!(coerce(Value::Int32(Some(1)), &scalar(Value::Boolean(None)), &STRICT).is_err());
        assert_eq!(
            coerce(Value::Int32(Some(5)), &scalar(Value::Boolean(None)), &CONVERT).unwrap(),
            Value::Boolean(Some(true))
        );
        assert_eq!(
            coerce(Value::Boolean(Some(true)), &scalar(Value::Int64(None)), &CONVERT).unwrap(),
            Value::Int64(Some(1))
        );
    }

    #[test]
    fn strings_never_become_numbers() {
        let failure = coerce(
            Value::Varchar(Some("12".into())),
            &scalar(Value::Int32(None)),
            &CONVERT,
        )
        .unwrap_err();
        assert_eq!(failure.value.received_type_name(), "String");
    }

    #[test]
    fn enum_from_name() {
        assert_eq!(
            coerce(Value::Varchar(Some("Shipped".into())), &status(), &STRICT).unwrap(),
            Value::Int16(Some(2))
        );
        assert!(coerce(Value::Varchar(Some("shipped".into())), &status(), &STRICT).is_err());
        let ignore_case = CoerceOptions {
            ignore_case: true,
            ..STRICT
        };
        assert_eq!(
            coerce(Value::Varchar(Some("shipped".into())), &status(), &ignore_case).unwrap(),
            Value::Int16(Some(2))
        );
        assert!(coerce(Value::Varchar(Some("Lost".into())), &status(), &STRICT).is_err());
    }

    #[test]
    fn enum_from_number() {
        assert_eq!(
            coerce(Value::Int16(Some(3)), &status(), &STRICT).unwrap(),
            Value::Int16(Some(3))
        );
        // Declared type differs from the underlying one
        assert!(coerce(Value::Int32(Some(3)), &status(), &STRICT).is_err());
        assert_eq!(
            coerce(Value::Int32(Some(3)), &status(), &CONVERT).unwrap(),
            Value::Int16(Some(3))
        );
        let failure = coerce(Value::Int16(Some(9)), &status(), &STRICT).unwrap_err();
        assert_eq!(failure.reason, "9 is not a defined value of Status");
    }

    #[test]
    fn flags_from_names() {
        assert_eq!(
            coerce(Value::Varchar(Some("Red, Blue".into())), &colors(), &STRICT).unwrap(),
            Value::Int32(Some(5))
        );
        assert_eq!(
            coerce(Value::Varchar(Some("Green".into())), &colors(), &STRICT).unwrap(),
            Value::Int32(Some(2))
        );
        // Undeclared combinations are fine for flags
        assert_eq!(
            coerce(Value::Int32(Some(7)), &colors(), &STRICT).unwrap(),
            Value::Int32(Some(7))
        );
        assert!(coerce(Value::Varchar(Some("Red,,Blue".into())), &colors(), &STRICT).is_err());
    }

    #[test]
    fn names_list_requires_flags() {
        let failure = coerce(
            Value::Varchar(Some("Pending, Shipped".into())),
            &status(),
            &STRICT,
        )
        .unwrap_err();
        assert_eq!(
            failure.reason,
            "`Pending, Shipped` combines several names but Status is not a flags enum"
        );
    }
}
