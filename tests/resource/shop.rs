use rust_decimal::Decimal;
use sprocket::{Record, ResultEnum, TrimString, result_flags};
use time::OffsetDateTime;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ResultEnum)]
#[repr(i16)]
pub enum Status {
    #[default]
    Pending = 1,
    Shipped = 2,
    #[sprocket(name = "Done")]
    Delivered = 3,
}

result_flags! {
    pub struct Colors: i32 {
        Red = 1,
        Green = 2,
        Blue = 4,
    }
}

#[derive(Debug, Default, Clone, PartialEq, Record)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub price: f64,
    #[sprocket(optional)]
    pub description: Option<String>,
    #[sprocket(optional)]
    pub status: Status,
}

impl Product {
    pub fn new(id: i32, name: &str, price: f64) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            ..Default::default()
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Record)]
#[sprocket(rename_all = "PascalCase")]
pub struct Customer {
    pub customer_id: i64,
    #[sprocket(transform(TrimString))]
    pub full_name: String,
    #[sprocket(name = "e_mail")]
    pub email: Option<String>,
    pub credit: Option<Decimal>,
    #[sprocket(optional, tag = "utc")]
    pub registered: Option<OffsetDateTime>,
    #[sprocket(skip)]
    pub loaded: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Record)]
pub struct Order {
    #[sprocket(key)]
    pub order_id: i64,
    pub customer: String,
    #[sprocket(children(foreign_key = "order_id"))]
    pub lines: Vec<OrderLine>,
    #[sprocket(children(foreign_key = "order_ref"))]
    pub notes: Vec<OrderNote>,
}

#[derive(Debug, Default, Clone, PartialEq, Record)]
pub struct OrderLine {
    pub order_id: i64,
    pub sku: String,
    pub quantity: i32,
}

#[derive(Debug, Default, Clone, PartialEq, Record)]
pub struct OrderNote {
    #[sprocket(name = "OrderRef")]
    pub order_ref: i32,
    pub text: String,
}

#[derive(Debug, Default, Clone, PartialEq, Record)]
pub struct Painting {
    pub title: String,
    pub palette: Colors,
    pub status: Option<Status>,
}
