use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Product category. The ids are fixed and mirror the `idrubro` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rubro {
    Hombre = 1,
    Mujer = 2,
    Teens = 3,
    Kids = 4,
}

impl Rubro {
    /// Case-insensitive lookup by category name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "hombre" => Some(Rubro::Hombre),
            "mujer" => Some(Rubro::Mujer),
            "teens" => Some(Rubro::Teens),
            "kids" => Some(Rubro::Kids),
            _ => None,
        }
    }

    pub fn id(self) -> i32 {
        self as i32
    }
}

/// Body of `PUT /productos/{id}`. Only a missing key means "not supplied";
/// `0` and `false` are real values. A numeric field sent as `null` is
/// treated as missing, while `"destacado": null` is a supplied falsy flag.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct ProductPatch {
    pub precio: Option<f64>,
    pub stock: Option<i32>,
    pub descuento: Option<f64>,
    #[serde(default, deserialize_with = "present")]
    pub destacado: Option<Value>,
}

/// Any present value, `null` included.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl ProductPatch {
    /// `destacado` coerced to the stored 0/1 form.
    pub fn destacado_flag(&self) -> Option<i32> {
        self.destacado.as_ref().map(|v| i32::from(is_truthy(v)))
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Query string of `GET /productos`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ProductFilter {
    pub rubro: Option<String>,
    pub destacado: Option<String>,
}

impl ProductFilter {
    /// Resolved category; unknown names yield no filter.
    pub fn rubro(&self) -> Option<Rubro> {
        self.rubro.as_deref().and_then(Rubro::from_name)
    }

    pub fn only_destacados(&self) -> bool {
        matches!(self.destacado.as_deref(), Some("true") | Some("1"))
    }
}

/// Query string of `GET /productos/buscar`.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}
