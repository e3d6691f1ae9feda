//! Literal injection values.
//!
//! A field tagged with `#[inject(value = "...")]` receives a primitive
//! parsed once, at registration time. The parsed [`LiteralValue`] is
//! copied into every instance the container builds.

use std::fmt;
use std::num::{ParseFloatError, ParseIntError};
use std::str::FromStr;

use crate::introspect::Value;

/// A complex number with real and imaginary parts.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Complex<T> {
    pub re: T,
    pub im: T,
}

impl<T> Complex<T> {
    pub const fn new(re: T, im: T) -> Self {
        Self { re, im }
    }
}

pub type Complex32 = Complex<f32>;
pub type Complex64 = Complex<f64>;

/// The primitive types a literal can be parsed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
    Bool,
    Str,
    Complex32,
    Complex64,
}

/// A parsed literal, ready to be injected.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Usize(usize),
    F32(f32),
    F64(f64),
    Bool(bool),
    Str(String),
    Complex32(Complex32),
    Complex64(Complex64),
}

/// Error produced when a literal cannot be parsed into its field's kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LiteralError {
    #[error("invalid integer: {0}")]
    Int(#[from] ParseIntError),

    #[error("invalid float: {0}")]
    Float(#[from] ParseFloatError),

    #[error("invalid boolean {0:?}")]
    Bool(String),

    #[error("invalid complex number {0:?}")]
    Complex(String),
}

impl PrimitiveKind {
    /// Parses `raw` into a value of this kind.
    ///
    /// ```
    /// use anbar_container::literal::{LiteralValue, PrimitiveKind};
    ///
    /// assert_eq!(PrimitiveKind::I32.parse("29").unwrap(), LiteralValue::I32(29));
    /// assert_eq!(PrimitiveKind::Bool.parse("T").unwrap(), LiteralValue::Bool(true));
    /// assert!(PrimitiveKind::U8.parse("256").is_err());
    /// ```
    pub fn parse(&self, raw: &str) -> Result<LiteralValue, LiteralError> {
        let value = match self {
            PrimitiveKind::I8 => LiteralValue::I8(raw.parse()?),
            PrimitiveKind::I16 => LiteralValue::I16(raw.parse()?),
            PrimitiveKind::I32 => LiteralValue::I32(raw.parse()?),
            PrimitiveKind::I64 => LiteralValue::I64(raw.parse()?),
            PrimitiveKind::Isize => LiteralValue::Isize(raw.parse()?),
            PrimitiveKind::U8 => LiteralValue::U8(raw.parse()?),
            PrimitiveKind::U16 => LiteralValue::U16(raw.parse()?),
            PrimitiveKind::U32 => LiteralValue::U32(raw.parse()?),
            PrimitiveKind::U64 => LiteralValue::U64(raw.parse()?),
            PrimitiveKind::Usize => LiteralValue::Usize(raw.parse()?),
            PrimitiveKind::F32 => LiteralValue::F32(raw.parse()?),
            PrimitiveKind::F64 => LiteralValue::F64(raw.parse()?),
            PrimitiveKind::Bool => LiteralValue::Bool(parse_bool(raw)?),
            PrimitiveKind::Str => LiteralValue::Str(raw.to_string()),
            PrimitiveKind::Complex32 => LiteralValue::Complex32(parse_complex(raw)?),
            PrimitiveKind::Complex64 => LiteralValue::Complex64(parse_complex(raw)?),
        };
        Ok(value)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrimitiveKind::I8 => "i8",
            PrimitiveKind::I16 => "i16",
            PrimitiveKind::I32 => "i32",
            PrimitiveKind::I64 => "i64",
            PrimitiveKind::Isize => "isize",
            PrimitiveKind::U8 => "u8",
            PrimitiveKind::U16 => "u16",
            PrimitiveKind::U32 => "u32",
            PrimitiveKind::U64 => "u64",
            PrimitiveKind::Usize => "usize",
            PrimitiveKind::F32 => "f32",
            PrimitiveKind::F64 => "f64",
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Str => "String",
            PrimitiveKind::Complex32 => "Complex32",
            PrimitiveKind::Complex64 => "Complex64",
        };
        f.write_str(name)
    }
}

impl LiteralValue {
    /// Boxes a fresh copy of the native value for one constructor call.
    pub fn to_value(&self) -> Value {
        match self {
            LiteralValue::I8(v) => Box::new(*v),
            LiteralValue::I16(v) => Box::new(*v),
            LiteralValue::I32(v) => Box::new(*v),
            LiteralValue::I64(v) => Box::new(*v),
            LiteralValue::Isize(v) => Box::new(*v),
            LiteralValue::U8(v) => Box::new(*v),
            LiteralValue::U16(v) => Box::new(*v),
            LiteralValue::U32(v) => Box::new(*v),
            LiteralValue::U64(v) => Box::new(*v),
            LiteralValue::Usize(v) => Box::new(*v),
            LiteralValue::F32(v) => Box::new(*v),
            LiteralValue::F64(v) => Box::new(*v),
            LiteralValue::Bool(v) => Box::new(*v),
            LiteralValue::Str(v) => Box::new(v.clone()),
            LiteralValue::Complex32(v) => Box::new(*v),
            LiteralValue::Complex64(v) => Box::new(*v),
        }
    }

    pub fn kind(&self) -> PrimitiveKind {
        match self {
            LiteralValue::I8(_) => PrimitiveKind::I8,
            LiteralValue::I16(_) => PrimitiveKind::I16,
            LiteralValue::I32(_) => PrimitiveKind::I32,
            LiteralValue::I64(_) => PrimitiveKind::I64,
            LiteralValue::Isize(_) => PrimitiveKind::Isize,
            LiteralValue::U8(_) => PrimitiveKind::U8,
            LiteralValue::U16(_) => PrimitiveKind::U16,
            LiteralValue::U32(_) => PrimitiveKind::U32,
            LiteralValue::U64(_) => PrimitiveKind::U64,
            LiteralValue::Usize(_) => PrimitiveKind::Usize,
            LiteralValue::F32(_) => PrimitiveKind::F32,
            LiteralValue::F64(_) => PrimitiveKind::F64,
            LiteralValue::Bool(_) => PrimitiveKind::Bool,
            LiteralValue::Str(_) => PrimitiveKind::Str,
            LiteralValue::Complex32(_) => PrimitiveKind::Complex32,
            LiteralValue::Complex64(_) => PrimitiveKind::Complex64,
        }
    }
}

/// Types that can be filled from a literal tag.
///
/// Implemented for the integer and float primitives, `bool`, `String`
/// and the [`Complex`] aliases, and for any number of `Box` levels around
/// them.
pub trait Literal: Sized + 'static {
    const KIND: PrimitiveKind;

    /// Takes the field value out of the slot produced by
    /// [`LiteralValue::to_value`]. Hands the slot back if it holds another type.
    fn from_value(value: Value) -> Result<Self, Value> {
        value.downcast::<Self>().map(|boxed| *boxed)
    }
}

/// The literal is parsed into `T`, then allocated one level up.
impl<T: Literal> Literal for Box<T> {
    const KIND: PrimitiveKind = T::KIND;

    fn from_value(value: Value) -> Result<Self, Value> {
        T::from_value(value).map(Box::new)
    }
}

macro_rules! impl_literal {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Literal for $ty {
                const KIND: PrimitiveKind = PrimitiveKind::$kind;
            }
        )*
    };
}

impl_literal! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    bool => Bool,
    String => Str,
    Complex32 => Complex32,
    Complex64 => Complex64,
}

fn parse_bool(raw: &str) -> Result<bool, LiteralError> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(LiteralError::Bool(raw.to_string())),
    }
}

/// Accepts `N`, `Ni` and `N±Ni`, optionally wrapped in parentheses.
fn parse_complex<T>(raw: &str) -> Result<Complex<T>, LiteralError>
where
    T: FromStr + Default + From<i8>,
{
    let invalid = || LiteralError::Complex(raw.to_string());

    let mut text = raw.trim();
    if let Some(inner) = text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        text = inner;
    }
    if text.is_empty() {
        return Err(invalid());
    }

    let Some(body) = text.strip_suffix('i') else {
        let re = text.parse().map_err(|_| invalid())?;
        return Ok(Complex::new(re, T::default()));
    };

    // The sign separating both parts is the last one that does not open
    // the number or belong to an exponent.
    let bytes = body.as_bytes();
    let split = (1..bytes.len()).rev().find(|&i| {
        matches!(bytes[i], b'+' | b'-') && !matches!(bytes[i - 1], b'e' | b'E')
    });

    let (re, im) = match split {
        Some(i) => (&body[..i], &body[i..]),
        None => ("", body),
    };

    let re = if re.is_empty() {
        T::default()
    } else {
        re.parse().map_err(|_| invalid())?
    };
    let im = match im {
        "" | "+" => T::from(1),
        "-" => T::from(-1),
        digits => digits.parse().map_err(|_| invalid())?,
    };

    Ok(Complex::new(re, im))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_integers_of_every_width() {
        assert_eq!(PrimitiveKind::I32.parse("29").unwrap(), LiteralValue::I32(29));
        assert_eq!(PrimitiveKind::I8.parse("-128").unwrap(), LiteralValue::I8(-128));
        assert_eq!(PrimitiveKind::U64.parse("+7").unwrap(), LiteralValue::U64(7));
        assert!(PrimitiveKind::I8.parse("128").is_err());
        assert!(PrimitiveKind::U16.parse("-1").is_err());
    }

    #[test]
    fn malformed_integer_fails() {
        match PrimitiveKind::I32.parse("abc") {
            Err(LiteralError::Int(_)) => {}
            other => panic!("Expected Int error, got: {other:?}"),
        }
    }

    #[test]
    fn parses_floats() {
        assert_eq!(PrimitiveKind::F32.parse("13.2").unwrap(), LiteralValue::F32(13.2));
        assert_eq!(PrimitiveKind::F64.parse("1.5").unwrap(), LiteralValue::F64(1.5));
        assert!(PrimitiveKind::F64.parse("one").is_err());
    }

    #[test]
    fn parses_booleans() {
        for raw in ["1", "t", "T", "TRUE", "true", "True"] {
            assert_eq!(PrimitiveKind::Bool.parse(raw).unwrap(), LiteralValue::Bool(true));
        }
        for raw in ["0", "f", "F", "FALSE", "false", "False"] {
            assert_eq!(PrimitiveKind::Bool.parse(raw).unwrap(), LiteralValue::Bool(false));
        }
        assert!(PrimitiveKind::Bool.parse("yes").is_err());
    }

    #[test]
    fn strings_are_verbatim() {
        assert_eq!(
            PrimitiveKind::Str.parse(" data value ok ").unwrap(),
            LiteralValue::Str(" data value ok ".into())
        );
    }

    #[test]
    fn parses_complex_forms() {
        assert_eq!(parse_complex::<f64>("1+2i").unwrap(), Complex::new(1.0, 2.0));
        assert_eq!(parse_complex::<f64>("(1.5-0.5i)").unwrap(), Complex::new(1.5, -0.5));
        assert_eq!(parse_complex::<f64>("3i").unwrap(), Complex::new(0.0, 3.0));
        assert_eq!(parse_complex::<f64>("-i").unwrap(), Complex::new(0.0, -1.0));
        assert_eq!(parse_complex::<f32>("2").unwrap(), Complex::new(2.0, 0.0));
        assert_eq!(parse_complex::<f64>("1e-3+1e+2i").unwrap(), Complex::new(0.001, 100.0));
        assert!(parse_complex::<f64>("").is_err());
        assert!(parse_complex::<f64>("x+yi").is_err());
    }

    #[test]
    fn value_keeps_native_type() {
        let value = LiteralValue::F32(13.2).to_value();
        assert_eq!(*value.downcast::<f32>().unwrap(), 13.2);

        let value = LiteralValue::Str("x".into()).to_value();
        assert_eq!(*value.downcast::<String>().unwrap(), "x");
    }

    #[test]
    fn boxed_literal_allocates_through_each_level() {
        assert_eq!(<Box<Box<i32>> as Literal>::KIND, PrimitiveKind::I32);

        let value = PrimitiveKind::I32.parse("29").unwrap().to_value();
        let boxed = <Box<Box<i32>> as Literal>::from_value(value).unwrap();
        assert_eq!(**boxed, 29);

        let wrong = LiteralValue::Bool(true).to_value();
        assert!(<Box<i32> as Literal>::from_value(wrong).is_err());
    }

    #[test]
    fn kind_round_trips() {
        assert_eq!(LiteralValue::U8(1).kind(), PrimitiveKind::U8);
        assert_eq!(<Complex64 as Literal>::KIND, PrimitiveKind::Complex64);
        assert_eq!(<String as Literal>::KIND, PrimitiveKind::Str);
    }
}
