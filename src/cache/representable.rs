//! JSON Representability Check
//!
//! Walks a value through serde without producing output and rejects the
//! shapes that JSON cannot carry faithfully:
//!
//! - non-finite `f32`/`f64` (serde_json writes them as `null`)
//! - a `Some` whose payload itself encodes as `null` (`Some(None)`,
//!   `Some(())`, `Some(UnitStruct)`), which would decode as `None`
//!
//! Everything else serde_json accepts round-trips unchanged.

use std::fmt;

use serde::ser::{self, Serialize};

// == Check Error ==
/// Reason a value cannot be encoded as JSON without loss.
#[derive(Debug)]
pub struct Unrepresentable(String);

impl fmt::Display for Unrepresentable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for Unrepresentable {}

impl ser::Error for Unrepresentable {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self(msg.to_string())
    }
}

/// Checks that `value` survives a JSON round trip unchanged.
pub fn check<T: Serialize + ?Sized>(value: &T) -> Result<(), Unrepresentable> {
    value.serialize(Checker::default())
}

// == Checker ==
/// Serializer that only inspects the shape of a value.
#[derive(Debug, Clone, Copy, Default)]
struct Checker {
    /// Set while serializing the payload of a `Some`
    inside_some: bool,
}

impl Checker {
    fn null(self, what: &str) -> Result<(), Unrepresentable> {
        if self.inside_some {
            Err(Unrepresentable(format!(
                "Some({}) encodes as null and would decode as None",
                what
            )))
        } else {
            Ok(())
        }
    }

    fn float(value: f64) -> Result<(), Unrepresentable> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(Unrepresentable(format!(
                "{} has no JSON representation",
                value
            )))
        }
    }
}

impl ser::Serializer for Checker {
    type Ok = ();
    type Error = Unrepresentable;

    type SerializeSeq = Compound;
    type SerializeTuple = Compound;
    type SerializeTupleStruct = Compound;
    type SerializeTupleVariant = Compound;
    type SerializeMap = Compound;
    type SerializeStruct = Compound;
    type SerializeStructVariant = Compound;

    fn serialize_bool(self, _v: bool) -> Result<(), Unrepresentable> {
        Ok(())
    }

    fn serialize_i8(self, _v: i8) -> Result<(), Unrepresentable> {
        Ok(())
    }

    fn serialize_i16(self, _v: i16) -> Result<(), Unrepresentable> {
        Ok(())
    }

    fn serialize_i32(self, _v: i32) -> Result<(), Unrepresentable> {
        Ok(())
    }

    fn serialize_i64(self, _v: i64) -> Result<(), Unrepresentable> {
        Ok(())
    }

    fn serialize_i128(self, _v: i128) -> Result<(), Unrepresentable> {
        Ok(())
    }

    fn serialize_u8(self, _v: u8) -> Result<(), Unrepresentable> {
        Ok(())
    }

    fn serialize_u16(self, _v: u16) -> Result<(), Unrepresentable> {
        Ok(())
    }

    fn serialize_u32(self, _v: u32) -> Result<(), Unrepresentable> {
        Ok(())
    }

    fn serialize_u64(self, _v: u64) -> Result<(), Unrepresentable> {
        Ok(())
    }

    fn serialize_u128(self, _v: u128) -> Result<(), Unrepresentable> {
        Ok(())
    }

    fn serialize_f32(self, v: f32) -> Result<(), Unrepresentable> {
        Self::float(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<(), Unrepresentable> {
        Self::float(v)
    }

    fn serialize_char(self, _v: char) -> Result<(), Unrepresentable> {
        Ok(())
    }

    fn serialize_str(self, _v: &str) -> Result<(), Unrepresentable> {
        Ok(())
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<(), Unrepresentable> {
        Ok(())
    }

    fn serialize_none(self) -> Result<(), Unrepresentable> {
        self.null("None")
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<(), Unrepresentable> {
        value.serialize(Checker { inside_some: true })
    }

    fn serialize_unit(self) -> Result<(), Unrepresentable> {
        self.null("()")
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<(), Unrepresentable> {
        self.null(name)
    }

    // Encoded as a plain string
    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
    ) -> Result<(), Unrepresentable> {
        Ok(())
    }

    // Newtypes are transparent, so `Some(Wrapper(None))` is still null
    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<(), Unrepresentable> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        value: &T,
    ) -> Result<(), Unrepresentable> {
        check(value)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Compound, Unrepresentable> {
        Ok(Compound)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Compound, Unrepresentable> {
        Ok(Compound)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Compound, Unrepresentable> {
        Ok(Compound)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Compound, Unrepresentable> {
        Ok(Compound)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Compound, Unrepresentable> {
        Ok(Compound)
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Compound, Unrepresentable> {
        Ok(Compound)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Compound, Unrepresentable> {
        Ok(Compound)
    }
}

// == Compound Values ==
/// Checks every element, key and field of a sequence, map or record.
struct Compound;

impl ser::SerializeSeq for Compound {
    type Ok = ();
    type Error = Unrepresentable;

    fn serialize_element<T: Serialize + ?Sized>(
        &mut self,
        value: &T,
    ) -> Result<(), Unrepresentable> {
        check(value)
    }

    fn end(self) -> Result<(), Unrepresentable> {
        Ok(())
    }
}

impl ser::SerializeTuple for Compound {
    type Ok = ();
    type Error = Unrepresentable;

    fn serialize_element<T: Serialize + ?Sized>(
        &mut self,
        value: &T,
    ) -> Result<(), Unrepresentable> {
        check(value)
    }

    fn end(self) -> Result<(), Unrepresentable> {
        Ok(())
    }
}

impl ser::SerializeTupleStruct for Compound {
    type Ok = ();
    type Error = Unrepresentable;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        value: &T,
    ) -> Result<(), Unrepresentable> {
        check(value)
    }

    fn end(self) -> Result<(), Unrepresentable> {
        Ok(())
    }
}

impl ser::SerializeTupleVariant for Compound {
    type Ok = ();
    type Error = Unrepresentable;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        value: &T,
    ) -> Result<(), Unrepresentable> {
        check(value)
    }

    fn end(self) -> Result<(), Unrepresentable> {
        Ok(())
    }
}

impl ser::SerializeMap for Compound {
    type Ok = ();
    type Error = Unrepresentable;

    fn serialize_key<T: Serialize + ?Sized>(
        &mut self,
        key: &T,
    ) -> Result<(), Unrepresentable> {
        check(key)
    }

    fn serialize_value<T: Serialize + ?Sized>(
        &mut self,
        value: &T,
    ) -> Result<(), Unrepresentable> {
        check(value)
    }

    fn end(self) -> Result<(), Unrepresentable> {
        Ok(())
    }
}

impl ser::SerializeStruct for Compound {
    type Ok = ();
    type Error = Unrepresentable;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        _key: &'static str,
        value: &T,
    ) -> Result<(), Unrepresentable> {
        check(value)
    }

    fn end(self) -> Result<(), Unrepresentable> {
        Ok(())
    }
}

impl ser::SerializeStructVariant for Compound {
    type Ok = ();
    type Error = Unrepresentable;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        _key: &'static str,
        value: &T,
    ) -> Result<(), Unrepresentable> {
        check(value)
    }

    fn end(self) -> Result<(), Unrepresentable> {
        Ok(())
    }
}
