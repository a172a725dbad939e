//! The field walker: a serde Serializer that flattens any `Serialize` record
//! into dotted key → typed leaf pairs.
//!
//! This is the discovery half of the core. Structs (and string-keyed maps)
//! recurse, building dotted paths from the literal nesting structure;
//! scalars emit a [`Leaf`] carrying both the current value and the exact
//! primitive kind the serde data model reported, so integer and float widths
//! survive into flag registration. `Option::None` fields emit `(key, None)`:
//! present in the namespace, absent from the defaults layer.

use serde::ser::{self, Serialize};
use toml::Value;

use crate::error::MedleyError;
use crate::field::{Kind, Scalar};

/// A discovered leaf value with its primitive kind.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Leaf {
    pub value: Value,
    pub kind: Kind,
}

/// Flatten `record` into `(dotted key, leaf)` pairs in declaration order.
///
/// A scalar or sequence at the root fails with [`MedleyError::NotAStruct`].
pub(crate) fn walk<S: Serialize>(
    record: &S,
) -> Result<Vec<(String, Option<Leaf>)>, MedleyError> {
    let mut out = Vec::new();
    record.serialize(Walker {
        prefix: String::new(),
        out: &mut out,
    })?;
    Ok(out)
}

fn dotted(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

struct Walker<'a> {
    prefix: String,
    out: &'a mut Vec<(String, Option<Leaf>)>,
}

impl Walker<'_> {
    fn leaf(self, value: Value, scalar: Scalar) -> Result<(), MedleyError> {
        if self.prefix.is_empty() {
            return Err(MedleyError::NotAStruct);
        }
        self.out.push((
            self.prefix,
            Some(Leaf {
                value,
                kind: Kind::Scalar(scalar),
            }),
        ));
        Ok(())
    }
}

macro_rules! int_leaf {
    ($method:ident, $ty:ty, $scalar:ident) => {
        fn $method(self, v: $ty) -> Result<(), MedleyError> {
            self.leaf(Value::Integer(v as i64), Scalar::$scalar)
        }
    };
}

impl<'a> ser::Serializer for Walker<'a> {
    type Ok = ();
    type Error = MedleyError;
    type SerializeSeq = SeqWalker<'a>;
    type SerializeTuple = SeqWalker<'a>;
    type SerializeTupleStruct = SeqWalker<'a>;
    type SerializeTupleVariant = SeqWalker<'a>;
    type SerializeMap = MapWalker<'a>;
    type SerializeStruct = StructWalker<'a>;
    type SerializeStructVariant = StructWalker<'a>;

    fn serialize_bool(self, v: bool) -> Result<(), MedleyError> {
        self.leaf(Value::Boolean(v), Scalar::Bool)
    }

    int_leaf!(serialize_i8, i8, I8);
    int_leaf!(serialize_i16, i16, I16);
    int_leaf!(serialize_i32, i32, I32);
    int_leaf!(serialize_i64, i64, I64);
    int_leaf!(serialize_u8, u8, U8);
    int_leaf!(serialize_u16, u16, U16);
    int_leaf!(serialize_u32, u32, U32);

    fn serialize_u64(self, v: u64) -> Result<(), MedleyError> {
        let v = i64::try_from(v)
            .map_err(|_| MedleyError::Discover(format!("u64 value {v} out of range")))?;
        self.leaf(Value::Integer(v), Scalar::U64)
    }

    fn serialize_f32(self, v: f32) -> Result<(), MedleyError> {
        self.leaf(Value::Float(v as f64), Scalar::F32)
    }

    fn serialize_f64(self, v: f64) -> Result<(), MedleyError> {
        self.leaf(Value::Float(v), Scalar::F64)
    }

    fn serialize_char(self, v: char) -> Result<(), MedleyError> {
        self.leaf(Value::String(v.to_string()), Scalar::Str)
    }

    fn serialize_str(self, v: &str) -> Result<(), MedleyError> {
        self.leaf(Value::String(v.to_string()), Scalar::Str)
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<(), MedleyError> {
        if self.prefix.is_empty() {
            return Err(MedleyError::NotAStruct);
        }
        let items = v.iter().map(|&b| Value::Integer(b as i64)).collect();
        self.out.push((
            self.prefix,
            Some(Leaf {
                value: Value::Array(items),
                kind: Kind::Bytes,
            }),
        ));
        Ok(())
    }

    fn serialize_none(self) -> Result<(), MedleyError> {
        if self.prefix.is_empty() {
            return Err(MedleyError::NotAStruct);
        }
        self.out.push((self.prefix, None));
        Ok(())
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<(), MedleyError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<(), MedleyError> {
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<(), MedleyError> {
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<(), MedleyError> {
        self.serialize_str(variant)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<(), MedleyError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        value: &T,
    ) -> Result<(), MedleyError> {
        value.serialize(self)
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq, MedleyError> {
        Ok(SeqWalker {
            prefix: self.prefix,
            out: self.out,
            items: Vec::with_capacity(len.unwrap_or(0)),
            elem: None,
            opaque: false,
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple, MedleyError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct, MedleyError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant, MedleyError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, MedleyError> {
        Ok(MapWalker {
            prefix: self.prefix,
            out: self.out,
            pending_key: None,
        })
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, MedleyError> {
        Ok(StructWalker {
            prefix: self.prefix,
            out: self.out,
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, MedleyError> {
        Ok(StructWalker {
            prefix: self.prefix,
            out: self.out,
        })
    }
}

// --- structs ---

struct StructWalker<'a> {
    prefix: String,
    out: &'a mut Vec<(String, Option<Leaf>)>,
}

impl ser::SerializeStruct for StructWalker<'_> {
    type Ok = ();
    type Error = MedleyError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), MedleyError> {
        value.serialize(Walker {
            prefix: dotted(&self.prefix, key),
            out: self.out,
        })
    }

    fn end(self) -> Result<(), MedleyError> {
        Ok(())
    }
}

impl ser::SerializeStructVariant for StructWalker<'_> {
    type Ok = ();
    type Error = MedleyError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), MedleyError> {
        ser::SerializeStruct::serialize_field(self, key, value)
    }

    fn end(self) -> Result<(), MedleyError> {
        Ok(())
    }
}

// --- maps (string keys only) ---

struct MapWalker<'a> {
    prefix: String,
    out: &'a mut Vec<(String, Option<Leaf>)>,
    pending_key: Option<String>,
}

impl ser::SerializeMap for MapWalker<'_> {
    type Ok = ();
    type Error = MedleyError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), MedleyError> {
        let value = Value::try_from(key)
            .map_err(|e| MedleyError::Discover(format!("map key: {e}")))?;
        match value {
            Value::String(s) => {
                self.pending_key = Some(s);
                Ok(())
            }
            _ => Err(MedleyError::Discover("map keys must be strings".into())),
        }
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), MedleyError> {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| MedleyError::Discover("map value without a key".into()))?;
        value.serialize(Walker {
            prefix: dotted(&self.prefix, &key),
            out: self.out,
        })
    }

    fn end(self) -> Result<(), MedleyError> {
        Ok(())
    }
}

// --- sequences ---
//
// Each element is probed through a nested walk. A single scalar leaf gives
// the element kind; anything else (structs, options, nested sequences)
// degrades the whole field to `Kind::Opaque` while still capturing the
// value for the defaults layer where possible.

struct SeqWalker<'a> {
    prefix: String,
    out: &'a mut Vec<(String, Option<Leaf>)>,
    items: Vec<Value>,
    elem: Option<Scalar>,
    opaque: bool,
}

impl SeqWalker<'_> {
    fn push_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), MedleyError> {
        let mut probed = Vec::new();
        value.serialize(Walker {
            prefix: "#".to_string(),
            out: &mut probed,
        })?;

        match probed.as_slice() {
            [(key, Some(leaf))] if key == "#" => {
                if let Kind::Scalar(s) = leaf.kind {
                    if self.elem.is_none() {
                        self.elem = Some(s);
                    }
                } else {
                    self.opaque = true;
                }
                self.items.push(leaf.value.clone());
                Ok(())
            }
            _ => {
                self.opaque = true;
                let v = Value::try_from(value)
                    .map_err(|e| MedleyError::Discover(format!("sequence element: {e}")))?;
                self.items.push(v);
                Ok(())
            }
        }
    }

    fn finish(self) -> Result<(), MedleyError> {
        if self.prefix.is_empty() {
            return Err(MedleyError::NotAStruct);
        }
        let kind = match (self.opaque, self.elem) {
            (false, Some(s)) => Kind::List(s),
            _ => Kind::Opaque,
        };
        self.out.push((
            self.prefix,
            Some(Leaf {
                value: Value::Array(self.items),
                kind,
            }),
        ));
        Ok(())
    }
}

impl ser::SerializeSeq for SeqWalker<'_> {
    type Ok = ();
    type Error = MedleyError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), MedleyError> {
        self.push_element(value)
    }

    fn end(self) -> Result<(), MedleyError> {
        self.finish()
    }
}

impl ser::SerializeTuple for SeqWalker<'_> {
    type Ok = ();
    type Error = MedleyError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), MedleyError> {
        self.push_element(value)
    }

    fn end(self) -> Result<(), MedleyError> {
        self.finish()
    }
}

impl ser::SerializeTupleStruct for SeqWalker<'_> {
    type Ok = ();
    type Error = MedleyError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), MedleyError> {
        self.push_element(value)
    }

    fn end(self) -> Result<(), MedleyError> {
        self.finish()
    }
}

impl ser::SerializeTupleVariant for SeqWalker<'_> {
    type Ok = ();
    type Error = MedleyError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), MedleyError> {
        self.push_element(value)
    }

    fn end(self) -> Result<(), MedleyError> {
        self.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::collections::BTreeMap;

    fn leaf(value: Value, kind: Kind) -> Option<Leaf> {
        Some(Leaf { value, kind })
    }

    #[test]
    fn flat_struct() {
        #[derive(Serialize)]
        struct Cfg {
            host: String,
            port: u16,
        }
        let pairs = walk(&Cfg {
            host: "0.0.0.0".into(),
            port: 3000,
        })
        .unwrap();
        assert_eq!(
            pairs,
            vec![
                (
                    "host".to_string(),
                    leaf(Value::String("0.0.0.0".into()), Kind::Scalar(Scalar::Str))
                ),
                (
                    "port".to_string(),
                    leaf(Value::Integer(3000), Kind::Scalar(Scalar::U16))
                ),
            ]
        );
    }

    #[test]
    fn nested_struct_builds_dotted_paths() {
        #[derive(Serialize)]
        struct Inner {
            url: String,
        }
        #[derive(Serialize)]
        struct Outer {
            database: Inner,
        }
        let pairs = walk(&Outer {
            database: Inner { url: "pg://".into() },
        })
        .unwrap();
        assert_eq!(pairs[0].0, "database.url");
    }

    #[test]
    fn depth_three_nesting() {
        #[derive(Serialize)]
        struct C {
            val: i32,
        }
        #[derive(Serialize)]
        struct B {
            c: C,
        }
        #[derive(Serialize)]
        struct A {
            b: B,
        }
        let pairs = walk(&A { b: B { c: C { val: 7 } } }).unwrap();
        assert_eq!(
            pairs,
            vec![(
                "b.c.val".to_string(),
                leaf(Value::Integer(7), Kind::Scalar(Scalar::I32))
            )]
        );
    }

    #[test]
    fn none_emits_keyed_absence() {
        #[derive(Serialize)]
        struct Cfg {
            url: Option<String>,
        }
        let pairs = walk(&Cfg { url: None }).unwrap();
        assert_eq!(pairs, vec![("url".to_string(), None)]);
    }

    #[test]
    fn some_unwraps_to_inner_kind() {
        #[derive(Serialize)]
        struct Cfg {
            retries: Option<u8>,
        }
        let pairs = walk(&Cfg { retries: Some(3) }).unwrap();
        assert_eq!(
            pairs,
            vec![(
                "retries".to_string(),
                leaf(Value::Integer(3), Kind::Scalar(Scalar::U8))
            )]
        );
    }

    #[test]
    fn string_list_keeps_element_kind() {
        #[derive(Serialize)]
        struct Cfg {
            hosts: Vec<String>,
        }
        let pairs = walk(&Cfg {
            hosts: vec!["a".into(), "b".into()],
        })
        .unwrap();
        assert_eq!(pairs[0].1.as_ref().unwrap().kind, Kind::List(Scalar::Str));
    }

    #[test]
    fn u8_list_is_a_u8_list_here() {
        // The bytes-vs-list decision is made later, in discovery.
        #[derive(Serialize)]
        struct Cfg {
            raw: Vec<u8>,
        }
        let pairs = walk(&Cfg { raw: vec![1, 2, 3] }).unwrap();
        assert_eq!(pairs[0].1.as_ref().unwrap().kind, Kind::List(Scalar::U8));
    }

    #[test]
    fn empty_list_is_opaque() {
        #[derive(Serialize)]
        struct Cfg {
            hosts: Vec<String>,
        }
        let pairs = walk(&Cfg { hosts: vec![] }).unwrap();
        assert_eq!(pairs[0].1.as_ref().unwrap().kind, Kind::Opaque);
    }

    #[test]
    fn list_of_structs_is_opaque_with_default() {
        #[derive(Serialize)]
        struct Peer {
            addr: String,
        }
        #[derive(Serialize)]
        struct Cfg {
            peers: Vec<Peer>,
        }
        let pairs = walk(&Cfg {
            peers: vec![Peer { addr: "x".into() }],
        })
        .unwrap();
        let leaf = pairs[0].1.as_ref().unwrap();
        assert_eq!(leaf.kind, Kind::Opaque);
        assert!(matches!(leaf.value, Value::Array(_)));
    }

    #[test]
    fn map_flattens_like_a_struct() {
        #[derive(Serialize)]
        struct Cfg {
            limits: BTreeMap<String, i64>,
        }
        let mut limits = BTreeMap::new();
        limits.insert("cpu".to_string(), 4);
        let pairs = walk(&Cfg { limits }).unwrap();
        assert_eq!(pairs[0].0, "limits.cpu");
    }

    #[test]
    fn non_string_map_key_fails() {
        #[derive(Serialize)]
        struct Cfg {
            m: BTreeMap<i32, i32>,
        }
        let mut m = BTreeMap::new();
        m.insert(1, 2);
        let err = walk(&Cfg { m }).unwrap_err();
        assert!(err.to_string().contains("map keys"));
    }

    #[test]
    fn unit_variant_is_a_string() {
        #[derive(Serialize)]
        enum Mode {
            Fast,
        }
        #[derive(Serialize)]
        struct Cfg {
            mode: Mode,
        }
        let pairs = walk(&Cfg { mode: Mode::Fast }).unwrap();
        assert_eq!(
            pairs[0].1.as_ref().unwrap().value,
            Value::String("Fast".into())
        );
    }

    #[test]
    fn bare_scalar_root_fails() {
        assert!(matches!(walk(&true).unwrap_err(), MedleyError::NotAStruct));
        assert!(matches!(
            walk(&"hello").unwrap_err(),
            MedleyError::NotAStruct
        ));
    }

    #[test]
    fn bare_sequence_root_fails() {
        assert!(matches!(
            walk(&vec![1, 2, 3]).unwrap_err(),
            MedleyError::NotAStruct
        ));
    }

    #[test]
    fn empty_struct_yields_no_fields() {
        #[derive(Serialize)]
        struct Empty {}
        assert!(walk(&Empty {}).unwrap().is_empty());
    }

    #[test]
    fn u64_out_of_range_is_a_discover_error() {
        #[derive(Serialize)]
        struct Cfg {
            big: u64,
        }
        let err = walk(&Cfg { big: u64::MAX }).unwrap_err();
        assert!(matches!(err, MedleyError::Discover(_)));
    }
}
