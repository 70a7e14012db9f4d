//! Serde adapters for rule-engine types
//!
//! The rule engine's types do not carry serde implementations, so the few
//! that cross the snapshot boundary get `#[serde(with = ...)]` modules
//! here.

pub mod color_serde {
    use serde::{de::Error, de::Visitor, Deserializer, Serializer};
    use shakmaty::Color;

    pub fn serialize<S: Serializer>(c: &Color, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(match c {
            Color::White => "white",
            Color::Black => "black",
        })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Color, D::Error> {
        struct ColorVisitor {}
        impl<'de> Visitor<'de> for ColorVisitor {
            type Value = Color;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(formatter, "\"white\" or \"black\"")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                match v {
                    "white" => Ok(Color::White),
                    "black" => Ok(Color::Black),
                    other => Err(Error::custom(format!("unknown color {other:?}"))),
                }
            }
        }
        d.deserialize_str(ColorVisitor {})
    }
}
