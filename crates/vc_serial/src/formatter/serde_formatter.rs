use alloc::boxed::Box;

use vc_os::sync::Arc;

use crate::Reflect;
use crate::context::SerializationPolicy;
use crate::error::SerialResult;
use crate::formatter::{Formatter, FormatterLocator, LocatorRegistration, LocatorStep};
use crate::info::TypeInfo;
use crate::registry::{TypeRegistryArc, TypeTraitSerde};
use crate::serde::{BridgeError, EntryDeserializer, EntrySerializer};
use crate::stream::{DataReader, DataWriter};

/// Formats a type through its `serde` implementations.
///
/// A failed write is a hard [`SerialError::Serde`](crate::SerialError::Serde).
/// A failed read is logged, the nodes and arrays the value had entered are
/// left, and the value keeps its default.
pub struct SerdeFormatter {
    ty: &'static TypeInfo,
    type_trait: TypeTraitSerde,
}

impl SerdeFormatter {
    #[inline]
    pub fn new(ty: &'static TypeInfo, type_trait: TypeTraitSerde) -> Self {
        Self { ty, type_trait }
    }
}

impl Formatter for SerdeFormatter {
    fn serialized_type(&self) -> &'static TypeInfo {
        self.ty
    }

    fn serialize(&self, value: &dyn Reflect, writer: &mut dyn DataWriter) -> SerialResult<()> {
        self.type_trait
            .serialize(value, EntrySerializer::new(writer))
            .map_err(Into::into)
    }

    fn deserialize(&self, value: &mut dyn Reflect, reader: &mut dyn DataReader) -> SerialResult<()> {
        let depth = reader.nodes().depth();
        match self.type_trait.deserialize(EntryDeserializer::new(reader)) {
            Ok(read) => {
                if let Err(read) = value.set(read) {
                    reader.context().debug().log_error(format_args!(
                        "serde produced a value of type `{}` for `{}`",
                        read.reflect_type_info(),
                        self.ty,
                    ));
                }
                Ok(())
            }
            Err(BridgeError::Custom(message)) => {
                reader.context().debug().log_warning(format_args!(
                    "Failed to read a value of type `{}` through serde: {message}",
                    self.ty,
                ));
                while reader.nodes().depth() > depth {
                    if reader.nodes().is_in_array() {
                        reader.exit_array()?;
                    } else {
                        reader.exit_node()?;
                    }
                }
                Ok(())
            }
            Err(BridgeError::Serial(error)) => Err(error),
        }
    }
}

/// Locates the [`SerdeFormatter`] of types registered with a
/// [`TypeTraitSerde`] in the global registry.
pub struct SerdeFormatterLocator;

impl FormatterLocator for SerdeFormatterLocator {
    fn try_get_formatter(
        &self,
        ty: &'static TypeInfo,
        step: LocatorStep,
        _policy: &Arc<SerializationPolicy>,
        _allow_weak_fallback: bool,
    ) -> SerialResult<Option<Arc<dyn Formatter>>> {
        if step != LocatorStep::AfterRegisteredFormatters {
            return Ok(None);
        }
        let type_trait = TypeRegistryArc::global().type_trait::<TypeTraitSerde>(ty);
        Ok(type_trait.map(|type_trait| Arc::new(SerdeFormatter::new(ty, type_trait)) as _))
    }
}

pub(crate) static SERDE_LOCATOR: LocatorRegistration = LocatorRegistration {
    name: "vc_serial::SerdeFormatterLocator",
    priority: -110,
    create: || Box::new(SerdeFormatterLocator),
};

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;

    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::context::{DeserializationContext, SerializationContext};
    use crate::info::{NonGenericTypeInfoCell, TypeKind, TypePath, Typed};
    use crate::registry::FromType;
    use crate::stream::{Token, TokenReader, TokenWriter};

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    enum Shape {
        #[default]
        Empty,
        Circle(f32),
        Rect { w: u32, h: u32 },
    }

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Sample {
        label: String,
        weights: Vec<i32>,
        shape: Shape,
        extra: Option<u8>,
    }

    impl TypePath for Sample {
        fn type_path() -> &'static str {
            "tests::Sample"
        }
        fn type_name() -> &'static str {
            "Sample"
        }
    }

    impl Typed for Sample {
        fn type_info() -> &'static TypeInfo {
            static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
            CELL.get_or_init(|| TypeInfo::new::<Self>(TypeKind::Opaque))
        }
    }

    fn formatter() -> SerdeFormatter {
        SerdeFormatter::new(
            Sample::type_info(),
            FromType::<Sample>::from_type(),
        )
    }

    fn write(value: &Sample) -> Vec<Token> {
        let mut writer = TokenWriter::new(SerializationContext::default());
        writer.begin_struct_node(None, None).unwrap();
        formatter().serialize(value, &mut writer).unwrap();
        writer.end_node(None).unwrap();
        writer.into_tokens()
    }

    fn read(tokens: &[Token]) -> Sample {
        let mut reader = TokenReader::new(tokens, DeserializationContext::default());
        reader.enter_node().unwrap().unwrap();
        let mut value = Sample::default();
        formatter().deserialize(&mut value, &mut reader).unwrap();
        reader.exit_node().unwrap();
        assert!(reader.is_exhausted());
        value
    }

    #[test]
    fn members_are_written_into_the_open_node() {
        let sample = Sample {
            label: "a".into(),
            weights: vec![1, 2],
            shape: Shape::Rect { w: 3, h: 4 },
            extra: None,
        };
        let tokens = write(&sample);
        assert_eq!(
            tokens[1],
            Token::String {
                name: Some("label".into()),
                value: "a".into()
            }
        );
        assert_eq!(read(&tokens), sample);
    }

    #[test]
    fn variants_and_options_survive() {
        for shape in [Shape::Empty, Shape::Circle(1.5)] {
            let sample = Sample {
                label: String::new(),
                weights: Vec::new(),
                shape,
                extra: Some(9),
            };
            assert_eq!(read(&write(&sample)), sample);
        }
    }

    #[test]
    fn unreadable_data_keeps_the_default_and_leaves_the_node_balanced() {
        let tokens = vec![
            Token::StartOfNode { name: None, type_name: None, id: -1 },
            Token::StartOfNode { name: Some("shape".into()), type_name: None, id: -1 },
            Token::Boolean { name: Some("Rect".into()), value: true },
            Token::EndOfNode,
            Token::EndOfNode,
        ];
        assert_eq!(read(&tokens), Sample::default());
    }
}
