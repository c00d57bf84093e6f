// JNI-style type signature parsing.
//
// Signatures appear throughout JDWP as the textual encoding of a type:
// `Ljava/lang/String;` for a class, `[I` for an int array, `[[Ljava/lang/Object;`
// for an array of arrays, `V` for void, and single letters for the other
// primitives (Z B C S I J F D).

use crate::error::{JdwpError, JdwpResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureKind {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Void,
    Class(String),
    Array(Box<SignatureKind>),
}

impl SignatureKind {
    /// Parses a full signature string, e.g. the value returned by
    /// ReferenceType.Signature or Method.VariableTable.
    pub fn parse(signature: &str) -> JdwpResult<Self> {
        let bytes = signature.as_bytes();
        let mut offset = 0;
        let kind = parse_at(bytes, &mut offset)?;
        if offset != bytes.len() {
            return Err(JdwpError::Signature(format!(
                "trailing data after signature: {signature:?}"
            )));
        }
        Ok(kind)
    }

    /// Builds the class signature for a dotted or slashed binary name, e.g.
    /// `java.lang.String` or `java/lang/String` -> `Ljava/lang/String;`.
    pub fn class_signature(name: &str) -> String {
        format!("L{};", name.replace('.', "/"))
    }

    pub fn array_of(element: SignatureKind) -> Self {
        SignatureKind::Array(Box::new(element))
    }

    pub fn is_primitive(&self) -> bool {
        !matches!(self, SignatureKind::Class(_) | SignatureKind::Array(_))
    }
}

fn parse_at(bytes: &[u8], offset: &mut usize) -> JdwpResult<SignatureKind> {
    let byte = *bytes
        .get(*offset)
        .ok_or_else(|| JdwpError::Signature("unexpected end of signature".into()))?;

    *offset += 1;
    Ok(match byte {
        b'Z' => SignatureKind::Boolean,
        b'B' => SignatureKind::Byte,
        b'C' => SignatureKind::Char,
        b'S' => SignatureKind::Short,
        b'I' => SignatureKind::Int,
        b'J' => SignatureKind::Long,
        b'F' => SignatureKind::Float,
        b'D' => SignatureKind::Double,
        b'V' => SignatureKind::Void,
        b'[' => SignatureKind::Array(Box::new(parse_at(bytes, offset)?)),
        b'L' => {
            let start = *offset;
            while bytes.get(*offset).copied() != Some(b';') {
                if *offset >= bytes.len() {
                    return Err(JdwpError::Signature("unterminated class signature".into()));
                }
                *offset += 1;
            }
            let name = std::str::from_utf8(&bytes[start..*offset])
                .map_err(|e| JdwpError::Signature(format!("invalid UTF-8 in signature: {e}")))?
                .to_string();
            *offset += 1; // consume ';'
            SignatureKind::Class(name)
        }
        other => {
            return Err(JdwpError::Signature(format!(
                "unrecognized signature lead byte: {other:#x}"
            )))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_primitives() {
        assert_eq!(SignatureKind::parse("I").unwrap(), SignatureKind::Int);
        assert_eq!(SignatureKind::parse("V").unwrap(), SignatureKind::Void);
        assert_eq!(SignatureKind::parse("Z").unwrap(), SignatureKind::Boolean);
    }

    #[test]
    fn parses_class_signature() {
        assert_eq!(
            SignatureKind::parse("Ljava/lang/String;").unwrap(),
            SignatureKind::Class("java/lang/String".to_string())
        );
    }

    #[test]
    fn parses_nested_arrays() {
        let parsed = SignatureKind::parse("[[Ljava/lang/Object;").unwrap();
        assert_eq!(
            parsed,
            SignatureKind::array_of(SignatureKind::array_of(SignatureKind::Class(
                "java/lang/Object".to_string()
            )))
        );
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(SignatureKind::parse("IJ").is_err());
    }

    #[test]
    fn rejects_unterminated_class() {
        assert!(SignatureKind::parse("Ljava/lang/String").is_err());
    }

    #[test]
    fn builds_class_signature_from_dotted_name() {
        assert_eq!(SignatureKind::class_signature("java.lang.String"), "Ljava/lang/String;");
    }
}
