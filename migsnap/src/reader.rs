//! Reading AIGER files in either the ASCII (`aag`) or the binary (`aig`) encoding.
//!
//! ASCII files go through the `aiger` crate. Binary files have implicit inputs and delta-compressed AND gates, so
//! they are decoded here into the same shape.

use aiger::{Aiger, Literal, Symbol};

use crate::error::{Error, Result};

/// The combinational content of an AIGER file, before any gate is built.
#[derive(Debug, Default, PartialEq)]
pub struct AigerFile {
    pub max_variable: usize,
    /// Input variables in file order.
    pub inputs: Vec<usize>,
    pub outputs: Vec<Literal>,
    /// The two inputs of each AND gate, indexed by variable.
    pub gates: Vec<Option<[Literal; 2]>>,
    pub input_symbols: Vec<(usize, String)>,
    pub output_symbols: Vec<(usize, String)>,
}

fn aiger_error(err: aiger::AigerError) -> Error {
    Error::Aiger(format!("{:?}", err))
}

impl AigerFile {
    /// Parse a whole file, picking the encoding from its header.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.starts_with(b"aig ") {
            Self::binary(bytes)
        } else {
            Self::ascii(bytes)
        }
    }

    fn with_capacity(max_variable: usize) -> Self {
        Self {
            max_variable,
            gates: vec![None; max_variable + 1],
            ..Self::default()
        }
    }

    fn ascii(bytes: &[u8]) -> Result<Self> {
        let reader = aiger::Reader::from_reader(bytes).map_err(aiger_error)?;
        let header = reader.header();
        if header.l > 0 {
            return Err(Error::Latches(header.l));
        }

        let mut file = Self::with_capacity(header.m);
        for record in reader.records() {
            match record.map_err(aiger_error)? {
                Aiger::Input(l) => file.inputs.push(l.variable()),
                Aiger::Latch { .. } => return Err(Error::Latches(1)),
                Aiger::Output(l) => file.outputs.push(l),
                Aiger::AndGate { output, inputs } => {
                    let variable = output.variable();
                    if variable > file.max_variable {
                        return Err(Error::UndefinedLiteral(variable));
                    }
                    file.gates[variable] = Some(inputs);
                }
                Aiger::Symbol { type_spec, position, symbol } => file.add_symbol(type_spec, position, symbol),
            }
        }
        Ok(file)
    }

    fn binary(bytes: &[u8]) -> Result<Self> {
        let mut cursor = Cursor { bytes, pos: 0 };

        let header = cursor.line().ok_or_else(|| Error::Aiger("missing header".to_owned()))?;
        let mut fields = header.split_whitespace().skip(1).map(|field| {
            field
                .parse::<usize>()
                .map_err(|_| Error::Aiger(format!("bad header field {:?}", field)))
        });
        let mut field = || fields.next().unwrap_or_else(|| Err(Error::Aiger("short header".to_owned())));
        let (m, i, l, o, a) = (field()?, field()?, field()?, field()?, field()?);
        // AIGER 1.9 appends bad-state, constraint, justice and fairness counts.
        for extra in fields {
            if extra? != 0 {
                return Err(Error::Aiger("bad states, constraints and liveness are not supported".to_owned()));
            }
        }
        if l > 0 {
            return Err(Error::Latches(l));
        }
        if m != i + a {
            return Err(Error::Aiger(format!("header declares {} variables for {} inputs and {} gates", m, i, a)));
        }

        let mut file = Self::with_capacity(m);
        file.inputs = (1..=i).collect();

        for _ in 0..o {
            let line = cursor.line().ok_or_else(|| Error::Aiger("missing output".to_owned()))?;
            let literal = line
                .trim()
                .parse::<usize>()
                .map_err(|_| Error::Aiger(format!("bad output literal {:?}", line)))?;
            if literal / 2 > m {
                return Err(Error::UndefinedLiteral(literal / 2));
            }
            file.outputs.push(Literal(literal));
        }

        for variable in i + 1..=m {
            let lhs = 2 * variable;
            let delta0 = cursor.varint()?;
            let delta1 = cursor.varint()?;
            let rhs0 = lhs.checked_sub(delta0).filter(|_| delta0 > 0);
            let rhs1 = rhs0.and_then(|rhs0| rhs0.checked_sub(delta1));
            match (rhs0, rhs1) {
                (Some(rhs0), Some(rhs1)) => file.gates[variable] = Some([Literal(rhs0), Literal(rhs1)]),
                _ => return Err(Error::Aiger(format!("bad delta for AND gate {}", lhs))),
            }
        }

        while let Some(line) = cursor.line() {
            let (type_spec, rest) = match line.as_bytes().first() {
                Some(b'i') => (Symbol::Input, &line[1..]),
                Some(b'o') => (Symbol::Output, &line[1..]),
                Some(b'l') => (Symbol::Latch, &line[1..]),
                // The comment section runs to the end of the file.
                Some(b'c') => break,
                _ => return Err(Error::Aiger(format!("bad symbol {:?}", line))),
            };
            let (position, symbol) = rest
                .split_once(' ')
                .and_then(|(position, symbol)| Some((position.parse::<usize>().ok()?, symbol)))
                .filter(|(_, symbol)| !symbol.is_empty())
                .ok_or_else(|| Error::Aiger(format!("bad symbol {:?}", line)))?;
            file.add_symbol(type_spec, position, symbol.to_owned());
        }

        Ok(file)
    }

    fn add_symbol(&mut self, type_spec: Symbol, position: usize, symbol: String) {
        match type_spec {
            Symbol::Input => self.input_symbols.push((position, symbol)),
            Symbol::Output => self.output_symbols.push((position, symbol)),
            Symbol::Latch => {}
        }
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// The next newline-terminated line, without the newline. Lines that are not UTF-8 end the input.
    fn line(&mut self) -> Option<&'a str> {
        let bytes = self.bytes;
        let rest = &bytes[self.pos..];
        if rest.is_empty() {
            return None;
        }
        let end = rest.iter().position(|byte| *byte == b'\n').unwrap_or(rest.len());
        self.pos += (end + 1).min(rest.len());
        std::str::from_utf8(&rest[..end]).ok()
    }

    /// A little-endian base-128 number: seven bits per byte, high bit set on every byte but the last.
    fn varint(&mut self) -> Result<usize> {
        let mut value = 0_usize;
        let mut shift = 0;
        loop {
            let byte = *self
                .bytes
                .get(self.pos)
                .ok_or_else(|| Error::Aiger("truncated AND gate section".to_owned()))?;
            self.pos += 1;
            if shift >= usize::BITS {
                return Err(Error::Aiger("AND gate delta overflows".to_owned()));
            }
            value |= usize::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }
}

#[cfg(test)]
mod tests {
    use aiger::Literal;

    use super::AigerFile;
    use crate::error::Error;

    #[test]
    fn binary_and_gate() {
        let file = AigerFile::parse(b"aig 3 2 0 1 1\n6\n\x02\x02").unwrap();
        assert_eq!(file.inputs, [1, 2]);
        assert_eq!(file.outputs, [Literal(6)]);
        assert_eq!(file.gates[3], Some([Literal(4), Literal(2)]));
    }

    #[test]
    fn binary_matches_ascii() {
        let ascii = AigerFile::parse(b"aag 5 2 0 2 3\n2\n4\n6\n11\n6 4 2\n8 5 3\n10 9 7\ni0 a\no1 sum\n").unwrap();
        let binary = AigerFile::parse(b"aig 5 2 0 2 3\n6\n11\n\x02\x02\x03\x02\x01\x02i0 a\no1 sum\nc\nmade by hand\n").unwrap();
        assert_eq!(ascii, binary);
        assert_eq!(binary.output_symbols, [(1, "sum".to_owned())]);
    }

    #[test]
    fn multi_byte_delta() {
        // Gate 201 (literal 402) reads literal 2 and the constant: deltas 400 and 2.
        let mut bytes = b"aig 201 200 0 1 1\n402\n".to_vec();
        bytes.extend([0x90, 0x03, 0x02]);
        let file = AigerFile::parse(&bytes).unwrap();
        assert_eq!(file.gates[201], Some([Literal(2), Literal(0)]));
    }

    #[test]
    fn binary_errors() {
        assert!(matches!(AigerFile::parse(b"aig 3 2 0 1 1\n6\n\x02"), Err(Error::Aiger(_))));
        assert!(matches!(AigerFile::parse(b"aig 3 2 0 1 1\n6\n\x07\x00"), Err(Error::Aiger(_))));
        assert!(matches!(AigerFile::parse(b"aig 3 2 0 1 2\n6\n"), Err(Error::Aiger(_))));
        assert!(matches!(AigerFile::parse(b"aig 2 1 1 0 0\n4 2\n"), Err(Error::Latches(1))));
        assert!(matches!(AigerFile::parse(b"aig 1 1 0 1 0\n8\n"), Err(Error::UndefinedLiteral(4))));
        assert!(matches!(AigerFile::parse(b"aig 1 1 0 0 0 1\n"), Err(Error::Aiger(_))));
    }
}
