use crate::node::NodeBody;

/// One of the three bare words of JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Literal {
    Null,
    True,
    False,
}

impl Literal {
    /// The literal that starts with `lead`, if any.
    pub(crate) fn from_lead(lead: u8) -> Option<Self> {
        match lead {
            b'n' => Some(Literal::Null),
            b't' => Some(Literal::True),
            b'f' => Some(Literal::False),
            _ => None,
        }
    }

    pub(crate) fn text(self) -> &'static [u8] {
        match self {
            Literal::Null => b"null",
            Literal::True => b"true",
            Literal::False => b"false",
        }
    }

    pub(crate) fn body(self) -> NodeBody<'static> {
        match self {
            Literal::Null => NodeBody::Null,
            Literal::True => NodeBody::True,
            Literal::False => NodeBody::False,
        }
    }

    /// Matches the whole literal at the start of `input`, returning its length.
    /// The byte after it is not inspected, so `nullx` matches `null`.
    pub(crate) fn match_prefix(self, input: &[u8]) -> Option<usize> {
        let text = self.text();
        input.starts_with(text).then_some(text.len())
    }
}
