use smallstr::SmallString;

/// A bus topic name to which messages can be published.
///
/// Topic names are case-sensitive.
// Channel names in typical specs fit in 36 bytes, e.g. `user.created` or `billing.invoice.paid`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Topic(SmallString<[u8; 36]>);

impl Topic {
    /// The topic name.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for Topic {
    fn default() -> Self {
        Topic(SmallString::new())
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'a> From<&'a str> for Topic {
    fn from(s: &'a str) -> Topic {
        Topic(s.into())
    }
}

impl From<String> for Topic {
    fn from(s: String) -> Topic {
        Topic(SmallString::from_string(s))
    }
}

impl AsRef<str> for Topic {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<str> for Topic {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}
