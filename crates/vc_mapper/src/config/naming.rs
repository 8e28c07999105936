use core::fmt;
use std::sync::Arc;

/// Produces an alternative name for a member name, or `None`.
pub type AlternateNameFn = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

// -----------------------------------------------------------------------------
// NamingSettings

/// How member names, type names and dictionary keys are compared.
///
/// Every comparison is ASCII case-insensitive. A name matches another when
/// any of their candidate spellings are equal, candidates are derived from:
///
/// - the name itself,
/// - the name without an ignored prefix or suffix (`strName` -> `Name`),
/// - identifier spellings (`CustomerId` <-> `CustomerIdentifier`),
/// - the configured alternate name generators.
///
/// # Examples
///
/// ```
/// use vc_mapper::config::NamingSettings;
///
/// let mut naming = NamingSettings::default();
/// naming.ignore_prefix("str");
///
/// assert!(naming.matches("strName", "name"));
/// assert!(naming.matches("OrderId", "OrderIdentifier"));
/// assert_eq!(naming.element_key("Lines", 2), "Lines[2]");
/// ```
#[derive(Clone)]
pub struct NamingSettings {
    ignored_prefixes: Vec<Arc<str>>,
    ignored_suffixes: Vec<Arc<str>>,
    alternate_names: Vec<AlternateNameFn>,
    identifier_suffixes: Vec<Arc<str>>,
    type_name_suffixes: Vec<Arc<str>>,
    separator: Arc<str>,
    element_open: Arc<str>,
    element_close: Arc<str>,
}

impl Default for NamingSettings {
    fn default() -> Self {
        Self {
            ignored_prefixes: Vec::new(),
            ignored_suffixes: Vec::new(),
            alternate_names: Vec::new(),
            identifier_suffixes: vec!["Id".into(), "Identifier".into()],
            type_name_suffixes: vec!["Dto".into(), "ViewModel".into(), "Model".into()],
            separator: ".".into(),
            element_open: "[".into(),
            element_close: "]".into(),
        }
    }
}

impl fmt::Debug for NamingSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamingSettings")
            .field("ignored_prefixes", &self.ignored_prefixes)
            .field("ignored_suffixes", &self.ignored_suffixes)
            .field("alternate_names", &self.alternate_names.len())
            .field("identifier_suffixes", &self.identifier_suffixes)
            .field("type_name_suffixes", &self.type_name_suffixes)
            .field("separator", &self.separator)
            .finish_non_exhaustive()
    }
}

impl NamingSettings {
    // -------------------------------------------------------------------------
    // Configuration

    /// Ignores a member name prefix (`str` in `strName`).
    pub fn ignore_prefix(&mut self, prefix: impl Into<Arc<str>>) -> &mut Self {
        self.ignored_prefixes.push(prefix.into());
        self
    }

    /// Ignores a member name suffix (`Field` in `NameField`).
    pub fn ignore_suffix(&mut self, suffix: impl Into<Arc<str>>) -> &mut Self {
        self.ignored_suffixes.push(suffix.into());
        self
    }

    /// Adds a generator of alternative member names.
    ///
    /// ```
    /// use vc_mapper::config::NamingSettings;
    ///
    /// let mut naming = NamingSettings::default();
    /// naming.alternate_names(|name| name.strip_prefix("Given").map(|rest| format!("First{rest}")));
    ///
    /// assert!(naming.matches("GivenName", "FirstName"));
    /// ```
    pub fn alternate_names(
        &mut self,
        generate: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> &mut Self {
        self.alternate_names.push(Arc::new(generate));
        self
    }

    /// Adds a suffix marking identifier members, `Id` and `Identifier` by default.
    pub fn identifier_suffix(&mut self, suffix: impl Into<Arc<str>>) -> &mut Self {
        self.identifier_suffixes.push(suffix.into());
        self
    }

    /// Adds a type name suffix ignored when type names prefix identifiers
    /// and when derived types are paired by name.
    ///
    /// `Dto`, `ViewModel` and `Model` are ignored by default.
    pub fn type_name_suffix(&mut self, suffix: impl Into<Arc<str>>) -> &mut Self {
        self.type_name_suffixes.push(suffix.into());
        self
    }

    /// Sets the separator joining nested member names in dictionary keys, `.` by default.
    pub fn separator(&mut self, separator: impl Into<Arc<str>>) -> &mut Self {
        self.separator = separator.into();
        self
    }

    /// Sets the brackets around element indices in dictionary keys, `[` and `]` by default.
    pub fn element_pattern(&mut self, open: impl Into<Arc<str>>, close: impl Into<Arc<str>>) -> &mut Self {
        self.element_open = open.into();
        self.element_close = close.into();
        self
    }

    // -------------------------------------------------------------------------
    // Queries

    #[inline]
    pub fn key_separator(&self) -> &str {
        &self.separator
    }

    /// Returns the lowercase spellings `name` may match.
    pub fn candidates(&self, name: &str) -> Vec<String> {
        let mut result: Vec<String> = Vec::new();
        let mut push = |candidate: String| {
            if !candidate.is_empty() && !result.contains(&candidate) {
                result.push(candidate);
            }
        };

        let lower = name.to_ascii_lowercase();
        let mut stems = vec![lower.clone()];
        for prefix in &self.ignored_prefixes {
            if let Some(rest) = strip_prefix_ignore_case(name, prefix) {
                stems.push(rest.to_ascii_lowercase());
            }
        }
        for suffix in &self.ignored_suffixes {
            if let Some(rest) = strip_suffix_ignore_case(name, suffix) {
                stems.push(rest.to_ascii_lowercase());
            }
        }
        for generate in &self.alternate_names {
            if let Some(alternate) = generate(name) {
                stems.push(alternate.to_ascii_lowercase());
            }
        }

        for stem in stems {
            for spelling in self.identifier_spellings(&stem) {
                push(spelling);
            }
            push(stem);
        }
        result
    }

    /// Returns `true` if any candidate spellings of the two names are equal.
    pub fn matches(&self, a: &str, b: &str) -> bool {
        let b = self.candidates(b);
        self.candidates(a).iter().any(|candidate| b.contains(candidate))
    }

    /// Returns `true` if the name ends with an identifier suffix (`Id`, `OrderId`).
    ///
    /// The suffix is compared case-sensitively unless it is the whole name,
    /// so `Paid` is not an identifier.
    pub fn is_identifier(&self, name: &str) -> bool {
        self.identifier_suffixes
            .iter()
            .any(|suffix| name.eq_ignore_ascii_case(suffix) || name.ends_with(&**suffix))
    }

    /// Returns the type name without an ignored type suffix (`CustomerDto` -> `Customer`).
    pub fn type_stem<'a>(&self, type_name: &'a str) -> &'a str {
        self.type_name_suffixes
            .iter()
            .find_map(|suffix| strip_suffix_ignore_case(type_name, suffix))
            .unwrap_or(type_name)
    }

    /// Joins nested member names into a dictionary key.
    pub fn dictionary_key<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> String {
        let mut key = String::new();
        for name in names {
            if !key.is_empty() {
                key.push_str(&self.separator);
            }
            key.push_str(name);
        }
        key
    }

    /// Returns the key of the element at `index` below `key`.
    pub fn element_key(&self, key: &str, index: usize) -> String {
        format!("{key}{}{index}{}", self.element_open, self.element_close)
    }

    /// Returns the prefix shared by the keys of every element below `key`.
    pub fn element_prefix(&self, key: &str) -> String {
        format!("{key}{}", self.element_open)
    }

    /// Returns the prefix shared by the keys nested below `key`.
    pub fn nested_prefix(&self, key: &str) -> String {
        format!("{key}{}", self.separator)
    }

    // `customerid` -> `customeridentifier`, and back
    fn identifier_spellings(&self, lower: &str) -> Vec<String> {
        let mut result = Vec::new();
        for suffix in &self.identifier_suffixes {
            let Some(base) = lower.strip_suffix(&*suffix.to_ascii_lowercase()) else {
                continue;
            };
            for other in &self.identifier_suffixes {
                if other != suffix {
                    result.push(format!("{base}{}", other.to_ascii_lowercase()));
                }
            }
        }
        result
    }
}

pub(crate) fn strip_prefix_ignore_case<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    let len = prefix.len();
    (name.len() > len && name.is_char_boundary(len) && name[..len].eq_ignore_ascii_case(prefix))
        .then(|| &name[len..])
}

pub(crate) fn strip_suffix_ignore_case<'a>(name: &'a str, suffix: &str) -> Option<&'a str> {
    let split = name.len().checked_sub(suffix.len())?;
    (split > 0 && name.is_char_boundary(split) && name[split..].eq_ignore_ascii_case(suffix))
        .then(|| &name[..split])
}

#[cfg(test)]
mod tests {
    use super::NamingSettings;

    #[test]
    fn candidates() {
        let mut naming = NamingSettings::default();
        naming.ignore_prefix("m_").ignore_suffix("Value");

        let candidates = naming.candidates("m_TotalValue");
        assert!(candidates.contains(&"m_totalvalue".to_string()));
        assert!(candidates.contains(&"totalvalue".to_string()));
        assert!(candidates.contains(&"m_total".to_string()));

        // a prefix is never stripped down to nothing
        assert_eq!(naming.candidates("Value"), ["value"]);
    }

    #[test]
    fn identifiers() {
        let naming = NamingSettings::default();

        assert!(naming.is_identifier("Id"));
        assert!(naming.is_identifier("id"));
        assert!(naming.is_identifier("CustomerId"));
        assert!(naming.is_identifier("CustomerIdentifier"));
        assert!(!naming.is_identifier("Paid"));

        assert!(naming.matches("Id", "identifier"));
        assert!(naming.matches("CUSTOMERID", "customerIdentifier"));
        assert!(!naming.matches("CustomerId", "Customer"));
    }

    #[test]
    fn type_stem() {
        let naming = NamingSettings::default();

        assert_eq!(naming.type_stem("CustomerDto"), "Customer");
        assert_eq!(naming.type_stem("OrderViewModel"), "Order");
        assert_eq!(naming.type_stem("Dto"), "Dto");
        assert_eq!(naming.type_stem("Customer"), "Customer");
    }

    #[test]
    fn keys() {
        let mut naming = NamingSettings::default();
        assert_eq!(naming.dictionary_key(["Address", "Line1"]), "Address.Line1");
        assert_eq!(naming.nested_prefix("Address"), "Address.");
        assert_eq!(naming.element_prefix("Lines"), "Lines[");

        naming.separator("_").element_pattern("(", ")");
        assert_eq!(naming.dictionary_key(["Address", "Line1"]), "Address_Line1");
        assert_eq!(naming.element_key("Lines", 0), "Lines(0)");
    }
}
