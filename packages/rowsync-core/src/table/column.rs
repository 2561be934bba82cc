//! Column descriptors supplied by the schema provider.

/// Type tags stored as opaque bytes and shown through the binary codec.
const BINARY_TYPE_TAGS: [&str; 4] = ["varbinary", "binary", "image", "blob"];

/// Column definition within a table.
///
/// Descriptor order is significant: it is the grid column order, the
/// INSERT column order, and the order of composite key parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Column name as reported by the schema provider
    pub name: String,
    /// Declared type tag, lower case without length (e.g. "varchar", "blob")
    pub type_tag: String,
    /// Whether the column accepts NULL
    pub nullable: bool,
    /// Declared maximum character length, if any
    pub max_length: Option<i64>,
    /// Server-assigned identity column
    pub identity: bool,
    /// Member of the configured primary key
    pub primary_key: bool,
}

impl ColumnDescriptor {
    /// Creates a nullable, non-key column of the given type.
    ///
    /// # Arguments
    /// * `name` - Column name
    /// * `type_tag` - Declared type tag
    ///
    /// # Returns
    /// A new ColumnDescriptor instance.
    pub fn new(name: impl Into<String>, type_tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_tag: type_tag.into().to_ascii_lowercase(),
            nullable: true,
            max_length: None,
            identity: false,
            primary_key: false,
        }
    }

    /// Marks the column NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Sets the declared maximum length.
    pub fn with_max_length(mut self, max_length: i64) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Marks the column as a primary-key member. Key columns are NOT NULL.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    /// Marks the column as server-assigned identity.
    pub fn identity(mut self) -> Self {
        self.identity = true;
        self
    }

    /// Returns true when values are stored through the binary codec.
    pub fn is_binary(&self) -> bool {
        BINARY_TYPE_TAGS
            .iter()
            .any(|tag| self.type_tag.eq_ignore_ascii_case(tag))
    }

    /// Returns the enforced maximum length; zero and negative lengths mean unbounded.
    pub fn effective_max_length(&self) -> Option<usize> {
        self.max_length
            .filter(|len| *len > 0)
            .and_then(|len| usize::try_from(len).ok())
    }

    /// Case-insensitive name comparison.
    pub fn matches_name(&self, name: &str) -> bool {
        column_key(&self.name) == column_key(name)
    }
}

/// Normalizes a column name for case-insensitive lookup.
pub fn column_key(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// Returns the descriptor index of the named column.
pub fn column_index(columns: &[ColumnDescriptor], name: &str) -> Option<usize> {
    let key = column_key(name);
    columns.iter().position(|c| column_key(&c.name) == key)
}

/// Returns the descriptor indexes of the primary-key columns, in descriptor order.
pub fn primary_key_indexes(columns: &[ColumnDescriptor]) -> Vec<usize> {
    columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.primary_key)
        .map(|(i, _)| i)
        .collect()
}
